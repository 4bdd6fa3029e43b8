//! # Coffer
//!
//! A centralized state container with namespaced modules, tracked mutations
//! and async actions.
//!
//! Coffer is organized in three layers:
//!
//! ## Modules (declarative descriptors)
//!
//! [`ModuleDef`] describes a named subtree of state plus its raw
//! getters/mutations/actions maps. Descriptors are plain data until a store
//! registers them.
//!
//! ## Transforms (registration)
//!
//! Registering a module rewires its raw maps into store-scoped entries:
//! getters become lazy cached accessors, mutations become tracked operations
//! over the module's state slice, and actions become deferred operations
//! receiving an [`ActionContext`]. Type collisions warn through the
//! injectable [`Diagnostics`] sink and the newer definition overwrites.
//!
//! ## Store (runtime)
//!
//! [`Store`] owns the merged state tree and dispatch tables:
//! - `commit` - synchronous, uninterruptible state transitions
//! - `dispatch` - asynchronous operations returning a deferred completion
//! - `subscribe` / `watch` - change notification with RAII guards
//! - `register_module` / `unregister_module` - dynamic module graph

pub mod devtool;
pub mod diagnostics;
pub mod error;
pub mod module;
pub mod store;

mod transform;

// Re-export main types for convenience
pub use devtool::DevtoolHook;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, MemoryDiagnostics, TracingDiagnostics};
pub use error::{StoreError, StoreResult};
pub use module::{ActionDef, GetterDef, ModuleDef, ModulePath, MutationDef};
pub use store::{
    ActionContext, CommitOptions, GetterScope, GetterView, MutationRecord, Store, StoreBuilder,
    SubscriptionGuard, WatchGuard,
};
