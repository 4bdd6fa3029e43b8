//! The centralized store.
//!
//! A store owns a module-namespaced JSON state tree plus the merged
//! getter/mutation/action tables produced by the transform layer. Commits
//! are synchronous tracked transitions; dispatches are the asynchronous
//! surface.

mod context;
mod store;

pub use context::{ActionContext, GetterScope, GetterView};
pub use store::{
    CommitOptions, MutationRecord, Store, StoreBuilder, SubscriptionGuard, WatchGuard,
};
