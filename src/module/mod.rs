//! Module descriptors.
//!
//! A module is a named subtree of the store's state plus its own
//! getters/mutations/actions definitions. Descriptors are plain data; the
//! transform layer rewires them into store-scoped entries at registration.

mod def;

pub use def::{
    ActionDef, ActionFn, GetterDef, ModuleDef, ModulePath, MutationDef, MutationFn,
    PositionalGetterFn, ScopedGetterFn,
};
