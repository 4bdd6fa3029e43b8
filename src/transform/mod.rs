//! Single-pass transforms over raw module maps.
//!
//! Each transform rewires one user-supplied map (getters, mutations or
//! actions) into store-scoped entries merged into the root dispatch tables.
//! The transforms are stateless: collisions are reported to the diagnostics
//! sink and the newer definition overwrites.

mod actions;
mod getters;
mod mutations;

pub(crate) use actions::{transform_actions, ActionEntry, ActionKind};
pub(crate) use getters::{transform_getters, GetterEntry};
pub(crate) use mutations::{transform_mutations, MutationEntry, MutationKind};
