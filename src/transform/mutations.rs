use std::collections::BTreeMap;

use serde_json::Value;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::module::{ModulePath, MutationDef, MutationFn};

#[derive(Clone)]
pub(crate) enum MutationKind {
    Handler(MutationFn),
    Placeholder(Value),
}

/// A mutation installed on the store. The path scopes the handler to its
/// module's state slice; committing resolves the slice and prepends it to
/// the caller-supplied payload.
#[derive(Clone)]
pub(crate) struct MutationEntry {
    pub(crate) path: ModulePath,
    pub(crate) kind: MutationKind,
}

/// Merge a module's raw mutations into the store's mutation table.
///
/// Placeholder entries pass through unchanged. A type already present in the
/// table is reported as a duplicate and then overwritten.
pub(crate) fn transform_mutations(
    mutations: BTreeMap<String, MutationDef>,
    path: &ModulePath,
    table: &mut BTreeMap<String, MutationEntry>,
    diagnostics: &dyn Diagnostics,
) {
    for (name, def) in mutations {
        if table.contains_key(&name) {
            diagnostics.warn(Diagnostic::new(
                DiagnosticKind::DuplicateMutation,
                format!("duplicate mutation type: {name}"),
            ));
        }
        let kind = match def {
            MutationDef::Handler(handler) => MutationKind::Handler(handler),
            MutationDef::Placeholder(value) => MutationKind::Placeholder(value),
        };
        table.insert(
            name,
            MutationEntry {
                path: path.clone(),
                kind,
            },
        );
    }
}
