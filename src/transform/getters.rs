use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::module::{GetterDef, ModulePath};

/// A getter installed on the store: the raw user fn plus the namespace of
/// the module that owns it. Evaluation is lazy and cached by the store,
/// keyed on the state version.
#[derive(Clone)]
pub(crate) struct GetterEntry {
    pub(crate) path: ModulePath,
    pub(crate) def: GetterDef,
}

/// Merge a module's raw getters into the store's getter table.
///
/// A name already present in the table is reported as a duplicate and then
/// overwritten by the newer definition.
pub(crate) fn transform_getters(
    getters: BTreeMap<String, GetterDef>,
    path: &ModulePath,
    table: &mut BTreeMap<String, GetterEntry>,
    diagnostics: &dyn Diagnostics,
) {
    for (name, def) in getters {
        if table.contains_key(&name) {
            diagnostics.warn(Diagnostic::new(
                DiagnosticKind::DuplicateGetter,
                format!("duplicate getter type: {name}"),
            ));
        }
        table.insert(
            name,
            GetterEntry {
                path: path.clone(),
                def,
            },
        );
    }
}
