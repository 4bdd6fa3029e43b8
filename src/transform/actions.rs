use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::StoreResult;
use crate::module::{ActionDef, ModulePath};
use crate::store::{ActionContext, Store};

/// An action wrapper bound to the store it was registered on. Invoking it
/// builds the handler's context from the live store, so nested dispatches
/// and commits reach the root dispatch tables.
pub(crate) type StoreActionFn =
    Arc<dyn Fn(Store, Value) -> BoxFuture<'static, StoreResult<Value>> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ActionKind {
    Handler(StoreActionFn),
    Placeholder(Value),
}

/// An action installed on the store.
#[derive(Clone)]
pub(crate) struct ActionEntry {
    pub(crate) path: ModulePath,
    pub(crate) kind: ActionKind,
}

/// Merge a module's raw actions into the store's action table.
///
/// Each handler is wrapped to receive an [`ActionContext`] scoped to the
/// owning module. The wrapper is lazy: nothing runs until the returned
/// future is polled. Placeholder entries pass through unchanged; a type
/// already present in the table is reported as a duplicate and overwritten.
pub(crate) fn transform_actions(
    actions: BTreeMap<String, ActionDef>,
    path: &ModulePath,
    table: &mut BTreeMap<String, ActionEntry>,
    diagnostics: &dyn Diagnostics,
) {
    for (name, def) in actions {
        if table.contains_key(&name) {
            diagnostics.warn(Diagnostic::new(
                DiagnosticKind::DuplicateAction,
                format!("duplicate action type: {name}"),
            ));
        }
        let kind = match def {
            ActionDef::Handler(handler) => {
                let path = path.clone();
                ActionKind::Handler(Arc::new(move |store: Store, payload: Value| {
                    handler(ActionContext::new(store, path.clone()), payload)
                }))
            }
            ActionDef::Placeholder(value) => ActionKind::Placeholder(value),
        };
        table.insert(
            name,
            ActionEntry {
                path: path.clone(),
                kind,
            },
        );
    }
}
