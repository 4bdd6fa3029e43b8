use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::StoreResult;
use crate::module::ModulePath;
use crate::store::Store;

/// Read access to the store's getters during getter and watcher evaluation.
///
/// Evaluation runs against a fixed snapshot of the state, so a getter that
/// reads other getters observes a consistent view even while commits are
/// happening on other threads.
pub struct GetterView<'a> {
    pub(crate) store: &'a Store,
    pub(crate) snapshot: &'a Value,
    pub(crate) version: u64,
}

impl GetterView<'_> {
    /// Evaluate another getter by name against the same snapshot.
    pub fn get(&self, name: &str) -> StoreResult<Value> {
        self.store.eval_getter(name, self.snapshot, self.version)
    }
}

/// Bound receiver for getters registered in the scoped convention.
pub struct GetterScope<'a> {
    /// The owning module's state slice.
    pub state: &'a Value,
    /// Store-wide getter access.
    pub getters: &'a GetterView<'a>,
    /// The root state tree.
    pub root_state: &'a Value,
}

/// Execution context handed to action handlers.
///
/// Exposes the owning module's state slice, the root state, store-wide
/// getters, and `dispatch`/`commit` bound to the root store so actions can
/// trigger cross-module effects.
#[derive(Clone)]
pub struct ActionContext {
    store: Store,
    path: ModulePath,
}

impl ActionContext {
    pub(crate) fn new(store: Store, path: ModulePath) -> Self {
        Self { store, path }
    }

    /// Snapshot of the owning module's state slice.
    pub fn state(&self) -> Value {
        self.store
            .read(|root| self.path.resolve(root).cloned())
            .unwrap_or(Value::Null)
    }

    /// Snapshot of the root state tree.
    pub fn root_state(&self) -> Value {
        self.store.state()
    }

    /// Evaluate a store-wide getter.
    pub fn getter(&self, name: &str) -> StoreResult<Value> {
        self.store.getter(name)
    }

    /// Commit a mutation on the root store.
    pub fn commit(&self, ty: &str, payload: Value) -> StoreResult<()> {
        self.store.commit(ty, payload)
    }

    /// Dispatch another action on the root store.
    ///
    /// The returned future is boxed so handlers can dispatch recursively;
    /// awaiting it guarantees the nested action's commits are applied before
    /// this handler resumes.
    pub fn dispatch(&self, ty: &str, payload: Value) -> BoxFuture<'static, StoreResult<Value>> {
        self.store.dispatch(ty, payload)
    }

    /// The root store this context is bound to.
    pub fn store(&self) -> &Store {
        &self.store
    }
}
