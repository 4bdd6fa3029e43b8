use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::devtool::{DevtoolHook, COMMIT_EVENT, ERROR_EVENT};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, TracingDiagnostics};
use crate::error::{StoreError, StoreResult};
use crate::module::{GetterDef, ModuleDef, ModulePath};
use crate::store::context::{GetterScope, GetterView};
use crate::transform::{
    transform_actions, transform_getters, transform_mutations, ActionEntry, ActionKind,
    GetterEntry, MutationEntry, MutationKind,
};

type SubscriberFn = Arc<dyn Fn(&MutationRecord, &Value) + Send + Sync>;
type WatchGetterFn = Arc<dyn Fn(&Value, &GetterView<'_>) -> Value + Send + Sync>;
type WatchCallbackFn = Arc<dyn Fn(&Value, &Value) + Send + Sync>;

/// A committed mutation, as delivered to subscribers and the devtool hook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationRecord {
    #[serde(rename = "type")]
    pub ty: String,
    pub payload: Value,
}

/// Options accepted by [`Store::commit_with_options`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
    /// Removed upstream; accepted for compatibility and warned about when set.
    pub silent: bool,
}

struct Watcher {
    getter: WatchGetterFn,
    callback: WatchCallbackFn,
    last: Mutex<Value>,
}

struct StoreInner {
    state: RwLock<Value>,
    getters: RwLock<BTreeMap<String, GetterEntry>>,
    mutations: RwLock<BTreeMap<String, MutationEntry>>,
    actions: RwLock<BTreeMap<String, ActionEntry>>,
    subscribers: RwLock<Vec<(usize, SubscriberFn)>>,
    watchers: RwLock<Vec<(usize, Arc<Watcher>)>>,
    getter_cache: RwLock<HashMap<String, (u64, Value)>>,
    devtool: RwLock<Option<Arc<dyn DevtoolHook>>>,
    diagnostics: Arc<dyn Diagnostics>,
    version: AtomicU64,
    next_id: AtomicUsize,
    strict: bool,
}

/// The root state container coordinating all modules.
///
/// Cloning a `Store` produces another handle to the same container.
///
/// # Examples
///
/// ```
/// use coffer::{ModuleDef, Store};
/// use serde_json::{json, Value};
///
/// let store = Store::new(
///     ModuleDef::new(json!({ "a": 1 }))
///         .mutation("TEST", |state, n| {
///             state["a"] = json!(state["a"].as_i64().unwrap_or(0) + n.as_i64().unwrap_or(0));
///         }),
/// )
/// .unwrap();
///
/// store.commit("TEST", json!(2)).unwrap();
/// assert_eq!(store.state()["a"], json!(3));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Configures and builds a [`Store`].
pub struct StoreBuilder {
    root: ModuleDef,
    strict: bool,
    diagnostics: Arc<dyn Diagnostics>,
    devtool: Option<Arc<dyn DevtoolHook>>,
}

impl StoreBuilder {
    /// Reject out-of-band state writes ([`Store::patch`]) at runtime.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Replace the default `tracing`-backed diagnostics sink.
    pub fn diagnostics(mut self, sink: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Attach a devtool hook at construction time.
    pub fn devtool(mut self, hook: Arc<dyn DevtoolHook>) -> Self {
        self.devtool = Some(hook);
        self
    }

    pub fn build(self) -> StoreResult<Store> {
        let store = Store {
            inner: Arc::new(StoreInner {
                state: RwLock::new(Value::Object(Map::new())),
                getters: RwLock::new(BTreeMap::new()),
                mutations: RwLock::new(BTreeMap::new()),
                actions: RwLock::new(BTreeMap::new()),
                subscribers: RwLock::new(Vec::new()),
                watchers: RwLock::new(Vec::new()),
                getter_cache: RwLock::new(HashMap::new()),
                devtool: RwLock::new(self.devtool),
                diagnostics: self.diagnostics,
                version: AtomicU64::new(0),
                next_id: AtomicUsize::new(0),
                strict: self.strict,
            }),
        };
        store.install(ModulePath::root(), self.root)?;
        Ok(store)
    }
}

impl Store {
    /// Create a store from a root module descriptor with default settings.
    pub fn new(root: ModuleDef) -> StoreResult<Self> {
        Self::builder(root).build()
    }

    /// Create a configurable builder from a root module descriptor.
    pub fn builder(root: ModuleDef) -> StoreBuilder {
        StoreBuilder {
            root,
            strict: false,
            diagnostics: Arc::new(TracingDiagnostics),
            devtool: None,
        }
    }

    /// Get a clone of the current root state.
    pub fn state(&self) -> Value {
        self.inner.state.read().unwrap().clone()
    }

    /// Read the root state with a function, without cloning.
    pub fn read<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.state.read().unwrap())
    }

    /// Commit a mutation: a synchronous, uninterruptible state transition.
    ///
    /// The handler runs to completion under the state write lock, so no two
    /// mutations ever interleave. When this returns, the state reflects the
    /// handler's effect and every subscriber has been notified.
    pub fn commit(&self, ty: &str, payload: Value) -> StoreResult<()> {
        self.commit_with_options(ty, payload, CommitOptions::default())
    }

    /// Commit in the object style: `{ "type": ..., ...fields }`.
    ///
    /// Equivalent to `commit(type, fields)`. Fails with
    /// [`StoreError::InvalidType`] when the `type` field is missing or not a
    /// string; state is left unchanged.
    pub fn commit_payload(&self, object: Value) -> StoreResult<()> {
        let (ty, payload) = split_typed_payload(object)?;
        self.commit(&ty, payload)
    }

    /// Commit with explicit [`CommitOptions`].
    pub fn commit_with_options(
        &self,
        ty: &str,
        payload: Value,
        options: CommitOptions,
    ) -> StoreResult<()> {
        if options.silent {
            self.inner.diagnostics.warn(Diagnostic::new(
                DiagnosticKind::DeprecatedOption,
                format!(
                    "mutation type: {ty}. silent option has been removed; \
                     use the filter functionality in the devtool"
                ),
            ));
        }
        let entry = { self.inner.mutations.read().unwrap().get(ty).cloned() }
            .ok_or_else(|| StoreError::UnknownMutation(ty.to_string()))?;
        let handler = match entry.kind {
            MutationKind::Handler(handler) => handler,
            MutationKind::Placeholder(_) => return Err(StoreError::NotCallable(ty.to_string())),
        };
        {
            let mut root = self.inner.state.write().unwrap();
            let slice = entry
                .path
                .resolve_mut(&mut root)
                .ok_or_else(|| StoreError::UnknownModule(entry.path.to_string()))?;
            handler(slice, payload.clone());
            self.touch();
        }
        self.notify(MutationRecord {
            ty: ty.to_string(),
            payload,
        });
        Ok(())
    }

    /// Dispatch an action, returning a deferred completion.
    ///
    /// The future is lazy: nothing executes before the caller polls it, even
    /// for handlers that complete without suspending. Rejections propagate
    /// verbatim to the caller and are mirrored to an attached devtool hook.
    /// Once polled to completion the action's effects stand; dispatched
    /// actions cannot be cancelled.
    pub fn dispatch(&self, ty: &str, payload: Value) -> BoxFuture<'static, StoreResult<Value>> {
        let store = self.clone();
        let ty = ty.to_string();
        async move { store.dispatch_inner(ty, payload).await }.boxed()
    }

    /// Dispatch in the object style: `{ "type": ..., ...fields }`.
    pub fn dispatch_payload(&self, object: Value) -> BoxFuture<'static, StoreResult<Value>> {
        let store = self.clone();
        async move {
            let (ty, payload) = split_typed_payload(object)?;
            store.dispatch_inner(ty, payload).await
        }
        .boxed()
    }

    async fn dispatch_inner(&self, ty: String, payload: Value) -> StoreResult<Value> {
        let entry = { self.inner.actions.read().unwrap().get(&ty).cloned() }
            .ok_or_else(|| StoreError::UnknownAction(ty.clone()))?;
        let handler = match entry.kind {
            ActionKind::Handler(handler) => handler,
            ActionKind::Placeholder(_) => return Err(StoreError::NotCallable(ty)),
        };
        match handler(self.clone(), payload).await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.emit_devtool(ERROR_EVENT, &err.to_payload());
                Err(err)
            }
        }
    }

    /// Evaluate a getter by name.
    ///
    /// Getters are lazy and cached: the computed value is reused until the
    /// next commit, patch or module registration bumps the state version.
    pub fn getter(&self, name: &str) -> StoreResult<Value> {
        let (snapshot, version) = self.versioned_state();
        self.eval_getter(name, &snapshot, version)
    }

    pub(crate) fn eval_getter(
        &self,
        name: &str,
        snapshot: &Value,
        version: u64,
    ) -> StoreResult<Value> {
        if let Some((cached_version, value)) = self.inner.getter_cache.read().unwrap().get(name) {
            if *cached_version == version {
                return Ok(value.clone());
            }
        }
        let entry = { self.inner.getters.read().unwrap().get(name).cloned() }
            .ok_or_else(|| StoreError::UnknownGetter(name.to_string()))?;
        let module_state = entry.path.resolve(snapshot).cloned().unwrap_or(Value::Null);
        let view = GetterView {
            store: self,
            snapshot,
            version,
        };
        let value = match &entry.def {
            GetterDef::Positional(getter) => getter(&module_state, &view, snapshot),
            GetterDef::Scoped(getter) => getter(&GetterScope {
                state: &module_state,
                getters: &view,
                root_state: snapshot,
            }),
        };
        self.inner
            .getter_cache
            .write()
            .unwrap()
            .insert(name.to_string(), (version, value.clone()));
        Ok(value)
    }

    /// Subscribe to committed mutations.
    ///
    /// The callback receives the [`MutationRecord`] and a post-commit state
    /// snapshot for every subsequent commit. The subscription lives as long
    /// as the returned guard; dropping it (or calling
    /// [`SubscriptionGuard::unsubscribe`]) stops further invocations without
    /// affecting other subscribers.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionGuard
    where
        F: Fn(&MutationRecord, &Value) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .subscribers
            .write()
            .unwrap()
            .push((id, Arc::new(subscriber)));
        SubscriptionGuard {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Watch a derived value, firing `callback(new, old)` when a commit
    /// changes it.
    ///
    /// The getter function receives the post-commit state snapshot and a
    /// [`GetterView`] for reading store getters, and is evaluated once at
    /// registration to seed the comparison value.
    pub fn watch<G, C>(&self, getter: G, callback: C) -> WatchGuard
    where
        G: Fn(&Value, &GetterView<'_>) -> Value + Send + Sync + 'static,
        C: Fn(&Value, &Value) + Send + Sync + 'static,
    {
        let getter: WatchGetterFn = Arc::new(getter);
        let (snapshot, version) = self.versioned_state();
        let initial = getter(
            &snapshot,
            &GetterView {
                store: self,
                snapshot: &snapshot,
                version,
            },
        );
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let watcher = Arc::new(Watcher {
            getter,
            callback: Arc::new(callback),
            last: Mutex::new(initial),
        });
        self.inner.watchers.write().unwrap().push((id, watcher));
        WatchGuard {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Register a module under the given name.
    ///
    /// Registration is best-effort: redefined getter/mutation/action types
    /// and a redefined module name are warned about and overwritten rather
    /// than rejected, so hot-reload style re-registration keeps working.
    pub fn register_module(&self, name: &str, module: ModuleDef) -> StoreResult<()> {
        let exists = self.read(|root| root.get(name).is_some());
        if exists {
            self.inner.diagnostics.warn(Diagnostic::new(
                DiagnosticKind::DuplicateModule,
                format!("duplicate module name: {name}"),
            ));
            self.unregister_module(name)?;
        }
        self.install(ModulePath::root().child(name), module)
    }

    /// Remove a module: its state slice and every entry it installed.
    ///
    /// Entries the module lost to a later overwrite are left alone; they
    /// belong to the module that overwrote them.
    pub fn unregister_module(&self, name: &str) -> StoreResult<()> {
        {
            let mut root = self.inner.state.write().unwrap();
            let kind = json_kind(&root);
            let object = root
                .as_object_mut()
                .ok_or(StoreError::StateNotObject { found: kind })?;
            if object.remove(name).is_none() {
                return Err(StoreError::UnknownModule(name.to_string()));
            }
            self.touch();
        }
        self.inner
            .getters
            .write()
            .unwrap()
            .retain(|_, entry| entry.path.head() != Some(name));
        self.inner
            .mutations
            .write()
            .unwrap()
            .retain(|_, entry| entry.path.head() != Some(name));
        self.inner
            .actions
            .write()
            .unwrap()
            .retain(|_, entry| entry.path.head() != Some(name));
        Ok(())
    }

    /// Replace the whole state tree, e.g. for hot-reload or time-travel.
    /// Allowed even in strict mode.
    pub fn replace_state(&self, state: Value) {
        let mut root = self.inner.state.write().unwrap();
        *root = state;
        self.touch();
    }

    /// Mutate state outside any mutation handler.
    ///
    /// Strict stores reject this with [`StoreError::StrictViolation`];
    /// non-strict stores apply it without notifying subscribers. Must not be
    /// called from inside a mutation handler.
    pub fn patch(&self, f: impl FnOnce(&mut Value)) -> StoreResult<()> {
        if self.inner.strict {
            return Err(StoreError::StrictViolation);
        }
        let mut root = self.inner.state.write().unwrap();
        f(&mut root);
        self.touch();
        Ok(())
    }

    /// Attach (or replace) the devtool hook.
    pub fn attach_devtool(&self, hook: Arc<dyn DevtoolHook>) {
        *self.inner.devtool.write().unwrap() = Some(hook);
    }

    /// Whether this store rejects out-of-band state writes.
    pub fn is_strict(&self) -> bool {
        self.inner.strict
    }

    fn install(&self, path: ModulePath, module: ModuleDef) -> StoreResult<()> {
        let ModuleDef {
            state,
            getters,
            mutations,
            actions,
            modules,
        } = module;
        self.attach_state(&path, state)?;
        {
            let diagnostics = &*self.inner.diagnostics;
            transform_getters(
                getters,
                &path,
                &mut self.inner.getters.write().unwrap(),
                diagnostics,
            );
            transform_mutations(
                mutations,
                &path,
                &mut self.inner.mutations.write().unwrap(),
                diagnostics,
            );
            transform_actions(
                actions,
                &path,
                &mut self.inner.actions.write().unwrap(),
                diagnostics,
            );
        }
        for (name, nested) in modules {
            self.install(path.child(&name), nested)?;
        }
        Ok(())
    }

    fn attach_state(&self, path: &ModulePath, state: Value) -> StoreResult<()> {
        // Modules declared without state get an empty object slice.
        let state = if state.is_null() {
            Value::Object(Map::new())
        } else {
            state
        };
        let mut root = self.inner.state.write().unwrap();
        match path.split_last() {
            None => {
                *root = state;
            }
            Some((parent, name)) => {
                let slot = parent
                    .resolve_mut(&mut root)
                    .ok_or_else(|| StoreError::UnknownModule(parent.to_string()))?;
                let kind = json_kind(slot);
                let object = slot
                    .as_object_mut()
                    .ok_or(StoreError::StateNotObject { found: kind })?;
                object.insert(name.to_string(), state);
            }
        }
        self.touch();
        Ok(())
    }

    // Must be called while the state write lock is held, so that a reader
    // can never pair a new version with pre-bump state or vice versa.
    fn touch(&self) {
        self.inner.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Snapshot the state together with the version it belongs to.
    ///
    /// Taken under the state read lock; version bumps happen under the write
    /// lock, so the pair is always consistent and getter-cache entries keyed
    /// on it never go stale.
    fn versioned_state(&self) -> (Value, u64) {
        let state = self.inner.state.read().unwrap();
        let version = self.inner.version.load(Ordering::SeqCst);
        (state.clone(), version)
    }

    fn notify(&self, record: MutationRecord) {
        let (snapshot, version) = self.versioned_state();
        self.emit_devtool(
            COMMIT_EVENT,
            &json!({ "type": record.ty, "payload": record.payload }),
        );

        // Callbacks run outside every lock so they can commit or subscribe
        // themselves without deadlocking.
        let subscribers: Vec<SubscriberFn> = self
            .inner
            .subscribers
            .read()
            .unwrap()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(&record, &snapshot);
        }

        let watchers: Vec<Arc<Watcher>> = self
            .inner
            .watchers
            .read()
            .unwrap()
            .iter()
            .map(|(_, watcher)| Arc::clone(watcher))
            .collect();
        for watcher in watchers {
            let view = GetterView {
                store: self,
                snapshot: &snapshot,
                version,
            };
            let value = (watcher.getter)(&snapshot, &view);
            let mut last = watcher.last.lock().unwrap();
            if *last != value {
                let old = std::mem::replace(&mut *last, value.clone());
                drop(last);
                (watcher.callback)(&value, &old);
            }
        }
    }

    fn emit_devtool(&self, event: &str, payload: &Value) {
        let hook = self.inner.devtool.read().unwrap().clone();
        if let Some(hook) = hook {
            hook.emit(event, payload);
        }
    }
}

/// RAII guard for store subscriptions.
pub struct SubscriptionGuard {
    id: usize,
    inner: Weak<StoreInner>,
}

impl SubscriptionGuard {
    /// Remove the subscriber. Dropping the guard has the same effect.
    pub fn unsubscribe(self) {}
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .subscribers
                .write()
                .unwrap()
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// RAII guard for state watchers.
pub struct WatchGuard {
    id: usize,
    inner: Weak<StoreInner>,
}

impl WatchGuard {
    /// Remove the watcher. Dropping the guard has the same effect.
    pub fn unwatch(self) {}
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .watchers
                .write()
                .unwrap()
                .retain(|(id, _)| *id != self.id);
        }
    }
}

fn split_typed_payload(object: Value) -> StoreResult<(String, Value)> {
    match object {
        Value::Object(mut fields) => match fields.remove("type") {
            Some(Value::String(ty)) => Ok((ty, Value::Object(fields))),
            Some(other) => Err(StoreError::InvalidType {
                found: json_kind(&other).to_string(),
            }),
            None => Err(StoreError::InvalidType {
                found: "undefined".to_string(),
            }),
        },
        other => Err(StoreError::InvalidType {
            found: json_kind(&other).to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
