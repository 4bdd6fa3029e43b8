use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};

use crate::error::StoreResult;
use crate::store::{ActionContext, GetterScope, GetterView};

/// User getter in the positional convention:
/// `(module_state, getters, root_state)`.
pub type PositionalGetterFn = Arc<dyn Fn(&Value, &GetterView<'_>, &Value) -> Value + Send + Sync>;

/// User getter in the bound-scope convention: a single [`GetterScope`]
/// exposing the same three views as fields.
pub type ScopedGetterFn = Arc<dyn Fn(&GetterScope<'_>) -> Value + Send + Sync>;

/// User mutation handler: `(module_state, payload)`.
pub type MutationFn = Arc<dyn Fn(&mut Value, Value) + Send + Sync>;

/// User action handler: `(context, payload)` returning a deferred completion.
pub type ActionFn =
    Arc<dyn Fn(ActionContext, Value) -> BoxFuture<'static, StoreResult<Value>> + Send + Sync>;

/// A raw getter definition. The variant selects the calling convention,
/// so a module can mix both styles.
#[derive(Clone)]
pub enum GetterDef {
    Positional(PositionalGetterFn),
    Scoped(ScopedGetterFn),
}

/// A raw mutation definition. Placeholder entries pass through registration
/// untouched and cannot be committed.
#[derive(Clone)]
pub enum MutationDef {
    Handler(MutationFn),
    Placeholder(Value),
}

/// A raw action definition. Placeholder entries pass through registration
/// untouched and cannot be dispatched.
#[derive(Clone)]
pub enum ActionDef {
    Handler(ActionFn),
    Placeholder(Value),
}

/// Namespace of a module inside the root state tree.
///
/// Empty for the root module; otherwise the chain of module names leading to
/// the module's state slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// The root module's path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend the path with a nested module name.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// The top-level module name this path belongs to, if any.
    pub fn head(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Split into parent path and final segment. `None` for the root.
    pub fn split_last(&self) -> Option<(ModulePath, &str)> {
        let (last, parent) = self.0.split_last()?;
        Some((Self(parent.to_vec()), last.as_str()))
    }

    /// Resolve this module's state slice within the root state.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |value, segment| value.get(segment))
    }

    /// Resolve this module's state slice mutably within the root state.
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.0
            .iter()
            .try_fold(root, |value, segment| value.get_mut(segment))
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

/// Descriptor for one module: a state subtree plus its raw
/// getters/mutations/actions maps and any nested modules.
///
/// Built with chained calls:
///
/// ```
/// use coffer::ModuleDef;
/// use serde_json::json;
///
/// let module = ModuleDef::new(json!({ "count": 0 }))
///     .getter("doubled", |state, _getters, _root| {
///         json!(state["count"].as_i64().unwrap_or(0) * 2)
///     })
///     .mutation("increment", |state, payload| {
///         let step = payload.as_i64().unwrap_or(1);
///         state["count"] = json!(state["count"].as_i64().unwrap_or(0) + step);
///     });
/// ```
#[derive(Clone)]
pub struct ModuleDef {
    pub(crate) state: Value,
    pub(crate) getters: BTreeMap<String, GetterDef>,
    pub(crate) mutations: BTreeMap<String, MutationDef>,
    pub(crate) actions: BTreeMap<String, ActionDef>,
    pub(crate) modules: BTreeMap<String, ModuleDef>,
}

impl Default for ModuleDef {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl ModuleDef {
    /// Create a descriptor with the given initial state.
    pub fn new(state: Value) -> Self {
        Self {
            state,
            getters: BTreeMap::new(),
            mutations: BTreeMap::new(),
            actions: BTreeMap::new(),
            modules: BTreeMap::new(),
        }
    }

    /// Register a getter in the positional convention.
    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Value, &GetterView<'_>, &Value) -> Value + Send + Sync + 'static,
    {
        self.getters
            .insert(name.into(), GetterDef::Positional(Arc::new(getter)));
        self
    }

    /// Register a getter in the bound-scope convention.
    pub fn scoped_getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&GetterScope<'_>) -> Value + Send + Sync + 'static,
    {
        self.getters
            .insert(name.into(), GetterDef::Scoped(Arc::new(getter)));
        self
    }

    /// Register a mutation handler.
    pub fn mutation<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Value, Value) + Send + Sync + 'static,
    {
        self.mutations
            .insert(name.into(), MutationDef::Handler(Arc::new(handler)));
        self
    }

    /// Register a placeholder mutation entry.
    pub fn mutation_placeholder(mut self, name: impl Into<String>, value: Value) -> Self {
        self.mutations
            .insert(name.into(), MutationDef::Placeholder(value));
        self
    }

    /// Register an action handler.
    pub fn action<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StoreResult<Value>> + Send + 'static,
    {
        let handler: ActionFn = Arc::new(move |ctx, payload| handler(ctx, payload).boxed());
        self.actions.insert(name.into(), ActionDef::Handler(handler));
        self
    }

    /// Register a placeholder action entry.
    pub fn action_placeholder(mut self, name: impl Into<String>, value: Value) -> Self {
        self.actions
            .insert(name.into(), ActionDef::Placeholder(value));
        self
    }

    /// Attach a nested module under the given name.
    pub fn module(mut self, name: impl Into<String>, module: ModuleDef) -> Self {
        self.modules.insert(name.into(), module);
        self
    }
}
