//! Error types for the coffer crate.
//!
//! Invocation-time failures (bad type, unknown handler, strict violation,
//! action rejection) surface as [`StoreError`] via [`StoreResult`].
//! Registration-time collisions are not errors; they go through the
//! diagnostics sink and registration proceeds.

use serde_json::Value;
use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when operating on a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A commit or dispatch was invoked without a string type identifier.
    #[error("expects string as the type, but found {found}")]
    InvalidType { found: String },

    /// No mutation handler is registered under this type.
    #[error("unknown mutation type: {0}")]
    UnknownMutation(String),

    /// No action handler is registered under this type.
    #[error("unknown action type: {0}")]
    UnknownAction(String),

    /// No getter is registered under this name.
    #[error("unknown getter: {0}")]
    UnknownGetter(String),

    /// The entry registered under this type is a placeholder, not a handler.
    #[error("type {0} is registered as a placeholder, not a handler")]
    NotCallable(String),

    /// The named module is not registered on this store.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// Module state can only attach to a JSON object.
    #[error("module state must attach to an object, found {found}")]
    StateNotObject { found: &'static str },

    /// State was mutated outside a mutation handler while strict mode is on.
    #[error("state mutated outside a mutation handler")]
    StrictViolation,

    /// An action handler rejected; the value propagates verbatim.
    #[error("action rejected: {0}")]
    Rejected(Value),
}

impl StoreError {
    /// Construct an action rejection carrying an arbitrary JSON value.
    pub fn reject(value: impl Into<Value>) -> Self {
        Self::Rejected(value.into())
    }

    /// The payload reported to an attached devtool hook for this error.
    ///
    /// Rejections carry their value verbatim; everything else is reported
    /// as its display string.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Rejected(value) => value.clone(),
            other => Value::String(other.to_string()),
        }
    }
}
