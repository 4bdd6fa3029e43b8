//! Optional devtool/observability hook.

use serde_json::Value;

/// Event emitted for every committed mutation.
pub const COMMIT_EVENT: &str = "commit";

/// Event emitted when a dispatched action rejects.
pub const ERROR_EVENT: &str = "vuex:error";

/// Receiver for store events, typically backed by an inspector UI.
///
/// When attached, every commit is reported as a discrete state transition
/// ([`COMMIT_EVENT`] with `{type, payload}`), and every action rejection is
/// reported as [`ERROR_EVENT`] carrying the rejection value before the error
/// is returned to the dispatcher.
pub trait DevtoolHook: Send + Sync {
    fn emit(&self, event: &str, payload: &Value);
}
