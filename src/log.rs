//! The logging collaborator.

use crate::Error;

/// Sink for messages and isolated failures.
///
/// Both methods are fire-and-forget and must not panic. The engine calls
/// [`log_error`](Self::log_error) for every failed handler phase and module
/// initialization; nothing it logs is ever returned to a caller.
pub trait BridgeLog: Send + Sync {
    /// Records an informational message.
    fn log(&self, message: &str);

    /// Records an error.
    fn log_error(&self, error: &Error);
}

/// [`BridgeLog`] emitting `tracing` events under the `hookbridge` target.
///
/// Messages are emitted at `INFO`, errors at `ERROR`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl BridgeLog for TracingLog {
    fn log(&self, message: &str) {
        tracing::info!(target: "hookbridge", "{message}");
    }

    fn log_error(&self, error: &Error) {
        tracing::error!(target: "hookbridge", error = %error, "hook failure");
    }
}
