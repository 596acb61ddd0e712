use thiserror::Error;

use crate::{hook::Phase, method::MethodId};

/// Builds an [`Error::InvalidTarget`] for a method that can not carry hooks.
macro_rules! invalid_target {
    ($method:expr, $reason:expr) => {
        crate::Error::InvalidTarget {
            method: $method.clone(),
            reason: $reason,
        }
    };
}

/// The generic Error type, which covers every error this library can return.
///
/// Errors here describe failures of the *engine* (registration, lookup,
/// installation, nesting limits). They are deliberately separate from the
/// outcome of a hooked method: an exception thrown by the original
/// implementation, or set by a handler, travels inside
/// [`InvocationResult`](crate::InvocationResult) and is never converted into an
/// [`Error`].
///
/// # Error Categories
///
/// ## Registration Errors
/// - [`Error::DuplicateHandler`] - The handler is already part of the chain
/// - [`Error::InvalidTarget`] - The method can never be intercepted
/// - [`Error::InterceptionFailed`] - The native interception collaborator refused the method
///
/// ## Dispatch Errors
/// - [`Error::UnknownMethod`] - Dispatch for a method that was never intercepted
/// - [`Error::RecursionLimit`] - Too many nested dispatches on one thread
///
/// ## Isolated Failures
/// - [`Error::HandlerFailure`] - A handler phase failed; only ever logged
/// - [`Error::ModuleInit`] - A module's registration entry point failed
///
/// # Examples
///
/// ```rust
/// use hookbridge::{Error, Handler, HookBridge, ClosureHook, Priority, MethodId, FnInterceptor, Value};
///
/// let bridge = HookBridge::new(FnInterceptor::new(|_, _, _| Ok(Value::Void)));
/// let method = MethodId::method("com.example.Clock", "tick", "()V");
/// let handler = Handler::method(Priority::DEFAULT, ClosureHook::new());
///
/// bridge.hook_method(&method, &handler)?;
/// match bridge.hook_method(&method, &handler) {
///     Err(Error::DuplicateHandler { .. }) => {}
///     other => panic!("unexpected: {other:?}"),
/// }
/// # Ok::<(), hookbridge::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The handler (by identity) is already registered in the target chain.
    ///
    /// Recoverable; the chain is left unchanged.
    #[error("Handler #{sequence} is already registered for {target}")]
    DuplicateHandler {
        /// The registration sequence number identifying the handler
        sequence: u64,
        /// Human readable description of the hook target
        target: String,
    },

    /// Dispatch was requested for a method with no chain and no interception record.
    ///
    /// Given the registry invariants this is only reachable through a native
    /// collaborator that routes calls for methods it was never asked to intercept.
    #[error("No interception record for {0}")]
    UnknownMethod(MethodId),

    /// The method can not be intercepted at all.
    ///
    /// Abstract methods and interface members have no implementation that
    /// could be redirected.
    #[error("Cannot hook {method}: {reason}")]
    InvalidTarget {
        /// The rejected method
        method: MethodId,
        /// Why it was rejected
        reason: &'static str,
    },

    /// The native interception collaborator failed to install the hook.
    ///
    /// The handler that triggered the installation is removed again, so a
    /// later registration retries the installation.
    #[error("Failed to install interception for {method}: {message}")]
    InterceptionFailed {
        /// The method whose entry point could not be redirected
        method: MethodId,
        /// Collaborator supplied description
        message: String,
    },

    /// Maximum nesting of dispatches on a single thread exceeded.
    ///
    /// The associated value is the configured limit.
    #[error("Reached the maximum dispatch depth allowed - {0}")]
    RecursionLimit(usize),

    /// A handler phase failed.
    ///
    /// Never returned from a dispatch; this is what the engine hands to the
    /// [`BridgeLog`](crate::BridgeLog) before continuing with the chain.
    #[error(transparent)]
    HandlerFailure(#[from] HandlerFailure),

    /// A module's registration entry point failed.
    #[error("Module '{module}' failed to initialize: {message}")]
    ModuleInit {
        /// Name reported by the module
        module: String,
        /// Description of the failure
        message: String,
    },
}

/// Details about a failed handler phase.
///
/// A handler fails when a phase returns `Err(..)` or, with
/// [`BridgeConfig::catch_panics`](crate::BridgeConfig::catch_panics) enabled,
/// panics. The failure is reported and the chain moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Handler #{sequence} failed in {phase} phase for {target}: {message}")]
pub struct HandlerFailure {
    /// Description of the hook target (method or lifecycle event)
    pub target: String,
    /// Sequence number of the failing handler
    pub sequence: u64,
    /// The phase which failed
    pub phase: Phase,
    /// The error message or panic payload
    pub message: String,
}

/// Renders a panic payload caught from handler or module code.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
