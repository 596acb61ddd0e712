//! The dispatch engine: runs a method's chain for one intercepted call.
//!
//! # Onion Semantics
//!
//! A dispatch walks an immutable chain snapshot recursively. Every handler's
//! before-phase runs on the way in, every after-phase on the way out:
//!
//! ```text
//! run_from(0)   H2.before ─┐                           ┌─ H2.after
//! run_from(1)              H1.before ─┐    ┌─ H1.after
//! run_from(2)                         Original
//! ```
//!
//! When a before-phase resolves the call (sets a result or exception), the walk
//! turns around at that handler: its own after-phase and those of the handlers
//! outside it still run, nothing inside it does.
//!
//! # Failure Isolation
//!
//! A phase that returns `Err`, or panics while panics are caught, is reported
//! to the [`BridgeLog`] as [`Error::HandlerFailure`] and the walk continues as
//! if it had returned normally. What happens to anything the phase set before
//! failing is decided by the [`FailurePolicy`].

use std::{
    any::Any,
    cell::Cell,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    config::{BridgeConfig, FailurePolicy},
    error::{panic_message, HandlerFailure},
    hook::{
        handler::{MethodEntry, MethodHandler},
        param::MethodHookParam,
        registry::HookRegistry,
        types::{HandlerError, HandlerResult, Phase},
    },
    log::BridgeLog,
    method::{InvocationResult, MethodId, Value},
    Error, Result,
};

/// How a guarded handler phase ended.
pub(crate) enum PhaseOutcome {
    Completed,
    Failed(HandlerError),
    Panicked(Box<dyn Any + Send>),
}

impl PhaseOutcome {
    /// The failure message, `None` if the phase completed.
    pub(crate) fn into_message(self) -> Option<String> {
        match self {
            PhaseOutcome::Completed => None,
            PhaseOutcome::Failed(error) => Some(error.to_string()),
            PhaseOutcome::Panicked(payload) => Some(panic_message(&*payload)),
        }
    }

    /// Converts a failed outcome into the record handed to the log.
    pub(crate) fn into_failure(
        self,
        target: impl fmt::Display,
        sequence: u64,
        phase: Phase,
    ) -> Option<HandlerFailure> {
        self.into_message().map(|message| HandlerFailure {
            target: target.to_string(),
            sequence,
            phase,
            message,
        })
    }
}

/// Runs one handler phase, catching panics if `catch_panics` is set.
pub(crate) fn guarded<F>(catch_panics: bool, call: F) -> PhaseOutcome
where
    F: FnOnce() -> HandlerResult,
{
    let result = if catch_panics {
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(result) => result,
            Err(payload) => return PhaseOutcome::Panicked(payload),
        }
    } else {
        call()
    };

    match result {
        Ok(()) => PhaseOutcome::Completed,
        Err(error) => PhaseOutcome::Failed(error),
    }
}

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Tracks the nesting of dispatches on the current thread.
struct DepthGuard;

impl DepthGuard {
    fn enter(limit: usize) -> Result<Self> {
        DISPATCH_DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if limit != 0 && next > limit {
                return Err(Error::RecursionLimit(limit));
            }
            depth.set(next);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Runs handler chains for intercepted calls.
///
/// The engine holds no per-dispatch state; any number of threads may dispatch
/// through it at once, on the same or on different methods, and dispatches may
/// nest. No lock is held while handler code or the original implementation
/// runs.
pub struct DispatchEngine {
    registry: Arc<HookRegistry>,
    hooks_enabled: AtomicBool,
    config: BridgeConfig,
    log: Arc<dyn BridgeLog>,
}

impl DispatchEngine {
    /// Creates an engine over `registry`.
    #[must_use]
    pub fn new(registry: Arc<HookRegistry>, config: BridgeConfig, log: Arc<dyn BridgeLog>) -> Self {
        DispatchEngine {
            registry,
            hooks_enabled: AtomicBool::new(config.hooks_enabled),
            config,
            log,
        }
    }

    /// The configuration the engine was created with.
    ///
    /// Its `hooks_enabled` field is the initial value only, see
    /// [`hooks_enabled`](Self::hooks_enabled).
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns true if dispatches currently run handler chains.
    #[must_use]
    pub fn hooks_enabled(&self) -> bool {
        self.hooks_enabled.load(Ordering::Acquire)
    }

    /// Switches handler chains on or off for every later dispatch.
    ///
    /// Dispatches already running finish with the chain they started with.
    pub fn set_hooks_enabled(&self, enabled: bool) {
        self.hooks_enabled.store(enabled, Ordering::Release);
    }

    /// Runs the chain of `method` for one call and returns its outcome.
    ///
    /// The outcome is the result or exception left in the param once the
    /// outermost handler's after-phase completed; an exception is meant to be
    /// rethrown by the native caller.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownMethod`] if `method` has no chain
    /// - [`Error::RecursionLimit`] if the configured nesting limit is exceeded
    pub fn dispatch(
        &self,
        method: &MethodId,
        this_object: Option<Value>,
        args: Vec<Value>,
    ) -> Result<InvocationResult> {
        let _depth = DepthGuard::enter(self.config.max_dispatch_depth)?;

        if !self.hooks_enabled() {
            return Ok(self.invoke_original(method, this_object.as_ref(), &args));
        }

        let chain = self
            .registry
            .get(method)
            .ok_or_else(|| Error::UnknownMethod(method.clone()))?;

        let snapshot = chain.snapshot();
        if snapshot.len() == 1 {
            return Ok(self.invoke_original(method, this_object.as_ref(), &args));
        }

        let mut param = MethodHookParam::new(method.clone(), this_object, args, Arc::clone(&snapshot));
        self.run_from(&snapshot, 0, &mut param);
        Ok(param.into_outcome())
    }

    /// Invokes the original implementation of `method` directly.
    pub fn invoke_original(
        &self,
        method: &MethodId,
        this_object: Option<&Value>,
        args: &[Value],
    ) -> InvocationResult {
        self.registry
            .interceptor()
            .invoke_original(method, this_object, args)
    }

    fn run_from(&self, chain: &[MethodEntry], position: usize, param: &mut MethodHookParam) {
        let Some(entry) = chain.get(position) else {
            return;
        };

        match entry {
            MethodEntry::Original => {
                let outcome = self.invoke_original(param.method(), param.this_object.as_ref(), &param.args);
                param.store(outcome);
            }
            MethodEntry::Hook(handler) => {
                self.run_phase(handler, Phase::Before, param);
                if !param.is_resolved() {
                    self.run_from(chain, position + 1, param);
                }
                self.run_phase(handler, Phase::After, param);
            }
        }
    }

    fn run_phase(&self, handler: &MethodHandler, phase: Phase, param: &mut MethodHookParam) {
        let saved = match self.config.failure_policy {
            FailurePolicy::Rollback => Some(param.save_outcome()),
            FailurePolicy::KeepRecorded => None,
        };

        let hook = handler.callback();
        let outcome = guarded(self.config.catch_panics, || match phase {
            Phase::Before => hook.before_invocation(param),
            _ => hook.after_invocation(param),
        });

        let Some(failure) = outcome.into_failure(param.method(), handler.sequence(), phase) else {
            return;
        };

        if let Some(saved) = saved {
            param.restore_outcome(saved);
        }
        self.log.log_error(&Error::HandlerFailure(failure));
    }
}

impl fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
