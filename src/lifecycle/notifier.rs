//! Lifecycle handler chains and their notification loop.

use std::{fmt, sync::Arc};

use crate::{
    config::BridgeConfig,
    hook::{
        dispatch::guarded,
        unhook::{Detach, HookTarget, LifecycleUnhook, Unhook},
        CallbackChain, Handler, HandlerResult, Phase, Priority,
    },
    lifecycle::event::{LifecycleEvent, LifecycleKind, LifecycleParam},
    log::BridgeLog,
    Error, Result,
};

/// Capability of a lifecycle event handler.
///
/// Closures taking `&mut LifecycleParam` implement it directly.
pub trait LifecycleHook: Send + Sync {
    /// Handles one event.
    fn handle_event(&self, param: &mut LifecycleParam) -> HandlerResult;
}

impl<F> LifecycleHook for F
where
    F: Fn(&mut LifecycleParam) -> HandlerResult + Send + Sync,
{
    fn handle_event(&self, param: &mut LifecycleParam) -> HandlerResult {
        self(param)
    }
}

/// A handler for lifecycle events.
pub type LifecycleHandler = Handler<dyn LifecycleHook>;

impl Handler<dyn LifecycleHook> {
    /// Creates a lifecycle handler.
    #[must_use]
    pub fn lifecycle<H: LifecycleHook + 'static>(priority: Priority, hook: H) -> Self {
        Self::from_arc(priority, Arc::new(hook) as Arc<dyn LifecycleHook>)
    }

    /// Creates a lifecycle handler from a closure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hookbridge::{Handler, LifecycleEvent, Priority};
    ///
    /// let handler = Handler::on_event(Priority::DEFAULT, |param| {
    ///     if let LifecycleEvent::LoadPackage(p) = param.event() {
    ///         println!("loaded {}", p.package_name);
    ///     }
    ///     Ok(())
    /// });
    /// # let _ = handler;
    /// ```
    #[must_use]
    pub fn on_event<F>(priority: Priority, hook: F) -> Self
    where
        F: Fn(&mut LifecycleParam) -> HandlerResult + Send + Sync + 'static,
    {
        Self::lifecycle(priority, hook)
    }
}

/// Chain of handlers for one lifecycle event kind.
pub type LifecycleChain = CallbackChain<LifecycleHandler>;

/// Delivers lifecycle events to their handler chains.
///
/// Unlike method dispatch there is no before/after split, no early resolution
/// and no original implementation: every handler in the snapshot runs exactly
/// once, in priority order. Failures are logged and counted, never propagated.
pub struct LifecycleNotifier {
    load_package: Arc<LifecycleChain>,
    init_package_resources: Arc<LifecycleChain>,
    config: BridgeConfig,
    log: Arc<dyn BridgeLog>,
}

impl LifecycleNotifier {
    /// Creates a notifier with empty chains.
    #[must_use]
    pub fn new(config: BridgeConfig, log: Arc<dyn BridgeLog>) -> Self {
        LifecycleNotifier {
            load_package: Arc::new(CallbackChain::new(
                HookTarget::Lifecycle(LifecycleKind::LoadPackage).to_string(),
            )),
            init_package_resources: Arc::new(CallbackChain::new(
                HookTarget::Lifecycle(LifecycleKind::InitPackageResources).to_string(),
            )),
            config,
            log,
        }
    }

    /// The chain of `kind`.
    #[must_use]
    pub fn chain(&self, kind: LifecycleKind) -> &Arc<LifecycleChain> {
        match kind {
            LifecycleKind::LoadPackage => &self.load_package,
            LifecycleKind::InitPackageResources => &self.init_package_resources,
        }
    }

    /// Registers `handler` for events of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandler`] if it is already registered there.
    pub fn hook(&self, kind: LifecycleKind, handler: &LifecycleHandler) -> Result<LifecycleUnhook> {
        let chain = self.chain(kind);
        chain.add(handler.clone())?;
        tracing::debug!(
            target: "hookbridge",
            event = %kind,
            sequence = handler.sequence(),
            "registered lifecycle handler"
        );
        let detach: Arc<dyn Detach> = Arc::<LifecycleChain>::clone(chain);
        Ok(Unhook::new(HookTarget::Lifecycle(kind), handler.clone(), detach))
    }

    /// Removes `handler` from the chain of `kind`. Returns `false` if absent.
    pub fn unhook(&self, kind: LifecycleKind, handler: &LifecycleHandler) -> bool {
        self.chain(kind).remove(handler.sequence())
    }

    /// Number of handlers registered for `kind`.
    #[must_use]
    pub fn handler_count(&self, kind: LifecycleKind) -> usize {
        self.chain(kind).len()
    }

    /// Delivers `event` to every handler of its kind.
    ///
    /// Returns the param after the last handler ran, carrying the (possibly
    /// modified) event, the extras and the number of failed handlers.
    pub fn fire_all(&self, event: LifecycleEvent) -> LifecycleParam {
        let kind = event.kind();
        let chain = self.chain(kind);
        let snapshot = chain.snapshot();
        let mut param = LifecycleParam::new(event, Arc::clone(&snapshot));

        for handler in snapshot.iter() {
            let hook = handler.callback();
            let outcome = guarded(self.config.catch_panics, || hook.handle_event(&mut param));
            if let Some(failure) = outcome.into_failure(chain.target(), handler.sequence(), Phase::Event) {
                param.record_failure();
                self.log.log_error(&Error::HandlerFailure(failure));
            }
        }

        param
    }
}

impl fmt::Debug for LifecycleNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleNotifier")
            .field("load_package", &self.load_package)
            .field("init_package_resources", &self.init_package_resources)
            .finish()
    }
}
