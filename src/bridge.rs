//! The [`HookBridge`] service object.
//!
//! One bridge is constructed per process by the embedding runtime and shared
//! (through [`Arc`]) with the native interception layer, which routes every
//! intercepted call into [`HookBridge::dispatch`], and with the module loader,
//! which hands modules to [`HookBridge::load_modules`].
//!
//! ```text
//! native call site ──► Interceptor ──► HookBridge::dispatch ──► DispatchEngine
//!                                                                   │
//! module loader ──► HookBridge::load_modules ──► HookModule::init   │
//!                                                   │               ▼
//!                                    hook_method / hook_load_package ──► HookRegistry
//!                                                                   └──► LifecycleNotifier
//! ```

use std::{fmt, sync::Arc};

use crate::{
    config::BridgeConfig,
    hook::{
        dispatch::guarded, unhook::Detach, DispatchEngine, HookRegistry, HookTarget, Interceptor,
        LifecycleUnhook, MethodHandler, MethodUnhook, Unhook,
    },
    lifecycle::{LifecycleEvent, LifecycleHandler, LifecycleKind, LifecycleNotifier, LifecycleParam},
    log::{BridgeLog, TracingLog},
    method::{InvocationResult, MethodId, Value},
    module::{HookModule, ModuleLoadReport},
    Error, Result,
};

/// Entry point of the hook framework.
///
/// Owns the [`HookRegistry`], the [`DispatchEngine`] and the
/// [`LifecycleNotifier`]. All operations take `&self` and are safe to call
/// from any thread, including from inside handlers.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{FnInterceptor, Handler, HookBridge, MethodId, Priority, Value};
///
/// let bridge = HookBridge::new(FnInterceptor::new(|_, _, _| Ok(Value::from(false))));
/// let method = MethodId::method("android.os.Debug", "isDebuggerConnected", "()Z");
///
/// bridge.hook_method(&method, &Handler::returns_constant(Priority::DEFAULT, Value::from(true)))?;
/// assert_eq!(bridge.dispatch(&method, None, Vec::new())?, Ok(Value::from(true)));
/// assert_eq!(bridge.invoke_original(&method, None, &[]), Ok(Value::from(false)));
/// # Ok::<(), hookbridge::Error>(())
/// ```
pub struct HookBridge {
    registry: Arc<HookRegistry>,
    engine: DispatchEngine,
    notifier: LifecycleNotifier,
    config: BridgeConfig,
    log: Arc<dyn BridgeLog>,
}

impl HookBridge {
    /// Creates a bridge with the default configuration, logging through
    /// [`TracingLog`].
    #[must_use]
    pub fn new(interceptor: impl Interceptor + 'static) -> Self {
        Self::with_config(interceptor, BridgeConfig::default())
    }

    /// Creates a bridge with `config`, logging through [`TracingLog`].
    #[must_use]
    pub fn with_config(interceptor: impl Interceptor + 'static, config: BridgeConfig) -> Self {
        Self::with_parts(Arc::new(interceptor), config, Arc::new(TracingLog))
    }

    /// Creates a bridge from all of its collaborators.
    #[must_use]
    pub fn with_parts(
        interceptor: Arc<dyn Interceptor>,
        config: BridgeConfig,
        log: Arc<dyn BridgeLog>,
    ) -> Self {
        let registry = Arc::new(HookRegistry::new(interceptor));
        HookBridge {
            engine: DispatchEngine::new(Arc::clone(&registry), config.clone(), Arc::clone(&log)),
            notifier: LifecycleNotifier::new(config.clone(), Arc::clone(&log)),
            registry,
            config,
            log,
        }
    }

    /// The configuration the bridge was created with.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns true if dispatches currently run handler chains.
    #[must_use]
    pub fn hooks_enabled(&self) -> bool {
        self.engine.hooks_enabled()
    }

    /// Switches handler chains on or off at runtime.
    ///
    /// While disabled every dispatch invokes the original implementation
    /// directly. Handlers stay registered and run again once re-enabled.
    pub fn set_hooks_enabled(&self, enabled: bool) {
        self.engine.set_hooks_enabled(enabled);
        tracing::info!(target: "hookbridge", enabled, "hooks switched");
    }

    /// The method hook registry.
    #[must_use]
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// The lifecycle notifier.
    #[must_use]
    pub fn notifier(&self) -> &LifecycleNotifier {
        &self.notifier
    }

    /// The logging collaborator.
    #[must_use]
    pub fn log(&self) -> &dyn BridgeLog {
        &*self.log
    }

    /// Hooks `method` with `handler`.
    ///
    /// The first hook on a method installs native interception.
    ///
    /// # Errors
    ///
    /// See [`HookRegistry::register_hook`].
    pub fn hook_method(&self, method: &MethodId, handler: &MethodHandler) -> Result<MethodUnhook> {
        self.registry.register_hook(method, handler)?;
        tracing::debug!(
            target: "hookbridge",
            method = %method,
            sequence = handler.sequence(),
            priority = handler.priority().0,
            "hooked method"
        );

        let detach: Arc<dyn Detach> = self.registry.chain_for(method);
        Ok(Unhook::new(HookTarget::Method(method.clone()), handler.clone(), detach))
    }

    /// Removes `handler` from `method`. Returns `false` if it was not hooked
    /// there.
    pub fn unhook_method(&self, method: &MethodId, handler: &MethodHandler) -> bool {
        self.registry.unregister_hook(method, handler)
    }

    /// Hooks every non-constructor in `candidates` named `name`.
    ///
    /// Abstract methods and interface members among the candidates are skipped.
    ///
    /// # Errors
    ///
    /// On any other registration error, the hooks made by this call are removed
    /// again and the error is returned.
    pub fn hook_all_methods<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a MethodId>,
        name: &str,
        handler: &MethodHandler,
    ) -> Result<Vec<MethodUnhook>> {
        let targets = candidates
            .into_iter()
            .filter(|m| !m.is_constructor() && m.name() == name);
        self.hook_all(targets, handler)
    }

    /// Hooks every constructor in `candidates`.
    ///
    /// # Errors
    ///
    /// Same as [`hook_all_methods`](Self::hook_all_methods).
    pub fn hook_all_constructors<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a MethodId>,
        handler: &MethodHandler,
    ) -> Result<Vec<MethodUnhook>> {
        let targets = candidates.into_iter().filter(|m| m.is_constructor());
        self.hook_all(targets, handler)
    }

    fn hook_all<'a>(
        &self,
        targets: impl Iterator<Item = &'a MethodId>,
        handler: &MethodHandler,
    ) -> Result<Vec<MethodUnhook>> {
        let mut unhooks = Vec::new();
        for method in targets {
            match self.hook_method(method, handler) {
                Ok(unhook) => unhooks.push(unhook),
                Err(Error::InvalidTarget { .. }) => {
                    tracing::trace!(target: "hookbridge", method = %method, "skipped non-hookable candidate");
                }
                Err(error) => {
                    for unhook in &unhooks {
                        unhook.unhook();
                    }
                    return Err(error);
                }
            }
        }
        Ok(unhooks)
    }

    /// Registers `handler` for lifecycle events of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandler`] if it is already registered for
    /// `kind`.
    pub fn hook_lifecycle(&self, kind: LifecycleKind, handler: &LifecycleHandler) -> Result<LifecycleUnhook> {
        self.notifier.hook(kind, handler)
    }

    /// Registers `handler` for [`LifecycleKind::LoadPackage`].
    ///
    /// # Errors
    ///
    /// See [`hook_lifecycle`](Self::hook_lifecycle).
    pub fn hook_load_package(&self, handler: &LifecycleHandler) -> Result<LifecycleUnhook> {
        self.hook_lifecycle(LifecycleKind::LoadPackage, handler)
    }

    /// Registers `handler` for [`LifecycleKind::InitPackageResources`].
    ///
    /// # Errors
    ///
    /// See [`hook_lifecycle`](Self::hook_lifecycle).
    pub fn hook_init_package_resources(&self, handler: &LifecycleHandler) -> Result<LifecycleUnhook> {
        self.hook_lifecycle(LifecycleKind::InitPackageResources, handler)
    }

    /// Removes `handler` from the lifecycle chain of `kind`.
    pub fn unhook_lifecycle(&self, kind: LifecycleKind, handler: &LifecycleHandler) -> bool {
        self.notifier.unhook(kind, handler)
    }

    /// Runs the hook chain of `method` for one intercepted call.
    ///
    /// Called by the native interception layer. An `Err` inner outcome is the
    /// exception the native caller must throw.
    ///
    /// # Errors
    ///
    /// See [`DispatchEngine::dispatch`].
    pub fn dispatch(
        &self,
        method: &MethodId,
        this_object: Option<Value>,
        args: Vec<Value>,
    ) -> Result<InvocationResult> {
        self.engine.dispatch(method, this_object, args)
    }

    /// Calls the original implementation of `method`, bypassing every hook.
    ///
    /// Works for hooked and unhooked methods alike.
    pub fn invoke_original(
        &self,
        method: &MethodId,
        this_object: Option<&Value>,
        args: &[Value],
    ) -> InvocationResult {
        self.engine.invoke_original(method, this_object, args)
    }

    /// Delivers a lifecycle event to every handler of its kind.
    pub fn fire_lifecycle(&self, event: impl Into<LifecycleEvent>) -> LifecycleParam {
        self.notifier.fire_all(event.into())
    }

    /// Returns true if native interception is installed for `method`.
    #[must_use]
    pub fn is_hooked(&self, method: &MethodId) -> bool {
        self.registry.is_hooked(method)
    }

    /// Methods with native interception installed, in installation order.
    #[must_use]
    pub fn hooked_methods(&self) -> Vec<MethodId> {
        self.registry.hooked_methods()
    }

    /// Number of handlers on `method`.
    #[must_use]
    pub fn handler_count(&self, method: &MethodId) -> usize {
        self.registry.handler_count(method)
    }

    /// Number of handlers for lifecycle events of `kind`.
    #[must_use]
    pub fn lifecycle_handler_count(&self, kind: LifecycleKind) -> usize {
        self.notifier.handler_count(kind)
    }

    /// Initializes a single module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleInit`] if the module's `init` fails or, with
    /// panics caught, panics.
    pub fn load_module(&self, module: &dyn HookModule) -> Result<()> {
        let outcome = guarded(self.config.catch_panics, || module.init(self));
        match outcome.into_message() {
            None => Ok(()),
            Some(message) => Err(Error::ModuleInit {
                module: module.name().to_string(),
                message,
            }),
        }
    }

    /// Initializes `modules` in order.
    ///
    /// A failing module is logged and recorded in the report; loading continues
    /// with the next one.
    pub fn load_modules<M: HookModule>(&self, modules: impl IntoIterator<Item = M>) -> ModuleLoadReport {
        let mut report = ModuleLoadReport::default();

        for module in modules {
            match self.load_module(&module) {
                Ok(()) => {
                    self.log.log(&format!("Loaded module {}", module.name()));
                    report.record_loaded(module.name());
                }
                Err(error) => {
                    self.log.log_error(&error);
                    let message = match error {
                        Error::ModuleInit { message, .. } => message,
                        other => other.to_string(),
                    };
                    report.record_failed(module.name(), message);
                }
            }
        }

        tracing::debug!(
            target: "hookbridge",
            loaded = report.loaded().len(),
            failed = report.failed().len(),
            "module loading finished"
        );
        report
    }
}

impl fmt::Debug for HookBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBridge")
            .field("registry", &self.registry)
            .field("notifier", &self.notifier)
            .field("config", &self.config)
            .finish()
    }
}
