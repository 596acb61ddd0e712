//! Module registration entry points.
//!
//! A module loader (outside this crate) discovers modules and hands them to
//! [`HookBridge::load_modules`](crate::HookBridge::load_modules), which calls
//! each module's [`HookModule::init`] in order. A failing module is logged and
//! skipped; the others still load.

use std::fmt;

use crate::{bridge::HookBridge, hook::HandlerResult};

/// A third-party module registering hooks.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{
///     FnInterceptor, Handler, HandlerResult, HookBridge, HookModule, LifecycleEvent, Priority, Value,
/// };
///
/// struct PackageLogger;
///
/// impl HookModule for PackageLogger {
///     fn name(&self) -> &str {
///         "package-logger"
///     }
///
///     fn init(&self, bridge: &HookBridge) -> HandlerResult {
///         bridge.hook_load_package(&Handler::on_event(Priority::DEFAULT, |param| {
///             if let LifecycleEvent::LoadPackage(p) = param.event() {
///                 println!("loaded {}", p.package_name);
///             }
///             Ok(())
///         }))?;
///         Ok(())
///     }
/// }
///
/// let bridge = HookBridge::new(FnInterceptor::new(|_, _, _| Ok(Value::Void)));
/// let report = bridge.load_modules([PackageLogger]);
/// assert!(report.is_success());
/// assert_eq!(report.loaded(), ["package-logger"]);
/// ```
pub trait HookModule {
    /// Name used in logs and load reports.
    fn name(&self) -> &str;

    /// Registers the module's hooks.
    ///
    /// # Errors
    ///
    /// Any error marks the module as failed. Registrations made before the
    /// error stay in place.
    fn init(&self, bridge: &HookBridge) -> HandlerResult;
}

impl<M: HookModule + ?Sized> HookModule for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn init(&self, bridge: &HookBridge) -> HandlerResult {
        (**self).init(bridge)
    }
}

impl<M: HookModule + ?Sized> HookModule for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn init(&self, bridge: &HookBridge) -> HandlerResult {
        (**self).init(bridge)
    }
}

/// Outcome of [`HookBridge::load_modules`](crate::HookBridge::load_modules).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ModuleLoadReport {
    loaded: Vec<String>,
    failed: Vec<(String, String)>,
}

impl ModuleLoadReport {
    pub(crate) fn record_loaded(&mut self, name: &str) {
        self.loaded.push(name.to_string());
    }

    pub(crate) fn record_failed(&mut self, name: &str, message: String) {
        self.failed.push((name.to_string(), message));
    }

    /// Names of the modules that initialized successfully, in load order.
    #[must_use]
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    /// Names and failure messages of the modules that failed, in load order.
    #[must_use]
    pub fn failed(&self) -> &[(String, String)] {
        &self.failed
    }

    /// Returns true if no module failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Debug for ModuleLoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoadReport")
            .field("loaded", &self.loaded)
            .field("failed", &self.failed)
            .finish()
    }
}
