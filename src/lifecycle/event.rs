//! Lifecycle event payloads and the per-event param.

use std::{fmt, sync::Arc};

use strum::{Display, EnumIter};

use crate::{
    hook::{Extras, Handler},
    lifecycle::notifier::LifecycleHook,
    method::Value,
};

/// The lifecycle events handlers can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleKind {
    /// An application package was loaded into the process.
    LoadPackage,
    /// The resources of an application package were initialized.
    InitPackageResources,
}

/// Payload of [`LifecycleKind::LoadPackage`].
#[derive(Clone, Debug, PartialEq)]
pub struct LoadPackageParam {
    /// Name of the loaded package.
    pub package_name: String,
    /// Name of the process the package was loaded into.
    pub process_name: String,
    /// Host handle of the package's class loader.
    pub class_loader: Value,
    /// Host handle of the package's application info.
    pub app_info: Value,
    /// Whether this is the first application loaded into the process.
    pub is_first_application: bool,
}

impl LoadPackageParam {
    /// Creates a payload for `package_name` running in a process of the same
    /// name, with null handles.
    #[must_use]
    pub fn new(package_name: impl Into<String>) -> Self {
        let package_name = package_name.into();
        LoadPackageParam {
            process_name: package_name.clone(),
            package_name,
            class_loader: Value::Null,
            app_info: Value::Null,
            is_first_application: true,
        }
    }
}

/// Payload of [`LifecycleKind::InitPackageResources`].
#[derive(Clone, Debug, PartialEq)]
pub struct InitPackageResourcesParam {
    /// Name of the package whose resources were initialized.
    pub package_name: String,
    /// Host handle of the resources object.
    pub resources: Value,
}

impl InitPackageResourcesParam {
    /// Creates a payload for `package_name` with a null resources handle.
    #[must_use]
    pub fn new(package_name: impl Into<String>) -> Self {
        InitPackageResourcesParam {
            package_name: package_name.into(),
            resources: Value::Null,
        }
    }
}

/// A lifecycle event with its payload.
#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleEvent {
    /// See [`LifecycleKind::LoadPackage`].
    LoadPackage(LoadPackageParam),
    /// See [`LifecycleKind::InitPackageResources`].
    InitPackageResources(InitPackageResourcesParam),
}

impl LifecycleEvent {
    /// The kind of the event.
    #[must_use]
    pub fn kind(&self) -> LifecycleKind {
        match self {
            LifecycleEvent::LoadPackage(_) => LifecycleKind::LoadPackage,
            LifecycleEvent::InitPackageResources(_) => LifecycleKind::InitPackageResources,
        }
    }

    /// Name of the package the event is about.
    #[must_use]
    pub fn package_name(&self) -> &str {
        match self {
            LifecycleEvent::LoadPackage(p) => &p.package_name,
            LifecycleEvent::InitPackageResources(p) => &p.package_name,
        }
    }
}

impl From<LoadPackageParam> for LifecycleEvent {
    fn from(param: LoadPackageParam) -> Self {
        LifecycleEvent::LoadPackage(param)
    }
}

impl From<InitPackageResourcesParam> for LifecycleEvent {
    fn from(param: InitPackageResourcesParam) -> Self {
        LifecycleEvent::InitPackageResources(param)
    }
}

/// Context for one lifecycle notification.
///
/// Every handler of the event sees the same param in priority order, so values
/// left in [`extras`](Self::extras) by one handler are visible to the next.
pub struct LifecycleParam {
    event: LifecycleEvent,
    extras: Extras,
    callbacks: Arc<[Handler<dyn LifecycleHook>]>,
    failures: usize,
}

impl LifecycleParam {
    pub(crate) fn new(event: LifecycleEvent, callbacks: Arc<[Handler<dyn LifecycleHook>]>) -> Self {
        LifecycleParam {
            event,
            extras: Extras::default(),
            callbacks,
            failures: 0,
        }
    }

    /// The event being delivered.
    #[must_use]
    pub fn event(&self) -> &LifecycleEvent {
        &self.event
    }

    /// The event being delivered, mutably. Later handlers see the changes.
    pub fn event_mut(&mut self) -> &mut LifecycleEvent {
        &mut self.event
    }

    /// The kind of the event.
    #[must_use]
    pub fn kind(&self) -> LifecycleKind {
        self.event.kind()
    }

    /// The handlers this notification runs, in order.
    #[must_use]
    pub fn callbacks(&self) -> &[Handler<dyn LifecycleHook>] {
        &self.callbacks
    }

    /// Side data shared by the handlers of this notification.
    #[must_use]
    pub fn extras(&self) -> &Extras {
        &self.extras
    }

    /// Side data shared by the handlers of this notification, mutably.
    pub fn extras_mut(&mut self) -> &mut Extras {
        &mut self.extras
    }

    /// Number of handlers that failed during this notification.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Consumes the param, returning the (possibly modified) event.
    #[must_use]
    pub fn into_event(self) -> LifecycleEvent {
        self.event
    }

    pub(crate) fn record_failure(&mut self) {
        self.failures += 1;
    }
}

impl fmt::Debug for LifecycleParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleParam")
            .field("event", &self.event)
            .field("extras", &self.extras)
            .field("callback_count", &self.callbacks.len())
            .field("failures", &self.failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind() {
        let load = LifecycleEvent::from(LoadPackageParam::new("com.example.app"));
        assert_eq!(load.kind(), LifecycleKind::LoadPackage);
        assert_eq!(load.package_name(), "com.example.app");

        let res = LifecycleEvent::from(InitPackageResourcesParam::new("android"));
        assert_eq!(res.kind(), LifecycleKind::InitPackageResources);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(LifecycleKind::LoadPackage.to_string(), "load_package");
        assert_eq!(
            LifecycleKind::InitPackageResources.to_string(),
            "init_package_resources"
        );
    }

    #[test]
    fn test_load_package_defaults() {
        let p = LoadPackageParam::new("com.example.app");
        assert_eq!(p.process_name, "com.example.app");
        assert!(p.class_loader.is_null());
        assert!(p.is_first_application);
    }
}
