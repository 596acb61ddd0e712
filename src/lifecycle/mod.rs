//! Lifecycle notifications.
//!
//! Modules learn about the host application through two events:
//!
//! - [`LifecycleKind::LoadPackage`] - an application package was loaded; the
//!   usual place to register method hooks for that package
//! - [`LifecycleKind::InitPackageResources`] - the package's resources are ready
//!
//! Each kind has one [`CallbackChain`](crate::CallbackChain) of
//! [`LifecycleHandler`]s. [`LifecycleNotifier::fire_all`] runs every handler of
//! the event's kind in priority order; a failing handler is logged and the
//! remaining ones still run.
//!
//! # Example
//!
//! ```rust
//! use hookbridge::{
//!     BridgeConfig, Handler, LifecycleKind, LifecycleNotifier, LoadPackageParam, Priority, TracingLog,
//! };
//! use std::sync::Arc;
//!
//! let notifier = LifecycleNotifier::new(BridgeConfig::default(), Arc::new(TracingLog));
//! notifier.hook(
//!     LifecycleKind::LoadPackage,
//!     &Handler::on_event(Priority::DEFAULT, |param| {
//!         let package = param.event().package_name().to_string();
//!         param.extras_mut().set("package", package);
//!         Ok(())
//!     }),
//! )?;
//!
//! let param = notifier.fire_all(LoadPackageParam::new("com.example.app").into());
//! assert_eq!(param.extras().get::<String>("package").map(String::as_str), Some("com.example.app"));
//! # Ok::<(), hookbridge::Error>(())
//! ```

mod event;
mod notifier;

pub use event::{
    InitPackageResourcesParam, LifecycleEvent, LifecycleKind, LifecycleParam, LoadPackageParam,
};
pub use notifier::{LifecycleChain, LifecycleHandler, LifecycleHook, LifecycleNotifier};
