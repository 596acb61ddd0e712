// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # hookbridge
//!
//! [![Crates.io](https://img.shields.io/crates/v/hookbridge.svg)](https://crates.io/crates/hookbridge)
//! [![Documentation](https://docs.rs/hookbridge/badge.svg)](https://docs.rs/hookbridge)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://www.apache.org/licenses/LICENSE-2.0)
//!
//! The registry and dispatch core of a runtime method-interception framework. Modules
//! register handlers on methods and constructors of a managed runtime; every call to a
//! hooked method is routed through a priority-ordered handler chain that can observe,
//! modify or replace the call, and that always ends in the original implementation.
//!
//! ## Features
//!
//! - **Priority-ordered chains** - Descending priority, ties broken by registration order
//! - **Runtime switch** - Hooks can be turned off and on again while calls are in flight
//! - **Onion semantics** - Before-phases outside-in, after-phases inside-out, early return and early throw
//! - **Copy-on-write snapshots** - Registration never blocks or disturbs an in-flight dispatch
//! - **Failure isolation** - A failing or panicking handler is logged, the chain continues
//! - **Lifecycle events** - Package load and resource initialization notifications
//! - **Module loading surface** - Per-module initialization with isolated failures
//!
//! ## Architecture
//!
//! - [`method`] - Method identities, values and exceptions
//! - [`hook`] - Handlers, chains, the registry and the dispatch engine
//! - [`lifecycle`] - Lifecycle events and their notifier
//! - [`HookBridge`] - The service object tying everything together
//!
//! The native side of interception (patching entry points, calling the unpatched
//! implementation) is supplied by the embedding runtime through the [`Interceptor`] trait.
//!
//! ## Quick Start
//!
//! ```rust
//! use hookbridge::prelude::*;
//!
//! // The embedding runtime supplies the native side
//! let bridge = HookBridge::new(FnInterceptor::new(|_method, _this, args| {
//!     Ok(Value::from(args[0].as_i32().unwrap_or_default() + 1))
//! }));
//!
//! let method = MethodId::static_method("com.example.Math", "inc", "(I)I");
//! let unhook = bridge.hook_method(
//!     &method,
//!     &Handler::method(
//!         Priority::DEFAULT,
//!         ClosureHook::new()
//!             .before(|param| {
//!                 param.args[0] = Value::from(10);
//!                 Ok(())
//!             })
//!             .after(|param| {
//!                 let v = param.result().as_i32().unwrap_or_default();
//!                 param.set_result(Value::from(v * 2));
//!                 Ok(())
//!             }),
//!     ),
//! )?;
//!
//! // Called by the native interception layer for every call of `inc`
//! assert_eq!(bridge.dispatch(&method, None, vec![Value::from(1)])?, Ok(Value::from(22)));
//!
//! unhook.unhook();
//! assert_eq!(bridge.dispatch(&method, None, vec![Value::from(1)])?, Ok(Value::from(2)));
//! # Ok::<(), hookbridge::Error>(())
//! ```
//!
//! ## Logging
//!
//! Isolated failures and module loading are reported through the [`BridgeLog`]
//! collaborator; the default [`TracingLog`] emits `tracing` events under the
//! `hookbridge` target. Registration and installation are traced at `DEBUG`.
//!
//! ### Testing
//!
//! ```bash
//! cargo test
//! cargo bench --bench dispatch
//! ```
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use hookbridge::prelude::*;
///
/// let bridge = HookBridge::new(FnInterceptor::new(|_, _, _| Ok(Value::Void)));
/// let method = MethodId::method("a.B", "c", "()V");
/// bridge.hook_method(&method, &Handler::do_nothing())?;
/// # Ok::<(), hookbridge::Error>(())
/// ```
pub mod prelude;

/// Method identities, values and exceptions
///
/// # Key Types
///
/// - [`method::MethodId`] - Stable key of one method or constructor
/// - [`method::Value`] - Receivers, arguments and results
/// - [`method::Exception`] - Exceptions thrown by or on behalf of hooked methods
pub mod method;

/// Method hooks: handlers, chains, registry and dispatch
///
/// # Key Types
///
/// - [`hook::Handler`] - A callback with priority and identity
/// - [`hook::CallbackChain`] - Copy-on-write, priority-ordered handler set
/// - [`hook::HookRegistry`] - Per-method chains and native installation
/// - [`hook::DispatchEngine`] - Runs a chain for one intercepted call
pub mod hook;

/// Lifecycle events and their notifier
pub mod lifecycle;

mod bridge;
mod config;
mod log;
mod module;

/// `hookbridge` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible
/// operations.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{MethodId, Result};
///
/// fn target() -> Result<MethodId> {
///     Ok(MethodId::method("a.B", "c", "()V"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `hookbridge` Error type
///
/// The main error type for all operations in this crate, and the record of an
/// isolated handler failure.
pub use error::{Error, HandlerFailure};

/// The service object and its configuration
pub use bridge::HookBridge;
pub use config::{BridgeConfig, FailurePolicy};
pub use log::{BridgeLog, TracingLog};
pub use module::{HookModule, ModuleLoadReport};

pub use hook::{
    chain_order, CallbackChain, ClosureHook, DispatchEngine, Extras, FnInterceptor, HandlerError,
    HandlerResult, Handler, HookRegistry, HookTarget, Interceptor, LifecycleUnhook, MethodChain,
    MethodEntry, MethodHandler, MethodHook, MethodHookParam, MethodReplacement, MethodUnhook,
    Phase, PhaseFn, Prioritized, Priority, Replacement, Unhook,
};
pub use lifecycle::{
    InitPackageResourcesParam, LifecycleChain, LifecycleEvent, LifecycleHandler, LifecycleHook,
    LifecycleKind, LifecycleNotifier, LifecycleParam, LoadPackageParam,
};
pub use method::{
    Exception, InvocationResult, MethodFlags, MethodId, MethodKind, ObjectRef, Value,
    CONSTRUCTOR_NAME,
};
