//! Method hooks: handlers, chains, the registry and the dispatch engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          HookRegistry                            │
//! │  MethodId ──► MethodChain [H(100), H(50), H(50), Original]       │
//! │  MethodId ──► MethodChain [Original]                             │
//! └──────────────────────────────────────────────────────────────────┘
//!         ▲ register / unregister            │ snapshot()
//!         │                                  ▼
//!   Handler::method(..)              DispatchEngine::dispatch
//!                                            │
//!                                            ▼
//!                                     MethodHookParam
//!                                 (args, result, throwable,
//!                                   extras, chain snapshot)
//! ```
//!
//! - [`Handler`] couples a callback ([`MethodHook`], or
//!   [`LifecycleHook`](crate::LifecycleHook) for lifecycle events) with a
//!   [`Priority`] and a unique registration sequence number.
//! - [`CallbackChain`] keeps handlers ordered and hands out immutable snapshots.
//! - [`HookRegistry`] owns one chain per hooked method, each ending in the
//!   [`MethodEntry::Original`] sentinel, and installs native interception
//!   through the [`Interceptor`] on first registration.
//! - [`DispatchEngine`] runs a snapshot for one call with before/after
//!   semantics and failure isolation.
//!
//! # Example
//!
//! ```rust
//! use hookbridge::{ClosureHook, FnInterceptor, Handler, HookBridge, MethodId, Priority, Value};
//!
//! let bridge = HookBridge::new(FnInterceptor::new(|_, _, args| {
//!     Ok(Value::from(args.len() as i32))
//! }));
//! let method = MethodId::method("com.example.Counter", "count", "([Ljava/lang/Object;)I");
//!
//! bridge.hook_method(
//!     &method,
//!     &Handler::method(
//!         Priority::DEFAULT,
//!         ClosureHook::new().after(|param| {
//!             let count = param.result().as_i32().unwrap_or_default();
//!             param.set_result(Value::from(count + 100));
//!             Ok(())
//!         }),
//!     ),
//! )?;
//!
//! let outcome = bridge.dispatch(&method, None, vec![Value::Null, Value::Null])?;
//! assert_eq!(outcome, Ok(Value::from(102)));
//! # Ok::<(), hookbridge::Error>(())
//! ```

mod chain;
pub(crate) mod dispatch;
mod handler;
mod param;
mod registry;
mod types;
pub(crate) mod unhook;

pub use chain::CallbackChain;
pub use dispatch::DispatchEngine;
pub use handler::{
    ClosureHook, Handler, MethodEntry, MethodHandler, MethodHook, MethodReplacement, PhaseFn,
    Replacement,
};
pub use param::{Extras, MethodHookParam};
pub use registry::{FnInterceptor, HookRegistry, Interceptor, MethodChain};
pub use types::{chain_order, HandlerError, HandlerResult, Phase, Prioritized, Priority};
pub use unhook::{HookTarget, LifecycleUnhook, MethodUnhook, Unhook};
