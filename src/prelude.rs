//! # hookbridge Prelude
//!
//! The types needed to register hooks, dispatch intercepted calls and deliver
//! lifecycle events. Import with `use hookbridge::prelude::*;`.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all hookbridge operations
pub use crate::Error;

/// The result type used throughout hookbridge
pub use crate::Result;

/// Bridge configuration
pub use crate::{BridgeConfig, FailurePolicy};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The service object and its native collaborator
pub use crate::{FnInterceptor, HookBridge, Interceptor};

/// Module registration surface
pub use crate::{HookModule, ModuleLoadReport};

// ================================================================================================
// Methods and Values
// ================================================================================================

/// Method identities
pub use crate::method::{MethodFlags, MethodId, MethodKind};

/// Call values and outcomes
pub use crate::method::{Exception, InvocationResult, ObjectRef, Value};

// ================================================================================================
// Handlers
// ================================================================================================

/// Method hooks
pub use crate::hook::{
    ClosureHook, Handler, HandlerResult, MethodHandler, MethodHook, MethodHookParam,
    MethodReplacement, MethodUnhook, Priority,
};

/// Lifecycle events
pub use crate::lifecycle::{
    InitPackageResourcesParam, LifecycleEvent, LifecycleHandler, LifecycleHook, LifecycleKind,
    LifecycleParam, LoadPackageParam,
};

// ================================================================================================
// Logging
// ================================================================================================

/// Logging collaborator
pub use crate::{BridgeLog, TracingLog};
