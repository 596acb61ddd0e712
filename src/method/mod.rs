//! Method identities and the values that flow through intercepted calls.
//!
//! The engine treats the target runtime as opaque: a method is a comparable
//! [`MethodId`] token rather than a live reflective handle, and receivers,
//! arguments and results are [`Value`]s. Whatever reflection or object model the
//! host uses stays behind the [`Interceptor`](crate::Interceptor) boundary.

mod identity;
mod value;

pub use identity::{MethodFlags, MethodId, MethodKind, CONSTRUCTOR_NAME};
pub use value::{Exception, InvocationResult, ObjectRef, Value};
