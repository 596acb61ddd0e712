//! Values flowing through a hooked call: receivers, arguments, results and
//! thrown exceptions.

use std::{any::Any, fmt, sync::Arc};

/// A shared handle to an opaque host object.
///
/// The engine never looks inside; handlers downcast to whatever type the
/// embedding runtime stores. Two handles are equal only when they point at the
/// same allocation.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Any + Send + Sync>);

impl ObjectRef {
    /// Wraps a host object.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(object: T) -> Self {
        ObjectRef(Arc::new(object))
    }

    /// Wraps an already shared host object.
    #[must_use]
    pub fn from_arc(object: Arc<dyn Any + Send + Sync>) -> Self {
        ObjectRef(object)
    }

    /// Returns the object as `T` if it has that type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns true if both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", Arc::as_ptr(&self.0))
    }
}

/// A dynamically typed value of the target runtime.
///
/// Used for receivers, arguments and results of intercepted calls. Cloning is
/// cheap; strings, byte arrays and objects are shared.
///
/// # Examples
///
/// ```rust
/// use hookbridge::Value;
///
/// let v = Value::from(21);
/// assert_eq!(v.as_i32(), Some(21));
/// assert!(Value::Void.is_void());
/// assert_eq!(Value::from("text").as_str(), Some("text"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value; the result of `void` methods and constructors.
    #[default]
    Void,
    /// The null reference.
    Null,
    /// Boolean.
    Bool(bool),
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// 64-bit floating point.
    F64(f64),
    /// Immutable string.
    Str(Arc<str>),
    /// Byte array.
    Bytes(Arc<[u8]>),
    /// Opaque host object.
    Object(ObjectRef),
}

impl Value {
    /// Wraps a host object.
    #[must_use]
    pub fn object<T: Any + Send + Sync>(object: T) -> Self {
        Value::Object(ObjectRef::new(object))
    }

    /// Returns true for [`Value::Void`].
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean payload.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the 32-bit integer payload.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the 64-bit integer payload, widening 32-bit integers.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the floating point payload.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(&**v),
            _ => None,
        }
    }

    /// Returns the byte array payload.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(&**v),
            _ => None,
        }
    }

    /// Returns the host object downcast to `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

/// An exception thrown by, or on behalf of, a hooked method.
///
/// Exceptions are values: the original implementation's exception is captured
/// into the dispatch's exception slot, handlers may observe, replace or clear
/// it, and whatever is left when the chain completes is handed back to the
/// native caller to be rethrown.
///
/// # Examples
///
/// ```rust
/// use hookbridge::Exception;
///
/// let cause = Exception::new("java.io.IOException").with_message("disk full");
/// let ex = Exception::new("java.lang.RuntimeException").with_cause(cause);
/// assert_eq!(ex.cause().map(|c| c.class_name()), Some("java.io.IOException"));
/// assert_eq!(ex.to_string(), "java.lang.RuntimeException");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Exception {
    class_name: Arc<str>,
    message: Option<String>,
    cause: Option<Box<Exception>>,
}

impl Exception {
    /// Creates an exception of the given class without message.
    #[must_use]
    pub fn new(class_name: impl Into<Arc<str>>) -> Self {
        Exception {
            class_name: class_name.into(),
            message: None,
            cause: None,
        }
    }

    /// Sets the detail message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the cause.
    #[must_use]
    pub fn with_cause(mut self, cause: Exception) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Fully qualified class name of the exception.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Detail message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The exception that caused this one, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&Exception> {
        self.cause.as_deref()
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.class_name, message),
            None => write!(f, "{}", self.class_name),
        }
    }
}

impl std::error::Error for Exception {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

/// Outcome of invoking a method: its result, or the exception it threw.
pub type InvocationResult = std::result::Result<Value, Exception>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(7).as_i64(), Some(7));
        assert_eq!(Value::from(7i64).as_i32(), None);
        assert_eq!(Value::from(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert_eq!(Value::default(), Value::Void);
    }

    #[test]
    fn test_object_identity() {
        let a = ObjectRef::new(5u32);
        let b = a.clone();
        let c = ObjectRef::new(5u32);

        assert_eq!(Value::from(a.clone()), Value::from(b));
        assert_ne!(Value::from(a.clone()), Value::from(c));
        assert_eq!(Value::from(a).downcast_ref::<u32>(), Some(&5));
    }

    #[test]
    fn test_exception_display_and_source() {
        use std::error::Error as _;

        let ex = Exception::new("java.lang.IllegalStateException")
            .with_message("not ready")
            .with_cause(Exception::new("java.lang.NullPointerException"));

        assert_eq!(ex.to_string(), "java.lang.IllegalStateException: not ready");
        assert_eq!(ex.message(), Some("not ready"));
        assert_eq!(
            ex.source().map(|s| s.to_string()),
            Some("java.lang.NullPointerException".to_string())
        );
    }
}
