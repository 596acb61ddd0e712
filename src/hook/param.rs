//! Per-dispatch context handed to handlers.
//!
//! A [`MethodHookParam`] is created once per dispatch and owned by that
//! dispatch's call stack. It carries the chain snapshot, the call's receiver and
//! arguments, the result/exception slots and an [`Extras`] side channel through
//! which handlers cooperating within one dispatch can pass values to each other
//! and to later stages.

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use crate::{
    hook::handler::MethodEntry,
    method::{Exception, InvocationResult, MethodId, Value},
};

/// String-keyed side-data store scoped to a single dispatch or event.
///
/// Values are stored by ownership and handed out by reference; their lifetime
/// ends with the param that owns the store. The map is only allocated once
/// something is stored.
///
/// # Examples
///
/// ```rust
/// use hookbridge::Extras;
///
/// let mut extras = Extras::default();
/// extras.set("started_at", 1234u64);
/// assert_eq!(extras.get::<u64>("started_at"), Some(&1234));
/// assert_eq!(extras.get::<String>("started_at"), None);
/// assert_eq!(extras.remove::<u64>("started_at"), Some(1234));
/// assert!(extras.is_empty());
/// ```
#[derive(Default)]
pub struct Extras {
    map: Option<HashMap<String, Box<dyn Any + Send>>>,
}

impl Extras {
    /// Stores a value under `key`, replacing any previous value.
    pub fn set<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.map
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), Box::new(value));
    }

    /// Returns the value under `key` if present and of type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.map.as_ref()?.get(key)?.downcast_ref::<T>()
    }

    /// Returns the value under `key` mutably if present and of type `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.map.as_mut()?.get_mut(key)?.downcast_mut::<T>()
    }

    /// Removes and returns the value under `key` if present and of type `T`.
    ///
    /// A value of another type stays in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        let map = self.map.as_mut()?;
        if !map.get(key)?.is::<T>() {
            return None;
        }
        map.remove(key)?.downcast::<T>().ok().map(|b| *b)
    }

    /// Returns true if a value of any type is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.map.as_ref().is_some_and(|m| m.contains_key(key))
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.as_ref().map_or(0, HashMap::len)
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Extras {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.map.iter().flat_map(|m| m.keys()).collect();
        keys.sort();
        f.debug_struct("Extras").field("keys", &keys).finish()
    }
}

/// Saved result/exception slots, used to undo what a failing phase did.
#[derive(Clone)]
pub(crate) struct SavedOutcome {
    result: Value,
    throwable: Option<Exception>,
    resolved: bool,
}

/// Context for one dispatch of a hooked method.
///
/// Handlers read and modify the call through this object:
///
/// - [`this_object`](Self::this_object) and [`args`](Self::args) may be changed
///   by before-phases; the original implementation is invoked with whatever
///   they hold when it is reached.
/// - [`set_result`](Self::set_result) / [`set_throwable`](Self::set_throwable)
///   decide the outcome. Called from a before-phase they resolve the call early:
///   no lower priority handler runs and the original is skipped. Called from an
///   after-phase they replace the outcome seen by higher priority handlers and,
///   finally, by the caller.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{ClosureHook, Value};
///
/// // Doubles every integer result of the hooked method.
/// let hook = ClosureHook::new().after(|param| {
///     if let Some(v) = param.result().as_i32() {
///         param.set_result(Value::from(v * 2));
///     }
///     Ok(())
/// });
/// # let _ = hook;
/// ```
pub struct MethodHookParam {
    method: MethodId,
    /// The receiver, `None` for static methods.
    pub this_object: Option<Value>,
    /// The call arguments.
    pub args: Vec<Value>,
    result: Value,
    throwable: Option<Exception>,
    resolved: bool,
    extras: Extras,
    callbacks: Arc<[MethodEntry]>,
}

impl MethodHookParam {
    pub(crate) fn new(
        method: MethodId,
        this_object: Option<Value>,
        args: Vec<Value>,
        callbacks: Arc<[MethodEntry]>,
    ) -> Self {
        MethodHookParam {
            method,
            this_object,
            args,
            result: Value::Void,
            throwable: None,
            resolved: false,
            extras: Extras::default(),
            callbacks,
        }
    }

    /// The method being called.
    #[must_use]
    pub fn method(&self) -> &MethodId {
        &self.method
    }

    /// The chain snapshot this dispatch runs, in execution order.
    ///
    /// The last element is always the original invocation.
    #[must_use]
    pub fn callbacks(&self) -> &[MethodEntry] {
        &self.callbacks
    }

    /// The current result. [`Value::Void`] until something sets it.
    #[must_use]
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Sets the result and clears any exception.
    ///
    /// From a before-phase this resolves the call early.
    pub fn set_result(&mut self, result: Value) {
        self.result = result;
        self.throwable = None;
        self.resolved = true;
    }

    /// The current exception, if any.
    #[must_use]
    pub fn throwable(&self) -> Option<&Exception> {
        self.throwable.as_ref()
    }

    /// Returns true if the exception slot is set.
    #[must_use]
    pub fn has_throwable(&self) -> bool {
        self.throwable.is_some()
    }

    /// Sets the exception and resets the result to [`Value::Void`].
    ///
    /// From a before-phase this resolves the call early.
    pub fn set_throwable(&mut self, throwable: Exception) {
        self.result = Value::Void;
        self.throwable = Some(throwable);
        self.resolved = true;
    }

    /// The exception if one is set, the result otherwise.
    pub fn result_or_throwable(&self) -> std::result::Result<&Value, &Exception> {
        match &self.throwable {
            Some(throwable) => Err(throwable),
            None => Ok(&self.result),
        }
    }

    /// Returns true once the result or exception has been set.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Side data shared by the handlers of this dispatch.
    #[must_use]
    pub fn extras(&self) -> &Extras {
        &self.extras
    }

    /// Side data shared by the handlers of this dispatch, mutably.
    pub fn extras_mut(&mut self) -> &mut Extras {
        &mut self.extras
    }

    pub(crate) fn store(&mut self, outcome: InvocationResult) {
        match outcome {
            Ok(value) => self.set_result(value),
            Err(exception) => self.set_throwable(exception),
        }
    }

    pub(crate) fn save_outcome(&self) -> SavedOutcome {
        SavedOutcome {
            result: self.result.clone(),
            throwable: self.throwable.clone(),
            resolved: self.resolved,
        }
    }

    pub(crate) fn restore_outcome(&mut self, saved: SavedOutcome) {
        self.result = saved.result;
        self.throwable = saved.throwable;
        self.resolved = saved.resolved;
    }

    pub(crate) fn into_outcome(self) -> InvocationResult {
        match self.throwable {
            Some(throwable) => Err(throwable),
            None => Ok(self.result),
        }
    }
}

impl fmt::Debug for MethodHookParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHookParam")
            .field("method", &self.method)
            .field("this_object", &self.this_object)
            .field("args", &self.args)
            .field("result", &self.result)
            .field("throwable", &self.throwable)
            .field("resolved", &self.resolved)
            .field("callback_count", &self.callbacks.len())
            .finish()
    }
}
