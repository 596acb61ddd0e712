//! Handler definitions.
//!
//! A [`Handler`] couples a callback with its [`Priority`] and a unique
//! registration sequence number. The sequence number is the handler's identity:
//! clones of a handler are the same handler, two handlers built from the same
//! callback value are not.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use crate::{
    hook::{
        param::MethodHookParam,
        types::{next_sequence, HandlerResult, Prioritized, Priority, ORIGINAL_SEQUENCE},
    },
    method::{InvocationResult, Value},
};

/// Capability set of a method hook.
///
/// Both phases default to doing nothing, so implementors override only what
/// they need. A phase fails by returning `Err`; the failure is logged and the
/// chain continues as if the phase had returned normally (see
/// [`FailurePolicy`](crate::FailurePolicy) for what happens to anything the
/// phase already set).
///
/// # Examples
///
/// ```rust
/// use hookbridge::{HandlerResult, MethodHook, MethodHookParam, Value};
///
/// struct ForceDebuggable;
///
/// impl MethodHook for ForceDebuggable {
///     fn before_invocation(&self, param: &mut MethodHookParam) -> HandlerResult {
///         param.set_result(Value::from(true));
///         Ok(())
///     }
/// }
/// ```
pub trait MethodHook: Send + Sync {
    /// Runs before lower priority handlers and the original implementation.
    fn before_invocation(&self, _param: &mut MethodHookParam) -> HandlerResult {
        Ok(())
    }

    /// Runs after lower priority handlers and the original implementation.
    fn after_invocation(&self, _param: &mut MethodHookParam) -> HandlerResult {
        Ok(())
    }
}

/// A handler that replaces the hooked method entirely.
///
/// Its outcome becomes the outcome of the call: `Ok(value)` is stored as the
/// result, `Err(exception)` as the exception. Lower priority handlers and the
/// original implementation do not run.
pub trait MethodReplacement: Send + Sync {
    /// Computes the outcome of the call.
    fn replace_hooked_method(&self, param: &mut MethodHookParam) -> InvocationResult;
}

impl<F> MethodReplacement for F
where
    F: Fn(&mut MethodHookParam) -> InvocationResult + Send + Sync,
{
    fn replace_hooked_method(&self, param: &mut MethodHookParam) -> InvocationResult {
        self(param)
    }
}

/// Adapter running a [`MethodReplacement`] as the before-phase of a hook.
pub struct Replacement<R>(pub R);

impl<R: MethodReplacement> MethodHook for Replacement<R> {
    fn before_invocation(&self, param: &mut MethodHookParam) -> HandlerResult {
        let outcome = self.0.replace_hooked_method(param);
        param.store(outcome);
        Ok(())
    }
}

/// Type alias for closures used as hook phases.
///
/// Phase closures must be `Send + Sync`; they may run on any thread and on
/// several threads at once.
pub type PhaseFn = Arc<dyn Fn(&mut MethodHookParam) -> HandlerResult + Send + Sync>;

/// A method hook built from closures.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{ClosureHook, Handler, Priority};
///
/// let handler = Handler::method(
///     Priority::DEFAULT,
///     ClosureHook::new()
///         .before(|param| {
///             let count = param.args.len();
///             param.extras_mut().set("arg_count", count);
///             Ok(())
///         })
///         .after(|param| {
///             let count = param.extras().get::<usize>("arg_count").copied();
///             assert_eq!(count, Some(param.args.len()));
///             Ok(())
///         }),
/// );
/// # let _ = handler;
/// ```
#[derive(Clone, Default)]
pub struct ClosureHook {
    before: Option<PhaseFn>,
    after: Option<PhaseFn>,
}

impl ClosureHook {
    /// Creates a hook with empty phases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the before-phase.
    #[must_use]
    pub fn before<F>(mut self, phase: F) -> Self
    where
        F: Fn(&mut MethodHookParam) -> HandlerResult + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(phase));
        self
    }

    /// Sets the after-phase.
    #[must_use]
    pub fn after<F>(mut self, phase: F) -> Self
    where
        F: Fn(&mut MethodHookParam) -> HandlerResult + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(phase));
        self
    }

    /// Returns true if a before-phase is set.
    #[must_use]
    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    /// Returns true if an after-phase is set.
    #[must_use]
    pub fn has_after(&self) -> bool {
        self.after.is_some()
    }
}

impl MethodHook for ClosureHook {
    fn before_invocation(&self, param: &mut MethodHookParam) -> HandlerResult {
        match &self.before {
            Some(phase) => phase(param),
            None => Ok(()),
        }
    }

    fn after_invocation(&self, param: &mut MethodHookParam) -> HandlerResult {
        match &self.after {
            Some(phase) => phase(param),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ClosureHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureHook")
            .field("has_before", &self.before.is_some())
            .field("has_after", &self.after.is_some())
            .finish()
    }
}

/// A registered callback with priority and identity.
///
/// `T` is the callback capability: `dyn MethodHook` for method hooks
/// ([`MethodHandler`]), `dyn LifecycleHook` for lifecycle events
/// ([`LifecycleHandler`](crate::LifecycleHandler)).
pub struct Handler<T: ?Sized> {
    sequence: u64,
    priority: Priority,
    callback: Arc<T>,
}

/// A handler for method hooks.
pub type MethodHandler = Handler<dyn MethodHook>;

impl<T: ?Sized> Handler<T> {
    /// Creates a handler from a shared callback.
    ///
    /// Every call produces a new identity, even for the same callback.
    #[must_use]
    pub fn from_arc(priority: Priority, callback: Arc<T>) -> Self {
        Handler {
            sequence: next_sequence(),
            priority,
            callback,
        }
    }

    /// The handler's priority.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The handler's identity.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The callback.
    #[must_use]
    pub fn callback(&self) -> &T {
        &self.callback
    }
}

impl Handler<dyn MethodHook> {
    /// Creates a method hook handler.
    #[must_use]
    pub fn method<H: MethodHook + 'static>(priority: Priority, hook: H) -> Self {
        Self::from_arc(priority, Arc::new(hook) as Arc<dyn MethodHook>)
    }

    /// Creates a handler replacing the hooked method with a closure.
    ///
    /// Types implementing [`MethodReplacement`] are registered through
    /// [`Handler::method`] wrapped in [`Replacement`].
    #[must_use]
    pub fn replacement<F>(priority: Priority, replacement: F) -> Self
    where
        F: Fn(&mut MethodHookParam) -> InvocationResult + Send + Sync + 'static,
    {
        Self::method(priority, Replacement(replacement))
    }

    /// Creates a handler replacing the hooked method with a constant result.
    #[must_use]
    pub fn returns_constant(priority: Priority, value: Value) -> Self {
        Self::replacement(priority, move |_| Ok(value.clone()))
    }

    /// The shared handler that skips the hooked method and returns
    /// [`Value::Void`].
    ///
    /// It runs at twice [`Priority::HIGHEST`], outside every regular handler.
    /// All callers get the same handler, so registering it twice on one method
    /// is a duplicate.
    #[must_use]
    pub fn do_nothing() -> Self {
        static DO_NOTHING: OnceLock<MethodHandler> = OnceLock::new();
        DO_NOTHING
            .get_or_init(|| {
                Self::replacement(Priority(Priority::HIGHEST.0 * 2), |_| Ok(Value::Void))
            })
            .clone()
    }
}

impl<T: ?Sized> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Handler {
            sequence: self.sequence,
            priority: self.priority,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T: ?Sized> PartialEq for Handler<T> {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl<T: ?Sized> Eq for Handler<T> {}

impl<T: ?Sized> std::hash::Hash for Handler<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.sequence.hash(state);
    }
}

impl<T: ?Sized> Prioritized for Handler<T> {
    fn priority(&self) -> Priority {
        self.priority
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<T: ?Sized> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("sequence", &self.sequence)
            .field("priority", &self.priority)
            .finish()
    }
}

/// One element of a method hook chain.
///
/// Every method chain ends in exactly one [`MethodEntry::Original`], the
/// sentinel invoking the real implementation.
#[derive(Clone, Debug)]
pub enum MethodEntry {
    /// A registered handler.
    Hook(MethodHandler),
    /// Invoke the original implementation.
    Original,
}

impl MethodEntry {
    /// The handler, `None` for the sentinel.
    #[must_use]
    pub fn handler(&self) -> Option<&MethodHandler> {
        match self {
            MethodEntry::Hook(handler) => Some(handler),
            MethodEntry::Original => None,
        }
    }

    /// Returns true for the sentinel.
    #[must_use]
    pub fn is_original(&self) -> bool {
        matches!(self, MethodEntry::Original)
    }
}

impl From<MethodHandler> for MethodEntry {
    fn from(handler: MethodHandler) -> Self {
        MethodEntry::Hook(handler)
    }
}

impl Prioritized for MethodEntry {
    fn priority(&self) -> Priority {
        match self {
            MethodEntry::Hook(handler) => handler.priority(),
            MethodEntry::Original => Priority::ORIGINAL,
        }
    }

    fn sequence(&self) -> u64 {
        match self {
            MethodEntry::Hook(handler) => handler.sequence(),
            MethodEntry::Original => ORIGINAL_SEQUENCE,
        }
    }

    fn is_terminal(&self) -> bool {
        self.is_original()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hook::chain_order, method::MethodId};
    use std::cmp::Ordering;

    fn param() -> MethodHookParam {
        MethodHookParam::new(
            MethodId::method("a.B", "c", "()I"),
            None,
            Vec::new(),
            Arc::from(vec![MethodEntry::Original]),
        )
    }

    #[test]
    fn test_clone_keeps_identity() {
        let handler = Handler::method(Priority::DEFAULT, ClosureHook::new());
        let copy = handler.clone();
        assert_eq!(handler, copy);
        assert_eq!(handler.sequence(), copy.sequence());
    }

    #[test]
    fn test_same_callback_new_identity() {
        let hook: Arc<dyn MethodHook> = Arc::new(ClosureHook::new());
        let a = Handler::from_arc(Priority::DEFAULT, Arc::clone(&hook));
        let b = Handler::from_arc(Priority::DEFAULT, hook);
        assert_ne!(a, b);
        assert!(a.sequence() < b.sequence());
    }

    #[test]
    fn test_closure_hook_phases() {
        let hook = ClosureHook::new().before(|p| {
            p.set_result(Value::from(1));
            Ok(())
        });
        assert!(hook.has_before());
        assert!(!hook.has_after());

        let mut p = param();
        hook.before_invocation(&mut p).unwrap();
        hook.after_invocation(&mut p).unwrap();
        assert_eq!(p.result(), &Value::from(1));
    }

    #[test]
    fn test_replacement_stores_outcome() {
        let handler = Handler::returns_constant(Priority::DEFAULT, Value::from("x"));
        let mut p = param();
        handler.callback().before_invocation(&mut p).unwrap();
        assert!(p.is_resolved());
        assert_eq!(p.result().as_str(), Some("x"));

        let throwing = Handler::replacement(Priority::DEFAULT, |_| {
            Err(crate::Exception::new("java.lang.SecurityException"))
        });
        let mut p = param();
        throwing.callback().before_invocation(&mut p).unwrap();
        assert_eq!(
            p.throwable().map(|t| t.class_name()),
            Some("java.lang.SecurityException")
        );
    }

    #[test]
    fn test_do_nothing_is_shared() {
        let a = Handler::do_nothing();
        let b = Handler::do_nothing();
        assert_eq!(a, b);
        assert_eq!(a.priority(), Priority(20000));
    }

    #[test]
    fn test_original_entry_sorts_last() {
        let lowest = MethodEntry::from(Handler::method(Priority(i32::MIN), ClosureHook::new()));
        assert_eq!(
            chain_order(&lowest, &MethodEntry::Original),
            Ordering::Less
        );
        assert_eq!(MethodEntry::Original.priority(), Priority::ORIGINAL);
        assert!(MethodEntry::Original.handler().is_none());
    }
}
