//! Handles returned by hook registration.

use std::{fmt, sync::Arc};

use crate::{
    hook::{
        chain::CallbackChain,
        handler::{Handler, MethodHook},
        types::Prioritized,
    },
    lifecycle::{LifecycleHook, LifecycleKind},
    method::MethodId,
};

/// What a handler is registered on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HookTarget {
    /// A method or constructor.
    Method(MethodId),
    /// A lifecycle event.
    Lifecycle(LifecycleKind),
}

impl fmt::Display for HookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookTarget::Method(method) => write!(f, "{method}"),
            HookTarget::Lifecycle(kind) => write!(f, "lifecycle:{kind}"),
        }
    }
}

/// Removal capability of a chain, independent of its element type.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, sequence: u64) -> bool;
}

impl<E> Detach for CallbackChain<E>
where
    E: Prioritized + Clone + Send + Sync,
{
    fn detach(&self, sequence: u64) -> bool {
        self.remove(sequence)
    }
}

/// Handle to one registration.
///
/// Dropping the handle does not remove the handler; removal is explicit only.
/// Native interception of a method stays in place after its last handler is
/// removed.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{ClosureHook, FnInterceptor, Handler, HookBridge, MethodId, Priority, Value};
///
/// let bridge = HookBridge::new(FnInterceptor::new(|_, _, _| Ok(Value::Void)));
/// let method = MethodId::method("com.example.Clock", "tick", "()V");
/// let unhook = bridge.hook_method(&method, &Handler::method(Priority::DEFAULT, ClosureHook::new()))?;
///
/// assert_eq!(bridge.handler_count(&method), 1);
/// assert!(unhook.unhook());
/// assert!(!unhook.unhook());
/// assert_eq!(bridge.handler_count(&method), 0);
/// assert!(bridge.is_hooked(&method));
/// # Ok::<(), hookbridge::Error>(())
/// ```
pub struct Unhook<T: ?Sized> {
    target: HookTarget,
    handler: Handler<T>,
    chain: Arc<dyn Detach>,
}

/// Handle to a method hook registration.
pub type MethodUnhook = Unhook<dyn MethodHook>;

/// Handle to a lifecycle handler registration.
pub type LifecycleUnhook = Unhook<dyn LifecycleHook>;

impl<T: ?Sized> Unhook<T> {
    pub(crate) fn new(target: HookTarget, handler: Handler<T>, chain: Arc<dyn Detach>) -> Self {
        Unhook {
            target,
            handler,
            chain,
        }
    }

    /// The registered handler.
    #[must_use]
    pub fn handler(&self) -> &Handler<T> {
        &self.handler
    }

    /// What the handler is registered on.
    #[must_use]
    pub fn target(&self) -> &HookTarget {
        &self.target
    }

    /// Removes the handler from its chain.
    ///
    /// Returns `false` if it was already removed. Dispatches that already took
    /// their snapshot still run the handler.
    pub fn unhook(&self) -> bool {
        let removed = self.chain.detach(self.handler.sequence());
        if removed {
            tracing::debug!(
                target: "hookbridge",
                sequence = self.handler.sequence(),
                target_desc = %self.target,
                "unhooked"
            );
        }
        removed
    }
}

impl<T: ?Sized> fmt::Debug for Unhook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unhook")
            .field("target", &self.target)
            .field("handler", &self.handler)
            .finish()
    }
}
