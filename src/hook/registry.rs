//! Per-method chain registry and the native interception seam.
//!
//! The registry maps every [`MethodId`] that was ever hooked to its chain. Chains
//! are created on first use, pre-seeded with the [`MethodEntry::Original`]
//! sentinel, and never removed again: once a method is intercepted natively it
//! stays intercepted for the lifetime of the registry, and removing handlers
//! only collapses the chain back to the sentinel.
//!
//! ```text
//! register_hook(m, h)
//!   |
//!   +-- slots.entry(m).or_insert(chain [Original])     (atomic per key)
//!   +-- chain.add(h)                                   (chain write lock)
//!   +-- installed? no -> Interceptor::install(m)       (per-method mutex)
//!                        ok  -> record m
//!                        err -> chain.remove(h), InterceptionFailed
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use dashmap::DashMap;

use crate::{
    hook::{
        chain::CallbackChain,
        handler::{MethodEntry, MethodHandler},
    },
    method::{InvocationResult, MethodFlags, MethodId, Value},
    Error, Result,
};

/// Chain of one hooked method, always terminated by the original invocation.
pub type MethodChain = CallbackChain<MethodEntry>;

/// The native interception collaborator.
///
/// Implemented by the embedding runtime: it redirects a method's entry point so
/// calls end up in [`HookBridge::dispatch`](crate::HookBridge::dispatch), and
/// can always call the unmodified implementation.
pub trait Interceptor: Send + Sync {
    /// Redirects `method` to the dispatch engine.
    ///
    /// Called at most once per method by the registry, unless a previous
    /// attempt failed.
    ///
    /// # Errors
    ///
    /// Any error fails the registration that triggered the installation. Errors
    /// other than [`Error::InterceptionFailed`] are wrapped into one.
    fn install(&self, method: &MethodId) -> Result<()>;

    /// Invokes the original implementation of `method`, bypassing every hook.
    fn invoke_original(
        &self,
        method: &MethodId,
        this_object: Option<&Value>,
        args: &[Value],
    ) -> InvocationResult;
}

impl<I: Interceptor + ?Sized> Interceptor for Arc<I> {
    fn install(&self, method: &MethodId) -> Result<()> {
        (**self).install(method)
    }

    fn invoke_original(
        &self,
        method: &MethodId,
        this_object: Option<&Value>,
        args: &[Value],
    ) -> InvocationResult {
        (**self).invoke_original(method, this_object, args)
    }
}

type InstallFn = Box<dyn Fn(&MethodId) -> Result<()> + Send + Sync>;
type OriginalFn = Box<dyn Fn(&MethodId, Option<&Value>, &[Value]) -> InvocationResult + Send + Sync>;

/// An [`Interceptor`] built from closures.
///
/// Installation succeeds unless an install closure is set.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{FnInterceptor, Interceptor, MethodId, Value};
///
/// let interceptor = FnInterceptor::new(|method, _this, args| {
///     Ok(Value::from(format!("{}({} args)", method.name(), args.len())))
/// });
/// let method = MethodId::static_method("a.B", "run", "(I)Ljava/lang/String;");
/// assert!(interceptor.install(&method).is_ok());
/// assert_eq!(
///     interceptor.invoke_original(&method, None, &[Value::from(1)]),
///     Ok(Value::from("run(1 args)"))
/// );
/// ```
pub struct FnInterceptor {
    install: Option<InstallFn>,
    original: OriginalFn,
}

impl FnInterceptor {
    /// Creates an interceptor whose original implementations are `original`.
    #[must_use]
    pub fn new<F>(original: F) -> Self
    where
        F: Fn(&MethodId, Option<&Value>, &[Value]) -> InvocationResult + Send + Sync + 'static,
    {
        FnInterceptor {
            install: None,
            original: Box::new(original),
        }
    }

    /// Sets the closure called to install interception.
    #[must_use]
    pub fn with_install<F>(mut self, install: F) -> Self
    where
        F: Fn(&MethodId) -> Result<()> + Send + Sync + 'static,
    {
        self.install = Some(Box::new(install));
        self
    }
}

impl Interceptor for FnInterceptor {
    fn install(&self, method: &MethodId) -> Result<()> {
        match &self.install {
            Some(install) => install(method),
            None => Ok(()),
        }
    }

    fn invoke_original(
        &self,
        method: &MethodId,
        this_object: Option<&Value>,
        args: &[Value],
    ) -> InvocationResult {
        (self.original)(method, this_object, args)
    }
}

impl std::fmt::Debug for FnInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("custom_install", &self.install.is_some())
            .finish()
    }
}

struct MethodSlot {
    chain: Arc<MethodChain>,
    installed: AtomicBool,
    install_lock: Mutex<()>,
}

impl MethodSlot {
    fn new(method: &MethodId) -> Self {
        MethodSlot {
            chain: Arc::new(CallbackChain::with_element(
                method.to_string(),
                MethodEntry::Original,
            )),
            installed: AtomicBool::new(false),
            install_lock: Mutex::new(()),
        }
    }
}

/// Process-wide map from method identity to its handler chain.
///
/// Safe to use from any number of threads. Creation of a method's chain is
/// atomic per key, mutation of a chain is serialized by the chain, and no lock
/// is held while the [`Interceptor`] runs except the per-method installation
/// lock.
pub struct HookRegistry {
    slots: DashMap<MethodId, Arc<MethodSlot>>,
    installed: boxcar::Vec<MethodId>,
    interceptor: Arc<dyn Interceptor>,
}

impl HookRegistry {
    /// Creates an empty registry using `interceptor` for native interception.
    #[must_use]
    pub fn new(interceptor: Arc<dyn Interceptor>) -> Self {
        HookRegistry {
            slots: DashMap::new(),
            installed: boxcar::Vec::new(),
            interceptor,
        }
    }

    /// The native interception collaborator.
    #[must_use]
    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }

    fn slot(&self, method: &MethodId) -> Arc<MethodSlot> {
        if let Some(slot) = self.slots.get(method) {
            return Arc::clone(slot.value());
        }

        let slot = self
            .slots
            .entry(method.clone())
            .or_insert_with(|| Arc::new(MethodSlot::new(method)));
        Arc::clone(slot.value())
    }

    // The shard guard is released before the slot is used; `Interceptor::install`
    // may register further methods while another thread inspects this one.
    fn existing_slot(&self, method: &MethodId) -> Option<Arc<MethodSlot>> {
        self.slots.get(method).map(|slot| Arc::clone(slot.value()))
    }

    /// Returns the chain of `method`, creating it if absent.
    ///
    /// A new chain holds only the original invocation. Concurrent callers for
    /// the same method all get the same chain.
    #[must_use]
    pub fn chain_for(&self, method: &MethodId) -> Arc<MethodChain> {
        Arc::clone(&self.slot(method).chain)
    }

    /// Returns the chain of `method` if one was ever created.
    #[must_use]
    pub fn get(&self, method: &MethodId) -> Option<Arc<MethodChain>> {
        self.existing_slot(method).map(|slot| Arc::clone(&slot.chain))
    }

    /// Adds `handler` to the chain of `method`.
    ///
    /// The first successful registration on a method installs native
    /// interception through the [`Interceptor`]; later ones do not.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTarget`] for abstract methods and interface members
    /// - [`Error::DuplicateHandler`] if `handler` is already in the chain
    /// - [`Error::InterceptionFailed`] if installation failed; `handler` is
    ///   removed again and the next registration retries the installation
    pub fn register_hook(&self, method: &MethodId, handler: &MethodHandler) -> Result<()> {
        if method.flags().contains(MethodFlags::ABSTRACT) {
            return Err(invalid_target!(method, "abstract method"));
        }
        if method.flags().contains(MethodFlags::INTERFACE) {
            return Err(invalid_target!(method, "interface member"));
        }

        let slot = self.slot(method);
        slot.chain.add(MethodEntry::from(handler.clone()))?;

        if slot.installed.load(Ordering::Acquire) {
            return Ok(());
        }
        let _install = lock!(slot.install_lock);
        if slot.installed.load(Ordering::Acquire) {
            return Ok(());
        }

        match self.interceptor.install(method) {
            Ok(()) => {
                slot.installed.store(true, Ordering::Release);
                self.installed.push(method.clone());
                tracing::debug!(target: "hookbridge", method = %method, "installed interception");
                Ok(())
            }
            Err(error) => {
                slot.chain.remove(handler.sequence());
                Err(match error {
                    Error::InterceptionFailed { .. } => error,
                    other => Error::InterceptionFailed {
                        method: method.clone(),
                        message: other.to_string(),
                    },
                })
            }
        }
    }

    /// Removes `handler` from the chain of `method`.
    ///
    /// Returns `false` if it was not registered there. Native interception is
    /// left in place.
    pub fn unregister_hook(&self, method: &MethodId, handler: &MethodHandler) -> bool {
        self.existing_slot(method)
            .is_some_and(|slot| slot.chain.remove(handler.sequence()))
    }

    /// Returns true if native interception is installed for `method`.
    #[must_use]
    pub fn is_hooked(&self, method: &MethodId) -> bool {
        self.existing_slot(method)
            .is_some_and(|slot| slot.installed.load(Ordering::Acquire))
    }

    /// Methods with native interception installed, in installation order.
    #[must_use]
    pub fn hooked_methods(&self) -> Vec<MethodId> {
        self.installed.iter().map(|(_, method)| method.clone()).collect()
    }

    /// Number of handlers registered on `method`, not counting the original
    /// invocation.
    #[must_use]
    pub fn handler_count(&self, method: &MethodId) -> usize {
        self.get(method)
            .map_or(0, |chain| chain.len().saturating_sub(1))
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("chains", &self.slots.len())
            .field("installed", &self.installed.count())
            .finish()
    }
}
