//! Priority-ordered, copy-on-write handler chains.

use std::{
    cmp::Ordering,
    fmt,
    sync::{Arc, RwLock},
};

use crate::{
    hook::types::{chain_order, Prioritized},
    Error, Result,
};

/// An ordered set of handlers for one hook target.
///
/// The chain keeps its elements as an immutable, sorted slice that is replaced
/// wholesale on every mutation. Mutations are serialized by the write lock;
/// [`snapshot`](Self::snapshot) only holds the read lock long enough to clone
/// the current slice pointer. A dispatch therefore never holds a lock while
/// handler code runs, and a snapshot is always some complete state the chain
/// actually had: never a partially applied update.
///
/// Order is descending by priority, ties in the order the elements were added,
/// with a terminal element (the original invocation of method chains) last.
///
/// # Examples
///
/// ```rust
/// use hookbridge::{CallbackChain, ClosureHook, Handler, Priority};
///
/// let chain = CallbackChain::new("example");
/// let low = Handler::method(Priority(10), ClosureHook::new());
/// let high = Handler::method(Priority(90), ClosureHook::new());
///
/// chain.add(low.clone())?;
/// chain.add(high.clone())?;
/// let snapshot = chain.snapshot();
/// assert_eq!(snapshot[0], high);
/// assert_eq!(snapshot[1], low);
///
/// chain.remove(high.sequence());
/// assert_eq!(chain.len(), 1);
/// assert_eq!(snapshot.len(), 2); // earlier snapshots are unaffected
/// # Ok::<(), hookbridge::Error>(())
/// ```
pub struct CallbackChain<E> {
    target: String,
    elements: RwLock<Arc<[E]>>,
}

impl<E: Prioritized + Clone> CallbackChain<E> {
    /// Creates an empty chain. `target` describes the hooked target in
    /// errors and logs.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        CallbackChain {
            target: target.into(),
            elements: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Creates a chain holding a single element.
    #[must_use]
    pub fn with_element(target: impl Into<String>, element: E) -> Self {
        CallbackChain {
            target: target.into(),
            elements: RwLock::new(Arc::from(vec![element])),
        }
    }

    /// Description of the hook target.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Inserts `element` at its ordered position, after every element of the
    /// same priority already present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateHandler`] if an element with the same sequence
    /// number is already present. The chain is left unchanged.
    pub fn add(&self, element: E) -> Result<()> {
        let mut elements = write_lock!(self.elements);

        if elements.iter().any(|e| e.sequence() == element.sequence()) {
            return Err(Error::DuplicateHandler {
                sequence: element.sequence(),
                target: self.target.clone(),
            });
        }

        let position = elements.partition_point(|e| chain_order(e, &element) != Ordering::Greater);

        let mut updated = Vec::with_capacity(elements.len() + 1);
        updated.extend_from_slice(&elements[..position]);
        updated.push(element);
        updated.extend_from_slice(&elements[position..]);

        *elements = Arc::from(updated);
        Ok(())
    }

    /// Removes the element with the given sequence number.
    ///
    /// Returns `false` if no such element is present. Terminal elements are
    /// never removed.
    pub fn remove(&self, sequence: u64) -> bool {
        let mut elements = write_lock!(self.elements);

        let Some(position) = elements
            .iter()
            .position(|e| e.sequence() == sequence && !e.is_terminal())
        else {
            return false;
        };

        let mut updated = Vec::with_capacity(elements.len() - 1);
        updated.extend_from_slice(&elements[..position]);
        updated.extend_from_slice(&elements[position + 1..]);

        *elements = Arc::from(updated);
        true
    }

    /// Returns the chain as it is right now, in execution order.
    ///
    /// The returned slice never changes, whatever happens to the chain later.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[E]> {
        Arc::clone(&read_lock!(self.elements))
    }

    /// Returns true if an element with the given sequence number is present.
    #[must_use]
    pub fn contains(&self, sequence: u64) -> bool {
        self.snapshot().iter().any(|e| e.sequence() == sequence)
    }

    /// Number of elements, including a terminal element.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock!(self.elements).len()
    }

    /// Returns true if the chain holds no elements at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> fmt::Debug for CallbackChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackChain")
            .field("target", &self.target)
            .field("len", &read_lock!(self.elements).len())
            .finish()
    }
}
