//! Core types for the hook system.
//!
//! - [`Priority`]: Controls the position of a handler in its chain
//! - [`Prioritized`]: The ordering contract every chain participant fulfils
//! - [`Phase`]: Which part of a handler is running
//! - [`HandlerResult`] / [`HandlerError`]: What handler phases return

use std::{
    cmp::Ordering,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
};

use strum::{Display, EnumIter};

/// Priority of a handler, controlling its position in the chain.
///
/// Higher priority handlers run their before-phase earlier and their
/// after-phase later (they wrap the lower priority ones).
///
/// # Predefined Priorities
///
/// | Constant | Value | Use Case |
/// |----------|-------|----------|
/// | [`HIGHEST`](Self::HIGHEST) | 10000 | Wrap every other handler |
/// | [`DEFAULT`](Self::DEFAULT) | 50 | General purpose handlers |
/// | [`LOWEST`](Self::LOWEST) | -10000 | Run right before the original |
/// | [`ORIGINAL`](Self::ORIGINAL) | -20000 | Reserved for the original invocation |
///
/// The original invocation always runs last in a chain, independent of the
/// priorities used by handlers; [`ORIGINAL`](Self::ORIGINAL) is only the value
/// it reports.
///
/// # Examples
///
/// ```rust
/// use hookbridge::Priority;
///
/// assert!(Priority::HIGHEST > Priority::DEFAULT);
/// assert!(Priority::DEFAULT > Priority::LOWEST);
/// assert_eq!(Priority::default(), Priority::DEFAULT);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// Call this handler first (value: 10000).
    pub const HIGHEST: Self = Self(10000);

    /// Default priority (value: 50).
    pub const DEFAULT: Self = Self(50);

    /// Call this handler last (value: -10000).
    pub const LOWEST: Self = Self(-10000);

    /// Priority reported by the original invocation (value: -20000).
    pub const ORIGINAL: Self = Self(-20000);
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The part of a handler that is executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Method hook, before the original implementation.
    Before,
    /// Method hook, after the original implementation.
    After,
    /// Lifecycle event handler.
    Event,
}

/// Error type returned by failing handler phases.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type of every handler phase.
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Sequence number reserved for the original invocation.
pub(crate) const ORIGINAL_SEQUENCE: u64 = 0;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(ORIGINAL_SEQUENCE + 1);

/// Hands out the next handler sequence number.
///
/// Numbers are unique for the lifetime of the process. They identify a handler
/// and play no part in ordering.
pub(crate) fn next_sequence() -> u64 {
    NEXT_SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Ordering contract of everything that takes part in a chain.
///
/// Chains are sorted descending by [`priority`](Self::priority); equal
/// priorities keep the order in which they were added to the chain. A
/// [`terminal`](Self::is_terminal) element sorts after everything else.
pub trait Prioritized {
    /// Position key, higher runs earlier.
    fn priority(&self) -> Priority;

    /// Unique, stable identity.
    fn sequence(&self) -> u64;

    /// Whether this element must always be last.
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Order used for every chain.
///
/// Elements comparing [`Ordering::Equal`] run in the order they were added.
pub fn chain_order<P: Prioritized + ?Sized>(a: &P, b: &P) -> Ordering {
    a.is_terminal()
        .cmp(&b.is_terminal())
        .then_with(|| b.priority().cmp(&a.priority()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(i32, u64, bool);

    impl Prioritized for Entry {
        fn priority(&self) -> Priority {
            Priority(self.0)
        }

        fn sequence(&self) -> u64 {
            self.1
        }

        fn is_terminal(&self) -> bool {
            self.2
        }
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::HIGHEST > Priority::DEFAULT);
        assert!(Priority::DEFAULT > Priority::LOWEST);
        assert!(Priority::LOWEST > Priority::ORIGINAL);
    }

    #[test]
    fn test_chain_order_descending_priority() {
        let high = Entry(100, 9, false);
        let low = Entry(50, 1, false);
        assert_eq!(chain_order(&high, &low), Ordering::Less);
        assert_eq!(chain_order(&low, &high), Ordering::Greater);
    }

    #[test]
    fn test_chain_order_ignores_sequence() {
        let older = Entry(50, 3, false);
        let newer = Entry(50, 4, false);
        assert_eq!(chain_order(&older, &newer), Ordering::Equal);
        assert_eq!(chain_order(&newer, &older), Ordering::Equal);
    }

    #[test]
    fn test_chain_order_terminal_last() {
        let terminal = Entry(i32::MAX, 0, true);
        let lowest = Entry(i32::MIN, 10, false);
        assert_eq!(chain_order(&lowest, &terminal), Ordering::Less);
    }

    #[test]
    fn test_sequences_increase() {
        let a = next_sequence();
        let b = next_sequence();
        assert!(b > a);
        assert!(a > ORIGINAL_SEQUENCE);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Before.to_string(), "before");
        assert_eq!(Phase::Event.to_string(), "event");
    }
}
