//! Bridge configuration.
//!
//! # Configuration Presets
//!
//! - [`BridgeConfig::default()`] - Hooks enabled, failures keep what the handler recorded
//! - [`BridgeConfig::passthrough()`] - Every dispatch goes straight to the original
//! - [`BridgeConfig::strict()`] - Failed phases are rolled back, nesting is bounded
//!
//! # Example
//!
//! ```rust
//! use hookbridge::{BridgeConfig, FailurePolicy};
//!
//! let config = BridgeConfig::default()
//!     .with_failure_policy(FailurePolicy::Rollback)
//!     .with_max_dispatch_depth(64);
//! assert!(config.hooks_enabled);
//!
//! let config = BridgeConfig {
//!     catch_panics: false,
//!     ..BridgeConfig::strict()
//! };
//! assert_eq!(config.max_dispatch_depth, 256);
//! ```

use strum::{Display, EnumIter};

/// What happens to the result and exception slots when a handler phase fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FailurePolicy {
    /// Whatever the phase set before failing stands.
    ///
    /// A phase that fails without touching the slots changes nothing.
    #[default]
    KeepRecorded,

    /// The slots are restored to their state before the failing phase.
    Rollback,
}

/// Runtime behavior of a [`HookBridge`](crate::HookBridge).
///
/// # Default Configuration
///
/// - Hooks enabled
/// - [`FailurePolicy::KeepRecorded`]
/// - Panics in handlers are caught and treated as failures
/// - Unlimited dispatch nesting
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Whether dispatches initially run handler chains.
    ///
    /// When disabled every dispatch invokes the original implementation
    /// directly. Registration keeps working and takes effect once hooks are
    /// enabled again through
    /// [`HookBridge::set_hooks_enabled`](crate::HookBridge::set_hooks_enabled).
    pub hooks_enabled: bool,

    /// Treatment of outcome slots after a failed handler phase.
    pub failure_policy: FailurePolicy,

    /// Whether panics escaping handler code are caught.
    ///
    /// When disabled a panicking handler unwinds through the dispatch to the
    /// caller.
    pub catch_panics: bool,

    /// Maximum number of nested dispatches on one thread, `0` for no limit.
    ///
    /// Reentrant dispatches (a handler or original implementation calling a
    /// hooked method) count towards the limit. Exceeding it fails the innermost
    /// dispatch with [`Error::RecursionLimit`](crate::Error::RecursionLimit).
    pub max_dispatch_depth: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            hooks_enabled: true,
            failure_policy: FailurePolicy::KeepRecorded,
            catch_panics: true,
            max_dispatch_depth: 0,
        }
    }
}

impl BridgeConfig {
    /// Configuration with hooks disabled.
    #[must_use]
    pub fn passthrough() -> Self {
        BridgeConfig {
            hooks_enabled: false,
            ..Self::default()
        }
    }

    /// Configuration that rolls back failed phases and bounds nesting at 256.
    #[must_use]
    pub fn strict() -> Self {
        BridgeConfig {
            failure_policy: FailurePolicy::Rollback,
            max_dispatch_depth: 256,
            ..Self::default()
        }
    }

    /// Sets whether hooks are enabled.
    #[must_use]
    pub fn with_hooks_enabled(mut self, enabled: bool) -> Self {
        self.hooks_enabled = enabled;
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets whether panics in handlers are caught.
    #[must_use]
    pub fn with_catch_panics(mut self, catch: bool) -> Self {
        self.catch_panics = catch;
        self
    }

    /// Sets the nesting limit, `0` for none.
    #[must_use]
    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }
}
