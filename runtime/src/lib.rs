//! # rxmvi Runtime
//!
//! Runtime implementation for the rxmvi architecture.
//!
//! This crate provides the [`Store`] that coordinates reducer execution,
//! middleware side effects and view subscriptions.
//!
//! ## Core Components
//!
//! - **Store**: Holds the state, serializes reductions, runs middlewares
//! - **`ViewModel`**: Couples a view's lifecycle to store bindings
//! - **`LoggerMiddleware`**: Logs every action with the current state
//!
//! ## Example
//!
//! ```ignore
//! use rxmvi_runtime::Store;
//!
//! let store = Store::new(CounterReducer, CounterState::default(), middlewares![IncrementMiddleware::new()]);
//!
//! // Bind a view
//! let binding = store.bind(Arc::new(TerminalView));
//!
//! // Dispatch an action
//! store.dispatch(|| CounterAction::Increment(1));
//!
//! // Stop rendering
//! binding.dispose();
//! ```

/// Logger middleware
pub mod logger;

/// Metric names and descriptions
pub mod metrics;

/// View lifecycle binder
pub mod view_model;

/// Store runtime
pub mod store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// Dispatching never fails: a dispatch into a released store is silently
    /// ignored. These errors come from the request/response helper and from
    /// configuration loading.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The store was released and no longer processes actions
        #[error("Store has been released")]
        Released,

        /// Timeout waiting for a matching action
        ///
        /// Returned by `dispatch_and_wait_for` when the timeout expires before
        /// a matching action is observed.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action channel closed
        ///
        /// The action relay was dropped, typically because the store was
        /// released while waiting.
        #[error("Action channel closed")]
        ChannelClosed,

        /// A configuration value is invalid
        #[error("Invalid configuration for {key}: {reason}")]
        InvalidConfig {
            /// The offending configuration key
            key: String,
            /// Why the value was rejected
            reason: String,
        },
    }

    /// Errors from the view lifecycle binder
    #[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum BinderError {
        /// The binder reached its terminal state; no view can be bound any more
        #[error("View model has been terminated")]
        Terminated,
    }
}

pub use error::{BinderError, StoreError};

use rxmvi_core::channel::DEFAULT_BACKLOG_WARNING;

/// Environment variable overriding [`StoreConfig::action_backlog_warning`].
pub const ACTION_BACKLOG_ENV: &str = "RXMVI_ACTION_BACKLOG_WARNING";

/// Environment variable overriding [`StoreConfig::state_backlog_warning`].
pub const STATE_BACKLOG_ENV: &str = "RXMVI_STATE_BACKLOG_WARNING";

/// Configuration for Store instances
///
/// Relays never drop values; these thresholds only decide when a subscriber
/// that falls behind is reported with a warning.
///
/// # Example
///
/// ```
/// use rxmvi_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_action_backlog_warning(1024)
///     .with_state_backlog_warning(64);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Undelivered actions per subscriber (middlewares included) before a warning
    pub action_backlog_warning: usize,
    /// Undelivered states per subscriber before a warning
    pub state_backlog_warning: usize,
}

impl StoreConfig {
    /// Create a configuration with explicit thresholds
    #[must_use]
    pub const fn new(action_backlog_warning: usize, state_backlog_warning: usize) -> Self {
        Self {
            action_backlog_warning,
            state_backlog_warning,
        }
    }

    /// Set the action backlog warning threshold
    #[must_use]
    pub const fn with_action_backlog_warning(mut self, threshold: usize) -> Self {
        self.action_backlog_warning = threshold;
        self
    }

    /// Set the state backlog warning threshold
    #[must_use]
    pub const fn with_state_backlog_warning(mut self, threshold: usize) -> Self {
        self.state_backlog_warning = threshold;
        self
    }

    /// Load a configuration from the environment, falling back to defaults
    ///
    /// Reads [`ACTION_BACKLOG_ENV`] and [`STATE_BACKLOG_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if a variable is set but is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, StoreError> {
        let defaults = Self::default();
        let config = Self {
            action_backlog_warning: read_threshold(
                ACTION_BACKLOG_ENV,
                defaults.action_backlog_warning,
            )?,
            state_backlog_warning: read_threshold(
                STATE_BACKLOG_ENV,
                defaults.state_backlog_warning,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if a threshold is zero.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.action_backlog_warning == 0 {
            return Err(StoreError::InvalidConfig {
                key: "action_backlog_warning".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.state_backlog_warning == 0 {
            return Err(StoreError::InvalidConfig {
                key: "state_backlog_warning".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            action_backlog_warning: DEFAULT_BACKLOG_WARNING,
            state_backlog_warning: DEFAULT_BACKLOG_WARNING,
        }
    }
}

fn read_threshold(key: &str, default: usize) -> Result<usize, StoreError> {
    parse_threshold(key, std::env::var(key), default)
}

fn parse_threshold(
    key: &str,
    value: Result<String, std::env::VarError>,
    default: usize,
) -> Result<usize, StoreError> {
    match value {
        Ok(raw) => raw.trim().parse().map_err(|error| StoreError::InvalidConfig {
            key: key.to_string(),
            reason: format!("{raw:?} is not a count: {error}"),
        }),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(std::env::VarError::NotUnicode(_)) => Err(StoreError::InvalidConfig {
            key: key.to_string(),
            reason: "value is not valid unicode".to_string(),
        }),
    }
}

pub use logger::LoggerMiddleware;
pub use store::Store;
pub use view_model::{BinderState, ViewModel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StoreConfig::default();
        assert_eq!(config.action_backlog_warning, DEFAULT_BACKLOG_WARNING);
        assert_eq!(config.state_backlog_warning, DEFAULT_BACKLOG_WARNING);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let config = StoreConfig::default().with_state_backlog_warning(0);
        assert!(matches!(
            config.validate(),
            Err(StoreError::InvalidConfig { key, .. }) if key == "state_backlog_warning"
        ));
    }

    #[test]
    fn unparsable_threshold_is_rejected() {
        let result = parse_threshold(ACTION_BACKLOG_ENV, Ok("many".to_string()), 8);
        assert!(matches!(
            result,
            Err(StoreError::InvalidConfig { key, .. }) if key == ACTION_BACKLOG_ENV
        ));
    }

    #[test]
    fn threshold_is_trimmed_and_parsed() {
        assert_eq!(parse_threshold(STATE_BACKLOG_ENV, Ok(" 512 ".to_string()), 8), Ok(512));
    }

    #[test]
    fn missing_variable_falls_back_to_default() {
        assert_eq!(read_threshold("RXMVI_TEST_MISSING_BACKLOG", 8), Ok(8));
    }
}
