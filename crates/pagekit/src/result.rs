//! Result and error types for pagekit.

use std::fmt;
use thiserror::Error;

use crate::wait::WaitCondition;

/// Result type for pagekit operations
pub type PageResult<T> = Result<T, PageError>;

/// The interaction a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Element lookup
    Find,
    /// Visibility probe
    IsVisible,
    /// Click
    Click,
    /// Text extraction
    ReadText,
    /// Keyboard entry
    Type,
    /// History navigation
    NavigateBack,
    /// Loading a URL
    Navigate,
}

impl Action {
    /// Get the action name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::IsVisible => "is_visible",
            Self::Click => "click",
            Self::ReadText => "read_text",
            Self::Type => "type",
            Self::NavigateBack => "navigate_back",
            Self::Navigate => "navigate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while driving a page model
#[derive(Debug, Error)]
pub enum PageError {
    /// Locator (or locator group) not registered
    #[error("Unknown locator '{name}' in group '{group}'")]
    UnknownLocator {
        /// Group that was searched
        group: String,
        /// Name that was requested
        name: String,
    },

    /// Two locators in one group share a name
    #[error("Duplicate locator '{name}' in group '{group}'")]
    DuplicateLocator {
        /// Group being built
        group: String,
        /// Name declared twice
        name: String,
    },

    /// Wait condition not satisfied before the deadline
    #[error("Timed out after {elapsed_ms}ms waiting for '{locator}' to be {condition}")]
    Timeout {
        /// Locator name
        locator: String,
        /// Condition that was polled
        condition: WaitCondition,
        /// Time spent waiting
        elapsed_ms: u64,
    },

    /// Element detached from the DOM between resolution and action
    #[error("Element '{locator}' went stale during {action}")]
    StaleElement {
        /// Locator name
        locator: String,
        /// Attempted action
        action: Action,
    },

    /// Element present but not interactable
    #[error("Element '{locator}' blocked during {action}: {reason}")]
    InteractionBlocked {
        /// Locator name
        locator: String,
        /// Attempted action
        action: Action,
        /// Driver-supplied reason (covered, disabled, zero-size)
        reason: String,
    },

    /// No card matches the requested item
    #[error("No '{locator}' matches item {item}")]
    ItemNotFound {
        /// Container locator name
        locator: String,
        /// Requested item
        item: String,
    },

    /// Element text could not be interpreted
    #[error("Unexpected text in '{locator}': {text:?}")]
    UnexpectedText {
        /// Locator name
        locator: String,
        /// Raw text read from the element
        text: String,
    },

    /// Any other driver failure
    #[error("Driver error on '{locator}' during {action}: {message}")]
    Driver {
        /// Locator name
        locator: String,
        /// Attempted action
        action: Action,
        /// Driver message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PageError {
    /// Locator name the failure is attributed to, if any
    #[must_use]
    pub fn locator(&self) -> Option<&str> {
        match self {
            Self::UnknownLocator { name, .. } | Self::DuplicateLocator { name, .. } => Some(name),
            Self::Timeout { locator, .. }
            | Self::StaleElement { locator, .. }
            | Self::InteractionBlocked { locator, .. }
            | Self::ItemNotFound { locator, .. }
            | Self::UnexpectedText { locator, .. }
            | Self::Driver { locator, .. } => Some(locator),
            Self::Config { .. } | Self::Io(_) | Self::Json(_) | Self::Yaml(_) => None,
        }
    }

    /// Whether the executor may retry the failed action
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_locator_and_condition() {
        let err = PageError::Timeout {
            locator: "movie_cards".into(),
            condition: WaitCondition::PresentAll,
            elapsed_ms: 250,
        };
        let msg = err.to_string();
        assert!(msg.contains("movie_cards"));
        assert!(msg.contains("present (all)"));
        assert!(msg.contains("250ms"));
    }

    #[test]
    fn test_locator_accessor() {
        let err = PageError::StaleElement {
            locator: "fav_button".into(),
            action: Action::Click,
        };
        assert_eq!(err.locator(), Some("fav_button"));
        assert!(err.is_transient());

        let err = PageError::Config {
            message: "bad".into(),
        };
        assert_eq!(err.locator(), None);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_blocked_is_not_transient() {
        let err = PageError::InteractionBlocked {
            locator: "sort_title".into(),
            action: Action::Click,
            reason: "covered".into(),
        };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("click"));
    }
}
