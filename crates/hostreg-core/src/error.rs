//! Error types for the host registry client
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for host registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the host registry client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No endpoint has been set yet
    #[error("No API endpoint configured")]
    NotConfigured,

    /// Network error, non-2xx status or malformed response body
    #[error("Transport error: {cause}")]
    Transport {
        /// Human-readable cause
        cause: String,
    },

    /// Bad local input, rejected before any network call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// An interaction was requested that the active workflow does not allow
    #[error("Cannot {requested} while {active} is active")]
    Workflow {
        /// Name of the workflow that is currently active
        active: &'static str,
        /// What was requested
        requested: &'static str,
    },

    /// No cached record with this MAC address
    #[error("Host not found: {0}")]
    NotFound(String),

    /// A mutation for this MAC address is already in flight
    #[error("A change to {0} is already in progress")]
    Busy(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(cause: impl Into<String>) -> Self {
        Self::Transport {
            cause: cause.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(mac: impl Into<String>) -> Self {
        Self::NotFound(mac.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the user can recover by pointing the client at another endpoint
    pub fn offers_reconfigure(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconfigure_affordance() {
        assert!(Error::NotConfigured.offers_reconfigure());
        assert!(Error::transport("connection refused").offers_reconfigure());
        assert!(!Error::validation("hostname is required").offers_reconfigure());
        assert!(!Error::Busy("aa:bb".into()).offers_reconfigure());
    }

    #[test]
    fn test_workflow_error_message() {
        let err = Error::Workflow {
            active: "delete confirmation",
            requested: "edit a host",
        };
        assert_eq!(
            err.to_string(),
            "Cannot edit a host while delete confirmation is active"
        );
    }
}
