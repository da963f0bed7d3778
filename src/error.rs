//! Error types for the crownet simulation engine.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, CrowNetError>;

/// Errors that can occur while configuring or driving the engine.
#[derive(Error, Debug)]
pub enum CrowNetError {
    /// A configuration value is out of range or internally inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// An operation was requested before the state it depends on exists,
    /// e.g. reading output before `Engine::build` has run.
    #[error("missing prerequisite: {reason}")]
    MissingPrerequisite {
        /// What state was expected but absent.
        reason: String,
    },

    /// A caller-supplied request could not be satisfied against the
    /// current engine state (unknown neuron id, malformed pattern, ...).
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Why the request was rejected.
        reason: String,
    },

    /// An underlying I/O operation failed while loading or saving state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state (config or weights) could not be parsed or written.
    #[error("persistence error: {reason}")]
    Persistence {
        /// Details of the persistence failure.
        reason: String,
    },
}

impl CrowNetError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create a missing prerequisite error.
    pub fn missing_prerequisite(reason: impl Into<String>) -> Self {
        Self::MissingPrerequisite {
            reason: reason.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::Persistence {
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "persistence")]
impl From<serde_json::Error> for CrowNetError {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

#[cfg(feature = "persistence")]
impl From<toml::de::Error> for CrowNetError {
    fn from(err: toml::de::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

#[cfg(feature = "persistence")]
impl From<toml::ser::Error> for CrowNetError {
    fn from(err: toml::ser::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_reason() {
        let err = CrowNetError::invalid_configuration("missing neurons");
        assert!(matches!(err, CrowNetError::InvalidConfiguration { .. }));

        let err = CrowNetError::invalid_request("unknown neuron id 42");
        assert!(matches!(err, CrowNetError::InvalidRequest { .. }));
    }

    #[test]
    fn display_includes_reason() {
        let err = CrowNetError::missing_prerequisite("network not built");
        let msg = format!("{err}");
        assert!(msg.contains("network not built"));
    }
}
