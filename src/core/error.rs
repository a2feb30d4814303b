//! Error types for the relay pipeline
//!
//! Only caller mistakes surface as errors, and only at init/getter time.
//! Transient I/O (unwritable file, full queue, malformed datagram) is
//! degraded and diagnosed to stderr instead; ordinary logging calls never
//! return errors.

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Scope name exceeds the allowed length
    #[error("Scope name '{scope}' exceeds {max} bytes")]
    ScopeNameTooLong { scope: String, max: usize },

    /// Session directory could not be created or used
    #[error("Session directory '{path}' unusable: {source}")]
    SessionDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Queue endpoint missing or unreachable at init
    #[error("Shared queue '{path}' unavailable: {message}")]
    QueueUnavailable { path: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RelayError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a session directory error
    pub fn session_dir(path: impl Into<String>, source: std::io::Error) -> Self {
        RelayError::SessionDir {
            path: path.into(),
            source,
        }
    }

    /// Create a queue unavailable error
    pub fn queue(path: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::QueueUnavailable {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RelayError::config("mode", "worker mode requires a queue path");
        assert!(matches!(err, RelayError::InvalidConfiguration { .. }));

        let err = RelayError::queue("/tmp/relay.sock", "no collector bound");
        assert!(matches!(err, RelayError::QueueUnavailable { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = RelayError::config("mode", "missing session directory");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for mode: missing session directory"
        );

        let err = RelayError::ScopeNameTooLong {
            scope: "x".repeat(70),
            max: 64,
        };
        assert!(err.to_string().contains("exceeds 64 bytes"));
    }
}
