//! Error types module
//!
//! All Beacon errors are unified under the `BeaconError` enum. Validation and
//! startup errors propagate to the caller unmodified; teardown errors are
//! collected during shutdown, logged, and only the first one is returned.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum BeaconError {
    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Failed to start {subsystem}: {source}")]
    Startup {
        subsystem: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to shut down {subsystem}: {source}")]
    Teardown {
        subsystem: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BeaconError {
    /// Wrap a subsystem constructor failure.
    pub fn startup(subsystem: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Startup {
            subsystem,
            source: source.into(),
        }
    }

    /// Wrap a subsystem teardown failure.
    pub fn teardown(subsystem: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Teardown {
            subsystem,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_error_names_the_subsystem() {
        let err = BeaconError::startup("recorder", anyhow::anyhow!("disk full"));
        let msg = err.to_string();
        assert!(msg.contains("recorder"), "message was: {msg}");
        assert!(msg.contains("disk full"), "message was: {msg}");
    }

    #[test]
    fn teardown_error_preserves_source() {
        let err = BeaconError::teardown("profiler", anyhow::anyhow!("task panicked"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
