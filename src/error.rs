//! Error types for the extractor.

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a browser handle.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("script returned unexpected value: {0}")]
    Script(String),

    #[error("browser session is closed")]
    Closed,
}

impl DriverError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout(..))
    }
}

/// Failure of one extraction attempt.
///
/// These are converted into a retry or a final `None` by the orchestrator and
/// never reach callers of [`crate::JobParser::parse`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("browser could not be started: {0}")]
    Resource(#[source] DriverError),

    #[error("browser pool is shut down")]
    PoolClosed,

    #[error("no browser became available within {0:?}")]
    PoolExhausted(Duration),

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ExtractError {
    /// Resource failures are the only kind worth surfacing to a user.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            ExtractError::Resource(_) | ExtractError::PoolExhausted(_) | ExtractError::PoolClosed
        )
    }
}
