use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors surfaced by user-initiated trash operations.
///
/// Background paths (probe, watch, synchronizer) never return these; they
/// degrade to a default instead. Every variant carries the call site.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The platform trash metadata query failed.
    #[error("Trash query failed: {reason} {location}")]
    PlatformQueryFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The platform trash-clear operation failed.
    #[error("Emptying trash failed: {reason} {location}")]
    EmptyFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Subscribing to filesystem notifications failed.
    #[error("Failed to watch {path:?}: {source} {location}")]
    WatchFailed {
        /// Directory that could not be watched.
        path: PathBuf,
        /// Underlying notify error.
        #[source]
        source: notify::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An embedded indicator image could not be decoded.
    #[error("Failed to decode indicator image: {reason} {location}")]
    IconDecodeFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A background task panicked or was aborted.
    #[error("Background task failed: {reason} {location}")]
    TaskFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The operation is not available on this platform.
    #[error("Not supported on this platform: {operation} {location}")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<tokio::task::JoinError> for CoreError {
    #[track_caller]
    fn from(source: tokio::task::JoinError) -> Self {
        CoreError::TaskFailed {
            reason: source.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
