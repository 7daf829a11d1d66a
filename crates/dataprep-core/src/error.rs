// crates/dataprep-core/src/error.rs
// ============================================================================
// Module: Dataprep Errors
// Description: Error taxonomy shared by sessions, resolvers, and wrappers.
// Purpose: Surface argument, authentication, and status failures uniformly.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every fallible operation in the workspace returns [`DataPrepError`].
//! Expected negative answers (a missing site on an exists-check, a conflict on
//! create) are not errors; wrappers map them to `false` and log a warning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors emitted by dataprep operations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - HTTP 401 responses always map to [`DataPrepError::Unauthorized`].
#[derive(Debug, Error)]
pub enum DataPrepError {
    /// A required argument was empty or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The server rejected the supplied credentials.
    #[error("authentication failed for user '{username}'")]
    Unauthorized {
        /// Username that was rejected.
        username: String,
    },
    /// A required repository object does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The server answered with a status the operation does not handle.
    #[error("{operation} failed with http status {status}: {body}")]
    UnexpectedStatus {
        /// Operation label used in logs and messages.
        operation: String,
        /// HTTP status code returned by the server.
        status: u16,
        /// Truncated response body.
        body: String,
    },
    /// The request could not be sent or the response could not be read.
    #[error("http transport error: {0}")]
    Transport(String),
    /// The server response did not match the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The response body exceeded the configured limit.
    #[error("response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Observed size in bytes.
        actual: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}

impl DataPrepError {
    /// Returns true when the error is an authentication failure.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Result alias used across the workspace.
pub type DataPrepResult<T> = Result<T, DataPrepError>;

// ============================================================================
// SECTION: Argument Checks
// ============================================================================

/// Rejects empty or whitespace-only arguments before any request is built.
///
/// # Errors
///
/// Returns [`DataPrepError::InvalidArgument`] naming the offending argument.
pub fn require_value(value: &str, name: &str) -> Result<(), DataPrepError> {
    if value.trim().is_empty() {
        return Err(DataPrepError::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}
