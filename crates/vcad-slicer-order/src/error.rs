//! Error types for path ordering.

use thiserror::Error;

/// Errors that can occur while setting up an ordering run.
///
/// Ordering itself always succeeds for structurally valid input; errors only
/// come from misconfiguration or misuse of the optimizer lifecycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    /// Invalid optimizer settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A path was added after `optimize` already ran.
    #[error("optimizer already ran; paths can no longer be added")]
    AlreadyOptimized,
}

/// Result type for ordering operations.
pub type Result<T> = std::result::Result<T, OrderError>;
