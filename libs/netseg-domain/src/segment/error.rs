//! Domain errors for segment operations
//!
//! `SegmentNotFound` is the only error the manager raises itself. Every other
//! variant originates in a storage adapter and reaches the caller unchanged.

use thiserror::Error;

use crate::segment::ids::SegmentId;

/// Errors that can occur while managing segments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// No segment exists with the given id
    #[error("Segment {segment_id} could not be found")]
    SegmentNotFound { segment_id: SegmentId },

    /// A segment with this id already exists
    #[error("Segment {0} already exists")]
    SegmentAlreadyExists(String),

    /// The referenced network does not exist
    #[error("Network {0} could not be found")]
    NetworkNotFound(String),

    /// A request value could not be interpreted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transaction bookkeeping failed (commit without begin, etc.)
    #[error("Transaction error: {0}")]
    TransactionFailure(String),

    /// The storage backend failed
    #[error("Storage operation failed: {0}")]
    StorageFailure(String),
}

impl SegmentError {
    /// Create a not-found error for the given segment
    pub fn not_found(segment_id: SegmentId) -> Self {
        Self::SegmentNotFound { segment_id }
    }

    /// Create an invalid input error with a message
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a transaction error with a message
    pub fn transaction_failure(msg: impl Into<String>) -> Self {
        Self::TransactionFailure(msg.into())
    }

    /// Create a storage failure error with a message
    pub fn storage_failure(msg: impl Into<String>) -> Self {
        Self::StorageFailure(msg.into())
    }

    /// Whether this error means the addressed record is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SegmentNotFound { .. } | Self::NetworkNotFound(_))
    }
}

/// Result type alias for segment operations
pub type Result<T> = std::result::Result<T, SegmentError>;
