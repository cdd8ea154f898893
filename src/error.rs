//! Error types for partition routing.

use thiserror::Error;

/// Result type alias for partition routing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for partition routing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The namespace is not present in the published partition tables.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Namespace name is empty, too long or contains non-printable characters.
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),

    /// Partition count must be a non-zero power of two.
    #[error("invalid partition count: {0}")]
    InvalidPartitionCount(u32),

    /// Partition id outside the table being built.
    #[error("partition {partition_id} out of range for table of size {size}")]
    PartitionOutOfRange { partition_id: u32, size: u32 },

    /// Allocation of a table or collection failed.
    #[error("failed to allocate {requested} {what}")]
    AllocationFailure { what: &'static str, requested: usize },

    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the caller may reasonably retry after a topology refresh.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NamespaceNotFound(_))
    }
}
