//! Error types for skipdb core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in skipdb core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Block store error.
    #[error("storage error: {0}")]
    Storage(#[from] skipdb_storage::StorageError),

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] skipdb_codec::CodecError),

    /// The operation cannot be performed by this query operator directly.
    #[error("{operation} is not supported by query `{query}`; run it against a collection")]
    Unsupported {
        /// The rejected operation.
        operation: &'static str,
        /// The query it was invoked on.
        query: String,
    },

    /// A node reference does not resolve to a live index node.
    #[error("index node not found: {node}")]
    NodeNotFound {
        /// The node slot that was requested.
        node: u32,
    },

    /// No index exists on the field.
    #[error("no index on field `{field}`")]
    IndexNotFound {
        /// The field that was looked up.
        field: String,
    },

    /// A unique index already holds the key.
    #[error("duplicate key {key} in unique index on `{field}`")]
    UniqueViolation {
        /// Field of the unique index.
        field: String,
        /// The normalized key that collided.
        key: String,
    },

    /// The query would need a full collection scan and the collection forbids them.
    #[error("full collection scan forbidden for query `{query}`")]
    FullScanForbidden {
        /// The query that needed the scan.
        query: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an unsupported-operation error for `query`.
    pub fn unsupported(operation: &'static str, query: impl ToString) -> Self {
        Self::Unsupported {
            operation,
            query: query.to_string(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a unique violation error.
    pub fn unique_violation(field: impl Into<String>, key: impl ToString) -> Self {
        Self::UniqueViolation {
            field: field.into(),
            key: key.to_string(),
        }
    }

    /// Creates a full-scan-forbidden error.
    pub fn full_scan_forbidden(query: impl ToString) -> Self {
        Self::FullScanForbidden {
            query: query.to_string(),
        }
    }
}
