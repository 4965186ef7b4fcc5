//! Error types for the cache manager
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Failures raised by an indexed store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Collection has not been registered
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Exact-match query on an attribute the collection does not index
    #[error("Attribute '{attribute}' is not indexed in collection '{collection}'")]
    NotIndexed {
        collection: String,
        attribute: String,
    },

    /// Record rejected by the store (not a JSON object, bad name, ...)
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Underlying file I/O failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state could not be encoded or decoded
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Cache Error Enum ==
/// Errors that cross the cache manager boundary.
///
/// Store failures on the read and write paths are absorbed and logged, so in
/// practice callers only ever see `InvalidArgument`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Caller passed something that can never be valid
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Store failure surfaced by a helper that does not absorb it
    #[error(transparent)]
    Store(#[from] StoreError),
}

// == Result Type Aliases ==
/// Convenience Result type for the cache manager.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type returned by store implementations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::CollectionNotFound("Account".to_string());
        assert_eq!(err.to_string(), "Collection not found: Account");

        let err = StoreError::NotIndexed {
            collection: "Account".to_string(),
            attribute: "Name".to_string(),
        };
        assert!(err.to_string().contains("'Name'"));
        assert!(err.to_string().contains("'Account'"));
    }

    #[test]
    fn test_cache_error_wraps_store_error() {
        let err: CacheError = StoreError::InvalidRecord("not an object".to_string()).into();
        assert!(matches!(err, CacheError::Store(StoreError::InvalidRecord(_))));
        assert_eq!(err.to_string(), "Invalid record: not an object");
    }
}
