//! Error types for focus-stats-core

use thiserror::Error;

/// Main error type for the focus-stats-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Cache error
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Persistence slot error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for focus-stats-core
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a key-value persistence backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend refused the write because it would exceed its capacity
    #[error("storage quota exceeded: {needed} bytes requested, limit is {limit} bytes")]
    QuotaExceeded { needed: usize, limit: usize },

    /// SQLite backend error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Any other backend failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether this failure means the slot is full rather than broken.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

/// Errors surfaced by explicit cache requests (export/import).
#[derive(Error, Debug)]
pub enum CacheError {
    /// Export was requested but nothing is cached
    #[error("no cache data to export")]
    NoCache,

    /// Import payload is not a usable cache snapshot
    #[error("invalid cache snapshot: {0}")]
    InvalidSnapshot(String),

    /// The persistence slot failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why a stored cache blob was discarded on read.
///
/// This never propagates as an error: the cache self-heals by purging the
/// blob and the lookup reports it so callers can decide whether to warn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedCache {
    /// The blob is not valid cache JSON
    #[error("failed to parse cache blob: {0}")]
    Parse(String),

    /// The blob was written by a different schema version
    #[error("cache version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: i64, expected: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_classification() {
        let quota = StorageError::QuotaExceeded {
            needed: 10,
            limit: 5,
        };
        assert!(quota.is_quota_exceeded());
        assert!(!StorageError::Backend("boom".to_string()).is_quota_exceeded());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(CacheError::NoCache.to_string(), "no cache data to export");
        let mismatch = MalformedCache::VersionMismatch {
            found: 2,
            expected: 1,
        };
        assert_eq!(
            mismatch.to_string(),
            "cache version mismatch: found 2, expected 1"
        );
        let err: Error = CacheError::InvalidSnapshot("missing version".to_string()).into();
        assert_eq!(
            err.to_string(),
            "cache error: invalid cache snapshot: missing version"
        );
    }
}
