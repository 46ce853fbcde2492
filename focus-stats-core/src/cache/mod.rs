//! Versioned, TTL-bound cache for computed statistics
//!
//! A [`CacheStore`] owns one slot in an injected [`KvStore`] and keeps a
//! single [`StatsCacheData`] blob there as JSON. The blob is derived data:
//! a blob that fails to decode is purged and reported rather than failing.
//!
//! ## Lifecycle
//!
//! ```text
//! Absent --write--> Fresh --(mutation newer | ttl elapsed)--> Stale
//!   ^                                                           |
//!   +----------------------- clear / rewrite -------------------+
//!
//! Absent <--purge-- Invalid (parse failure | version mismatch)
//! ```
//!
//! A backend failure on read leaves the slot alone and is reported as
//! [`CacheLookup::Unavailable`].
//!
//! Writes are last-write-wins. Callers that may recompute concurrently should
//! funnel all writes through one store, e.g. via [`CacheStore::get_or_rebuild`].

pub mod store;

pub use store::{KvStore, MemoryStore};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::CacheConfig;
use crate::error::{CacheError, MalformedCache, StorageError};
use crate::types::{StatsCacheData, CURRENT_CACHE_VERSION, DEFAULT_CACHE_TTL_MS};

/// Slot the cache lives under unless configured otherwise
pub const DEFAULT_CACHE_KEY: &str = "focus-stats:stats:cache";

/// Result of looking up the cached blob.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A version-matched blob was found
    Hit(StatsCacheData),
    /// Nothing is stored
    Absent,
    /// A blob was found but could not be used, and has been purged
    Discarded(MalformedCache),
    /// The backend failed; whatever is stored was left in place
    Unavailable(String),
}

impl CacheLookup {
    pub fn into_data(self) -> Option<StatsCacheData> {
        match self {
            CacheLookup::Hit(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    pub fn discarded(&self) -> Option<&MalformedCache> {
        match self {
            CacheLookup::Discarded(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Result of persisting a blob.
///
/// A failed write is never fatal: the computed data stays valid in memory
/// and the engine keeps working without a cache.
#[must_use]
#[derive(Debug)]
pub enum WriteOutcome {
    /// The blob was stored
    Written { bytes: usize },
    /// The backend is full. The previous entry was purged if `cleared`.
    QuotaExceeded { error: StorageError, cleared: bool },
    /// Any other backend failure. The previous entry is left as it was.
    Failed(StorageError),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }

    /// The underlying failure, if the write did not go through.
    pub fn error(&self) -> Option<&StorageError> {
        match self {
            WriteOutcome::Written { .. } => None,
            WriteOutcome::QuotaExceeded { error, .. } | WriteOutcome::Failed(error) => Some(error),
        }
    }
}

/// Result of [`CacheStore::get_or_rebuild`].
#[derive(Debug)]
pub enum Refresh {
    /// The cached blob was fresh and served as-is
    Cached(StatsCacheData),
    /// The blob was missing, stale or discarded and has been recomputed
    Rebuilt {
        data: StatsCacheData,
        write: WriteOutcome,
        /// Set when a malformed blob was purged on the way
        discarded: Option<MalformedCache>,
    },
}

impl Refresh {
    pub fn data(&self) -> &StatsCacheData {
        match self {
            Refresh::Cached(data) | Refresh::Rebuilt { data, .. } => data,
        }
    }

    pub fn into_data(self) -> StatsCacheData {
        match self {
            Refresh::Cached(data) | Refresh::Rebuilt { data, .. } => data,
        }
    }

    pub fn was_rebuilt(&self) -> bool {
        matches!(self, Refresh::Rebuilt { .. })
    }
}

/// Read-only diagnostic view of the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    /// A usable, version-matched blob is stored
    pub exists: bool,
    /// Raw blob length in bytes, 0 when nothing is stored
    pub size: usize,
    pub last_update: Option<DateTime<Utc>>,
    /// Lifetime in milliseconds
    pub ttl: u64,
    pub is_stale: bool,
}

/// Cache of computed statistics in a single key-value slot.
#[derive(Debug)]
pub struct CacheStore<S> {
    backend: S,
    key: String,
    ttl: u64,
}

impl<S: KvStore> CacheStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            key: DEFAULT_CACHE_KEY.to_string(),
            ttl: DEFAULT_CACHE_TTL_MS,
        }
    }

    pub fn from_config(backend: S, config: &CacheConfig) -> Self {
        Self::new(backend)
            .with_key(config.key.clone())
            .with_ttl(config.ttl_ms)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// TTL given to blobs created by [`Self::create_data`].
    pub fn with_ttl(mut self, ttl_ms: u64) -> Self {
        self.ttl = ttl_ms;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// An empty payload carrying this store's TTL.
    pub fn create_data(&self, now: DateTime<Utc>) -> StatsCacheData {
        StatsCacheData::new(now, self.ttl)
    }

    /// Load the cached blob.
    ///
    /// Unparseable or version-mismatched blobs are purged and reported as
    /// [`CacheLookup::Discarded`]. Backend failures purge nothing. TTL is not checked here; see
    /// [`Self::is_stale_at`].
    pub fn read(&self) -> CacheLookup {
        let blob = match self.backend.get(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return CacheLookup::Absent,
            Err(e) => {
                tracing::debug!(key = %self.key, error = %e, "Cache backend read failed");
                return CacheLookup::Unavailable(e.to_string());
            }
        };

        match decode(&blob) {
            Ok(data) => {
                tracing::trace!(key = %self.key, bytes = blob.len(), "Cache hit");
                CacheLookup::Hit(data)
            }
            Err(reason) => self.discard(reason),
        }
    }

    fn discard(&self, reason: MalformedCache) -> CacheLookup {
        tracing::debug!(key = %self.key, %reason, "Discarding cache blob");
        if let Err(e) = self.backend.remove(&self.key) {
            tracing::debug!(key = %self.key, error = %e, "Failed to purge cache blob");
        }
        CacheLookup::Discarded(reason)
    }

    /// Persist `data`, stamping `last_update_time` with the current time.
    pub fn write(&self, data: &mut StatsCacheData) -> WriteOutcome {
        self.write_at(data, Utc::now())
    }

    /// Persist `data`, stamping `last_update_time` with `now`.
    ///
    /// On a quota failure the existing entry is purged so no outdated blob
    /// is served afterwards.
    pub fn write_at(&self, data: &mut StatsCacheData, now: DateTime<Utc>) -> WriteOutcome {
        data.last_update_time = now.timestamp_millis();

        let blob = match serde_json::to_string(data) {
            Ok(blob) => blob,
            Err(e) => {
                return WriteOutcome::Failed(StorageError::Backend(format!(
                    "failed to serialize cache: {e}"
                )));
            }
        };

        match self.backend.set(&self.key, &blob) {
            Ok(()) => {
                tracing::debug!(key = %self.key, bytes = blob.len(), "Wrote cache blob");
                WriteOutcome::Written { bytes: blob.len() }
            }
            Err(error) if error.is_quota_exceeded() => {
                let cleared = self.backend.remove(&self.key).is_ok();
                tracing::debug!(key = %self.key, %error, cleared, "Cache write over quota");
                WriteOutcome::QuotaExceeded { error, cleared }
            }
            Err(error) => {
                tracing::debug!(key = %self.key, %error, "Cache write failed");
                WriteOutcome::Failed(error)
            }
        }
    }

    /// Whether the cache needs recomputing, as of the current time.
    pub fn is_stale(&self, last_mutation: Option<DateTime<Utc>>) -> bool {
        self.is_stale_at(last_mutation, Utc::now())
    }

    /// Whether the cache needs recomputing as of `now`.
    ///
    /// True when nothing usable is stored, when `last_mutation` is newer than
    /// the last write, or when the blob's TTL has elapsed.
    pub fn is_stale_at(&self, last_mutation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self.read() {
            CacheLookup::Hit(data) => is_stale_data(&data, last_mutation, now),
            CacheLookup::Absent | CacheLookup::Discarded(_) | CacheLookup::Unavailable(_) => true,
        }
    }

    /// Serialize the cached blob as pretty JSON.
    pub fn export_snapshot(&self) -> Result<String, CacheError> {
        let data = self.read().into_data().ok_or(CacheError::NoCache)?;
        serde_json::to_string_pretty(&data)
            .map_err(|e| CacheError::Storage(StorageError::Backend(e.to_string())))
    }

    /// Validate and store an exported snapshot, stamped with the current time.
    pub fn import_snapshot(&self, blob: &str) -> Result<WriteOutcome, CacheError> {
        self.import_snapshot_at(blob, Utc::now())
    }

    /// Validate and store an exported snapshot, stamped with `now`.
    ///
    /// The existing cache is untouched when validation fails.
    pub fn import_snapshot_at(
        &self,
        blob: &str,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome, CacheError> {
        let mut data = validate_snapshot(blob)?;
        tracing::debug!(
            key = %self.key,
            months = data.monthly_stats.len(),
            "Importing cache snapshot"
        );
        Ok(self.write_at(&mut data, now))
    }

    /// Describe the slot as of the current time.
    pub fn info(&self) -> Result<CacheInfo, StorageError> {
        self.info_at(Utc::now())
    }

    /// Describe the slot as of `now`. Never modifies the backend.
    pub fn info_at(&self, now: DateTime<Utc>) -> Result<CacheInfo, StorageError> {
        let blob = self.backend.get(&self.key)?;
        let size = blob.as_ref().map_or(0, String::len);
        let data = blob.as_deref().and_then(|b| decode(b).ok());

        Ok(match data {
            Some(data) => CacheInfo {
                exists: true,
                size,
                last_update: data.last_update(),
                ttl: data.ttl,
                is_stale: data.is_expired_at(now),
            },
            None => CacheInfo {
                exists: false,
                size,
                last_update: None,
                ttl: self.ttl,
                is_stale: true,
            },
        })
    }

    /// Remove the slot.
    pub fn clear(&self) -> Result<(), StorageError> {
        tracing::debug!(key = %self.key, "Clearing cache");
        self.backend.remove(&self.key)
    }

    /// Serve the cache when fresh, otherwise recompute and store.
    ///
    /// `rebuild` runs at most once and only when the cache is missing, stale
    /// or discarded.
    pub fn get_or_rebuild<F>(
        &self,
        last_mutation: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        rebuild: F,
    ) -> Refresh
    where
        F: FnOnce() -> StatsCacheData,
    {
        let discarded = match self.read() {
            CacheLookup::Hit(data) if !is_stale_data(&data, last_mutation, now) => {
                return Refresh::Cached(data);
            }
            CacheLookup::Discarded(reason) => Some(reason),
            CacheLookup::Hit(_) | CacheLookup::Absent | CacheLookup::Unavailable(_) => None,
        };

        let mut data = rebuild();
        let write = self.write_at(&mut data, now);
        Refresh::Rebuilt {
            data,
            write,
            discarded,
        }
    }
}

fn is_stale_data(
    data: &StatsCacheData,
    last_mutation: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let mutated_since = last_mutation.map_or(false, |m| m.timestamp_millis() > data.last_update_time);
    mutated_since || data.is_expired_at(now)
}

/// Parse a stored blob, checking the schema version before the full shape.
fn decode(blob: &str) -> Result<StatsCacheData, MalformedCache> {
    let value: serde_json::Value =
        serde_json::from_str(blob).map_err(|e| MalformedCache::Parse(e.to_string()))?;

    let found = value
        .get("version")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| MalformedCache::Parse("missing numeric version".to_string()))?;
    let expected = i64::from(CURRENT_CACHE_VERSION);
    if found != expected {
        return Err(MalformedCache::VersionMismatch { found, expected });
    }

    serde_json::from_value(value).map_err(|e| MalformedCache::Parse(e.to_string()))
}

fn validate_snapshot(blob: &str) -> Result<StatsCacheData, CacheError> {
    let value: serde_json::Value = serde_json::from_str(blob)
        .map_err(|e| CacheError::InvalidSnapshot(format!("not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(CacheError::InvalidSnapshot(
            "snapshot must be a JSON object".to_string(),
        ));
    }
    for field in ["version", "monthlyStats", "overallStats"] {
        if value.get(field).map_or(true, serde_json::Value::is_null) {
            return Err(CacheError::InvalidSnapshot(format!(
                "missing required field `{field}`"
            )));
        }
    }

    let data: StatsCacheData = serde_json::from_value(value)
        .map_err(|e| CacheError::InvalidSnapshot(e.to_string()))?;
    if data.version != CURRENT_CACHE_VERSION {
        return Err(CacheError::InvalidSnapshot(format!(
            "unsupported version {} (expected {})",
            data.version, CURRENT_CACHE_VERSION
        )));
    }
    Ok(data)
}
