//! # focus-stats-core
//!
//! Statistics engine for focus/rest timer records.
//!
//! This library provides:
//! - Record and rollup types ([`types`])
//! - Day, week, month, year and whole-history aggregation ([`analytics`])
//! - A date-sorted session index and query filters ([`index`], [`filter`])
//! - A versioned, TTL-bound cache over a key-value slot ([`cache`])
//! - SQLite persistence for that slot ([`db`])
//! - Configuration and logging infrastructure
//!
//! ## Architecture
//!
//! Raw records are always the source of truth. Aggregation is a pure function
//! of the records plus an explicit "today"; the cache only stores a derived,
//! rebuildable snapshot of those results.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use focus_stats_core::analytics::build_cache_data;
//! use focus_stats_core::{CacheStore, Config, SqliteStore};
//!
//! let config = Config::load().expect("failed to load config");
//! let store = SqliteStore::open(&Config::cache_db_path()).expect("failed to open cache");
//! store.migrate().expect("failed to run migrations");
//!
//! let cache = CacheStore::from_config(store, &config.cache);
//! let now = Utc::now();
//! let refresh = cache.get_or_rebuild(None, now, || {
//!     build_cache_data(&[], &[], now.date_naive(), now, config.cache.ttl_ms)
//! });
//! println!("{} months cached", refresh.data().monthly_stats.len());
//! ```

// Re-export commonly used items at the crate root
pub use cache::{CacheInfo, CacheLookup, CacheStore, KvStore, MemoryStore, Refresh, WriteOutcome};
pub use config::Config;
pub use db::SqliteStore;
pub use error::{CacheError, Error, MalformedCache, Result, StorageError};
pub use filter::{filter_records, filter_stats, StatsQuery};
pub use index::{build_session_index, SessionIndex};
pub use types::*;

// Public modules
pub mod analytics;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod index;
pub mod logging;
pub mod types;
