//! # refetch Cache Contract
//!
//! The fetch engine consumes a cache, it does not implement one. This module
//! holds the value type the engine reads and writes ([`CacheItem`] +
//! [`Payload`]), the storage contract ([`CacheStore`]) and a process-local
//! store for tests and single-process deployments.
//!
//! ## Lifecycle
//!
//! ```text
//!  get(key) ──► CacheItem ──► fresh?  ── yes ──► serve cached payload
//!                               │
//!                               no (stale / expired)
//!                               ▼
//!                      network refresh ── ok ──► new CacheItem ──► save()
//!                               │
//!                             error ──► serve seeded payload (stale or none)
//! ```
//!
//! ## Modules
//!
//! - [`item`] - Payload and CacheItem
//! - [`store`] - CacheStore trait, MemoryCacheStore
//! - [`util`] - Cache key hashing

pub mod item;
pub mod store;
pub mod util;

pub use item::{CacheItem, Payload};
pub use store::{CacheStore, MemoryCacheStore};
pub use util::{compute_hash, url_cache_key};
