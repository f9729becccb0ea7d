//! Cache store contract + in-memory implementation
//!
//! 엔진은 저장소의 영속화/만료 정책을 알지 못함. get/save만 사용.

use super::item::CacheItem;
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage backend consumed by the fetch engine
///
/// `get` never fails for a missing key: it returns [`CacheItem::empty`],
/// which reports itself as expired. Implementations must be safe to share
/// between concurrent batches.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<CacheItem>;

    /// Replace the item stored under `item.key()` wholesale
    async fn save(&self, item: CacheItem) -> Result<()>;
}

/// Process-local store without eviction
///
/// Items live until overwritten or [`MemoryCacheStore::clear`]ed; expiry is
/// only ever evaluated by the reader.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    items: RwLock<HashMap<String, CacheItem>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 동기 삽입 (테스트 seed 용)
    pub fn insert(&self, item: CacheItem) {
        self.items.write().insert(item.key().to_string(), item);
    }

    /// Read without going through the async contract
    pub fn peek(&self, key: &str) -> Option<CacheItem> {
        self.items.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn clear(&self) {
        self.items.write().clear();
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<CacheItem> {
        Ok(self
            .peek(key)
            .unwrap_or_else(|| CacheItem::empty(key)))
    }

    async fn save(&self, item: CacheItem) -> Result<()> {
        self.insert(item);
        Ok(())
    }
}
