//! Cache item - 응답 payload + 수명 정보

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw upstream response as stored in the cache
///
/// `status` is kept alongside the headers so transforms can tell a tolerated
/// error body (e.g. a 404) from a regular 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub body: String,
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
}

impl Payload {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status,
            headers: BTreeMap::new(),
        }
    }

    /// 200 OK 응답
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// All values of a header, matched case-insensitively
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
            .collect()
    }

    /// First value of a header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).into_iter().next()
    }

    /// Cache-Control 값 (여러 줄이면 ", "로 합침)
    pub fn cache_control(&self) -> Option<String> {
        let values = self.header_values("cache-control");
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// Cache Item
// ============================================================================

/// One cache slot, keyed by a query's cache key
///
/// Freshness is derived from `stored_at`:
/// - fresh: `now < stored_at + best_before`
/// - stale: `stored_at + best_before <= now < stored_at + lifetime`
/// - expired: no data, or `now >= stored_at + lifetime`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheItem {
    key: String,
    data: Option<Payload>,
    stored_at: Option<DateTime<Utc>>,
    best_before_secs: u64,
    lifetime_secs: u64,
}

impl CacheItem {
    /// 비어있는 아이템 (항상 expired)
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: None,
            stored_at: None,
            best_before_secs: 0,
            lifetime_secs: 0,
        }
    }

    /// Item with an explicit store time, mainly for seeding stores
    pub fn stored(
        key: impl Into<String>,
        payload: Payload,
        stored_at: DateTime<Utc>,
        best_before_secs: u64,
        lifetime_secs: u64,
    ) -> Self {
        Self {
            key: key.into(),
            data: Some(payload),
            stored_at: Some(stored_at),
            best_before_secs,
            lifetime_secs,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Payload> {
        self.data
    }

    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        self.stored_at
    }

    pub fn best_before(&self) -> u64 {
        self.best_before_secs
    }

    pub fn lifetime(&self) -> u64 {
        self.lifetime_secs
    }

    /// payload 교체 + 저장 시각 갱신
    pub fn set_data(&mut self, payload: Payload) {
        self.data = Some(payload);
        self.stored_at = Some(Utc::now());
    }

    pub fn set_best_before(&mut self, secs: u64) {
        self.best_before_secs = secs;
    }

    pub fn set_lifetime(&mut self, secs: u64) {
        self.lifetime_secs = secs;
    }

    // ========================================================================
    // 상태 판정
    // ========================================================================

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    pub fn is_fresh(&self) -> bool {
        !self.is_expired() && !self.is_stale()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.data, self.stored_at) {
            (Some(_), Some(stored_at)) => now >= deadline(stored_at, self.lifetime_secs),
            _ => true,
        }
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.data, self.stored_at) {
            (Some(_), Some(stored_at)) => {
                now >= deadline(stored_at, self.best_before_secs)
                    && now < deadline(stored_at, self.lifetime_secs)
            }
            _ => false,
        }
    }
}

/// 100년 상한 (chrono 범위 초과 방지)
const MAX_AGE_SECS: u64 = 100 * 365 * 24 * 60 * 60;

fn deadline(stored_at: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    let offset = ChronoDuration::seconds(secs.min(MAX_AGE_SECS) as i64);
    stored_at
        .checked_add_signed(offset)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
