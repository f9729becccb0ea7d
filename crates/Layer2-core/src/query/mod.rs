//! # Query contract
//!
//! 하나의 업스트림 엔드포인트 호출을 설명하는 단위.
//! URL, 캐시 키, 타임아웃, 캐시 수명, 실패 분류, payload 변환을 담당.
//!
//! 직접 구현하려면 `service_name`, `url`, `as_any`, `as_any_mut`만 필요.
//! 나머지는 모두 기본값이 있음.
//!
//! - [`HttpQuery`] - 설정 가능한 범용 구현
//! - [`CacheLifetime`] / [`CacheControl`] - 캐시 수명 결정

mod http;
mod lifetime;
mod params;

pub use http::{FailureClassifier, HttpQuery, PayloadTransform};
pub use lifetime::{CacheAges, CacheControl, CacheLifetime};
pub use params::Parameters;

use crate::error::FetchError;
use crate::transport::RequestOptions;
use refetch_foundation::{url_cache_key, CircuitBreaker, Payload, Timeouts};
use reqwest::Method;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default slow-response threshold
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(3000);

/// What to do with an error response the query does not classify as a failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToleratedResponse {
    /// Treat the body like a success: cache it and serve it
    #[default]
    Serve,
    /// Keep the cached value (or no data) for this slot
    Discard,
}

/// One call to an upstream web service
pub trait Query: Any + Send + Sync + fmt::Debug {
    /// Breaker and monitoring key, `[a-z0-9-_]+`
    fn service_name(&self) -> &str;

    /// Fully resolved URL including the query string
    fn url(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn cache_key(&self) -> String {
        url_cache_key(&self.url())
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn request_headers(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Last word on the request options, applied after the engine's own
    fn override_request_options(&self, options: RequestOptions) -> RequestOptions {
        options
    }

    /// Used when refreshing a stale item
    fn short_timeouts(&self) -> Timeouts {
        Timeouts::short_default()
    }

    /// Used when nothing usable is cached
    fn long_timeouts(&self) -> Timeouts {
        Timeouts::long_default()
    }

    fn slow_threshold(&self) -> Duration {
        DEFAULT_SLOW_THRESHOLD
    }

    fn cache_lifetime(&self) -> CacheLifetime {
        CacheLifetime::default()
    }

    /// `(stale_age, max_age)` for a response, `None` when it must not be cached
    fn cache_ages(&self, cache_control: Option<&str>) -> Option<CacheAges> {
        self.cache_lifetime().ages_for(cache_control)
    }

    /// Whether any caching, even forced, is allowed
    fn can_cache(&self) -> bool {
        true
    }

    /// Failures trip the breaker and are reported to monitoring
    fn is_failure(&self, _error: &FetchError) -> bool {
        true
    }

    fn tolerated_response(&self) -> ToleratedResponse {
        ToleratedResponse::default()
    }

    /// Breaker owned by the query; `None` defers to the engine's registry
    fn circuit_breaker(&self) -> Option<Arc<dyn CircuitBreaker>> {
        None
    }

    /// Turn the slot's payload into the caller facing result
    ///
    /// Default: the body parsed as JSON, or the body as a JSON string when it
    /// is not JSON. No payload stays `None`.
    fn transform(&self, payload: Option<&Payload>) -> Option<Value> {
        payload.map(|payload| {
            serde_json::from_str(&payload.body).unwrap_or_else(|_| Value::String(payload.body.clone()))
        })
    }
}

// ============================================================================
// Structural identity
// ============================================================================

/// Identity used for de-duplication: equal keys mean the same upstream call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub service_name: String,
    pub url: String,
}

impl QueryKey {
    pub fn of(query: &dyn Query) -> Self {
        Self {
            service_name: query.service_name().to_string(),
            url: query.url(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.service_name, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Bare {
        url: &'static str,
    }

    impl Query for Bare {
        fn service_name(&self) -> &str {
            "bare"
        }
        fn url(&self) -> String {
            self.url.to_string()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_defaults() {
        let query = Bare { url: "http://localhost/a" };
        assert_eq!(query.method(), Method::GET);
        assert_eq!(query.short_timeouts(), Timeouts::short_default());
        assert_eq!(query.long_timeouts(), Timeouts::long_default());
        assert_eq!(query.slow_threshold(), Duration::from_millis(3000));
        assert!(query.can_cache());
        assert!(query.is_failure(&FetchError::Timeout(1)));
        assert_eq!(query.tolerated_response(), ToleratedResponse::Serve);
        assert!(query.circuit_breaker().is_none());
        assert_eq!(query.cache_key(), url_cache_key("http://localhost/a"));
        assert_eq!(
            query.cache_ages(None),
            Some(CacheAges {
                stale_age: 60,
                max_age: 300
            })
        );
    }

    #[test]
    fn test_default_transform() {
        let query = Bare { url: "http://localhost/a" };
        assert_eq!(query.transform(None), None);
        assert_eq!(
            query.transform(Some(&Payload::ok("{\"n\":1}"))),
            Some(serde_json::json!({"n": 1}))
        );
        assert_eq!(
            query.transform(Some(&Payload::ok("plain"))),
            Some(Value::String("plain".into()))
        );
    }

    #[test]
    fn test_structural_identity() {
        let a = Bare { url: "http://localhost/a" };
        let b = Bare { url: "http://localhost/a" };
        let c = Bare { url: "http://localhost/c" };

        assert_eq!(QueryKey::of(&a), QueryKey::of(&b));
        assert_ne!(QueryKey::of(&a), QueryKey::of(&c));
    }
}
