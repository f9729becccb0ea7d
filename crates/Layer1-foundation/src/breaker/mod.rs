//! Circuit breaker contract
//!
//! 상태 전이(closed → open → half-open)는 구현체 책임.
//! 엔진은 `is_closed()`만 읽고 `success()`/`failure()`만 보고함.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-endpoint breaker consumed by the fetch engine
pub trait CircuitBreaker: Send + Sync {
    /// `false` means the endpoint is assumed down and must not be called
    fn is_closed(&self) -> bool;

    fn success(&self);

    fn failure(&self);
}

/// Lookup of breakers by service name
pub trait BreakerRegistry: Send + Sync {
    fn breaker_for(&self, service_name: &str) -> Option<Arc<dyn CircuitBreaker>>;
}

// ============================================================================
// StaticBreakerRegistry
// ============================================================================

/// Registry backed by a fixed map, filled at startup
#[derive(Default)]
pub struct StaticBreakerRegistry {
    breakers: RwLock<HashMap<String, Arc<dyn CircuitBreaker>>>,
}

impl StaticBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    pub fn with(self, service_name: impl Into<String>, breaker: Arc<dyn CircuitBreaker>) -> Self {
        self.register(service_name, breaker);
        self
    }

    pub fn register(&self, service_name: impl Into<String>, breaker: Arc<dyn CircuitBreaker>) {
        self.breakers.write().insert(service_name.into(), breaker);
    }

    pub fn remove(&self, service_name: &str) -> Option<Arc<dyn CircuitBreaker>> {
        self.breakers.write().remove(service_name)
    }

    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl BreakerRegistry for StaticBreakerRegistry {
    fn breaker_for(&self, service_name: &str) -> Option<Arc<dyn CircuitBreaker>> {
        self.breakers.read().get(service_name).cloned()
    }
}

impl fmt::Debug for StaticBreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBreakerRegistry")
            .field("services", &self.services())
            .finish()
    }
}
