//! 통합 테스트 공용 헬퍼 - 기록용 monitor, 테스트 breaker, 캐시 seed

#![allow(dead_code)]

use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use refetch_core::{FetchEngine, FetchError, HttpQuery, MockResponse, MockTransport, Monitoring, Query};
use refetch_foundation::{CacheItem, CircuitBreaker, MemoryCacheStore, Payload};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// RecordingMonitor
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    pub service: String,
    pub url: String,
    pub millis: u64,
}

#[derive(Debug, Default)]
pub struct RecordingMonitor {
    pub apis_called: Mutex<Vec<BTreeMap<String, usize>>>,
    pub response_times: Mutex<Vec<Timing>>,
    pub slow_responses: Mutex<Vec<Timing>>,
    pub exceptions: Mutex<Vec<(String, FetchError)>>,
}

impl RecordingMonitor {
    pub fn last_apis_called(&self) -> Option<BTreeMap<String, usize>> {
        self.apis_called.lock().last().cloned()
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.lock().len()
    }

    pub fn response_millis(&self) -> Vec<u64> {
        self.response_times.lock().iter().map(|t| t.millis).collect()
    }

    pub fn slow_count(&self) -> usize {
        self.slow_responses.lock().len()
    }
}

fn timing(query: &dyn Query, millis: u64) -> Timing {
    Timing {
        service: query.service_name().to_string(),
        url: query.url(),
        millis,
    }
}

impl Monitoring for RecordingMonitor {
    fn apis_called(&self, counts: &BTreeMap<String, usize>) {
        self.apis_called.lock().push(counts.clone());
    }

    fn response_time(&self, query: &dyn Query, millis: u64) {
        self.response_times.lock().push(timing(query, millis));
    }

    fn slow_response(&self, query: &dyn Query, millis: u64) {
        self.slow_responses.lock().push(timing(query, millis));
    }

    fn on_exception(&self, query: &dyn Query, error: &FetchError) {
        self.exceptions
            .lock()
            .push((query.service_name().to_string(), error.clone()));
    }
}

// ============================================================================
// TrippingBreaker
// ============================================================================

/// Opens after `threshold` consecutive failures; a success resets the count
#[derive(Debug)]
pub struct TrippingBreaker {
    threshold: usize,
    consecutive: AtomicUsize,
    open: AtomicBool,
    pub successes: AtomicUsize,
    pub failures: AtomicUsize,
}

impl TrippingBreaker {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            consecutive: AtomicUsize::new(0),
            open: AtomicBool::new(false),
            successes: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn opened() -> Self {
        let breaker = Self::new(5);
        breaker.open.store(true, Ordering::SeqCst);
        breaker
    }

    pub fn success_count(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

impl CircuitBreaker for TrippingBreaker {
    fn is_closed(&self) -> bool {
        !self.open.load(Ordering::SeqCst)
    }

    fn success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
        self.consecutive.store(0, Ordering::SeqCst);
    }

    fn failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        let consecutive = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
        if consecutive >= self.threshold {
            self.open.store(true, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub engine: FetchEngine,
    pub mock: Arc<MockTransport>,
    pub cache: Arc<MemoryCacheStore>,
    pub monitor: Arc<RecordingMonitor>,
}

impl Harness {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        let mock = Arc::new(MockTransport::with_responses(responses));
        let cache = Arc::new(MemoryCacheStore::new());
        let monitor = Arc::new(RecordingMonitor::default());
        let engine = FetchEngine::new(mock.clone(), cache.clone()).with_monitoring(monitor.clone());
        Self {
            engine,
            mock,
            cache,
            monitor,
        }
    }
}

pub fn programmes(pid: &str) -> HttpQuery {
    HttpQuery::new("mock-programmes", "http://example.com/programmes.json")
        .expect("valid query")
        .param("pid", pid)
}

pub fn boxed(query: HttpQuery) -> Box<dyn Query> {
    Box::new(query)
}

/// Seed an item stored `ago_secs` seconds ago with the default 60/300 ages
pub fn seed(cache: &MemoryCacheStore, query: &dyn Query, body: &str, ago_secs: i64) {
    cache.insert(CacheItem::stored(
        query.cache_key(),
        Payload::ok(body),
        Utc::now() - ChronoDuration::seconds(ago_secs),
        60,
        300,
    ));
}

pub fn seed_fresh(cache: &MemoryCacheStore, query: &dyn Query, body: &str) {
    seed(cache, query, body, 5);
}

pub fn seed_stale(cache: &MemoryCacheStore, query: &dyn Query, body: &str) {
    seed(cache, query, body, 120);
}

pub fn seed_expired(cache: &MemoryCacheStore, query: &dyn Query, body: &str) {
    seed(cache, query, body, 600);
}
