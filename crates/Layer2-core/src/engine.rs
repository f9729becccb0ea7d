//! # Fetch Engine
//!
//! 쿼리 배치를 캐시 + circuit breaker + 네트워크로 해결하여
//! 입력 순서대로 결과를 반환.
//!
//! ## 쿼리 하나의 흐름
//!
//! ```text
//! before hooks ─► cache.get(key) ─► fresh? ── yes ──► cached payload
//!                                     │
//!                                     no (stale / expired / none)
//!                                     ▼
//!                              breaker closed? ── no ──► cached payload or None
//!                                     │
//!                                    yes
//!                                     ▼
//!                  timeouts: stale → short, expired/none → long
//!                                     ▼
//!                             transport.request()  (배치 내 동시 실행)
//!                        ┌────────────┴────────────┐
//!                       ok                        error
//!                        ▼                          ▼
//!              cache.save + success     failure? → on_exception + breaker.failure
//!                                       tolerated? → Serve: cache + serve body
//! ```
//!
//! 개별 쿼리의 실패는 배치를 중단시키지 않음. Contract 에러만 `Err`로 전파.

use crate::error::FetchError;
use crate::hooks::BeforeQueryHooks;
use crate::monitoring::{Monitoring, TracingMonitor};
use crate::query::{Query, ToleratedResponse};
use crate::transport::{HttpTransport, RequestOptions};
use futures::future::join_all;
use refetch_foundation::{
    BreakerRegistry, CacheItem, CacheStore, CircuitBreaker, Error, Payload, Result,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Result slot of one query before transformation
#[derive(Debug)]
struct Slot {
    payload: Option<Payload>,
    dispatched: bool,
}

impl Slot {
    fn kept(payload: Option<Payload>) -> Self {
        Self {
            payload,
            dispatched: false,
        }
    }

    fn dispatched(payload: Option<Payload>) -> Self {
        Self {
            payload,
            dispatched: true,
        }
    }
}

/// Resolves batches of queries against cache, breakers and the network
pub struct FetchEngine {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<dyn CacheStore>,
    monitor: Arc<dyn Monitoring>,
    breakers: Option<Arc<dyn BreakerRegistry>>,
    hooks: BeforeQueryHooks,
}

impl FetchEngine {
    pub fn new(transport: Arc<dyn HttpTransport>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            transport,
            cache,
            monitor: Arc::new(TracingMonitor),
            breakers: None,
            hooks: BeforeQueryHooks::new(),
        }
    }

    pub fn with_monitoring(mut self, monitor: Arc<dyn Monitoring>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Breakers for queries that do not carry their own
    pub fn with_breakers(mut self, registry: Arc<dyn BreakerRegistry>) -> Self {
        self.breakers = Some(registry);
        self
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn monitoring(&self) -> &Arc<dyn Monitoring> {
        &self.monitor
    }

    // ========================================================================
    // Before-query hooks
    // ========================================================================

    /// Modify every query of type `Q` right before it is resolved
    pub fn before_query<Q, F>(&mut self, f: F) -> &mut Self
    where
        Q: Query,
        F: Fn(&mut Q) + Send + Sync + 'static,
    {
        self.hooks.for_type::<Q, F>(f);
        self
    }

    pub fn before_any_query<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut dyn Query) + Send + Sync + 'static,
    {
        self.hooks.for_any(f);
        self
    }

    pub fn before_query_matching<P, F>(&mut self, predicate: P, f: F) -> &mut Self
    where
        P: Fn(&dyn Query) -> bool + Send + Sync + 'static,
        F: Fn(&mut dyn Query) + Send + Sync + 'static,
    {
        self.hooks.for_matching(predicate, f);
        self
    }

    // ========================================================================
    // Fetch
    // ========================================================================

    /// Transformed results, index-aligned with `queries`
    pub async fn fetch(&self, queries: Vec<Box<dyn Query>>) -> Result<Vec<Option<Value>>> {
        let (queries, payloads) = self.resolve_batch(queries).await?;
        Ok(queries
            .iter()
            .zip(payloads)
            .map(|(query, payload)| query.transform(payload.as_ref()))
            .collect())
    }

    /// Untransformed payloads, index-aligned with `queries`
    pub async fn fetch_raw(&self, queries: Vec<Box<dyn Query>>) -> Result<Vec<Option<Payload>>> {
        let (_, payloads) = self.resolve_batch(queries).await?;
        Ok(payloads)
    }

    pub async fn fetch_one(&self, query: Box<dyn Query>) -> Result<Option<Value>> {
        let mut results = self.fetch(vec![query]).await?;
        Ok(results.pop().flatten())
    }

    async fn resolve_batch(
        &self,
        mut queries: Vec<Box<dyn Query>>,
    ) -> Result<(Vec<Box<dyn Query>>, Vec<Option<Payload>>)> {
        for query in queries.iter_mut() {
            self.hooks.apply(query.as_mut());
        }

        let outcomes = join_all(queries.iter().map(|query| self.resolve_one(query.as_ref()))).await;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut payloads = Vec::with_capacity(queries.len());
        let mut contract_error = None;

        for (query, outcome) in queries.iter().zip(outcomes) {
            match outcome {
                Ok(slot) => {
                    if slot.dispatched {
                        *counts.entry(query.service_name().to_string()).or_insert(0) += 1;
                    }
                    payloads.push(slot.payload);
                }
                Err(err) => {
                    // 호출은 됐으므로 카운트에 포함
                    *counts.entry(query.service_name().to_string()).or_insert(0) += 1;
                    contract_error.get_or_insert(err);
                    payloads.push(None);
                }
            }
        }

        self.monitor.apis_called(&counts);

        if let Some(err) = contract_error {
            return Err(err);
        }

        info!(
            queries = queries.len(),
            dispatched = counts.values().sum::<usize>(),
            "batch resolved"
        );
        Ok((queries, payloads))
    }

    async fn resolve_one(&self, query: &dyn Query) -> Result<Slot> {
        let key = query.cache_key();
        let item = match self.cache.get(&key).await {
            Ok(item) => item,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                CacheItem::empty(key.as_str())
            }
        };

        let expired = item.is_expired();
        let stale = item.is_stale();
        let seeded = item.into_data();

        if !expired && !stale {
            debug!("Cache hit (fresh) for {}", query.url());
            return Ok(Slot::kept(seeded));
        }

        let breaker = self.breaker_for(query);
        if let Some(breaker) = &breaker {
            if !breaker.is_closed() {
                debug!("Breaker open for {}, serving cached value", query.service_name());
                return Ok(Slot::kept(seeded));
            }
        }

        let timeouts = if stale && !expired {
            query.short_timeouts()
        } else {
            query.long_timeouts()
        };
        let options = RequestOptions::new(timeouts).with_headers(query.request_headers());
        let options = query.override_request_options(options);

        let url = query.url();
        debug!("Refreshing {} ({})", url, if stale { "stale" } else { "expired" });

        let started = Instant::now();
        let result = self.transport.request(query.method(), &url, &options).await;
        let elapsed = started.elapsed().as_millis() as u64;

        match result {
            Ok(payload) => {
                self.record_latency(query, elapsed);
                self.store(query, &key, &payload).await;
                if let Some(breaker) = &breaker {
                    breaker.success();
                }
                Ok(Slot::dispatched(Some(payload)))
            }
            Err(FetchError::Contract(msg)) => Err(Error::Contract(msg)),
            Err(err) => {
                let millis = if err.is_connect_level() {
                    options.timeouts.total_ms
                } else {
                    elapsed
                };
                self.record_latency(query, millis);
                let payload = self
                    .handle_error(query, &key, seeded, err, breaker.as_deref())
                    .await;
                Ok(Slot::dispatched(payload))
            }
        }
    }

    async fn handle_error(
        &self,
        query: &dyn Query,
        key: &str,
        seeded: Option<Payload>,
        err: FetchError,
        breaker: Option<&dyn CircuitBreaker>,
    ) -> Option<Payload> {
        let failure = query.is_failure(&err);

        if failure || err.is_transport() {
            self.monitor.on_exception(query, &err);
        }

        if failure {
            warn!("Refresh of {} failed: {}", query.url(), err);
            if let Some(breaker) = breaker {
                breaker.failure();
            }
            return seeded;
        }

        // 실패로 분류되지 않은 응답은 정상 응답으로 취급
        if let Some(breaker) = breaker {
            breaker.success();
        }

        match (err, query.tolerated_response()) {
            (FetchError::Status { payload, .. }, ToleratedResponse::Serve) => {
                debug!("Serving tolerated {} from {}", payload.status, query.url());
                self.store(query, key, &payload).await;
                Some(payload)
            }
            _ => seeded,
        }
    }

    /// Replace the cache item wholesale when the query and response allow it
    async fn store(&self, query: &dyn Query, key: &str, payload: &Payload) {
        if !query.can_cache() {
            return;
        }

        let cache_control = payload.cache_control();
        let Some(ages) = query.cache_ages(cache_control.as_deref()) else {
            debug!("Not caching {}: no-cache", query.url());
            return;
        };

        let mut item = CacheItem::empty(key);
        item.set_data(payload.clone());
        item.set_best_before(ages.stale_age);
        item.set_lifetime(ages.max_age);

        if let Err(e) = self.cache.save(item).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    fn record_latency(&self, query: &dyn Query, millis: u64) {
        self.monitor.response_time(query, millis);
        if millis >= query.slow_threshold().as_millis() as u64 {
            self.monitor.slow_response(query, millis);
        }
    }

    fn breaker_for(&self, query: &dyn Query) -> Option<Arc<dyn CircuitBreaker>> {
        query.circuit_breaker().or_else(|| {
            self.breakers
                .as_ref()
                .and_then(|registry| registry.breaker_for(query.service_name()))
        })
    }
}

impl fmt::Debug for FetchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchEngine")
            .field("has_breakers", &self.breakers.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}
