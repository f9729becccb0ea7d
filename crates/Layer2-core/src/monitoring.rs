//! Monitoring delegate
//!
//! 엔진이 호출 횟수, 응답 시간, 느린 응답, 예외를 보고하는 대상.
//! 메트릭 백엔드가 없으면 [`TracingMonitor`]로 로그만 남김.

use crate::error::FetchError;
use crate::query::Query;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Receiver of per-batch and per-request measurements
pub trait Monitoring: Send + Sync {
    /// Network calls dispatched by one batch, per service name
    ///
    /// Called exactly once per batch, with an empty map when nothing was
    /// dispatched.
    fn apis_called(&self, counts: &BTreeMap<String, usize>);

    fn response_time(&self, query: &dyn Query, millis: u64);

    /// Called in addition to `response_time` when `millis` reaches the
    /// query's slow threshold
    fn slow_response(&self, query: &dyn Query, millis: u64);

    fn on_exception(&self, query: &dyn Query, error: &FetchError);
}

/// Monitor that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl Monitoring for NoopMonitor {
    fn apis_called(&self, _counts: &BTreeMap<String, usize>) {}
    fn response_time(&self, _query: &dyn Query, _millis: u64) {}
    fn slow_response(&self, _query: &dyn Query, _millis: u64) {}
    fn on_exception(&self, _query: &dyn Query, _error: &FetchError) {}
}

/// Monitor that emits structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitor;

impl Monitoring for TracingMonitor {
    fn apis_called(&self, counts: &BTreeMap<String, usize>) {
        let total: usize = counts.values().sum();
        info!(total, ?counts, "apis called");
    }

    fn response_time(&self, query: &dyn Query, millis: u64) {
        tracing::debug!(
            service = query.service_name(),
            url = %query.url(),
            millis,
            "response time"
        );
    }

    fn slow_response(&self, query: &dyn Query, millis: u64) {
        warn!(
            service = query.service_name(),
            url = %query.url(),
            millis,
            threshold = query.slow_threshold().as_millis() as u64,
            "slow response"
        );
    }

    fn on_exception(&self, query: &dyn Query, error: &FetchError) {
        warn!(
            service = query.service_name(),
            url = %query.url(),
            error = %error,
            "upstream request failed"
        );
    }
}
