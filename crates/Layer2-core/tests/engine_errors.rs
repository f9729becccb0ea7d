//! Fetch engine 에러 처리 통합 테스트
//!
//! `cargo test -p refetch-core --test engine_errors`

mod common;

use common::{boxed, programmes, seed_stale, Harness, TrippingBreaker};
use refetch_core::{FetchError, MockResponse, Query, ToleratedResponse};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_stale_item_survives_server_error() {
    let h = Harness::new(vec![MockResponse::status(500, "oops")]);
    let breaker = Arc::new(TrippingBreaker::new(5));
    let query = programmes("b006q2x0").breaker(breaker.clone());
    let key = query.cache_key();
    seed_stale(&h.cache, &query, "{\"old\":true}");
    let before = h.cache.peek(&key).unwrap();

    let result = h.engine.fetch_one(boxed(query)).await.expect("fetch failed");

    assert_eq!(result, Some(json!({"old": true})));
    assert_eq!(h.cache.peek(&key).unwrap(), before);
    assert_eq!(breaker.failure_count(), 1);
    assert_eq!(breaker.success_count(), 0);
    assert_eq!(h.monitor.exception_count(), 1);
    assert_eq!(h.monitor.exceptions.lock()[0].1.status(), Some(500));
}

#[tokio::test]
async fn test_connect_failure_without_cache_yields_none() {
    let h = Harness::new(vec![MockResponse::connect_error()]);

    let result = h
        .engine
        .fetch_one(boxed(programmes("b006q2x0")))
        .await
        .expect("single failure never aborts");

    assert_eq!(result, None);
    assert_eq!(h.monitor.exception_count(), 1);
    // 연결 실패는 실제 사용된 total timeout으로 기록 (long: 10s)
    assert_eq!(h.monitor.response_millis(), vec![10_000]);
    assert_eq!(h.monitor.slow_count(), 1);
}

#[tokio::test]
async fn test_connect_failure_on_stale_records_short_timeout() {
    let h = Harness::new(vec![MockResponse::error(FetchError::Timeout(3000))]);
    let query = programmes("b006q2x0");
    seed_stale(&h.cache, &query, "{\"old\":true}");

    let result = h.engine.fetch_one(boxed(query)).await.expect("fetch failed");

    assert_eq!(result, Some(json!({"old": true})));
    assert_eq!(h.monitor.response_millis(), vec![3000]);
}

#[tokio::test]
async fn test_tolerated_status_is_served_and_cached() {
    let h = Harness::new(vec![MockResponse::status(404, "{\"error\":\"not found\"}")]);
    let breaker = Arc::new(TrippingBreaker::new(5));
    let query = programmes("missing")
        .tolerate_statuses([404])
        .breaker(breaker.clone());
    let key = query.cache_key();

    let result = h.engine.fetch_one(boxed(query)).await.expect("fetch failed");

    assert_eq!(result, Some(json!({"error": "not found"})));
    let stored = h.cache.peek(&key).expect("tolerated body cached");
    assert_eq!(stored.data().unwrap().status, 404);
    assert_eq!(breaker.success_count(), 1);
    assert_eq!(breaker.failure_count(), 0);
    assert_eq!(h.monitor.exception_count(), 0);
}

#[tokio::test]
async fn test_tolerated_status_can_be_discarded() {
    let h = Harness::new(vec![MockResponse::status(404, "{}")]);
    let query = programmes("missing")
        .tolerate_statuses([404])
        .tolerated(ToleratedResponse::Discard);
    let key = query.cache_key();
    seed_stale(&h.cache, &query, "{\"old\":true}");

    let result = h.engine.fetch_one(boxed(query)).await.expect("fetch failed");

    assert_eq!(result, Some(json!({"old": true})));
    assert_eq!(h.cache.peek(&key).unwrap().data().unwrap().body, "{\"old\":true}");
    assert_eq!(h.monitor.exception_count(), 0);
}

#[tokio::test]
async fn test_untolerated_client_error_is_failure() {
    let h = Harness::new(vec![MockResponse::status(404, "{}")]);
    let breaker = Arc::new(TrippingBreaker::new(5));
    let query = programmes("missing").breaker(breaker.clone());
    let key = query.cache_key();

    let result = h.engine.fetch_one(boxed(query)).await.expect("fetch failed");

    assert_eq!(result, None);
    assert!(!h.cache.contains(&key));
    assert_eq!(breaker.failure_count(), 1);
    assert_eq!(h.monitor.exception_count(), 1);
}

#[tokio::test]
async fn test_transport_error_always_reported() {
    // 실패로 분류하지 않아도 transport 에러는 monitoring에 보고
    let h = Harness::new(vec![MockResponse::connect_error()]);
    let breaker = Arc::new(TrippingBreaker::new(5));
    let query = programmes("b006q2x0")
        .failure_classifier(|_| false)
        .breaker(breaker.clone());

    h.engine.fetch_one(boxed(query)).await.expect("fetch failed");

    assert_eq!(h.monitor.exception_count(), 1);
    assert_eq!(breaker.failure_count(), 0);
}

#[tokio::test]
async fn test_failure_does_not_affect_siblings() {
    let h = Harness::new(vec![
        MockResponse::ok("{\"n\":1}"),
        MockResponse::status(503, "down"),
        MockResponse::ok("{\"n\":3}"),
    ]);

    let results = h
        .engine
        .fetch(vec![
            boxed(programmes("one")),
            boxed(programmes("two")),
            boxed(programmes("three")),
        ])
        .await
        .expect("batch survives");

    assert_eq!(results, vec![Some(json!({"n": 1})), None, Some(json!({"n": 3}))]);
    assert_eq!(h.monitor.last_apis_called().unwrap()["mock-programmes"], 3);
}

#[tokio::test]
async fn test_exhausted_mock_aborts_batch() {
    let h = Harness::new(vec![MockResponse::ok("{}")]);

    let err = h
        .engine
        .fetch(vec![boxed(programmes("one")), boxed(programmes("two"))])
        .await
        .expect_err("contract error propagates");

    assert!(err.is_contract());
    assert_eq!(h.monitor.apis_called.lock().len(), 1);
}
