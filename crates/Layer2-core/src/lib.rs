//! refetch-core: Fetch runtime for refetch
//!
//! Layer2 - 쿼리 실행 레이어
//!
//! # 주요 모듈
//!
//! - `query`: Query 계약, HttpQuery, 캐시 수명 (Cache-Control)
//! - `transport`: HTTP 전송 계약 (reqwest / mock)
//! - `engine`: 캐시 + circuit breaker + 네트워크로 배치 해결
//! - `resolver`: 구조적 중복 제거 + 결과 모양 복원
//! - `hooks`: before-query 훅 (타입 / predicate)
//! - `monitoring`: 호출 수, 응답 시간, 예외 보고
//!
//! # 사용 예시
//!
//! ```ignore
//! use refetch_core::{DedupResolver, FetchEngine, HttpQuery, ReqwestTransport};
//! use refetch_foundation::MemoryCacheStore;
//!
//! let engine = FetchEngine::new(
//!     Arc::new(ReqwestTransport::default()),
//!     Arc::new(MemoryCacheStore::new()),
//! );
//!
//! // 단일 쿼리
//! let query = HttpQuery::new("programmes", "http://example.com/programmes.json")?
//!     .param("pid", "b006q2x0");
//! let result = engine.fetch_one(Box::new(query)).await?;
//!
//! // 중복 제거 배치
//! let resolver = DedupResolver::new(Arc::new(engine));
//! let results = resolver.resolve(vec![a.into(), vec![b, c].into()]).await?;
//! ```

pub mod engine;
pub mod error;
pub mod hooks;
pub mod monitoring;
pub mod query;
pub mod resolver;
pub mod transport;

// Re-exports: Error
pub use error::FetchError;

// Re-exports: Query
pub use query::{
    CacheAges, CacheControl, CacheLifetime, FailureClassifier, HttpQuery, Parameters,
    PayloadTransform, Query, QueryKey, ToleratedResponse, DEFAULT_SLOW_THRESHOLD,
};

// Re-exports: Transport
pub use transport::{
    HttpTransport, MockResponse, MockTransport, RecordedRequest, RequestOptions, ReqwestTransport,
};

// Re-exports: Engine / Resolver
pub use engine::FetchEngine;
pub use hooks::BeforeQueryHooks;
pub use monitoring::{Monitoring, NoopMonitor, TracingMonitor};
pub use resolver::{DedupResolver, NamedQuery, Requirement, Resolved};
