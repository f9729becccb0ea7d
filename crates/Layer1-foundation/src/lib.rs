//! # refetch-foundation
//!
//! Foundation layer for refetch:
//! - Error: 공통 에러 타입 (`Error`, `Result`)
//! - Config: fetch 설정 (`FetchConfig`, `Environment`, `Timeouts`)
//! - Cache: 캐시 아이템 + 저장소 계약 (`CacheItem`, `CacheStore`)
//! - Breaker: circuit breaker 계약 + 서비스별 레지스트리
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  refetch-core (Query, FetchEngine, Resolver) │
//! │                     │                        │
//! │        ┌────────────┼─────────────┐          │
//! │        ▼            ▼             ▼          │
//! │   CacheStore   CircuitBreaker  FetchConfig   │
//! │   (get/save)   (closed?/report) (defaults)   │
//! └──────────────────────────────────────────────┘
//! ```

pub mod breaker;
pub mod cache;
pub mod config;
pub mod error;
pub mod naming;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    global_config_path, project_config_path, Environment, FetchConfig, Timeouts,
    FETCH_CONFIG_FILE, PROJECT_CONFIG_DIR,
};

// ============================================================================
// Cache (캐시 계약)
// ============================================================================
pub use cache::{url_cache_key, CacheItem, CacheStore, MemoryCacheStore, Payload};

// ============================================================================
// Breaker
// ============================================================================
pub use breaker::{BreakerRegistry, CircuitBreaker, StaticBreakerRegistry};

pub use naming::validate_service_name;
