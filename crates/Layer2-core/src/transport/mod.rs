//! HTTP transport contract
//!
//! 엔진은 전송 계층을 직접 구현하지 않음. `HttpTransport` 구현체를 주입받음.
//!
//! - [`ReqwestTransport`] - 실제 네트워크 (reqwest)
//! - [`MockTransport`] - 테스트용 FIFO 응답 큐

mod http_client;
pub mod mock;

pub use http_client::ReqwestTransport;
pub use mock::{MockResponse, MockTransport, RecordedRequest};

use crate::error::FetchError;
use async_trait::async_trait;
use refetch_foundation::{Payload, Timeouts};
use reqwest::Method;
use std::collections::BTreeMap;

/// Options of a single request, computed by the engine and then handed to
/// the query for a last override
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub timeouts: Timeouts,
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn new(timeouts: Timeouts) -> Self {
        Self {
            timeouts,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Async HTTP client used by the fetch engine
///
/// A non-2xx response is returned as [`FetchError::Status`] with the full
/// payload. Implementations must honour both `options.timeouts` bounds.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Payload, FetchError>;
}
