//! Mock transport - 테스트용 FIFO 응답 큐
//!
//! 요청 순서대로 큐에서 응답을 꺼냄. 큐가 비면 Contract 에러로 배치 전체 중단.

use super::{HttpTransport, RequestOptions};
use crate::error::FetchError;
use async_trait::async_trait;
use parking_lot::Mutex;
use refetch_foundation::Payload;
use reqwest::Method;
use std::collections::VecDeque;
use std::time::Duration;

/// One canned answer
#[derive(Debug, Clone)]
pub struct MockResponse {
    outcome: Result<Payload, FetchError>,
    delay: Option<Duration>,
}

impl MockResponse {
    /// 200 with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    /// Any status; non-2xx is delivered as [`FetchError::Status`]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::payload(Payload::new(status, body))
    }

    pub fn payload(payload: Payload) -> Self {
        Self {
            outcome: Ok(payload),
            delay: None,
        }
    }

    pub fn error(error: FetchError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
        }
    }

    /// Connection refused
    pub fn connect_error() -> Self {
        Self::error(FetchError::Connect("connection refused".to_string()))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.outcome = self
            .outcome
            .map(|payload| payload.with_header(name, value));
        self
    }

    /// Delay the answer; a delay beyond the total timeout yields a timeout
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request the mock received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub options: RequestOptions,
}

/// Transport answering from a queue of [`MockResponse`]s
#[derive(Debug, Default)]
pub struct MockTransport {
    queue: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        let mock = Self::new();
        mock.queue.lock().extend(responses);
        mock
    }

    pub fn push(&self, response: MockResponse) {
        self.queue.lock().push_back(response);
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }

    /// Requests received so far, in dispatch order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Payload, FetchError> {
        self.requests.lock().push(RecordedRequest {
            method: method.clone(),
            url: url.to_string(),
            options: options.clone(),
        });

        // 큐에서 꺼내는 건 await 이전 (dispatch 순서 = 응답 순서)
        let next = self.queue.lock().pop_front();
        let response = next.ok_or_else(|| {
            FetchError::Contract(format!(
                "MockTransport has no queued response for {} {}",
                method, url
            ))
        })?;

        if let Some(delay) = response.delay {
            let total = options.timeouts.total();
            if delay > total {
                tokio::time::sleep(total).await;
                return Err(FetchError::Timeout(options.timeouts.total_ms));
            }
            tokio::time::sleep(delay).await;
        }

        match response.outcome {
            Ok(payload) if payload.is_success() => Ok(payload),
            Ok(payload) => Err(FetchError::Status {
                status: payload.status,
                payload,
            }),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refetch_foundation::Timeouts;

    fn options() -> RequestOptions {
        RequestOptions::new(Timeouts::long_default())
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let mock = MockTransport::with_responses([
            MockResponse::ok("first"),
            MockResponse::status(404, "missing"),
        ]);

        let first = mock.request(Method::GET, "http://a", &options()).await;
        assert_eq!(first.unwrap().body, "first");

        let second = mock.request(Method::GET, "http://b", &options()).await;
        assert_eq!(second.unwrap_err().status(), Some(404));

        assert_eq!(mock.request_count(), 2);
        assert_eq!(mock.requests()[1].url, "http://b");
    }

    #[tokio::test]
    async fn test_exhausted_queue_is_contract_error() {
        let mock = MockTransport::new();
        let err = tokio_test::assert_err!(mock.request(Method::GET, "http://a", &options()).await);
        assert!(err.is_contract());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_beyond_total_times_out() {
        let mock = MockTransport::with_responses([
            MockResponse::ok("late").with_delay(Duration::from_secs(30))
        ]);
        let err = mock
            .request(Method::GET, "http://a", &options())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout(10_000));
    }
}
