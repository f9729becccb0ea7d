//! Fetch 에러 타입
//!
//! FetchError는 단일 쿼리의 전송/업스트림 실패를 표현.
//! 배치를 중단시키지 않고 캐시/no-data로 degrade 됨 (Contract 제외).

use refetch_foundation::{Error as FoundationError, Payload};
use thiserror::Error;

/// Error of one upstream request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// 연결 실패 (DNS, refused, connect timeout)
    #[error("Connection failed: {0}")]
    Connect(String),

    /// 전체 타임아웃 초과
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// 업스트림이 non-2xx 응답
    #[error("Upstream responded with status {status}")]
    Status { status: u16, payload: Payload },

    /// 요청 구성/전송 실패
    #[error("Request failed: {0}")]
    Request(String),

    /// 응답 본문 읽기 실패
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Transport used incorrectly (e.g. mock queue exhausted). Aborts the batch.
    #[error("Contract violation: {0}")]
    Contract(String),
}

impl FetchError {
    /// HTTP 상태 코드 + 본문에서 에러 생성
    pub fn from_http_status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            payload: Payload::new(status, body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response carried by the error, if the upstream answered at all
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Status { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// 응답을 받지 못한 실패 (latency는 timeout 값으로 기록)
    pub fn is_connect_level(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }

    /// Failure of the transport itself, as opposed to an upstream status
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Status { .. } | Self::Contract(_))
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_timeout() {
            // total timeout 값은 transport가 채움
            Self::Timeout(0)
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

// ============================================================================
// refetch_foundation::Error 변환
// ============================================================================

impl From<FetchError> for FoundationError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Contract(msg) => FoundationError::Contract(msg),
            other => FoundationError::Http(other.to_string()),
        }
    }
}
