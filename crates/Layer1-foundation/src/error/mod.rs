//! Error types for refetch
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// refetch 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 캐시 관련
    // ========================================================================
    #[error("Cache error: {0}")]
    Cache(String),

    // ========================================================================
    // 계약 위반 (프로그래머 에러)
    // ========================================================================
    /// A collaborator or test double was used incorrectly. Never recovered:
    /// it aborts the whole batch.
    #[error("Contract violation: {0}")]
    Contract(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 배치 전체를 중단시켜야 하는 에러인지 확인
    pub fn is_contract(&self) -> bool {
        matches!(self, Error::Contract(_))
    }

    /// 사용자 입력으로 인한 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::Validation(_) | Error::Config(_)
        )
    }

    /// 계약 위반 에러 생성 헬퍼
    pub fn contract(message: impl Into<String>) -> Self {
        Error::Contract(message.into())
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_classification() {
        assert!(Error::contract("mock queue is empty").is_contract());
        assert!(!Error::Cache("down".into()).is_contract());
    }

    #[test]
    fn test_display() {
        let err = Error::InvalidInput("\"qa\" is not a supported environment".into());
        assert_eq!(
            err.to_string(),
            "Invalid input: \"qa\" is not a supported environment"
        );
        assert!(err.is_user_facing());
    }
}
