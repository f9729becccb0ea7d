//! 설정 공용 타입 - Environment, Timeouts

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Environment
// ============================================================================

/// Upstream environment a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Int,
    Test,
    Stage,
    #[default]
    Live,
}

impl Environment {
    pub const ALL: [Environment; 5] = [
        Environment::Local,
        Environment::Int,
        Environment::Test,
        Environment::Stage,
        Environment::Live,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Int => "int",
            Environment::Test => "test",
            Environment::Stage => "stage",
            Environment::Live => "live",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("\"{}\" is not a supported environment", s)))
    }
}

// ============================================================================
// Timeouts
// ============================================================================

/// Connect + total timeout pair for one request
///
/// `connect` covers DNS and connection setup, `total` the whole response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeouts {
    pub connect_ms: u64,
    pub total_ms: u64,
}

impl Timeouts {
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self {
            connect_ms: connect.as_millis() as u64,
            total_ms: total.as_millis() as u64,
        }
    }

    pub fn from_secs(connect: u64, total: u64) -> Self {
        Self {
            connect_ms: connect * 1000,
            total_ms: total * 1000,
        }
    }

    /// Budget for a service that answered recently
    pub fn short_default() -> Self {
        Self::from_secs(1, 3)
    }

    /// Budget for a service assumed cold
    pub fn long_default() -> Self {
        Self::from_secs(10, 10)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }
}
