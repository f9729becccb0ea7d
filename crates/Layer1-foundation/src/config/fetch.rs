//! Fetch Config - fetch 계층 통합 설정
//!
//! 글로벌 → 프로젝트 → 환경변수 순서로 병합

use super::types::{Environment, Timeouts};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 설정 파일명
pub const FETCH_CONFIG_FILE: &str = "config.toml";

/// 프로젝트 설정 디렉토리
pub const PROJECT_CONFIG_DIR: &str = ".refetch";

pub const ENV_ENVIRONMENT: &str = "REFETCH_ENVIRONMENT";
pub const ENV_USER_AGENT: &str = "REFETCH_USER_AGENT";
pub const ENV_SLOW_THRESHOLD_MS: &str = "REFETCH_SLOW_THRESHOLD_MS";

// ============================================================================
// Fetch Config
// ============================================================================

/// Defaults applied to queries built through this configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// Cache lifetime when the response carries no max-age (seconds)
    #[serde(default = "default_max_age_secs")]
    pub default_max_age_secs: u64,

    /// Freshness window when the response carries no stale-while-revalidate (seconds)
    #[serde(default = "default_stale_age_secs")]
    pub default_stale_age_secs: u64,

    #[serde(default = "Timeouts::short_default")]
    pub short_timeouts: Timeouts,

    #[serde(default = "Timeouts::long_default")]
    pub long_timeouts: Timeouts,

    /// Responses at or above this are reported as slow (milliseconds)
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub environment: Environment,
}

fn default_max_age_secs() -> u64 {
    300
}
fn default_stale_age_secs() -> u64 {
    60
}
fn default_slow_threshold_ms() -> u64 {
    3000
}
fn default_user_agent() -> String {
    concat!("refetch/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_max_age_secs: default_max_age_secs(),
            default_stale_age_secs: default_stale_age_secs(),
            short_timeouts: Timeouts::short_default(),
            long_timeouts: Timeouts::long_default(),
            slow_threshold_ms: default_slow_threshold_ms(),
            user_agent: default_user_agent(),
            environment: Environment::default(),
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 + 환경변수 병합 로드
    pub fn load() -> Result<Self> {
        let mut merged = toml::Table::new();

        // 1. 글로벌 설정
        if let Some(path) = global_config_path() {
            if let Some(table) = read_table(&path)? {
                merge_tables(&mut merged, table);
            }
        }

        // 2. 프로젝트 설정
        let project = project_config_path()?;
        if let Some(table) = read_table(&project)? {
            merge_tables(&mut merged, table);
        }

        let mut config: FetchConfig = toml::Value::Table(merged).try_into()?;

        // 3. 환경변수
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// 단일 파일에서 로드 (환경변수 미적용)
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FetchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 환경변수 오버라이드 적용
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(env) = std::env::var(ENV_ENVIRONMENT) {
            self.environment = env.parse()?;
        }
        if let Ok(agent) = std::env::var(ENV_USER_AGENT) {
            self.user_agent = agent;
        }
        if let Ok(ms) = std::env::var(ENV_SLOW_THRESHOLD_MS) {
            self.slow_threshold_ms = ms.parse().map_err(|_| {
                Error::Config(format!("{} must be an integer, got {:?}", ENV_SLOW_THRESHOLD_MS, ms))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_max_age_secs < self.default_stale_age_secs {
            return Err(Error::Validation(format!(
                "defaultMaxAgeSecs ({}) must not be below defaultStaleAgeSecs ({})",
                self.default_max_age_secs, self.default_stale_age_secs
            )));
        }
        for (name, timeouts) in [("shortTimeouts", &self.short_timeouts), ("longTimeouts", &self.long_timeouts)] {
            if timeouts.total_ms == 0 {
                return Err(Error::Validation(format!("{}.totalMs must be positive", name)));
            }
        }
        Ok(())
    }
}

/// 글로벌 설정 경로 (~/.config/refetch/config.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("refetch").join(FETCH_CONFIG_FILE))
}

/// 프로젝트 설정 경로 (./.refetch/config.toml)
pub fn project_config_path() -> Result<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
    Ok(cwd.join(PROJECT_CONFIG_DIR).join(FETCH_CONFIG_FILE))
}

fn read_table(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let table = content
        .parse::<toml::Table>()
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    tracing::debug!("Loaded fetch config from {}", path.display());
    Ok(Some(table))
}

/// overlay 값이 base를 덮어씀 (중첩 테이블은 재귀 병합)
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.default_max_age_secs, 300);
        assert_eq!(config.default_stale_age_secs, 60);
        assert_eq!(config.slow_threshold(), Duration::from_millis(3000));
        assert_eq!(config.environment, Environment::Live);
        assert!(config.user_agent.starts_with("refetch/"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FetchConfig::from_toml_str(
            r#"
            defaultMaxAgeSecs = 900
            environment = "stage"

            [shortTimeouts]
            connectMs = 500
            totalMs = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.default_max_age_secs, 900);
        assert_eq!(config.default_stale_age_secs, 60);
        assert_eq!(config.environment, Environment::Stage);
        assert_eq!(config.short_timeouts, Timeouts { connect_ms: 500, total_ms: 1500 });
        assert_eq!(config.long_timeouts, Timeouts::long_default());
    }

    #[test]
    fn test_validation_rejects_inverted_ages() {
        let err = FetchConfig::from_toml_str("defaultMaxAgeSecs = 10\ndefaultStaleAgeSecs = 20").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FETCH_CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "slowThresholdMs = 1200").unwrap();

        let config = FetchConfig::load_from(&path).unwrap();
        assert_eq!(config.slow_threshold_ms, 1200);
    }

    #[test]
    fn test_merge_tables_overlay_wins() {
        let mut base: toml::Table = "a = 1\n[t]\nx = 1\ny = 2".parse().unwrap();
        let overlay: toml::Table = "b = 2\n[t]\ny = 3".parse().unwrap();
        merge_tables(&mut base, overlay);

        assert_eq!(base["a"].as_integer(), Some(1));
        assert_eq!(base["b"].as_integer(), Some(2));
        assert_eq!(base["t"]["x"].as_integer(), Some(1));
        assert_eq!(base["t"]["y"].as_integer(), Some(3));
    }
}
