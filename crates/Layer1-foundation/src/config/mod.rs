//! 설정 모듈

mod fetch;
mod types;

pub use fetch::{
    global_config_path, project_config_path, FetchConfig, ENV_ENVIRONMENT, ENV_SLOW_THRESHOLD_MS,
    ENV_USER_AGENT, FETCH_CONFIG_FILE, PROJECT_CONFIG_DIR,
};
pub use types::{Environment, Timeouts};
