pub type Result<T> = core::result::Result<T, LoadgenError>;

#[derive(thiserror::Error, Debug)]
pub enum LoadgenError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot connect to API: {0}")]
    Unreachable(String),
    #[error("API health check returned status {status}")]
    Unhealthy { status: u16 },
    #[error("logging: {0}")]
    Logging(String),
}

pub mod config {
    use serde::{Deserialize, Serialize};
    use std::env;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use crate::{LoadgenError, Result};

    /// Longest run accepted; 30 days.
    pub const MAX_DURATION_SECS: u64 = 30 * 24 * 60 * 60;
    /// Longest pause between two requests; one hour.
    pub const MAX_DELAY_MS: u64 = 60 * 60 * 1000;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LoadgenConfig {
        pub api_base: String,
        pub workers: usize,
        pub duration_secs: u64,
        pub min_delay_ms: u64,
        pub max_delay_ms: u64,
        pub seed: Option<u64>,
        pub log_file: PathBuf,
    }

    impl Default for LoadgenConfig {
        fn default() -> Self {
            Self {
                api_base: String::from("http://localhost:8000"),
                workers: 3,
                duration_secs: 120,
                min_delay_ms: 100,
                max_delay_ms: 2000,
                seed: None,
                log_file: PathBuf::from("api.log"),
            }
        }
    }

    impl LoadgenConfig {
        /// Reads `LOADGEN_CONFIG` as a YAML file when set, otherwise layers
        /// the `LOADGEN_*` variables over the defaults.
        pub fn load() -> Result<Self> {
            if let Ok(path) = env::var("LOADGEN_CONFIG") {
                return Self::from_file(path);
            }
            let mut cfg = Self::default();
            if let Ok(base) = env::var("LOADGEN_API_BASE") { cfg.api_base = base; }
            if let Some(v) = parse_env("LOADGEN_WORKERS")? { cfg.workers = v; }
            if let Some(v) = parse_env("LOADGEN_DURATION_SECS")? { cfg.duration_secs = v; }
            if let Some(v) = parse_env("LOADGEN_MIN_DELAY_MS")? { cfg.min_delay_ms = v; }
            if let Some(v) = parse_env("LOADGEN_MAX_DELAY_MS")? { cfg.max_delay_ms = v; }
            if let Some(v) = parse_env("LOADGEN_SEED")? { cfg.seed = Some(v); }
            if let Ok(path) = env::var("LOADGEN_LOG_FILE") { cfg.log_file = PathBuf::from(path); }
            Ok(cfg)
        }

        pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
            let text = std::fs::read_to_string(path)?;
            Self::from_yaml(&text)
        }

        pub fn from_yaml(text: &str) -> Result<Self> {
            Ok(serde_yaml::from_str(text)?)
        }

        pub fn validate(&self) -> Result<()> {
            if self.workers == 0 {
                return Err(LoadgenError::Config("workers must be at least 1".into()));
            }
            if self.duration_secs > MAX_DURATION_SECS {
                return Err(LoadgenError::Config(format!(
                    "duration_secs ({}) exceeds the {} s limit",
                    self.duration_secs, MAX_DURATION_SECS
                )));
            }
            if self.max_delay_ms > MAX_DELAY_MS {
                return Err(LoadgenError::Config(format!(
                    "max_delay_ms ({}) exceeds the {} ms limit",
                    self.max_delay_ms, MAX_DELAY_MS
                )));
            }
            if self.min_delay_ms > self.max_delay_ms {
                return Err(LoadgenError::Config(format!(
                    "min_delay_ms ({}) exceeds max_delay_ms ({})",
                    self.min_delay_ms, self.max_delay_ms
                )));
            }
            if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
                return Err(LoadgenError::Config(format!(
                    "api_base must start with http:// or https://, got {}",
                    self.api_base
                )));
            }
            Ok(())
        }

        pub fn duration(&self) -> Duration { Duration::from_secs(self.duration_secs) }

        /// Base address without a trailing slash, ready for `format!("{}/path")`.
        pub fn base_url(&self) -> &str { self.api_base.trim_end_matches('/') }
    }

    fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
        match env::var(key) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| LoadgenError::Config(format!("{key}={raw} is not a valid value"))),
            Err(_) => Ok(None),
        }
    }
}
