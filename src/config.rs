use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Configuration for the chapter generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Indexing service settings
    pub api: ApiConfig,

    /// Long-video splitting settings
    pub splitting: SplitConfig,

    /// Per-chapter clip extraction settings
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the indexing service
    pub base_url: String,

    /// API credential (required for any remote operation)
    pub api_key: String,

    /// Target index (collection) id videos are registered against
    pub index_id: String,

    /// Timeout for individual HTTP requests (seconds)
    pub request_timeout_seconds: u64,

    /// Interval between job status polls (seconds)
    pub poll_interval_seconds: u64,

    /// Page size when listing previously indexed videos
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Hard ceiling on indexable source duration (seconds)
    pub max_duration_seconds: u64,

    /// Duration of each sub-job window for long videos (seconds)
    pub segment_duration_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Directory extracted per-chapter clips are written to
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from file, falling back to environment variables
    pub fn load() -> Result<Self> {
        let config_paths = [
            "chapter-gen.toml",
            "config/chapter-gen.toml",
            "~/.config/chapter-gen/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::from_env())
    }

    /// Build configuration from defaults plus environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("TWELVELABS_API_KEY") {
            self.api.api_key = api_key;
        }

        if let Ok(index_id) = std::env::var("TWELVELABS_INDEX_ID") {
            self.api.index_id = index_id;
        }

        if let Ok(base_url) = std::env::var("CHAPTER_GEN_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(interval) = std::env::var("CHAPTER_GEN_POLL_INTERVAL") {
            if let Ok(seconds) = interval.parse() {
                self.api.poll_interval_seconds = seconds;
            }
        }

        if let Ok(output_dir) = std::env::var("CHAPTER_GEN_OUTPUT_DIR") {
            self.extraction.output_dir = PathBuf::from(output_dir);
        }
    }

    /// Validate settings needed to talk to the indexing service. Missing
    /// credentials are a fatal startup condition for remote workflows.
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.is_empty() {
            return Err(Error::Config(
                "API key not set (TWELVELABS_API_KEY or [api].api_key)".to_string(),
            ));
        }

        if self.api.index_id.is_empty() {
            return Err(Error::Config(
                "index id not set (TWELVELABS_INDEX_ID or [api].index_id)".to_string(),
            ));
        }

        if self.api.poll_interval_seconds == 0 {
            return Err(Error::Config("poll_interval_seconds must be greater than 0".to_string()));
        }

        if self.splitting.segment_duration_seconds >= self.splitting.max_duration_seconds {
            return Err(Error::Config(
                "segment_duration_seconds must be smaller than max_duration_seconds".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://api.twelvelabs.io/v1.2".to_string(),
                api_key: String::new(),
                index_id: String::new(),
                request_timeout_seconds: 60,
                poll_interval_seconds: 5,
                page_size: 10,
            },
            splitting: SplitConfig {
                max_duration_seconds: 3600,     // 1 hour indexing ceiling
                segment_duration_seconds: 1800, // 30 minute sub-jobs
            },
            extraction: ExtractionConfig {
                output_dir: PathBuf::from("./clips"),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.api.api_key = api_key;
        self
    }

    pub fn with_index_id(mut self, index_id: String) -> Self {
        self.config.api.index_id = index_id;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.config.api.base_url = base_url;
        self
    }

    pub fn with_poll_interval(mut self, seconds: u64) -> Self {
        self.config.api.poll_interval_seconds = seconds;
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.extraction.output_dir = dir;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.splitting.max_duration_seconds, 3600);
        assert_eq!(config.splitting.segment_duration_seconds, 1800);
        assert_eq!(config.api.poll_interval_seconds, 5);
    }

    #[test]
    fn test_validation_requires_credentials() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ConfigBuilder::new()
            .with_api_key("tlk_test".to_string())
            .with_index_id("idx_test".to_string())
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_inverted_windows() {
        let mut config = ConfigBuilder::new()
            .with_api_key("tlk_test".to_string())
            .with_index_id("idx_test".to_string())
            .build();
        config.splitting.segment_duration_seconds = 3600;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_poll_interval(2)
            .with_output_dir(PathBuf::from("/tmp/clips"))
            .build();

        assert_eq!(config.api.poll_interval_seconds, 2);
        assert_eq!(config.extraction.output_dir, PathBuf::from("/tmp/clips"));
    }
}
