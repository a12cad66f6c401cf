use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of download worker threads
    pub downloaders: usize,

    /// Number of link-extraction worker threads
    pub extractors: usize,

    /// Maximum simultaneous downloads against a single host
    pub per_host: usize,

    pub http: HttpSettings,
}

/// HTTP client settings used by the default fetcher
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            downloaders: 10,
            extractors: 10,
            per_host: 10,
            http: HttpSettings::default(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("linkdive/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 10,
        }
    }
}

impl CrawlerConfig {
    /// Reject sizes that would make a pool or the host gate unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.downloaders == 0 {
            return Err(ConfigError::Downloaders(self.downloaders));
        }
        if self.extractors == 0 {
            return Err(ConfigError::Extractors(self.extractors));
        }
        if self.per_host == 0 {
            return Err(ConfigError::PerHost(self.per_host));
        }
        Ok(())
    }

    /// Load a configuration profile from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CrawlerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let mut config = CrawlerConfig::default();
        config.per_host = 0;
        assert_eq!(config.validate(), Err(ConfigError::PerHost(0)));

        let mut config = CrawlerConfig::default();
        config.downloaders = 0;
        assert_eq!(config.validate(), Err(ConfigError::Downloaders(0)));

        let mut config = CrawlerConfig::default();
        config.extractors = 0;
        assert_eq!(config.validate(), Err(ConfigError::Extractors(0)));
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: CrawlerConfig = serde_yaml::from_str("per_host: 3\n").unwrap();
        assert_eq!(config.per_host, 3);
        assert_eq!(config.downloaders, 10);
        assert_eq!(config.http.timeout_secs, 10);
    }
}
