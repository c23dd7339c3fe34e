use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    /// Serialized model bundle. When absent the service runs
    /// physics-only with the altitude-threshold risk fallback.
    pub bundle_path: Option<PathBuf>,
}

/// Upstream base URLs, overridable for tests and mirrors. Space-Track
/// credentials come from the environment, never from this file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    pub spacetrack_url: Option<String>,
    pub noaa_url: Option<String>,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert!(config.model.bundle_path.is_none());
        assert!(config.sources.spacetrack_url.is_none());
    }

    #[test]
    fn explicit_values_override() {
        let yaml = "web:\n  bind: 127.0.0.1:9000\nmodel:\n  bundle_path: /tmp/bundle.json\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.web.bind, "127.0.0.1:9000");
        assert_eq!(
            config.model.bundle_path.unwrap(),
            PathBuf::from("/tmp/bundle.json")
        );
    }
}
