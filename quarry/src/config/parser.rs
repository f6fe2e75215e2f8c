use super::types::Config;
use crate::error::Result;
use std::path::Path;

/// Source of configuration. The registry depends on this interface only;
/// how the file is located or evaluated is up to the implementor.
pub trait ConfigProvider: Send + Sync {
    fn load_config(&self, path: &Path) -> Result<Config>;
}

/// Reads `quarry.yaml`-style files.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlConfigProvider;

impl ConfigProvider for YamlConfigProvider {
    fn load_config(&self, path: &Path) -> Result<Config> {
        parse_config(path)
    }
}

/// Parse a quarry.yaml file into a Config
pub fn parse_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse a config YAML string into a Config
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(content)?;
    Ok(config)
}
