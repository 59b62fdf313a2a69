use chrono::Duration;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_KERNEL: usize = 17;

const BUILTIN_KERNELS: &[(&str, usize)] = &[
    ("altitude", 17),
    ("longitude", 15),
    ("latitude", 15),
    ("track", 5),
    ("ground_speed", 5),
    ("cas", 5),
    ("tas", 5),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid duration {0:?}: {1}")]
    InvalidDuration(String, String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter: FilterConfig,
    pub split: SplitConfig,
    pub resample: ResampleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub default_kernel: usize,
    /// Per-feature overrides, consulted before the built-in table.
    pub kernels: HashMap<String, usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_kernel: DEFAULT_KERNEL,
            kernels: HashMap::new(),
        }
    }
}

impl FilterConfig {
    pub fn kernel_for(&self, feature: &str) -> usize {
        self.kernels
            .get(feature)
            .copied()
            .or_else(|| {
                BUILTIN_KERNELS
                    .iter()
                    .find(|(name, _)| *name == feature)
                    .map(|(_, k)| *k)
            })
            .unwrap_or(self.default_kernel)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub gap: Duration,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            gap: Duration::minutes(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub period: Duration,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            period: Duration::seconds(1),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

/// Parses a human readable duration such as `10m` or `1s`.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidDuration(s.to_string(), msg);
    humantime::parse_duration(s.trim())
        .map_err(|e| invalid(e.to_string()))
        .and_then(|d| Duration::from_std(d).map_err(|e| invalid(e.to_string())))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}
