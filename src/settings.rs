//! Declarative TOML-driven configuration: the keys a run recognizes
//! (`output_dir`, `source_tree`, `cache_dir`, `log_level`,
//! `analysis.components.log`, per-kind provider timeout/cache flags,
//! `analysis.pipeline`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::SetupError;
use crate::provider::ProviderSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Status,
    #[default]
    Info,
    Debug,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ComponentsConfig {
    #[serde(default)]
    pub log: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub components: ComponentsConfig,
    /// Stage type names from `analysis.pipeline`, wired linearly; the
    /// terminal stage is the last one. Empty when a code-supplied
    /// assembler function is used instead.
    #[serde(default)]
    pub pipeline: Vec<String>,
}

fn default_timeout_ms() -> u64 {
    60_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheFlags {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

impl Default for CacheFlags {
    fn default() -> Self {
        Self {
            read: false,
            write: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub cache: CacheFlags,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            cache: CacheFlags::default(),
        }
    }
}

impl ProviderConfig {
    pub fn to_settings(&self, concurrency: usize) -> ProviderSettings {
        ProviderSettings {
            timeout: Duration::from_millis(self.timeout_ms),
            concurrency: concurrency.max(1),
            read_cache: self.cache.read,
            write_cache: self.cache.write,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub output_dir: PathBuf,
    pub source_tree: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub variability: ProviderConfig,
    #[serde(default)]
    pub build: ProviderConfig,
    #[serde(default)]
    pub code: ProviderConfig,
    /// Worker pool size for the code-model provider. 1 for variability and
    /// build providers is implicit — they have exactly one target.
    #[serde(default = "default_code_concurrency")]
    pub code_concurrency: usize,
}

fn default_code_concurrency() -> usize {
    4
}

/// Loads configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, SetupError> {
    let content = std::fs::read_to_string(&path).map_err(|source| SetupError::InvalidConfig(
        format!("could not read '{}': {source}", path.as_ref().display()),
    ))?;
    load_config_from_str(&content)
}

/// Loads configuration from TOML content already in memory; used by tests
/// and by callers that source configuration from somewhere other than a
/// file path.
pub fn load_config_from_str(content: &str) -> Result<Config, SetupError> {
    toml::from_str(content).map_err(|e| SetupError::InvalidConfig(e.to_string()))
}
