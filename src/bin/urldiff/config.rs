use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf, time::Duration};

pub const DEFAULT_TIMEOUT_MS: u64 = 100_000;

/// Contents of the `compare` configuration file
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct CompareConfig {
    /// Time given to each target invocation
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Compare the stdout of the targets, not only how they exited
    #[serde(default = "default_true")]
    pub output_differentials_matter: bool,

    /// Compare exact exit statuses instead of success versus failure
    #[serde(default)]
    pub exit_statuses_matter: bool,

    #[serde(rename = "target", default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub name: Option<String>,
    pub executable: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Added on top of the inherited environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

impl CompareConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: CompareConfig = toml::from_str(contents)?;
        if config.targets.is_empty() {
            return Err(anyhow!("At least one [[target]] is required"));
        }
        if config.timeout_ms == 0 {
            return Err(anyhow!("timeout_ms must be greater than zero"));
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl TargetConfig {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .executable
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.executable.display().to_string()),
        }
    }
}
