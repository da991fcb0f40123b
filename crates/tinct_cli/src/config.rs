//! tinct.toml configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tinct_tokens::ResolveOptions;

/// Top-level tinct configuration (tinct.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TinctConfig {
    #[serde(default)]
    pub resolve: ResolveOptions,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub layers: LayersConfig,
    /// Directory layer paths are relative to
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Output configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

/// Token files layered before any given on the command line, base first
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LayersConfig {
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl TinctConfig {
    pub const FILE_NAME: &'static str = "tinct.toml";

    /// Load an explicit config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(config)
    }

    /// Load `tinct.toml` from `dir` if present, defaults otherwise
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            tracing::debug!(dir = %dir.display(), "no tinct.toml found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(src: &str) -> Result<Self> {
        toml::from_str(src).context("Invalid tinct configuration")
    }

    /// Configured layer files, resolved against the config file's directory
    pub fn layer_paths(&self) -> Vec<PathBuf> {
        self.layers
            .files
            .iter()
            .map(|file| self.base_dir.join(file))
            .collect()
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
