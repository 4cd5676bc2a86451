//! Editor configuration loaded from built-in defaults, the user config file,
//! and environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));

/// Layered configuration for the corpus editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub paths: Paths,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Output {
    #[serde(default)]
    pretty: Option<bool>,
    #[serde(default)]
    backup: Option<bool>,
}

impl Output {
    pub fn pretty(&self) -> bool {
        self.pretty.unwrap_or(true)
    }

    pub fn backup(&self) -> bool {
        self.backup.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paths {
    /// Directory offered by file prompts when no document is loaded.
    #[serde(default = "Paths::default_corpus_dir")]
    pub corpus_dir: String,
}

impl Paths {
    fn default_corpus_dir() -> String {
        ".".into()
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            corpus_dir: Self::default_corpus_dir(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    corpus_dir: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            corpus_dir: env::var("FWCORPUS_DIR").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(corpus_dir: &str) -> Self {
        Self {
            corpus_dir: Some(corpus_dir.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the user config file, and env.
    pub fn load() -> Result<Self> {
        Self::load_with_layers(user_config_path(), EnvOverrides::from_env())
    }

    fn load_with_layers(user: Option<PathBuf>, env_overrides: EnvOverrides) -> Result<Self> {
        let mut config = Self::parse(&DEFAULT_CONFIG)?;
        if let Some(path) = user.filter(|path| path.exists()) {
            config = config.merge(Self::from_file(&path)?);
        }
        if let Some(corpus_dir) = env_overrides.corpus_dir {
            config.paths.corpus_dir = corpus_dir;
        }
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&data)
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse TOML config")
    }

    fn merge(mut self, overlay: Self) -> Self {
        if let Some(value) = overlay.output.pretty {
            self.output.pretty = Some(value);
        }
        if let Some(value) = overlay.output.backup {
            self.output.backup = Some(value);
        }
        if overlay.paths.corpus_dir != Paths::default_corpus_dir() {
            self.paths.corpus_dir = overlay.paths.corpus_dir;
        }
        self
    }
}

fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("fwcorpus/config.toml"))
}
