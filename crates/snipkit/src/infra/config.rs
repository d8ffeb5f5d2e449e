//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));

/// Layered configuration loaded from defaults, the user's config file, and
/// environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub snippets: Snippets,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippets {
    /// Root directory holding snippet files. Defaults to
    /// `<config dir>/snipkit/snippets` when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "Snippets::default_extension")]
    pub extension: String,
    /// Whether a blocking re-analysis runs after every snippet.
    #[serde(default)]
    pub auto_update_analysis: bool,
}

impl Snippets {
    fn default_extension() -> String {
        "py".into()
    }
}

impl Default for Snippets {
    fn default() -> Self {
        Self {
            directory: None,
            extension: Self::default_extension(),
            auto_update_analysis: false,
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    directory: Option<PathBuf>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            directory: env::var_os("SNIPKIT_DIR").map(PathBuf::from),
        }
    }

    #[cfg(test)]
    fn for_tests(directory: &str) -> Self {
        Self {
            directory: Some(PathBuf::from(directory)),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the global config file, and env
    /// overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        Self::load_with_layers(global_config_path(), env)
    }

    fn load_with_layers(global: Option<PathBuf>, env_overrides: EnvOverrides) -> Result<Self> {
        let mut config = Self::from_str(&DEFAULT_CONFIG)?;

        if let Some(global_path) = global.filter(|path| path.exists()) {
            config = config.merge(Self::from_file(&global_path)?);
        }

        Ok(apply_env_overrides(config, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).context("failed to parse TOML config")?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            snippets: Snippets {
                directory: other.snippets.directory.or(self.snippets.directory),
                extension: if other.snippets.extension != Snippets::default_extension() {
                    other.snippets.extension
                } else {
                    self.snippets.extension
                },
                auto_update_analysis: if other.snippets.auto_update_analysis
                    != Snippets::default().auto_update_analysis
                {
                    other.snippets.auto_update_analysis
                } else {
                    self.snippets.auto_update_analysis
                },
            },
        }
    }

    /// Resolve the snippet root, falling back to a per-user default.
    pub fn snippet_directory(&self) -> PathBuf {
        self.snippets.directory.clone().unwrap_or_else(|| {
            config_dir()
                .map(|base| base.join("snipkit/snippets"))
                .unwrap_or_else(|| PathBuf::from("snippets"))
        })
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("snipkit/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(directory) = env.directory {
        config.snippets.directory = Some(directory);
    }
    config
}
