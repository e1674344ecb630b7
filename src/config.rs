use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::{InputMode, SessionSettings};

pub const VALIDATOR_URL_ENV: &str = "SPELLDRILL_VALIDATOR_URL";
pub const VALIDATOR_TOKEN_ENV: &str = "SPELLDRILL_VALIDATOR_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read word file {path}: {source}")]
    WordFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not save config to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Preferred settings, stored between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub time_limit_secs: u32,
    pub word_count: usize,
    pub random_order: bool,
    pub input_mode: InputMode,
    pub word_source: Option<String>,
    pub validator_url: Option<String>,
    pub silent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_limit_secs: 30,
            word_count: 10,
            random_order: false,
            input_mode: InputMode::Typed,
            word_source: None,
            validator_url: None,
            silent: false,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            word_source: cfg.word_source.clone().unwrap_or_default(),
            time_limit_secs: i64::from(cfg.time_limit_secs),
            random_order: cfg.random_order,
            input_mode: cfg.input_mode,
            default_word_count: i64::try_from(cfg.word_count).unwrap_or(i64::MAX),
        }
    }
}

impl Config {
    /// Validation endpoint from the config file, falling back to the environment.
    pub fn resolved_validator_url(&self) -> Option<String> {
        self.validator_url
            .clone()
            .or_else(|| std::env::var(VALIDATOR_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
    }
}

/// Read a word source from a file, for `--word-file`.
pub fn read_word_source<P: AsRef<Path>>(path: P) -> Result<String, ConfigError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| ConfigError::WordFile {
        path: path.to_path_buf(),
        source,
    })
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = crate::app_dirs::AppDirs::config_path()
            .unwrap_or_else(|| PathBuf::from("spelldrill_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable config: {e}");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        let to_error = |source| ConfigError::Save {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data).map_err(to_error)
    }
}
