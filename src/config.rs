use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::discipline::Discipline;
use crate::error::ConfigError;
use crate::session::SessionConfig;

/// Locale hint passed to list generators and the coaching advisor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Uk,
}

impl Locale {
    pub fn toggled(self) -> Self {
        match self {
            Locale::En => Locale::Uk,
            Locale::Uk => Locale::En,
        }
    }
}

/// Preferences remembered between launches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub discipline: Discipline,
    pub quantity: usize,
    pub time_limit_secs: u32,
    pub pace_items_per_minute: u32,
    pub grouping: usize,
    pub locale: Locale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discipline: Discipline::Numbers,
            quantity: 20,
            time_limit_secs: 60,
            pace_items_per_minute: 0,
            grouping: 2,
            locale: Locale::En,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        SessionConfig::new(
            self.quantity,
            self.time_limit_secs,
            self.pace_items_per_minute,
            self.grouping,
        )
    }

    pub fn remember(&mut self, discipline: Discipline, settings: &SessionConfig, locale: Locale) {
        self.discipline = discipline;
        self.quantity = settings.quantity;
        self.time_limit_secs = settings.time_limit_secs;
        self.pace_items_per_minute = settings.pace_items_per_minute;
        self.grouping = settings.grouping;
        self.locale = locale;
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "mnemo") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("mnemo_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

/// Keeps preferences for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    cfg: std::cell::RefCell<Config>,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Config {
        self.cfg.borrow().clone()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        *self.cfg.borrow_mut() = cfg.clone();
        Ok(())
    }
}
