// src/config/options.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::consts::*;
use crate::error::ConfigError;

/// Everything one run needs, resolved up front by the caller.
/// No component reads globals or the environment on its own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source: SourceOptions,
    pub store: StoreOptions,
    pub push: PushOptions,
    pub run: RunOptions,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOptions {
    pub url: String,
    pub id_column: String,
    pub location_column: String,
    pub time_column: String,
    pub timeout_secs: u64,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            url: s!(DEFAULT_CSV_URL),
            id_column: s!(ID_COLUMN),
            location_column: s!(LOCATION_COLUMN),
            time_column: s!(TIME_COLUMN),
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

impl SourceOptions {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOptions {
    pub path: PathBuf,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { path: PathBuf::from(DEFAULT_STATE_FILE) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PushOptions {
    pub api_url: String,
    pub app_id: String,
    pub rest_key: String,
    pub segment: String,
    pub locales: Vec<String>,
    pub title: String,
    pub timeout_secs: u64,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            api_url: s!(ONESIGNAL_API_URL),
            app_id: s!(),
            rest_key: s!(),
            segment: s!(DEFAULT_SEGMENT),
            locales: DEFAULT_LOCALES.iter().map(|l| s!(*l)).collect(),
            title: s!(DEFAULT_TITLE),
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

impl PushOptions {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    /// 1 = strictly sequential dispatch
    pub dispatch_workers: usize,
    pub lock_stale_secs: u64,
    #[serde(skip)]
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dispatch_workers: DISPATCH_WORKERS,
            lock_stale_secs: LOCK_STALE_SECS,
            dry_run: false,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file at `path` (or `carnabot.toml` if it exists),
    /// then process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overlay non-empty values from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_CSV_URL) { self.source.url = v; }
        if let Some(v) = get(ENV_STATE_FILE) { self.store.path = PathBuf::from(v); }
        if let Some(v) = get(ENV_APP_ID) { self.push.app_id = v; }
        if let Some(v) = get(ENV_REST_KEY) { self.push.rest_key = v; }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.url.trim().is_empty() {
            return Err(ConfigError::Missing("source.url"));
        }
        if self.source.id_column.trim().is_empty() {
            return Err(ConfigError::Missing("source.id_column"));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Missing("store.path"));
        }
        if self.run.dispatch_workers == 0 || self.run.dispatch_workers > MAX_DISPATCH_WORKERS {
            return Err(ConfigError::Invalid {
                key: "run.dispatch_workers",
                value: self.run.dispatch_workers.to_string(),
            });
        }
        if self.run.dry_run {
            return Ok(());
        }
        if self.push.app_id.trim().is_empty() {
            return Err(ConfigError::Missing("push.app_id"));
        }
        if self.push.rest_key.trim().is_empty() {
            return Err(ConfigError::Missing("push.rest_key"));
        }
        if self.push.locales.is_empty() {
            return Err(ConfigError::Missing("push.locales"));
        }
        Ok(())
    }

    /// `<state file>.lock`, next to the snapshot it guards.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.store.path.as_os_str().to_os_string();
        name.push(".");
        name.push(LOCK_SUFFIX);
        PathBuf::from(name)
    }
}
