use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

use crate::models::money::DEFAULT_CURRENCY_SUFFIX;

pub const CONFIG_PATH_ENV: &str = "HOTEL_ADMIN_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "hotel-admin.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file; `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    pub mutation_timeout_secs: u64,
    pub currency_suffix: String,
    /// Insert the default room prices when the price table is empty.
    pub seed_default_catalog: bool,
    pub notification_recipient: String,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            mutation_timeout_secs: 15,
            currency_suffix: DEFAULT_CURRENCY_SUFFIX.into(),
            seed_default_catalog: true,
            notification_recipient: "reservas@hotel.local".into(),
            debug: false,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

impl AppConfig {
    pub fn mutation_timeout(&self) -> Duration {
        Duration::from_secs(self.mutation_timeout_secs.max(1))
    }

    /// `HOTEL_ADMIN_DB`, `HOTEL_ADMIN_TIMEOUT_SECS` and `HOTEL_ADMIN_DEBUG`
    /// win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = env::var("HOTEL_ADMIN_DB") {
            let path = path.trim();
            self.database_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        if let Some(secs) = env::var("HOTEL_ADMIN_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
        {
            self.mutation_timeout_secs = secs;
        }
        if let Some(debug) = env_flag("HOTEL_ADMIN_DEBUG") {
            self.debug = debug;
        }
    }
}

pub fn config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AppConfig>,
}

impl SettingsStore {
    /// A missing or unparsable file yields the defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            AppConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> AppConfig {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update(&self, config: AppConfig) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: AppConfig = serde_json::from_str(&contents)?;
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &AppConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.config(), AppConfig::default());
        assert_eq!(store.config().mutation_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn partial_files_fill_in_defaults_and_updates_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotel-admin.json");
        fs::write(&path, r#"{ "mutation_timeout_secs": 5 }"#).unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        let mut config = store.config();
        assert_eq!(config.mutation_timeout_secs, 5);
        assert_eq!(config.currency_suffix, "MZN");

        config.database_path = Some(dir.path().join("hotel.sqlite3"));
        store.update(config.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.config(), config);
    }

    #[test]
    fn garbage_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotel-admin.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(SettingsStore::new(path.clone()).unwrap().config(), AppConfig::default());

        let store = SettingsStore::new(path).unwrap();
        assert!(store.reload().is_err());
    }
}
