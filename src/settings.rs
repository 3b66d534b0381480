use anyhow::{Context, Result};
use chrono::TimeDelta;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceSettings {
    pub listen_addr: String,
    pub database_path: PathBuf,
    pub token_ttl_minutes: i64,
    pub hash_rounds: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".into(),
            database_path: PathBuf::from("watchlog.sqlite3"),
            token_ttl_minutes: 30,
            hash_rounds: 10_000,
        }
    }
}

/// One year.
const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

impl ServiceSettings {
    /// Token lifetime, clamped to between one minute and one year.
    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::minutes(self.token_ttl_minutes.clamp(1, MAX_TOKEN_TTL_MINUTES))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: ServiceSettings,
}

impl SettingsStore {
    /// Read settings from `path`. A missing file yields defaults; an
    /// unreadable one yields defaults and a warning.
    pub fn load(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unparseable settings file {}: {err}",
                    path.display()
                );
                ServiceSettings::default()
            })
        } else {
            ServiceSettings::default()
        };

        Ok(Self { path, data })
    }

    pub fn from_settings(path: PathBuf, data: ServiceSettings) -> Self {
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.data
    }

    pub fn into_settings(self) -> ServiceSettings {
        self.data
    }

    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create settings directory {}", parent.display())
                })?;
            }
        }
        let serialized = serde_json::to_string_pretty(&self.data)?;
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
        let store = SettingsStore::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.settings(), &ServiceSettings::default());
    }

    #[test]
    fn persisted_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("settings.json");
        let store = SettingsStore::load(path.clone()).unwrap();
        store.persist().unwrap();

        let reloaded = SettingsStore::load(path).unwrap();
        assert_eq!(reloaded.settings(), store.settings());
    }

    #[test]
    fn overridden_settings_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = ServiceSettings {
            listen_addr: "0.0.0.0:8080".into(),
            ..ServiceSettings::default()
        };
        SettingsStore::from_settings(path.clone(), settings.clone())
            .persist()
            .unwrap();

        assert_eq!(SettingsStore::load(path).unwrap().into_settings(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "listen_addr": "0.0.0.0:9000" }"#).unwrap();

        let settings = SettingsStore::load(path).unwrap().into_settings();
        assert_eq!(settings.listen_addr, "0.0.0.0:9000");
        assert_eq!(settings.token_ttl_minutes, 30);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::load(path).unwrap();
        assert_eq!(store.settings(), &ServiceSettings::default());
    }

    #[test]
    fn token_ttl_is_at_least_a_minute() {
        let settings = ServiceSettings {
            token_ttl_minutes: 0,
            ..ServiceSettings::default()
        };
        assert_eq!(settings.token_ttl(), TimeDelta::minutes(1));
    }

    #[test]
    fn huge_token_ttl_is_capped_at_a_year() {
        let settings = ServiceSettings {
            token_ttl_minutes: i64::MAX,
            ..ServiceSettings::default()
        };
        assert_eq!(settings.token_ttl(), TimeDelta::days(365));
    }
}
