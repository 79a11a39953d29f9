use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;

use crate::{Config, ConfigError};

const CONFIG_FILE: &str = "config.json";
const BACKUP_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "config_";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = "YYYYmmdd_HHMMSS".len();

/// A saved copy of the preferences file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigBackup {
    pub name: String,
    pub taken_at: Option<NaiveDateTime>,
}

impl ConfigBackup {
    fn from_name(name: String) -> Self {
        let taken_at = name
            .strip_prefix(BACKUP_PREFIX)
            .and_then(|rest| rest.get(..STAMP_LEN))
            .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok());
        Self { name, taken_at }
    }
}

/// Reads and writes `config.json` in one directory, with copies under `backups/`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    dir: PathBuf,
}

impl ConfigManager {
    /// Keeps `config.json` directly in `dir`.
    pub fn in_dir(dir: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(dir.join(BACKUP_DIR))?;
        Ok(Self { dir })
    }

    /// `<base>/config/config.json`, the layout used under `PURCHASE_TRACKER_HOME`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        Self::in_dir(base.join("config"))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.dir.join(BACKUP_DIR)
    }

    /// Defaults when no file has been written yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let path = self.config_path();
        if path.is_file() {
            read_json(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        write_json(&self.config_path(), config)
    }

    /// Copies `config` to `backups/config_<stamp>[_<note>].json`.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<ConfigBackup, ConfigError> {
        let mut name = format!("{BACKUP_PREFIX}{}", Utc::now().format(STAMP_FORMAT));
        if let Some(slug) = note.map(slugify).filter(|slug| !slug.is_empty()) {
            name.push('_');
            name.push_str(&slug);
        }
        name.push_str(".json");
        write_json(&self.backups_dir().join(&name), config)?;
        Ok(ConfigBackup::from_name(name))
    }

    /// Makes the named backup the active configuration and returns it.
    pub fn restore(&self, name: &str) -> Result<Config, ConfigError> {
        let path = self.backups_dir().join(name);
        if !path.is_file() || name.contains(['/', '\\']) {
            return Err(ConfigError::BackupNotFound(name.to_string()));
        }
        let config = read_json(&path)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Newest first; names without a readable stamp go last.
    pub fn backups(&self) -> Result<Vec<ConfigBackup>, ConfigError> {
        let mut found = Vec::new();
        for entry in fs::read_dir(self.backups_dir())? {
            let path = entry?.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            if let (true, Some(name)) = (is_json, path.file_name().and_then(|n| n.to_str())) {
                found.push(ConfigBackup::from_name(name.to_string()));
            }
        }
        found.sort_by(|a, b| b.taken_at.cmp(&a.taken_at).then_with(|| b.name.cmp(&a.name)));
        Ok(found)
    }
}

fn read_json(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| ConfigError::Serde(err.to_string()))
}

/// Writes next to the target first so a crash never leaves half a file behind.
fn write_json(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let body =
        serde_json::to_string_pretty(config).map_err(|err| ConfigError::Serde(err.to_string()))?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, body)?;
    fs::rename(&staging, path)?;
    Ok(())
}

/// `"Before  Reset!"` becomes `before-reset`.
fn slugify(note: &str) -> String {
    note.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
