use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ConfigError;

const SORT_VALUES: [&str; 4] = ["date-asc", "date-desc", "amount-asc", "amount-desc"];

/// User preferences for display, logging, and where books are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "Config::default_currency_precision")]
    pub currency_precision: u32,
    /// One of `date-asc`, `date-desc`, `amount-asc`, `amount-desc`.
    #[serde(default = "Config::default_sort_value")]
    pub default_sort: String,
    /// Extra `tracing` filter directives, applied on top of `RUST_LOG`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_book: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for books. Defaults to `~/Documents/PurchaseTracker`.
    pub data_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for backups. Defaults to `<data root>/backups`.
    pub backup_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            currency_symbol: Self::default_currency_symbol(),
            currency_precision: Self::default_currency_precision(),
            default_sort: Self::default_sort_value(),
            log_filter: None,
            backup_retention: Self::default_backup_retention(),
            last_opened_book: None,
            data_root: None,
            backup_root: None,
        }
    }
}

impl Config {
    pub fn default_locale() -> String {
        "en-KE".into()
    }

    pub fn default_currency_symbol() -> String {
        "KSh".into()
    }

    pub fn default_currency_precision() -> u32 {
        2
    }

    pub fn default_sort_value() -> String {
        "date-desc".into()
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    /// Keys accepted by [`Config::set`].
    pub const KEYS: [&'static str; 8] = [
        "locale",
        "currency_symbol",
        "currency_precision",
        "default_sort",
        "log_filter",
        "backup_retention",
        "data_root",
        "backup_root",
    ];

    /// Updates one preference from its textual form. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSetting {
            key: key.to_string(),
            reason,
        };
        let value = value.trim();
        let optional_path = |raw: &str| (!raw.is_empty()).then(|| PathBuf::from(raw));

        match key {
            "locale" => self.locale = value.to_string(),
            "currency_symbol" => self.currency_symbol = value.to_string(),
            "currency_precision" => {
                let precision: u32 = value
                    .parse()
                    .map_err(|_| invalid(format!("`{value}` is not a whole number")))?;
                if precision > 8 {
                    return Err(invalid("at most 8 decimal places".into()));
                }
                self.currency_precision = precision;
            }
            "default_sort" => {
                if !SORT_VALUES.contains(&value) {
                    return Err(invalid(format!("expected one of {}", SORT_VALUES.join(", "))));
                }
                self.default_sort = value.to_string();
            }
            "log_filter" => self.log_filter = (!value.is_empty()).then(|| value.to_string()),
            "backup_retention" => {
                self.backup_retention = value
                    .parse()
                    .map_err(|_| invalid(format!("`{value}` is not a whole number")))?;
            }
            "data_root" => self.data_root = optional_path(value),
            "backup_root" => self.backup_root = optional_path(value),
            _ => return Err(invalid(format!("known keys are {}", Self::KEYS.join(", ")))),
        }
        Ok(())
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("PurchaseTracker")
    }

    pub fn resolve_book_root(&self) -> PathBuf {
        self.resolve_data_root().join("books")
    }

    pub fn resolve_backup_root(&self) -> PathBuf {
        if let Some(path) = &self.backup_root {
            return path.clone();
        }
        self.resolve_data_root().join("backups")
    }
}
