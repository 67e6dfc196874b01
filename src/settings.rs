use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregator::{SliceRules, DEFAULT_EMI_PATTERN, DEFAULT_UPI_PATTERN};
use crate::error::{CashError, Result};
use crate::forecast::ForecastSettings;
use crate::mapping::{DEFAULT_CREDIT_TOKEN, DEFAULT_DEBIT_TOKEN};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_credit_token")]
    pub credit_token: String,
    #[serde(default = "default_debit_token")]
    pub debit_token: String,
    /// Read ambiguous numeric dates as day/month instead of month/day.
    #[serde(default)]
    pub day_first: bool,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_upi_pattern")]
    pub upi_pattern: String,
    #[serde(default = "default_emi_pattern")]
    pub emi_pattern: String,
    #[serde(default)]
    pub forecast: ForecastSettings,
}

fn default_credit_token() -> String {
    DEFAULT_CREDIT_TOKEN.to_string()
}

fn default_debit_token() -> String {
    DEFAULT_DEBIT_TOKEN.to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_upi_pattern() -> String {
    DEFAULT_UPI_PATTERN.to_string()
}

fn default_emi_pattern() -> String {
    DEFAULT_EMI_PATTERN.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credit_token: default_credit_token(),
            debit_token: default_debit_token(),
            day_first: false,
            currency_symbol: default_currency_symbol(),
            upi_pattern: default_upi_pattern(),
            emi_pattern: default_emi_pattern(),
            forecast: ForecastSettings::default(),
        }
    }
}

impl Settings {
    pub fn slice_rules(&self) -> Result<SliceRules> {
        SliceRules::new(&self.upi_pattern, &self.emi_pattern)
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cashraaga")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

/// Settings from `~/.config/cashraaga/settings.json`, or defaults.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing keys take their defaults. An unreadable or malformed file is
/// logged and ignored.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CashError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
