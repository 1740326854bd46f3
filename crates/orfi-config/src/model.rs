use std::{fmt, path::PathBuf, str::FromStr};

use orfi_domain::MonthKey;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable that overrides every other data-root setting.
pub const DATA_ROOT_ENV: &str = "ORFI_HOME";

const DATA_DIR_NAME: &str = ".orfi";

/// Whether closed months reject edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    #[default]
    Enforced,
    Advisory,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockMode::Enforced => "enforced",
            LockMode::Advisory => "advisory",
        })
    }
}

impl FromStr for LockMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enforced" => Ok(LockMode::Enforced),
            "advisory" => Ok(LockMode::Advisory),
            other => Err(format!("expected `enforced` or `advisory`, got `{other}`")),
        }
    }
}

/// Stores user-configurable CLI preferences and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    /// Month shown when the shell starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_month: Option<MonthKey>,
    /// Drift in currency units tolerated before a stored installment is recomputed.
    #[serde(default = "Config::default_installment_hysteresis")]
    pub installment_hysteresis: i64,
    #[serde(default)]
    pub lock_policy: LockMode,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_seed_sample_data")]
    pub seed_sample_data: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom data directory. Defaults to `~/.orfi`.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "es-CO".into(),
            currency: "COP".into(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            last_month: None,
            installment_hysteresis: Self::default_installment_hysteresis(),
            lock_policy: LockMode::default(),
            backup_retention: Self::default_backup_retention(),
            seed_sample_data: Self::default_seed_sample_data(),
            data_root: None,
        }
    }
}

impl Config {
    /// Keys accepted by [`Config::set`].
    pub const KEYS: [&'static str; 8] = [
        "locale",
        "currency",
        "ui_color_enabled",
        "last_month",
        "installment_hysteresis",
        "lock_policy",
        "backup_retention",
        "seed_sample_data",
    ];

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn default_installment_hysteresis() -> i64 {
        1
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_seed_sample_data() -> bool {
        true
    }

    /// Resolves the data directory: `ORFI_HOME`, then `data_root`, then the
    /// platform data or home directory.
    pub fn resolve_data_root(&self) -> PathBuf {
        self.resolve_data_root_with(std::env::var_os(DATA_ROOT_ENV).map(PathBuf::from))
    }

    pub fn resolve_data_root_with(&self, env_override: Option<PathBuf>) -> PathBuf {
        if let Some(path) = env_override.filter(|path| !path.as_os_str().is_empty()) {
            return path;
        }
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join(DATA_DIR_NAME)
    }

    /// Current settings as `(key, value)` pairs in [`Config::KEYS`] order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("locale", self.locale.clone()),
            ("currency", self.currency.clone()),
            ("ui_color_enabled", self.ui_color_enabled.to_string()),
            (
                "last_month",
                self.last_month
                    .map(|key| key.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            (
                "installment_hysteresis",
                self.installment_hysteresis.to_string(),
            ),
            ("lock_policy", self.lock_policy.to_string()),
            ("backup_retention", self.backup_retention.to_string()),
            ("seed_sample_data", self.seed_sample_data.to_string()),
        ]
    }

    /// Updates one setting from text.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        match key {
            "locale" | "currency" => {
                if value.is_empty() {
                    return Err(invalid("value cannot be empty".into()));
                }
                if key == "locale" {
                    self.locale = value.to_string();
                } else {
                    self.currency = value.to_ascii_uppercase();
                }
            }
            "ui_color_enabled" => self.ui_color_enabled = parse_flag(value).map_err(invalid)?,
            "seed_sample_data" => self.seed_sample_data = parse_flag(value).map_err(invalid)?,
            "last_month" => {
                self.last_month = match value {
                    "" | "-" | "none" => None,
                    other => Some(other.parse().map_err(|err| invalid(format!("{err}")))?),
                }
            }
            "installment_hysteresis" => {
                let threshold: i64 = value
                    .parse()
                    .map_err(|_| invalid("expected a whole number".into()))?;
                if threshold < 0 {
                    return Err(invalid("cannot be negative".into()));
                }
                self.installment_hysteresis = threshold;
            }
            "lock_policy" => self.lock_policy = value.parse().map_err(invalid)?,
            "backup_retention" => {
                let retention: usize = value
                    .parse()
                    .map_err(|_| invalid("expected a positive number".into()))?;
                if retention == 0 {
                    return Err(invalid("keep at least one backup".into()));
                }
                self.backup_retention = retention;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on/off, got `{other}`")),
    }
}
