use anyhow::{Context, Result};
use chrono::FixedOffset;
use regex::Regex;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::shared::errors::AppError;
use crate::shared::types::TIMESTAMP_FIELD;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerCfg {
    pub bind: String,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerCfg {
    pub interval_secs: u64,
    pub run_on_start: bool,
    pub reporting_utc_offset_minutes: i32,
    pub city: Option<String>,
    pub currency_symbol: String,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            run_on_start: true,
            reporting_utc_offset_minutes: 330, // Asia/Kolkata
            city: None,
            currency_symbol: "₹".to_string(),
        }
    }
}

/// One named numeric field and how to pull it out of the response body.
/// Exactly one of `json_pointer` / `pattern` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldCfg {
    pub name: String,
    pub json_pointer: Option<String>,
    /// Regex; capture group 1 (or the whole match) is the price text
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    pub url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub fields: Vec<FieldCfg>,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: 15,
            user_agent: concat!("goldwatch/", env!("CARGO_PKG_VERSION")).to_string(),
            fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailCfg {
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for MailCfg {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key_env: "GOLDWATCH_MAIL_API_KEY".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyCfg {
    pub sender: String,
    pub recipients: Vec<String>,
    pub dry_run: bool,
    pub mail: Option<MailCfg>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BroadcastCfg {
    pub enabled: bool,
    pub channel: String,
    pub event: String,
    pub capacity: usize,
}

impl Default for BroadcastCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: "gold-price".to_string(),
            event: "goldPriceUpdate".to_string(),
            capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingCfg {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingCfg {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerCfg,
    pub tracker: TrackerCfg,
    pub source: SourceCfg,
    pub notify: NotifyCfg,
    pub broadcast: BroadcastCfg,
    pub logging: LoggingCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        let cfg: Self = toml::from_str(&s).context("parse config TOML")?;
        Ok(cfg)
    }

    pub fn reporting_offset(&self) -> Result<FixedOffset, AppError> {
        let minutes = self.tracker.reporting_utc_offset_minutes;
        FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            AppError::ConfigError(format!("reporting_utc_offset_minutes out of range: {}", minutes))
        })
    }

    /// Checks that must pass before anything is started
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tracker.interval_secs == 0 {
            return Err(AppError::ConfigError("tracker.interval_secs must be > 0".to_string()));
        }
        self.reporting_offset()?;

        if self.source.url.trim().is_empty() {
            return Err(AppError::ConfigError("source.url is required".to_string()));
        }
        if self.source.fields.is_empty() {
            return Err(AppError::ConfigError(
                "source.fields must name at least one price field".to_string(),
            ));
        }
        for field in &self.source.fields {
            if field.name == TIMESTAMP_FIELD {
                return Err(AppError::ConfigError(format!(
                    "field name {} is reserved for the export column",
                    TIMESTAMP_FIELD
                )));
            }
            match (&field.json_pointer, &field.pattern) {
                (Some(_), None) => {}
                (None, Some(pattern)) => {
                    Regex::new(pattern).map_err(|e| {
                        AppError::ConfigError(format!("field {}: invalid pattern: {}", field.name, e))
                    })?;
                }
                _ => {
                    return Err(AppError::ConfigError(format!(
                        "field {}: set exactly one of json_pointer or pattern",
                        field.name
                    )))
                }
            }
        }

        if let Some(mail) = &self.notify.mail {
            if mail.endpoint.trim().is_empty() {
                return Err(AppError::ConfigError("notify.mail.endpoint is required".to_string()));
            }
            if self.notify.sender.trim().is_empty() {
                return Err(AppError::ConfigError(
                    "notify.sender is required when notify.mail is set".to_string(),
                ));
            }
        }

        if self.broadcast.enabled && self.broadcast.capacity == 0 {
            return Err(AppError::ConfigError("broadcast.capacity must be > 0".to_string()));
        }

        Ok(())
    }
}
