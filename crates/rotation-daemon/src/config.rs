//! Environment configuration
//!
//! Every setting comes from an environment variable. [`Settings::from_lookup`]
//! takes the lookup as a function so parsing is testable without touching
//! the process environment. Empty values count as missing.

use reqwest::Url;
use std::path::PathBuf;

use rotation_core::{resolve_cell, resolve_range, CellRange, ReportCell, ScheduledInstant};

/// Remote state endpoint
pub const EUREKA_URL: &str = "EUREKA_URL";
/// Remote state client id
pub const EUREKA_CLIENT_ID: &str = "EUREKA_CLIENT_ID";
/// Remote state client secret
pub const EUREKA_CLIENT_SECRET: &str = "EUREKA_CLIENT_SECRET";
/// Trigger instant, seconds after UTC midnight
pub const UTC_CLEAR_TIME: &str = "UTC_CLEAR_TIME";
/// Optional notification webhook
pub const WEBHOOK_URL: &str = "WEBHOOK_URL";
/// Authorized-user token file
pub const GOOGLE_TOKEN_PATH: &str = "GOOGLE_TOKEN_PATH";
/// Range cleared on every rotation
pub const CLEAR_RANGE: &str = "CLEAR_RANGE";
/// Cell reset to the report label
pub const REPORT_CELL: &str = "REPORT_CELL";
/// Label written into the report cell
pub const REPORT_LABEL: &str = "REPORT_LABEL";
/// `json` or `text`
pub const LOG_FORMAT: &str = "LOG_FORMAT";

const DEFAULT_TOKEN_PATH: &str = "token.json";
const DEFAULT_CLEAR_RANGE: &str = "G3:V";
const DEFAULT_REPORT_CELL: &str = "E3";
const DEFAULT_REPORT_LABEL: &str = "Upper Caf.";

/// Configuration errors; all are fatal at startup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{var} is not a valid URL: {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var} must be a number of seconds in [0, 86400), got '{value}'")]
    InvalidInstant { var: &'static str, value: String },

    #[error("{var} is not a valid cell address: {value}")]
    InvalidAddress { var: &'static str, value: String },

    #[error("{var} must be 'json' or 'text', got '{value}'")]
    InvalidLogFormat { var: &'static str, value: String },
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Read [`LOG_FORMAT`]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        match optional(&lookup, LOG_FORMAT) {
            None => Ok(Self::Text),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "json" => Ok(Self::Json),
                "text" => Ok(Self::Text),
                _ => Err(ConfigError::InvalidLogFormat {
                    var: LOG_FORMAT,
                    value,
                }),
            },
        }
    }
}

/// Daemon settings
#[derive(Clone)]
pub struct Settings {
    pub eureka_url: Url,
    pub client_id: String,
    pub client_secret: String,
    pub clear_time: ScheduledInstant,
    pub webhook_url: Option<Url>,
    pub token_path: PathBuf,
    pub clear_range: CellRange,
    pub report: ReportCell,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let eureka_url = parse_url(EUREKA_URL, required(&lookup, EUREKA_URL)?)?;
        let client_id = required(&lookup, EUREKA_CLIENT_ID)?;
        let client_secret = required(&lookup, EUREKA_CLIENT_SECRET)?;
        let clear_time = parse_instant(required(&lookup, UTC_CLEAR_TIME)?)?;

        let webhook_url = optional(&lookup, WEBHOOK_URL)
            .map(|value| parse_url(WEBHOOK_URL, value))
            .transpose()?;

        let token_path = optional(&lookup, GOOGLE_TOKEN_PATH)
            .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH), PathBuf::from);

        let range_text =
            optional(&lookup, CLEAR_RANGE).unwrap_or_else(|| DEFAULT_CLEAR_RANGE.to_string());
        let clear_range = resolve_range(&range_text).map_err(|_| ConfigError::InvalidAddress {
            var: CLEAR_RANGE,
            value: range_text.clone(),
        })?;

        let cell_text =
            optional(&lookup, REPORT_CELL).unwrap_or_else(|| DEFAULT_REPORT_CELL.to_string());
        let cell = resolve_cell(&cell_text, 0).map_err(|_| ConfigError::InvalidAddress {
            var: REPORT_CELL,
            value: cell_text.clone(),
        })?;
        let label =
            optional(&lookup, REPORT_LABEL).unwrap_or_else(|| DEFAULT_REPORT_LABEL.to_string());

        Ok(Self {
            eureka_url,
            client_id,
            client_secret,
            clear_time,
            webhook_url,
            token_path,
            clear_range,
            report: ReportCell { cell, label },
            log_format: LogFormat::from_lookup(&lookup)?,
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("eureka_url", &self.eureka_url.as_str())
            .field("client_id", &self.client_id)
            .field("clear_time", &self.clear_time)
            .field("webhook", &self.webhook_url.is_some())
            .field("token_path", &self.token_path)
            .field("clear_range", &self.clear_range)
            .field("report", &self.report)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Option<String> {
    lookup(var).filter(|value| !value.trim().is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, var).ok_or(ConfigError::Missing(var))
}

fn parse_url(var: &'static str, value: String) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|_| ConfigError::InvalidUrl { var, value })
}

/// Finite number of seconds, floored, in `[0, 86400)`
fn parse_instant(value: String) -> Result<ScheduledInstant, ConfigError> {
    let invalid = || ConfigError::InvalidInstant {
        var: UTC_CLEAR_TIME,
        value: value.clone(),
    };
    let seconds: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 || seconds >= 86_400.0 {
        return Err(invalid());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = seconds.floor() as u32;
    ScheduledInstant::new(whole).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rotation_core::CellRef;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        (EUREKA_URL, "https://eureka.example.org/graphql"),
        (EUREKA_CLIENT_ID, "client"),
        (EUREKA_CLIENT_SECRET, "secret"),
        (UTC_CLEAR_TIME, "14400"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs = REQUIRED.to_vec();
        pairs.retain(|(k, _)| !extra.iter().any(|(e, _)| e == k));
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn defaults_apply() {
        let settings = Settings::from_lookup(env(&REQUIRED)).unwrap();

        assert_eq!(settings.clear_time.seconds(), 14_400);
        assert_eq!(settings.webhook_url, None);
        assert_eq!(settings.token_path, PathBuf::from("token.json"));
        assert_eq!(settings.clear_range, resolve_range("G3:V").unwrap());
        assert_eq!(settings.report.cell, CellRef::new(4, 2));
        assert_eq!(settings.report.label, "Upper Caf.");
        assert_eq!(settings.log_format, LogFormat::Text);
    }

    #[test]
    fn missing_required_variable_is_named() {
        for (var, _) in REQUIRED {
            let pairs: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != var).collect();
            let err = Settings::from_lookup(env(&pairs)).unwrap_err();
            assert_eq!(err, ConfigError::Missing(var));
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let err = Settings::from_lookup(env(&with(&[(EUREKA_CLIENT_ID, "")]))).unwrap_err();
        assert_eq!(err, ConfigError::Missing(EUREKA_CLIENT_ID));
    }

    #[test]
    fn clear_time_is_floored() {
        let settings = Settings::from_lookup(env(&with(&[(UTC_CLEAR_TIME, "3600.9")]))).unwrap();
        assert_eq!(settings.clear_time.seconds(), 3600);
    }

    #[test]
    fn clear_time_out_of_range_is_rejected() {
        for bad in ["86400", "-1", "NaN", "inf", "soon"] {
            let err = Settings::from_lookup(env(&with(&[(UTC_CLEAR_TIME, bad)]))).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidInstant { .. }),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn invalid_urls_are_rejected() {
        let err = Settings::from_lookup(env(&with(&[(EUREKA_URL, "not a url")]))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: EUREKA_URL, .. }));

        let err = Settings::from_lookup(env(&with(&[(WEBHOOK_URL, "::")]))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: WEBHOOK_URL, .. }));
    }

    #[test]
    fn webhook_is_optional() {
        let settings = Settings::from_lookup(env(&with(&[(
            WEBHOOK_URL,
            "https://discord.com/api/webhooks/1/abc",
        )])))
        .unwrap();
        assert_eq!(
            settings.webhook_url.map(String::from),
            Some("https://discord.com/api/webhooks/1/abc".to_string())
        );
    }

    #[test]
    fn overrides_are_resolved() {
        let settings = Settings::from_lookup(env(&with(&[
            (CLEAR_RANGE, "b2:d10"),
            (REPORT_CELL, "A1"),
            (REPORT_LABEL, "Lower Caf."),
            (GOOGLE_TOKEN_PATH, "/etc/rotation/token.json"),
            (LOG_FORMAT, "JSON"),
        ])))
        .unwrap();
        assert_eq!(settings.clear_range, resolve_range("B2:D10").unwrap());
        assert_eq!(settings.report.cell, CellRef::new(0, 0));
        assert_eq!(settings.report.label, "Lower Caf.");
        assert_eq!(settings.token_path, PathBuf::from("/etc/rotation/token.json"));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        let err = Settings::from_lookup(env(&with(&[(CLEAR_RANGE, "A1-B2")]))).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidAddress {
                var: CLEAR_RANGE,
                value: "A1-B2".to_string()
            }
        );
        let err = Settings::from_lookup(env(&with(&[(REPORT_CELL, "3E")]))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { var: REPORT_CELL, .. }));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = LogFormat::from_lookup(env(&[(LOG_FORMAT, "yaml")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogFormat { .. }));
    }

    #[test]
    fn invalid_log_format_fails_settings() {
        let err = Settings::from_lookup(env(&with(&[(LOG_FORMAT, "yaml")]))).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidLogFormat { var: LOG_FORMAT, ref value } if value == "yaml"
        ));
    }
}
