//! Application configuration.
//!
//! Values come from the environment (optionally a `.env` file); command-line
//! flags override them.

use buybot_core::Trigger;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "dev" | "development" => RunMode::Development,
            _ => RunMode::Production,
        }
    }

    /// Log level used when none is given explicitly.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            RunMode::Development => "debug",
            RunMode::Production => "info",
        }
    }
}

/// Overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub interval_secs: Option<u64>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot token.
    pub telegram_token: String,
    /// Run mode.
    pub mode: RunMode,
    /// Explorer API base URL.
    pub market_api_url: String,
    /// Explorer API key.
    pub market_api_key: Option<String>,
    /// Image sent with the onboarding text in private chats.
    pub onboarding_image: Option<String>,
    /// Path of the persisted bot config.
    pub config_path: PathBuf,
    /// Fixed update interval.
    pub update_interval: Duration,
    /// Recent transactions requested per address.
    pub transaction_limit: usize,
}

impl AppConfig {
    pub const DEFAULT_API_URL: &'static str = "https://public-api.solscan.io";
    pub const DEFAULT_CONFIG_PATH: &'static str = "bot_config.json";
    pub const DEFAULT_INTERVAL_SECS: u64 = 300;
    pub const DEFAULT_TRANSACTION_LIMIT: usize = 10;

    /// Build from the process environment.
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(
        overrides: CliOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_token = get("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let interval_secs = match overrides.interval_secs {
            Some(secs) => secs,
            None => parse_var(get("UPDATE_INTERVAL_SECS"), "UPDATE_INTERVAL_SECS")?
                .unwrap_or(Self::DEFAULT_INTERVAL_SECS),
        };
        if interval_secs == 0 || interval_secs > Trigger::MAX_PERIOD.as_secs() {
            return Err(ConfigError::Invalid {
                key: "UPDATE_INTERVAL_SECS",
                value: interval_secs.to_string(),
            });
        }

        let transaction_limit = parse_var(get("TRANSACTION_LIMIT"), "TRANSACTION_LIMIT")?
            .unwrap_or(Self::DEFAULT_TRANSACTION_LIMIT);

        Ok(Self {
            telegram_token,
            mode: get("BOT_ENV").map(|v| RunMode::parse(&v)).unwrap_or_default(),
            market_api_url: get("MARKET_API_URL")
                .unwrap_or_else(|| Self::DEFAULT_API_URL.to_string()),
            market_api_key: get("MARKET_API_KEY"),
            onboarding_image: get("ONBOARDING_IMAGE"),
            config_path: overrides
                .config_path
                .or_else(|| get("CONFIG_PATH").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_PATH)),
            update_interval: Duration::from_secs(interval_secs),
            transaction_limit,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { key, value: v })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_token_fails() {
        let result = AppConfig::from_lookup(CliOverrides::default(), lookup(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("TELOXIDE_TOKEN"));

        let result =
            AppConfig::from_lookup(CliOverrides::default(), lookup(&[("TELOXIDE_TOKEN", " ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config =
            AppConfig::from_lookup(CliOverrides::default(), lookup(&[("TELOXIDE_TOKEN", "t")]))
                .unwrap();
        assert_eq!(config.mode, RunMode::Production);
        assert_eq!(config.market_api_url, AppConfig::DEFAULT_API_URL);
        assert_eq!(config.config_path, PathBuf::from("bot_config.json"));
        assert_eq!(config.update_interval, Duration::from_secs(300));
        assert_eq!(config.transaction_limit, 10);
        assert!(config.market_api_key.is_none());
        assert!(config.onboarding_image.is_none());
    }

    #[test]
    fn test_env_values_and_overrides() {
        let vars = lookup(&[
            ("TELOXIDE_TOKEN", "t"),
            ("BOT_ENV", "development"),
            ("UPDATE_INTERVAL_SECS", "60"),
            ("CONFIG_PATH", "/data/env.json"),
            ("TRANSACTION_LIMIT", "25"),
            ("MARKET_API_KEY", "secret"),
        ]);
        let overrides = CliOverrides {
            config_path: Some(PathBuf::from("/data/cli.json")),
            interval_secs: None,
        };
        let config = AppConfig::from_lookup(overrides, vars).unwrap();
        assert_eq!(config.mode, RunMode::Development);
        assert_eq!(config.update_interval, Duration::from_secs(60));
        assert_eq!(config.config_path, PathBuf::from("/data/cli.json"));
        assert_eq!(config.transaction_limit, 25);
        assert_eq!(config.market_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let result = AppConfig::from_lookup(
            CliOverrides::default(),
            lookup(&[("TELOXIDE_TOKEN", "t"), ("UPDATE_INTERVAL_SECS", "soon")]),
        );
        assert_eq!(
            result.unwrap_err(),
            ConfigError::Invalid {
                key: "UPDATE_INTERVAL_SECS",
                value: "soon".to_string()
            }
        );

        let result = AppConfig::from_lookup(
            CliOverrides {
                interval_secs: Some(0),
                ..Default::default()
            },
            lookup(&[("TELOXIDE_TOKEN", "t")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_interval_above_one_year_rejected() {
        let result = AppConfig::from_lookup(
            CliOverrides::default(),
            lookup(&[
                ("TELOXIDE_TOKEN", "t"),
                ("UPDATE_INTERVAL_SECS", "1000000000000000"),
            ]),
        );
        assert_eq!(
            result.unwrap_err(),
            ConfigError::Invalid {
                key: "UPDATE_INTERVAL_SECS",
                value: "1000000000000000".to_string()
            }
        );

        let result = AppConfig::from_lookup(
            CliOverrides {
                interval_secs: Some(Trigger::MAX_PERIOD.as_secs() + 1),
                ..Default::default()
            },
            lookup(&[("TELOXIDE_TOKEN", "t")]),
        );
        assert!(result.is_err());

        let config = AppConfig::from_lookup(
            CliOverrides {
                interval_secs: Some(Trigger::MAX_PERIOD.as_secs()),
                ..Default::default()
            },
            lookup(&[("TELOXIDE_TOKEN", "t")]),
        )
        .unwrap();
        assert_eq!(config.update_interval, Trigger::MAX_PERIOD);
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!(RunMode::parse("dev"), RunMode::Development);
        assert_eq!(RunMode::parse("Development"), RunMode::Development);
        assert_eq!(RunMode::parse("production"), RunMode::Production);
        assert_eq!(RunMode::parse("anything"), RunMode::Production);
        assert_eq!(RunMode::Development.default_log_level(), "debug");
    }
}
