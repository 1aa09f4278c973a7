//! Environment configuration
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.7.0
//!
//! ## Changelog
//! - 2.0.0: Dispatcher settings (prefix, admins, throttle, notices, member log)
//! - 1.0.0: Initial creation

use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_PREFIX: &str = "_";
pub const DEFAULT_GUILD_SETTINGS_PATH: &str = "guilds.yaml";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required environment variable is not set.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub log_level: String,
    pub command_prefix: String,
    pub bot_admins: HashSet<String>,
    /// Put users who keep commanding with an empty bucket into cooldown
    pub throttle_on_empty: bool,
    /// Reply with a notice instead of dropping rate limited commands silently
    pub rate_limit_notice: bool,
    pub member_log_channel_id: Option<String>,
    pub guild_settings_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = non_empty("DISCORD_TOKEN")
            .ok_or_else(|| ConfigError::MissingEnvVar("DISCORD_TOKEN".to_string()))?;

        let command_prefix = lookup("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        if command_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                key: "COMMAND_PREFIX".to_string(),
                reason: "prefix must not contain whitespace".to_string(),
            });
        }

        let bot_admins = non_empty("BOT_ADMINS")
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            discord_token,
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            command_prefix,
            bot_admins,
            throttle_on_empty: parse_flag("THROTTLE_ON_EMPTY", non_empty("THROTTLE_ON_EMPTY"))?,
            rate_limit_notice: parse_flag("RATE_LIMIT_NOTICE", non_empty("RATE_LIMIT_NOTICE"))?,
            member_log_channel_id: non_empty("MEMBER_LOG_CHANNEL_ID"),
            guild_settings_path: non_empty("GUILD_SETTINGS_PATH")
                .unwrap_or_else(|| DEFAULT_GUILD_SETTINGS_PATH.to_string()),
        })
    }
}

fn parse_flag(key: &str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("expected true or false, got '{v}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_token_is_required() {
        assert_eq!(
            config_from(&[]).unwrap_err(),
            ConfigError::MissingEnvVar("DISCORD_TOKEN".to_string())
        );
        assert!(config_from(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DISCORD_TOKEN", "token")]).unwrap();
        assert_eq!(config.command_prefix, DEFAULT_PREFIX);
        assert_eq!(config.log_level, "info");
        assert!(config.bot_admins.is_empty());
        assert!(!config.throttle_on_empty);
        assert!(!config.rate_limit_notice);
        assert_eq!(config.member_log_channel_id, None);
        assert_eq!(config.guild_settings_path, DEFAULT_GUILD_SETTINGS_PATH);
    }

    #[test]
    fn test_admins_and_flags() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "token"),
            ("BOT_ADMINS", "1, 2,,3"),
            ("THROTTLE_ON_EMPTY", "true"),
            ("RATE_LIMIT_NOTICE", "0"),
            ("COMMAND_PREFIX", "!"),
        ])
        .unwrap();

        assert_eq!(config.bot_admins.len(), 3);
        assert!(config.bot_admins.contains("2"));
        assert!(config.throttle_on_empty);
        assert!(!config.rate_limit_notice);
        assert_eq!(config.command_prefix, "!");
    }

    #[test]
    fn test_invalid_flag() {
        let err = config_from(&[("DISCORD_TOKEN", "token"), ("THROTTLE_ON_EMPTY", "maybe")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "THROTTLE_ON_EMPTY"));
    }

    #[test]
    fn test_prefix_with_whitespace_is_rejected() {
        assert!(config_from(&[("DISCORD_TOKEN", "token"), ("COMMAND_PREFIX", "! ")]).is_err());
    }
}
