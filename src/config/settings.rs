//! Application settings and Telegram configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, validate_description};
use crate::botfather::HandleGenerator;

/// Telegram API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org/apps>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org/apps>).
    pub api_hash: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("sessions/bot_creator.session")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String) -> Self {
        Self {
            api_id,
            api_hash,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TELEGRAM_API_ID` and `TELEGRAM_API_HASH` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if the API ID or hash is missing, or the ID is not a
    /// positive number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_id: i32 = lookup("TELEGRAM_API_ID")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("TELEGRAM_API_ID"))?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;

        if api_id <= 0 {
            return Err(ConfigError::InvalidApiId);
        }

        let api_hash = lookup("TELEGRAM_API_HASH")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("TELEGRAM_API_HASH"))?;

        let mut config = Self::new(api_id, api_hash.trim().to_owned());
        if let Some(path) = lookup("TELEGRAM_SESSION_PATH") {
            config.session_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

/// Settings for the BotFather conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorSettings {
    /// Description applied to every new bot unless overridden.
    #[serde(default = "default_description")]
    pub description: String,

    /// Prefix of generated bot usernames.
    #[serde(default = "default_username_prefix")]
    pub username_prefix: String,

    /// Delay after each message sent to BotFather, in seconds.
    #[serde(default = "default_message_delay")]
    pub message_delay_secs: u64,

    /// Username of the bot-management account.
    #[serde(default = "default_botfather_username")]
    pub botfather_username: String,
}

fn default_description() -> String {
    "Want the same gift? Check out @FameGifterBot\n\nBot created for entertainment purposes."
        .to_owned()
}

fn default_username_prefix() -> String {
    "famegifter".to_owned()
}

fn default_message_delay() -> u64 {
    3
}

fn default_botfather_username() -> String {
    "BotFather".to_owned()
}

impl Default for CreatorSettings {
    fn default() -> Self {
        Self {
            description: default_description(),
            username_prefix: default_username_prefix(),
            message_delay_secs: default_message_delay(),
            botfather_username: default_botfather_username(),
        }
    }
}

impl CreatorSettings {
    /// Creates settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates settings from an arbitrary variable source with defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            description: lookup("BOT_DESCRIPTION")
                .filter(|s| !s.trim().is_empty())
                .map_or_else(default_description, |s| s.replace("\\n", "\n")),
            username_prefix: lookup("USERNAME_PREFIX")
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(default_username_prefix),
            message_delay_secs: lookup("MESSAGE_DELAY_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_message_delay),
            botfather_username: lookup("BOTFATHER_USERNAME")
                .map(|s| s.trim().trim_start_matches('@').to_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(default_botfather_username),
        }
    }

    /// Returns the delay to wait after each message.
    #[must_use]
    pub const fn message_delay(&self) -> Duration {
        Duration::from_secs(self.message_delay_secs)
    }

    /// Validates the description and username prefix.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_description(&self.description)?;
        HandleGenerator::new(&self.username_prefix)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,
}
