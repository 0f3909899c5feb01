//! Configuration module for the bot creator.
//!
//! Handles loading and validation of Telegram API credentials and the
//! settings that drive the BotFather conversation.

mod settings;
mod validation;

pub use settings::{ConfigError, CreatorSettings, TelegramConfig};
pub use validation::{ValidationError, validate_bot_name, validate_description};

/// Minimum length of a bot display name.
pub const MIN_BOT_NAME_LENGTH: usize = 3;

/// Maximum length of a bot display name.
pub const MAX_BOT_NAME_LENGTH: usize = 100;

/// Maximum length of a bot description accepted by BotFather.
pub const MAX_DESCRIPTION_LENGTH: usize = 512;
