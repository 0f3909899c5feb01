//! Validation of user-supplied bot parameters.

use thiserror::Error;

use super::{MAX_BOT_NAME_LENGTH, MAX_DESCRIPTION_LENGTH, MIN_BOT_NAME_LENGTH};

/// Errors produced when bot parameters break BotFather's rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bot name must be between {min} and {max} characters (got {length})")]
    BotNameLength {
        length: usize,
        min: usize,
        max: usize,
    },

    #[error("Description is empty")]
    EmptyDescription,

    #[error("Description exceeds maximum length: {length} > {max_length}")]
    DescriptionTooLong { length: usize, max_length: usize },

    #[error("Invalid username '{handle}': {reason}")]
    InvalidHandle { handle: String, reason: &'static str },

    #[error("Invalid username prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },
}

/// Checks that a display name fits BotFather's length limits.
///
/// # Errors
///
/// Returns [`ValidationError::BotNameLength`] if the trimmed name is too
/// short or too long.
pub fn validate_bot_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if (MIN_BOT_NAME_LENGTH..=MAX_BOT_NAME_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(ValidationError::BotNameLength {
            length,
            min: MIN_BOT_NAME_LENGTH,
            max: MAX_BOT_NAME_LENGTH,
        })
    }
}

/// Checks that a description is non-empty and short enough.
///
/// # Errors
///
/// Returns an error if the text is blank or too long.
pub fn validate_description(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }

    let length = text.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong {
            length,
            max_length: MAX_DESCRIPTION_LENGTH,
        });
    }

    Ok(())
}
