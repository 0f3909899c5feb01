//! Bot username ("handle") rules and random handle generation.

use rand::Rng;

use crate::config::ValidationError;

/// Suffix every bot username must end with.
pub const BOT_SUFFIX: &str = "bot";

/// Minimum length of a bot username.
pub const MIN_HANDLE_LENGTH: usize = 5;

/// Maximum length of a bot username.
pub const MAX_HANDLE_LENGTH: usize = 32;

/// Random digits used for the first generated handle.
pub const PRIMARY_SUFFIX_DIGITS: usize = 8;

/// Random digits used for the handle generated after a collision.
pub const FALLBACK_SUFFIX_DIGITS: usize = 10;

/// Builds handles of the form `<prefix><random digits>bot`.
#[derive(Debug, Clone)]
pub struct HandleGenerator {
    prefix: String,
}

impl HandleGenerator {
    /// Creates a generator, rejecting prefixes that cannot yield valid handles.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPrefix`] for such a prefix.
    pub fn new(prefix: &str) -> Result<Self, ValidationError> {
        let prefix = normalize_handle(prefix);
        let invalid = |reason| ValidationError::InvalidPrefix {
            prefix: prefix.clone(),
            reason,
        };

        if !prefix.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(invalid("must start with a latin letter"));
        }
        if !prefix.chars().all(is_handle_char) {
            return Err(invalid("only latin letters, digits and underscores are allowed"));
        }
        if prefix.len() + FALLBACK_SUFFIX_DIGITS + BOT_SUFFIX.len() > MAX_HANDLE_LENGTH {
            return Err(invalid("too long to fit a random suffix"));
        }

        Ok(Self { prefix })
    }

    /// Returns the configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generates a handle with `digits` random decimal digits.
    #[must_use]
    pub fn generate(&self, digits: usize) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..digits)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        format!("{}{suffix}{BOT_SUFFIX}", self.prefix)
    }
}

/// Strips surrounding whitespace and a leading `@`.
#[must_use]
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_owned()
}

/// Checks a handle against Telegram's bot username rules.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidHandle`] naming the broken rule.
pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    let invalid = |reason| ValidationError::InvalidHandle {
        handle: handle.to_owned(),
        reason,
    };

    if !(MIN_HANDLE_LENGTH..=MAX_HANDLE_LENGTH).contains(&handle.len()) {
        return Err(invalid("must be between 5 and 32 characters"));
    }
    if !handle.chars().all(is_handle_char) {
        return Err(invalid("only latin letters, digits and underscores are allowed"));
    }
    if !handle.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(invalid("must start with a latin letter"));
    }
    if !handle.to_ascii_lowercase().ends_with(BOT_SUFFIX) {
        return Err(invalid("must end in 'bot'"));
    }

    Ok(())
}

fn is_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
