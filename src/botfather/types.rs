//! Request, result and message types of the BotFather conversation.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// A button attached to a message from the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentButton {
    /// Button label.
    pub text: String,

    /// Callback payload for inline buttons, `None` for reply-keyboard buttons.
    pub data: Option<Vec<u8>>,
}

impl AgentButton {
    /// Creates an inline (callback) button.
    #[must_use]
    pub fn inline(text: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            text: text.into(),
            data: Some(data.into()),
        }
    }

    /// Creates a reply-keyboard button, pressed by sending its label.
    #[must_use]
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
        }
    }
}

/// Snapshot of one message in the conversation with the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentMessage {
    /// Message ID within the chat.
    pub id: i32,

    /// Whether we sent this message ourselves.
    pub outgoing: bool,

    /// Message text (empty for media without caption).
    pub text: String,

    /// Keyboard rows attached to the message.
    pub buttons: Vec<Vec<AgentButton>>,
}

impl AgentMessage {
    /// Creates an incoming text message.
    #[must_use]
    pub fn incoming(id: i32, text: impl Into<String>) -> Self {
        Self {
            id,
            outgoing: false,
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    /// Attaches keyboard rows to the message.
    #[must_use]
    pub fn with_buttons(mut self, buttons: Vec<Vec<AgentButton>>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Returns `true` if the message has any buttons.
    #[must_use]
    pub fn has_buttons(&self) -> bool {
        self.buttons.iter().any(|row| !row.is_empty())
    }
}

/// Parameters of a single bot creation.
#[derive(Debug, Clone)]
pub struct CreationRequest {
    /// Display name of the new bot.
    pub name: String,

    /// Desired username; a generated one is used when `None`.
    pub handle: Option<String>,

    /// Delay after each message sent to the agent.
    pub delay: Duration,
}

impl CreationRequest {
    /// Creates a request that uses a generated username.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            handle: None,
            delay,
        }
    }

    /// Requests a specific username.
    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }
}

/// Outcome of a bot creation attempt.
///
/// A successful result always carries a non-empty token and handle and no
/// error; a failed one always carries a non-empty error and no token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreationResult {
    success: bool,
    token: Option<String>,
    handle: Option<String>,
    error: Option<String>,
}

impl CreationResult {
    /// Creates a successful result.
    ///
    /// Falls back to a failure if the token or handle is empty.
    #[must_use]
    pub fn success(token: impl Into<String>, handle: impl Into<String>) -> Self {
        let token = token.into();
        let handle = handle.into();

        if token.trim().is_empty() {
            return Self::failure("BotFather returned an empty token");
        }
        if handle.trim().is_empty() {
            return Self::failure("Bot username is empty");
        }

        Self {
            success: true,
            token: Some(token),
            handle: Some(handle),
            error: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "Unknown error".to_owned()
        } else {
            error
        };

        Self {
            success: false,
            token: None,
            handle: None,
            error: Some(error),
        }
    }

    /// Creates a failed result that remembers the attempted handle.
    #[must_use]
    pub fn failure_for(handle: impl Into<String>, error: impl Into<String>) -> Self {
        let mut result = Self::failure(error);
        let handle = handle.into();
        if !handle.is_empty() {
            result.handle = Some(handle);
        }
        result
    }

    /// Whether a token was obtained.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// The bot token, present only on success.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The bot username (the attempted one on failure, if known).
    #[must_use]
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    /// The error text, present only on failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl fmt::Display for CreationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.token, &self.handle, &self.error) {
            (Some(_), Some(handle), _) => write!(f, "created @{handle}"),
            (_, Some(handle), Some(error)) => write!(f, "failed to create @{handle}: {error}"),
            (_, _, error) => write!(f, "failed: {}", error.as_deref().unwrap_or("Unknown error")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_invariants() {
        let result = CreationResult::success("123:abc", "coolbot");
        assert!(result.is_success());
        assert_eq!(result.token(), Some("123:abc"));
        assert_eq!(result.handle(), Some("coolbot"));
        assert_eq!(result.error(), None);
    }

    #[test]
    fn test_empty_success_degrades_to_failure() {
        let result = CreationResult::success("", "coolbot");
        assert!(!result.is_success());
        assert!(result.token().is_none());
        assert!(!result.error().unwrap().is_empty());

        let result = CreationResult::success("123:abc", " ");
        assert!(!result.is_success());
        assert!(result.token().is_none());
    }

    #[test]
    fn test_failure_invariants() {
        let result = CreationResult::failure("");
        assert!(!result.is_success());
        assert_eq!(result.token(), None);
        assert_eq!(result.error(), Some("Unknown error"));

        let result = CreationResult::failure_for("coolbot", "taken");
        assert_eq!(result.handle(), Some("coolbot"));
        assert_eq!(result.token(), None);
        assert_eq!(result.to_string(), "failed to create @coolbot: taken");
    }

    #[test]
    fn test_message_buttons() {
        let msg = AgentMessage::incoming(1, "Choose a bot").with_buttons(vec![vec![]]);
        assert!(!msg.has_buttons());

        let msg = msg.with_buttons(vec![vec![AgentButton::reply("@coolbot")]]);
        assert!(msg.has_buttons());
    }
}
