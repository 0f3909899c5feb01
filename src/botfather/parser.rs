//! Pattern matching over BotFather's free-text replies.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{AgentButton, AgentMessage};

/// Longest error text copied out of a BotFather reply.
pub const MAX_ERROR_CHARS: usize = 500;

static TOKEN_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\d+:[A-Za-z0-9_-]{20,})",
        r"(?is)Use this token.*?(\d+:[A-Za-z0-9_-]+)",
        r"(?is)Токен.*?(\d+:[A-Za-z0-9_-]+)",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

const REJECTION_MARKERS: &[&str] = &["sorry", "error", "already", "taken", "invalid", "not available"];

const TAKEN_MARKERS: &[&str] = &["already", "taken"];

const SUCCESS_MARKERS: &[&str] = &["successfully", "успешно", "success"];

const FAILURE_MARKERS: &[&str] = &["error", "ошибка", "sorry", "invalid"];

/// What a configuration step expects BotFather to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKind {
    Description,
    Avatar,
}

impl ConfirmKind {
    const fn marker(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Avatar => "picture",
        }
    }
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    let lower = text.to_lowercase();
    markers.iter().any(|marker| lower.contains(marker))
}

/// Extracts a bot token from a reply, trying the most specific pattern first.
#[must_use]
pub fn extract_token(text: &str) -> Option<String> {
    TOKEN_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Whether a reply looks like a refusal.
#[must_use]
pub fn is_rejection(text: &str) -> bool {
    contains_any(text, REJECTION_MARKERS)
}

/// Whether an error says the requested username is already in use.
#[must_use]
pub fn is_handle_taken(error: &str) -> bool {
    contains_any(error, TAKEN_MARKERS)
}

/// Decides whether a configuration step succeeded.
///
/// `messages` are newest first; the first incoming message that carries a
/// success or failure marker decides. No decisive message means failure.
#[must_use]
pub fn confirms(messages: &[AgentMessage], kind: ConfirmKind) -> bool {
    for msg in messages.iter().filter(|m| !m.outgoing && !m.text.is_empty()) {
        if contains_any(&msg.text, SUCCESS_MARKERS) || contains_any(&msg.text, &[kind.marker()]) {
            return true;
        }
        if contains_any(&msg.text, FAILURE_MARKERS) {
            return false;
        }
    }
    false
}

/// Picks the button that selects `handle`, or the first button offered.
#[must_use]
pub fn find_bot_button<'a>(rows: &'a [Vec<AgentButton>], handle: &str) -> Option<&'a AgentButton> {
    let needle = handle.trim_start_matches('@').to_lowercase();

    rows.iter()
        .flatten()
        .find(|button| button.text.to_lowercase().contains(&needle))
        .or_else(|| rows.iter().flatten().next())
}

/// Shortens an error text to [`MAX_ERROR_CHARS`] characters.
#[must_use]
pub fn clip_error(text: &str) -> String {
    text.chars().take(MAX_ERROR_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATED: &str = "Done! Congratulations on your new bot. You will find it at \
        t.me/coolbot. Use this token to access the HTTP API:\n\
        1234567890:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw\n\
        Keep your token secure and store it safely.";

    #[test]
    fn test_extract_token_from_botfather_reply() {
        assert_eq!(
            extract_token(CREATED).as_deref(),
            Some("1234567890:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw")
        );
    }

    #[test]
    fn test_extract_token_short_token_after_marker() {
        assert_eq!(
            extract_token("Use this token to access the API:\n42:short_tok").as_deref(),
            Some("42:short_tok")
        );
        assert_eq!(
            extract_token("Токен для доступа: 42:abc-def").as_deref(),
            Some("42:abc-def")
        );
    }

    #[test]
    fn test_extract_token_absent() {
        assert_eq!(extract_token("Alright, a new bot. How are we going to call it?"), None);
        assert_eq!(extract_token("Meeting at 10:30"), None);
    }

    #[test]
    fn test_rejection_detection() {
        assert!(is_rejection(
            "Sorry, this username is already taken. Please try something different."
        ));
        assert!(is_rejection("Sorry, this username is invalid."));
        assert!(!is_rejection("Good. Now let's choose a username for your bot."));
    }

    #[test]
    fn test_handle_taken_detection() {
        assert!(is_handle_taken("Sorry, this username is already taken."));
        assert!(is_handle_taken("TAKEN"));
        assert!(!is_handle_taken("Sorry, this username is invalid."));
        assert!(!is_handle_taken("Token not found in BotFather response"));
    }

    #[test]
    fn test_confirms_success() {
        let messages = vec![AgentMessage::incoming(
            3,
            "Success! Description updated. /help",
        )];
        assert!(confirms(&messages, ConfirmKind::Description));
    }

    #[test]
    fn test_confirms_kind_marker() {
        let messages = vec![AgentMessage::incoming(3, "OK. Bot picture changed.")];
        assert!(confirms(&messages, ConfirmKind::Avatar));
        assert!(!confirms(&messages, ConfirmKind::Description));
    }

    #[test]
    fn test_confirms_newest_decides() {
        let messages = vec![
            AgentMessage::incoming(5, "Sorry, invalid photo."),
            AgentMessage::incoming(4, "Success! Profile photo updated."),
        ];
        assert!(!confirms(&messages, ConfirmKind::Avatar));
    }

    #[test]
    fn test_confirms_ignores_outgoing() {
        let mut ours = AgentMessage::incoming(2, "This bot description was set successfully");
        ours.outgoing = true;
        assert!(!confirms(&[ours], ConfirmKind::Description));
        assert!(!confirms(&[], ConfirmKind::Description));
    }

    #[test]
    fn test_find_bot_button() {
        let rows = vec![
            vec![AgentButton::inline("@otherbot", "a"), AgentButton::inline("@CoolBot", "b")],
            vec![AgentButton::inline("@thirdbot", "c")],
        ];

        let button = find_bot_button(&rows, "@coolbot").unwrap();
        assert_eq!(button.data.as_deref(), Some(&b"b"[..]));

        let fallback = find_bot_button(&rows, "missingbot").unwrap();
        assert_eq!(fallback.text, "@otherbot");

        assert!(find_bot_button(&[], "coolbot").is_none());
    }

    #[test]
    fn test_clip_error() {
        let long = "я".repeat(600);
        assert_eq!(clip_error(&long).chars().count(), MAX_ERROR_CHARS);
        assert_eq!(clip_error("short"), "short");
    }
}
