//! The conversation channel to the bot-management agent.

use std::path::Path;

use async_trait::async_trait;

use super::types::AgentMessage;
use crate::telegram::TelegramError;

/// A private chat with the bot-management agent.
///
/// The Telegram implementation is [`crate::telegram::BotFatherChat`]; tests
/// drive the conversation through scripted fakes.
#[async_trait]
pub trait AgentChannel: Send + Sync {
    /// Sends a text message to the agent.
    async fn send_text(&self, text: &str) -> Result<(), TelegramError>;

    /// Uploads an image file and sends it to the agent as a photo.
    async fn send_photo(&self, path: &Path) -> Result<(), TelegramError>;

    /// Returns up to `limit` most recent messages of the chat, newest first.
    async fn recent_messages(&self, limit: usize) -> Result<Vec<AgentMessage>, TelegramError>;

    /// Presses an inline button of the given message.
    async fn press_button(&self, message_id: i32, data: &[u8]) -> Result<(), TelegramError>;
}
