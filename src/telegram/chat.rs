//! Private chat with the bot-management account.

use std::path::Path;

use async_trait::async_trait;
use grammers_client::Client;
use grammers_client::message::InputMessage;
use grammers_session::types::PeerRef;
use grammers_tl_types as tl;
use tracing::debug;

use super::TelegramError;
use crate::botfather::{AgentButton, AgentChannel, AgentMessage};

/// A resolved chat with BotFather (or a compatible agent).
#[derive(Clone)]
pub struct BotFatherChat {
    client: Client,
    peer: PeerRef,
}

impl BotFatherChat {
    pub(super) const fn new(client: Client, peer: PeerRef) -> Self {
        Self { client, peer }
    }
}

impl std::fmt::Debug for BotFatherChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotFatherChat").finish_non_exhaustive()
    }
}

#[async_trait]
impl AgentChannel for BotFatherChat {
    async fn send_text(&self, text: &str) -> Result<(), TelegramError> {
        self.client.send_message(self.peer, text).await?;
        Ok(())
    }

    async fn send_photo(&self, path: &Path) -> Result<(), TelegramError> {
        let uploaded = self
            .client
            .upload_file(path)
            .await
            .map_err(|e| TelegramError::Upload(e.to_string()))?;

        debug!("Uploaded {}", path.display());

        self.client
            .send_message(self.peer, InputMessage::default().photo(uploaded))
            .await?;
        Ok(())
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<AgentMessage>, TelegramError> {
        let mut iter = self.client.iter_messages(self.peer).limit(limit);
        let mut messages = Vec::with_capacity(limit);

        while let Some(message) = iter.next().await? {
            messages.push(AgentMessage {
                id: message.id(),
                outgoing: message.outgoing(),
                text: message.text().to_owned(),
                buttons: keyboard_rows(message.reply_markup()),
            });
        }

        Ok(messages)
    }

    async fn press_button(&self, message_id: i32, data: &[u8]) -> Result<(), TelegramError> {
        let request = tl::functions::messages::GetBotCallbackAnswer {
            game: false,
            peer: self.peer.into(),
            msg_id: message_id,
            data: Some(data.to_vec()),
            password: None,
        };

        self.client.invoke(&request).await?;
        Ok(())
    }
}

/// Flattens a reply markup into rows of buttons we know how to press.
fn keyboard_rows(markup: Option<tl::enums::ReplyMarkup>) -> Vec<Vec<AgentButton>> {
    let rows = match markup {
        Some(tl::enums::ReplyMarkup::ReplyInlineMarkup(markup)) => markup.rows,
        Some(tl::enums::ReplyMarkup::ReplyKeyboardMarkup(markup)) => markup.rows,
        _ => return Vec::new(),
    };

    rows.into_iter()
        .map(|tl::enums::KeyboardButtonRow::Row(row)| {
            row.buttons.into_iter().filter_map(convert_button).collect()
        })
        .collect()
}

fn convert_button(button: tl::enums::KeyboardButton) -> Option<AgentButton> {
    match button {
        tl::enums::KeyboardButton::Callback(b) => Some(AgentButton::inline(b.text, b.data)),
        tl::enums::KeyboardButton::Button(b) => Some(AgentButton::reply(b.text)),
        _ => None,
    }
}
