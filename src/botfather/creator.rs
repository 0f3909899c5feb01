//! The scripted BotFather conversation.
//!
//! Every step follows the same pattern: send a message, sleep for the
//! configured delay, read the newest messages and pattern-match the replies.
//! Only replies that arrived after our last outgoing message are considered.
//!
//! Creation:
//! 1. `/newbot` → display name → username
//! 2. Scan the replies for a token
//! 3. If BotFather turned the username down, start over once with a
//!    generated one. A custom username is replaced on any rejection, a
//!    generated one only when it is taken.
//!
//! Configuration (`/setdescription`, `/setuserpic`):
//! 1. Send the command
//! 2. Select the bot via inline button, or by sending `@username`
//! 3. Send the description text or the photo
//! 4. Look for a success or failure marker in the replies

use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::channel::AgentChannel;
use super::handle::{
    FALLBACK_SUFFIX_DIGITS, HandleGenerator, PRIMARY_SUFFIX_DIGITS, normalize_handle,
    validate_handle,
};
use super::parser::{
    ConfirmKind, clip_error, confirms, extract_token, find_bot_button, is_handle_taken,
    is_rejection,
};
use super::types::{AgentMessage, CreationRequest, CreationResult};
use crate::config::validate_bot_name;
use crate::telegram::TelegramError;

/// Messages read back after sending the username.
const CREATION_HISTORY: usize = 5;

/// Messages read back after a configuration step.
const CONFIRM_HISTORY: usize = 3;

/// Extra wait after steps BotFather takes longer to answer.
const SETTLE_TIME: Duration = Duration::from_secs(1);

/// How one `/newbot` exchange ended.
enum Attempt {
    /// A token, silence, or a transport error.
    Done(CreationResult),
    /// BotFather answered the username with a rejection.
    Rejected(CreationResult),
}

impl Attempt {
    fn into_result(self) -> CreationResult {
        match self {
            Self::Done(result) | Self::Rejected(result) => result,
        }
    }
}

const NO_RESPONSE: &str = "No response received from BotFather";
const TOKEN_NOT_FOUND: &str = "Token not found in BotFather response";

/// Drives bot creation and configuration over an [`AgentChannel`].
#[derive(Debug)]
pub struct BotCreator<C> {
    channel: C,
    generator: HandleGenerator,
    delay: Duration,
}

impl<C: AgentChannel> BotCreator<C> {
    /// Creates a creator; `delay` paces the configuration steps.
    #[must_use]
    pub const fn new(channel: C, generator: HandleGenerator, delay: Duration) -> Self {
        Self {
            channel,
            generator,
            delay,
        }
    }

    /// Returns the underlying channel.
    #[must_use]
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    /// Returns the pause taken after each configuration message.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Creates a bot, retrying at most once with a generated username.
    ///
    /// A custom username that fails local validation is replaced before
    /// BotFather sees it. One that BotFather rejects is replaced after the
    /// first exchange. A generated username is only replaced when taken.
    pub async fn provision(&self, request: &CreationRequest) -> CreationResult {
        let name = request.name.trim();
        if let Err(e) = validate_bot_name(name) {
            return CreationResult::failure(e.to_string());
        }

        let first = match request.handle.as_deref().map(normalize_handle) {
            Some(custom) => match validate_handle(&custom) {
                Ok(()) => Some((custom, true)),
                Err(e) => {
                    warn!("{}; using a generated username instead", e);
                    None
                }
            },
            None => Some((self.generator.generate(PRIMARY_SUFFIX_DIGITS), false)),
        };

        if let Some((handle, custom)) = first {
            match self.attempt(name, &handle, request.delay).await {
                Attempt::Rejected(result)
                    if custom || result.error().is_some_and(is_handle_taken) =>
                {
                    warn!("@{} was rejected by BotFather", handle);
                }
                attempt => return attempt.into_result(),
            }
        }

        let fallback = self.generator.generate(FALLBACK_SUFFIX_DIGITS);
        info!("Retrying once as @{}", fallback);

        self.create_bot(name, &fallback, request.delay).await
    }

    /// Runs one `/newbot` exchange for the given name and username.
    pub async fn create_bot(&self, name: &str, handle: &str, delay: Duration) -> CreationResult {
        self.attempt(name, handle, delay).await.into_result()
    }

    async fn attempt(&self, name: &str, handle: &str, delay: Duration) -> Attempt {
        info!("Creating bot \"{}\" as @{}", name, handle);

        match self.try_create(name, handle, delay).await {
            Ok(attempt) => {
                let result = match &attempt {
                    Attempt::Done(result) | Attempt::Rejected(result) => result,
                };
                match result.token() {
                    Some(token) => info!("Bot @{} created (token {})", handle, mask_token(token)),
                    None => warn!(
                        "Bot @{} was not created: {}",
                        handle,
                        result.error().unwrap_or_default()
                    ),
                }
                attempt
            }
            Err(e) => {
                error!("Bot creation error: {}", e);
                Attempt::Done(CreationResult::failure_for(handle, e.to_string()))
            }
        }
    }

    async fn try_create(
        &self,
        name: &str,
        handle: &str,
        delay: Duration,
    ) -> Result<Attempt, TelegramError> {
        self.send_and_wait("/newbot", delay).await?;
        self.send_and_wait(name, delay).await?;
        self.send_and_wait(handle, settled(delay)).await?;

        let replies = latest_replies(self.channel.recent_messages(CREATION_HISTORY).await?);

        if replies.is_empty() {
            return Ok(Attempt::Done(CreationResult::failure_for(handle, NO_RESPONSE)));
        }

        if let Some(token) = replies.iter().find_map(|m| extract_token(&m.text)) {
            return Ok(Attempt::Done(CreationResult::success(token, handle)));
        }

        Ok(match replies.iter().find(|m| is_rejection(&m.text)) {
            Some(m) => Attempt::Rejected(CreationResult::failure_for(handle, clip_error(&m.text))),
            None => Attempt::Done(CreationResult::failure_for(handle, TOKEN_NOT_FOUND)),
        })
    }

    /// Sets the description of one of our bots. Returns `true` if BotFather
    /// confirmed the change.
    pub async fn set_description(&self, handle: &str, text: &str) -> bool {
        let handle = normalize_handle(handle);
        info!("Setting description for @{}", handle);

        match self.try_set_description(&handle, text).await {
            Ok(confirmed) => {
                info!("Description for @{} confirmed: {}", handle, confirmed);
                confirmed
            }
            Err(e) => {
                error!("Description setting error: {}", e);
                false
            }
        }
    }

    async fn try_set_description(&self, handle: &str, text: &str) -> Result<bool, TelegramError> {
        self.send_and_wait("/setdescription", self.delay).await?;
        self.select_bot(handle).await?;
        self.send_and_wait(text, self.delay).await?;

        let replies = latest_replies(self.channel.recent_messages(CONFIRM_HISTORY).await?);
        Ok(confirms(&replies, ConfirmKind::Description))
    }

    /// Sets the profile picture of one of our bots. Returns `true` if
    /// BotFather confirmed the change.
    pub async fn set_avatar(&self, handle: &str, path: &Path) -> bool {
        let handle = normalize_handle(handle);

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            warn!("Avatar file {} does not exist", path.display());
            return false;
        }

        info!("Setting avatar for @{} from {}", handle, path.display());

        match self.try_set_avatar(&handle, path).await {
            Ok(confirmed) => {
                info!("Avatar for @{} confirmed: {}", handle, confirmed);
                confirmed
            }
            Err(e) => {
                error!("Avatar setting error: {}", e);
                false
            }
        }
    }

    async fn try_set_avatar(&self, handle: &str, path: &Path) -> Result<bool, TelegramError> {
        self.send_and_wait("/setuserpic", self.delay).await?;
        self.select_bot(handle).await?;

        self.channel.send_photo(path).await?;
        tokio::time::sleep(settled(self.delay)).await;

        let replies = latest_replies(self.channel.recent_messages(CONFIRM_HISTORY).await?);
        Ok(confirms(&replies, ConfirmKind::Avatar))
    }

    /// Answers BotFather's "choose a bot" prompt.
    async fn select_bot(&self, handle: &str) -> Result<(), TelegramError> {
        let prompt = self
            .channel
            .recent_messages(1)
            .await?
            .into_iter()
            .find(|m| !m.outgoing);

        let button = prompt
            .as_ref()
            .filter(|m| m.has_buttons())
            .and_then(|m| find_bot_button(&m.buttons, handle).map(|b| (m.id, b)));

        if let Some((message_id, button)) = button
            && let Some(data) = &button.data
        {
            debug!("Pressing button \"{}\"", button.text);
            match self.channel.press_button(message_id, data).await {
                Ok(()) => {
                    tokio::time::sleep(self.delay).await;
                    return Ok(());
                }
                Err(e) => warn!("Button click error: {}", e),
            }
        }

        self.send_and_wait(&format!("@{handle}"), self.delay).await
    }

    async fn send_and_wait(&self, text: &str, delay: Duration) -> Result<(), TelegramError> {
        debug!("-> BotFather: \"{}\"", truncate_for_log(text, 40));
        self.channel.send_text(text).await?;
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

/// Adds the settle time to a non-zero delay.
fn settled(delay: Duration) -> Duration {
    if delay.is_zero() {
        delay
    } else {
        delay + SETTLE_TIME
    }
}

/// Returns the incoming messages newer than our last outgoing one.
fn latest_replies(messages: Vec<AgentMessage>) -> Vec<AgentMessage> {
    messages
        .into_iter()
        .take_while(|m| !m.outgoing)
        .filter(|m| !m.text.is_empty())
        .collect()
}

/// Masks a bot token for logging (keeps the bot ID only).
pub fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, _)) => format!("{id}:****"),
        None => "****".to_owned(),
    }
}

fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
