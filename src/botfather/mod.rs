//! BotFather conversation module.
//!
//! Creates bots and configures their description and avatar by chatting
//! with the platform's bot-management account.

mod channel;
mod creator;
mod handle;
mod parser;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::AgentChannel;
pub use creator::{BotCreator, mask_token};
pub use handle::{
    BOT_SUFFIX, FALLBACK_SUFFIX_DIGITS, HandleGenerator, MAX_HANDLE_LENGTH, MIN_HANDLE_LENGTH,
    PRIMARY_SUFFIX_DIGITS, normalize_handle, validate_handle,
};
pub use parser::{ConfirmKind, confirms, extract_token, is_handle_taken, is_rejection};
pub use types::{AgentButton, AgentMessage, CreationRequest, CreationResult};
