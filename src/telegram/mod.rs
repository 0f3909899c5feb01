//! Telegram client wrapper module.
//!
//! Provides the user-account session used to authorize once and to talk
//! to BotFather.

mod chat;
mod client;

pub use chat::BotFatherChat;
pub use client::{
    Account, PwdToken as PasswordToken, TelegramError, Token as LoginToken, UserClient,
};
