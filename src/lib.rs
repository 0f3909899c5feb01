//! Bot Creator Library
//!
//! A Telegram userbot that creates bots through BotFather.
//!
//! This crate provides the core functionality for:
//! - Loading and validating configuration from the environment
//! - Connecting to Telegram via `MTProto` as a regular user
//! - Scripting the `/newbot` conversation and extracting the token
//! - Setting the new bot's description and avatar

pub mod botfather;
pub mod config;
pub mod provision;
pub mod telegram;
