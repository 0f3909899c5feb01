//! Scripted BotFather stand-ins for conversation tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use super::channel::AgentChannel;
use super::types::{AgentButton, AgentMessage};
use crate::telegram::TelegramError;

pub const TOKEN: &str = "1234567890:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw";

/// How the fake BotFather answers a username.
#[derive(Debug, Clone, Copy)]
pub enum HandleReply {
    Created,
    TakenOnce,
    AlwaysTaken,
    Invalid,
    Silent,
}

/// A scripted BotFather that answers like the real one.
#[derive(Debug)]
pub struct FakeBotFather {
    history: Mutex<Vec<AgentMessage>>,
    sent: Mutex<Vec<String>>,
    pub pressed: Mutex<Vec<(i32, Vec<u8>)>>,
    taken: Mutex<HashSet<String>>,
    handle_reply: HandleReply,
    offer_buttons: bool,
    fail_press: bool,
    awaiting: Mutex<&'static str>,
}

impl FakeBotFather {
    pub fn new(handle_reply: HandleReply) -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            pressed: Mutex::new(Vec::new()),
            taken: Mutex::new(HashSet::new()),
            handle_reply,
            offer_buttons: false,
            fail_press: false,
            awaiting: Mutex::new("command"),
        }
    }

    pub fn with_buttons(mut self) -> Self {
        self.offer_buttons = true;
        self
    }

    pub fn failing_buttons(mut self) -> Self {
        self.offer_buttons = true;
        self.fail_press = true;
        self
    }

    fn push(&self, outgoing: bool, text: &str, buttons: Vec<Vec<AgentButton>>) {
        let mut history = self.history.lock().unwrap();
        let id = i32::try_from(history.len()).unwrap() + 1;
        history.push(AgentMessage {
            id,
            outgoing,
            text: text.to_owned(),
            buttons,
        });
    }

    fn reply(&self, text: &str) {
        self.push(false, text, Vec::new());
    }

    fn bot_picker(&self) -> Vec<Vec<AgentButton>> {
        if self.offer_buttons {
            vec![
                vec![AgentButton::inline("@otherbot", "pick-other")],
                vec![AgentButton::inline("@coolbot", "pick-cool")],
            ]
        } else {
            Vec::new()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn newbot_count(&self) -> usize {
        self.sent().iter().filter(|s| *s == "/newbot").count()
    }

    fn answer_handle(&self, handle: &str) {
        let taken = {
            let mut taken = self.taken.lock().unwrap();
            match self.handle_reply {
                HandleReply::TakenOnce => taken.is_empty() && taken.insert(handle.to_owned()),
                HandleReply::AlwaysTaken => true,
                _ => false,
            }
        };

        match self.handle_reply {
            HandleReply::Silent => {}
            HandleReply::Invalid => self.reply("Sorry, this username is invalid."),
            _ if taken => self.reply(
                "Sorry, this username is already taken. Please try something different.",
            ),
            _ => self.reply(&format!(
                "Done! Congratulations on your new bot. You will find it at t.me/{handle}. \
                 Use this token to access the HTTP API:\n{TOKEN}\nKeep your token secure."
            )),
        }
    }
}

#[async_trait]
impl AgentChannel for FakeBotFather {
    async fn send_text(&self, text: &str) -> Result<(), TelegramError> {
        self.sent.lock().unwrap().push(text.to_owned());
        self.push(true, text, Vec::new());

        let state = *self.awaiting.lock().unwrap();
        let next = match (state, text) {
            (_, "/newbot") => {
                self.reply("Alright, a new bot. How are we going to call it?");
                "name"
            }
            (_, "/setdescription") => {
                self.push(false, "Choose a bot to change description.", self.bot_picker());
                "bot"
            }
            (_, "/setuserpic") => {
                self.push(false, "Choose a bot to change profile photo.", self.bot_picker());
                "bot"
            }
            ("name", _) => {
                self.reply("Good. Now let's choose a username for your bot.");
                "handle"
            }
            ("handle", handle) => {
                self.answer_handle(handle);
                "command"
            }
            ("bot", _) => {
                self.reply("OK. Send me the new description for the bot.");
                "description"
            }
            ("description", _) => {
                self.reply("Success! Description updated. /help");
                "command"
            }
            _ => {
                self.reply("Unrecognized command. Say what?");
                "command"
            }
        };
        *self.awaiting.lock().unwrap() = next;
        Ok(())
    }

    async fn send_photo(&self, _path: &Path) -> Result<(), TelegramError> {
        self.sent.lock().unwrap().push("<photo>".to_owned());
        self.push(true, "", Vec::new());
        self.reply("Success! Profile photo updated. /help");
        *self.awaiting.lock().unwrap() = "command";
        Ok(())
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<AgentMessage>, TelegramError> {
        let history = self.history.lock().unwrap();
        Ok(history.iter().rev().take(limit).cloned().collect())
    }

    async fn press_button(&self, message_id: i32, data: &[u8]) -> Result<(), TelegramError> {
        if self.fail_press {
            return Err(TelegramError::Invocation("DATA_INVALID".to_owned()));
        }
        self.pressed.lock().unwrap().push((message_id, data.to_vec()));
        self.reply("OK. Send me the new description for the bot.");
        *self.awaiting.lock().unwrap() = "description";
        Ok(())
    }
}

/// A channel whose transport is down.
#[derive(Debug)]
pub struct BrokenChannel;

#[async_trait]
impl AgentChannel for BrokenChannel {
    async fn send_text(&self, _text: &str) -> Result<(), TelegramError> {
        Err(TelegramError::Connection("socket closed".to_owned()))
    }

    async fn send_photo(&self, _path: &Path) -> Result<(), TelegramError> {
        Err(TelegramError::Connection("socket closed".to_owned()))
    }

    async fn recent_messages(&self, _limit: usize) -> Result<Vec<AgentMessage>, TelegramError> {
        Err(TelegramError::Connection("socket closed".to_owned()))
    }

    async fn press_button(&self, _message_id: i32, _data: &[u8]) -> Result<(), TelegramError> {
        Err(TelegramError::Connection("socket closed".to_owned()))
    }
}
