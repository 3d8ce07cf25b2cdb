//! Messaging gateway abstraction.
//!
//! The controller renders through this trait instead of calling Telegram
//! directly, so conversations can be driven in tests with a recording
//! gateway. Texts are Telegram HTML.

use crate::bot::callback::CallbackAction;
use anyhow::Result;
use async_trait::async_trait;

/// Chat identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message identifier within a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// What pressing a button does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonTarget {
    /// Send a callback back to the bot
    Callback(CallbackAction),
    /// Open a link
    Url(String),
}

/// A single inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Button label
    pub label: String,
    /// Button behaviour
    pub target: ButtonTarget,
}

impl Button {
    /// Button that sends a callback action
    #[must_use]
    pub fn callback(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Callback(action),
        }
    }

    /// Button that opens a link
    #[must_use]
    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Url(url.into()),
        }
    }

    /// The button's callback action, if any
    #[must_use]
    pub fn action(&self) -> Option<&CallbackAction> {
        match &self.target {
            ButtonTarget::Callback(action) => Some(action),
            ButtonTarget::Url(_) => None,
        }
    }
}

/// Inline keyboard: rows of buttons
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    /// Button rows, top to bottom
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Empty keyboard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row with a single button
    #[must_use]
    pub fn button(mut self, button: Button) -> Self {
        self.rows.push(vec![button]);
        self
    }

    /// Append a row; empty rows are skipped
    #[must_use]
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.rows.push(buttons);
        }
        self
    }

    /// All buttons, row by row
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// All callback actions, row by row
    pub fn actions(&self) -> impl Iterator<Item = &CallbackAction> {
        self.buttons().filter_map(Button::action)
    }
}

/// Outbound side of the chat transport
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a new message, returning its ID
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageId>;

    /// Replace the text and keyboard of an existing message
    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()>;

    /// Delete a message
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    /// Acknowledge a button press, optionally showing a notification or alert
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>, alert: bool)
        -> Result<()>;
}
