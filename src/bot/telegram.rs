//! Telegram implementation of the messaging gateway.

use crate::bot::gateway::{Button, ButtonTarget, ChatId, Keyboard, MessageId, MessagingGateway};
use crate::bot::resilient::{
    answer_callback_resilient, delete_message_resilient, edit_message_resilient,
    send_message_resilient,
};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{self as tg, InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

/// Gateway that renders through the Telegram Bot API
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    /// Wrap a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn to_inline_button(button: &Button) -> Option<InlineKeyboardButton> {
    match &button.target {
        ButtonTarget::Callback(action) => Some(InlineKeyboardButton::callback(
            button.label.clone(),
            action.encode(),
        )),
        ButtonTarget::Url(raw) => match Url::parse(raw) {
            Ok(url) => Some(InlineKeyboardButton::url(button.label.clone(), url)),
            Err(e) => {
                warn!("Dropping button '{}' with invalid URL {raw}: {e}", button.label);
                None
            }
        },
    }
}

/// Convert a gateway keyboard to Telegram inline markup
#[must_use]
pub fn to_inline_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| row.iter().filter_map(to_inline_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageId> {
        let markup = keyboard.as_ref().map(to_inline_markup);
        let sent = send_message_resilient(&self.bot, tg::ChatId(chat_id.0), text, markup).await?;
        Ok(MessageId(sent.id.0))
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        let markup = keyboard.as_ref().map(to_inline_markup);
        edit_message_resilient(
            &self.bot,
            tg::ChatId(chat_id.0),
            tg::MessageId(message_id.0),
            text,
            markup,
        )
        .await
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        delete_message_resilient(&self.bot, tg::ChatId(chat_id.0), tg::MessageId(message_id.0))
            .await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<()> {
        answer_callback_resilient(&self.bot, callback_id, text, alert).await
    }
}
