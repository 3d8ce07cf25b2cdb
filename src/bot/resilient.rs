//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! These wrappers retry transient network failures using exponential backoff
//! with jitter and smooth over the Telegram errors that carry no real failure
//! ("message is not modified", already deleted messages).
//!
//! # Usage
//!
//! ```ignore
//! use mod_catalog_bot::bot::resilient::{send_message_resilient, edit_message_resilient};
//!
//! let msg = send_message_resilient(&bot, chat_id, "Hello!", None).await?;
//! edit_message_resilient(&bot, chat_id, msg.id, "Updated!", None).await?;
//! ```

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ChatId, InlineKeyboardMarkup, Message, MessageId, ParseMode};
use tracing::debug;

const ERROR_NOT_MODIFIED: &str = "message is not modified";
const ERROR_TO_DELETE_NOT_FOUND: &str = "message to delete not found";

/// Send an HTML message with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let text = text.into();
    crate::utils::retry_telegram_operation(|| async {
        let mut req = bot
            .send_message(chat_id, text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Edit an HTML message with automatic retry on network failures.
///
/// An edit that changes nothing is treated as success.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn edit_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: impl Into<String>,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let text = text.into();
    let result = crate::utils::retry_telegram_operation(|| async {
        let mut req = bot
            .edit_message_text(chat_id, msg_id, text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Telegram edit error: {e}"))
    })
    .await;

    match result {
        Err(e) if e.to_string().contains(ERROR_NOT_MODIFIED) => {
            debug!("Message update skipped: {e}");
            Ok(())
        }
        other => other,
    }
}

/// Delete a message with automatic retry on network failures.
///
/// Deleting a message that is already gone is treated as success.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn delete_message_resilient(bot: &Bot, chat_id: ChatId, msg_id: MessageId) -> Result<()> {
    let result = crate::utils::retry_telegram_operation(|| async {
        bot.delete_message(chat_id, msg_id)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Telegram delete error: {e}"))
    })
    .await;

    match result {
        Err(e) if e.to_string().contains(ERROR_TO_DELETE_NOT_FOUND) => {
            debug!("Message already deleted: {e}");
            Ok(())
        }
        other => other,
    }
}

/// Answer a callback query with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn answer_callback_resilient(
    bot: &Bot,
    callback_id: &str,
    text: Option<&str>,
    show_alert: bool,
) -> Result<()> {
    crate::utils::retry_telegram_operation(|| async {
        let mut req = bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .show_alert(show_alert);
        if let Some(text) = text {
            req = req.text(text);
        }
        req.await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Telegram callback answer error: {e}"))
    })
    .await
}
