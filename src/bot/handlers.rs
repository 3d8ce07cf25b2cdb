use crate::access::Identity;
use crate::bot::controller::{log_turn_error, ButtonPress, ConversationController};
use crate::bot::gateway::{ChatId, MessageId};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, User};
use teloxide::update_listeners::Polling;
use teloxide::utils::command::BotCommands;
use tracing::{debug, warn};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Same as `/start`
    #[command(description = "Show help.")]
    Help,
    /// Show saved mods
    #[command(description = "List saved mods.")]
    List,
    /// Stop the bot so the supervisor restarts it (administrator only)
    #[command(description = "Restart the bot.")]
    Restart,
    /// Alias for `/restart`
    #[command(description = "Restart the bot.")]
    Reload,
    /// Alias for `/restart`
    #[command(description = "Restart the bot.")]
    Q,
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

fn identity_from_user(user: &User) -> Identity {
    Identity::new(user.id.0.cast_signed(), user.username.clone())
}

/// Identity of a message's sender; anonymous senders get no username
#[must_use]
pub fn identity_from_message(msg: &Message) -> Identity {
    msg.from
        .as_ref()
        .map_or_else(|| Identity::new(get_user_id_safe(msg), None), identity_from_user)
}

/// Long-polling listener that skips updates queued while the bot was down
#[must_use]
pub fn update_listener(bot: Bot) -> Polling<Bot> {
    Polling::builder(bot).drop_pending_updates().build()
}

/// Build the dispatcher tree
///
/// Access control happens in the controller so that denied users still get
/// an answer.
#[must_use]
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text)),
        )
}

async fn handle_command(
    msg: Message,
    cmd: Command,
    controller: Arc<ConversationController>,
) -> Result<(), teloxide::RequestError> {
    let identity = identity_from_message(&msg);
    debug!("Command {cmd:?} from user {}", identity.id);
    if let Err(e) = controller
        .handle_command(&identity, ChatId(msg.chat.id.0), cmd)
        .await
    {
        log_turn_error("Command", &e);
    }
    respond(())
}

async fn handle_text(
    msg: Message,
    controller: Arc<ConversationController>,
) -> Result<(), teloxide::RequestError> {
    let identity = identity_from_message(&msg);
    let text = msg.text().unwrap_or_default();
    if let Err(e) = controller
        .handle_text(&identity, ChatId(msg.chat.id.0), text)
        .await
    {
        log_turn_error("Text", &e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    controller: Arc<ConversationController>,
) -> Result<(), teloxide::RequestError> {
    let identity = identity_from_user(&q.from);

    let Some(message) = q.message.as_ref() else {
        // Inline-mode callbacks carry no message to render into
        warn!("Callback without message from user {}", identity.id);
        if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
            warn!("Failed to answer callback: {e}");
        }
        return respond(());
    };

    let press = ButtonPress {
        callback_id: q.id.0.clone(),
        chat_id: ChatId(message.chat().id.0),
        message_id: MessageId(message.id().0),
        data: q.data.clone().unwrap_or_default(),
    };

    if let Err(e) = controller.handle_button(&identity, &press).await {
        log_turn_error("Callback", &e);
    }
    respond(())
}
