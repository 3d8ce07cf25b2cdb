//! Conversation state machine.
//!
//! Turns inbound commands, texts and button presses into catalog, session
//! and lookup operations and renders the result through the messaging
//! gateway. Every entry point checks the access policy first.
//!
//! Per user the flow is: idle → choosing a candidate → viewing a candidate
//! → saved / already saved. Catalog browsing runs independently: page →
//! saved mod → deleted / back to the list.

use crate::access::{AccessPolicy, Identity};
use crate::bot::callback::CallbackAction;
use crate::bot::gateway::{ChatId, MessageId, MessagingGateway};
use crate::bot::handlers::Command;
use crate::bot::views::{self, CatalogView, DefaultCatalogView};
use crate::catalog::{Catalog, CatalogError};
use crate::lookup::{LookupError, LookupProvider};
use crate::session::{SessionError, SessionStore};
use crate::shutdown::ShutdownSignal;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// An inline button press
#[derive(Debug, Clone)]
pub struct ButtonPress {
    /// Callback query ID to answer
    pub callback_id: String,
    /// Chat of the message carrying the button
    pub chat_id: ChatId,
    /// Message carrying the button
    pub message_id: MessageId,
    /// Raw callback data
    pub data: String,
}

/// How a button press is acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CallbackReply {
    text: Option<&'static str>,
    alert: bool,
}

impl CallbackReply {
    const fn silent() -> Self {
        Self {
            text: None,
            alert: false,
        }
    }

    const fn alert(text: &'static str) -> Self {
        Self {
            text: Some(text),
            alert: true,
        }
    }
}

/// Orchestrates search, selection, saving and catalog browsing
pub struct ConversationController {
    access: AccessPolicy,
    catalog: Arc<dyn Catalog>,
    lookup: Arc<dyn LookupProvider>,
    gateway: Arc<dyn MessagingGateway>,
    sessions: SessionStore,
    last_pages: Mutex<HashMap<ChatId, MessageId>>,
    shutdown: ShutdownSignal,
}

impl ConversationController {
    /// Create a controller over its collaborators
    #[must_use]
    pub fn new(
        access: AccessPolicy,
        catalog: Arc<dyn Catalog>,
        lookup: Arc<dyn LookupProvider>,
        gateway: Arc<dyn MessagingGateway>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            access,
            catalog,
            lookup,
            gateway,
            sessions: SessionStore::new(),
            last_pages: Mutex::new(HashMap::new()),
            shutdown,
        }
    }

    /// Search sessions owned by this controller
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    async fn deny(&self, identity: &Identity, chat_id: ChatId) -> Result<()> {
        info!(
            "⛔️ Unauthorized access from user {} ({}).",
            identity.id,
            identity.display_name()
        );
        self.gateway
            .send_message(chat_id, DefaultCatalogView::access_denied(), None)
            .await?;
        Ok(())
    }

    /// Handle a bot command
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or the gateway fails.
    pub async fn handle_command(
        &self,
        identity: &Identity,
        chat_id: ChatId,
        command: Command,
    ) -> Result<()> {
        if !self.access.is_authorized(identity) {
            return self.deny(identity, chat_id).await;
        }

        match command {
            Command::Start | Command::Help => {
                info!("User {} ({}) opened the menu.", identity.id, identity.display_name());
                self.sessions.invalidate(identity).await;
                self.gateway
                    .send_message(
                        chat_id,
                        DefaultCatalogView::welcome_message(),
                        Some(views::welcome_keyboard()),
                    )
                    .await?;
            }
            Command::List => self.show_catalog(chat_id, 0, None).await?,
            Command::Restart | Command::Reload | Command::Q => {
                if !self.access.is_administrator(identity) {
                    warn!(
                        "User {} ({}) tried to restart the bot.",
                        identity.id,
                        identity.display_name()
                    );
                    self.gateway
                        .send_message(chat_id, DefaultCatalogView::command_denied(), None)
                        .await?;
                    return Ok(());
                }
                self.gateway
                    .send_message(chat_id, DefaultCatalogView::restarting(), None)
                    .await?;
                self.shutdown.request(&format!(
                    "restart command from {}",
                    identity.display_name()
                ));
            }
        }
        Ok(())
    }

    /// Handle a plain text message as a mod search
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails.
    pub async fn handle_text(&self, identity: &Identity, chat_id: ChatId, text: &str) -> Result<()> {
        if !self.access.is_authorized(identity) {
            return self.deny(identity, chat_id).await;
        }

        let query = text.trim();
        if query.is_empty() {
            return Ok(());
        }
        info!("User {} searches for '{query}'.", identity.id);

        let reply = match self.lookup.search(query).await {
            Ok(candidates) => {
                let keyboard = views::candidates_keyboard(&candidates);
                self.sessions.store_results(identity, candidates).await;
                self.gateway
                    .send_message(chat_id, DefaultCatalogView::choose_mod(), Some(keyboard))
                    .await?;
                return Ok(());
            }
            Err(LookupError::NoResults) => DefaultCatalogView::no_results(),
            Err(e) => {
                warn!("Search for '{query}' failed: {e}");
                DefaultCatalogView::provider_unavailable()
            }
        };
        self.gateway.send_message(chat_id, reply, None).await?;
        Ok(())
    }

    /// Handle an inline button press
    ///
    /// The callback is always answered exactly once, including when the turn
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or the gateway fails.
    pub async fn handle_button(&self, identity: &Identity, press: &ButtonPress) -> Result<()> {
        let outcome = if self.access.is_authorized(identity) {
            match CallbackAction::decode(&press.data) {
                Some(action) => self.dispatch(identity, press, action).await,
                None => {
                    debug!("Ignoring unknown callback data {:?}", press.data);
                    Ok(CallbackReply::silent())
                }
            }
        } else {
            info!(
                "⛔️ Unauthorized button press from user {} ({}).",
                identity.id,
                identity.display_name()
            );
            Ok(CallbackReply::alert(DefaultCatalogView::access_denied()))
        };

        match outcome {
            Ok(reply) => {
                self.gateway
                    .answer_callback(&press.callback_id, reply.text, reply.alert)
                    .await
            }
            Err(e) => {
                if let Err(answer_err) = self
                    .gateway
                    .answer_callback(
                        &press.callback_id,
                        Some(DefaultCatalogView::internal_error()),
                        true,
                    )
                    .await
                {
                    warn!("Failed to answer callback after error: {answer_err}");
                }
                Err(e)
            }
        }
    }

    async fn dispatch(
        &self,
        identity: &Identity,
        press: &ButtonPress,
        action: CallbackAction,
    ) -> Result<CallbackReply> {
        match action {
            CallbackAction::ShowSaved => {
                self.show_catalog(press.chat_id, 0, Some(press.message_id))
                    .await?;
                Ok(CallbackReply::silent())
            }
            CallbackAction::Page(page) => {
                self.show_catalog(press.chat_id, page, Some(press.message_id))
                    .await?;
                Ok(CallbackReply::silent())
            }
            CallbackAction::BackToList => {
                self.show_catalog(press.chat_id, 0, Some(press.message_id))
                    .await?;
                Ok(CallbackReply::silent())
            }
            CallbackAction::Candidate(index) => self.select_candidate(identity, press, index).await,
            CallbackAction::Save(id) => self.save(identity, press, &id).await,
            CallbackAction::ViewSaved(id) => self.view_saved(identity, press, &id).await,
            CallbackAction::Delete(id) => self.delete(identity, press, &id).await,
            CallbackAction::BackToSearch => self.back_to_search(identity, press).await,
        }
    }

    async fn select_candidate(
        &self,
        identity: &Identity,
        press: &ButtonPress,
        index: usize,
    ) -> Result<CallbackReply> {
        let candidate = match self.sessions.resolve_candidate(identity, index).await {
            Ok(candidate) => candidate,
            Err(SessionError::StaleSession) => {
                return Ok(CallbackReply::alert(DefaultCatalogView::stale_session()));
            }
            Err(SessionError::IndexOutOfRange { .. }) => {
                return Ok(CallbackReply::alert(DefaultCatalogView::invalid_choice()));
            }
        };

        let already_saved = self.catalog.exists(&candidate.id).await?;
        self.gateway
            .edit_message(
                press.chat_id,
                press.message_id,
                &views::candidate_detail_text(&candidate),
                Some(views::candidate_detail_keyboard(&candidate, already_saved)),
            )
            .await?;
        Ok(CallbackReply::silent())
    }

    async fn save(&self, identity: &Identity, press: &ButtonPress, id: &str) -> Result<CallbackReply> {
        let record = match self.lookup.fetch_by_id(id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Fetching mod {id} for saving failed: {e}");
                self.edit_plain(press, DefaultCatalogView::fetch_failed())
                    .await?;
                return Ok(CallbackReply::silent());
            }
        };

        // Rows are keyed by the provider's canonical ID, not the button token
        let id = record.id.clone();
        let text = if self.catalog.exists(&id).await? {
            DefaultCatalogView::already_saved()
        } else {
            match self.catalog.insert(record).await {
                Ok(()) => {
                    info!("User {} saved mod {id}.", identity.id);
                    DefaultCatalogView::saved()
                }
                Err(CatalogError::DuplicateKey(_)) => {
                    debug!("Mod {id} was saved concurrently.");
                    DefaultCatalogView::already_saved()
                }
                Err(e) => return Err(e.into()),
            }
        };
        self.edit_plain(press, text).await?;
        Ok(CallbackReply::silent())
    }

    async fn view_saved(
        &self,
        identity: &Identity,
        press: &ButtonPress,
        id: &str,
    ) -> Result<CallbackReply> {
        let Some(record) = self.catalog.get(id).await? else {
            return Ok(CallbackReply::alert(DefaultCatalogView::not_found()));
        };
        let is_admin = self.access.is_administrator(identity);
        self.gateway
            .edit_message(
                press.chat_id,
                press.message_id,
                &views::saved_detail_text(&record),
                Some(views::saved_detail_keyboard(&record, is_admin)),
            )
            .await?;
        Ok(CallbackReply::silent())
    }

    async fn delete(&self, identity: &Identity, press: &ButtonPress, id: &str) -> Result<CallbackReply> {
        if !self.access.is_administrator(identity) {
            warn!(
                "User {} ({}) tried to delete mod {id}.",
                identity.id,
                identity.display_name()
            );
            return Ok(CallbackReply::alert(DefaultCatalogView::button_denied()));
        }

        self.catalog.remove(id).await?;
        info!("Administrator {} deleted mod {id}.", identity.display_name());
        self.gateway
            .edit_message(
                press.chat_id,
                press.message_id,
                DefaultCatalogView::deleted(),
                Some(views::back_to_list_keyboard()),
            )
            .await?;
        Ok(CallbackReply::silent())
    }

    async fn back_to_search(&self, identity: &Identity, press: &ButtonPress) -> Result<CallbackReply> {
        let Some(candidates) = self.sessions.active_candidates(identity).await else {
            return Ok(CallbackReply::alert(DefaultCatalogView::history_unavailable()));
        };
        self.gateway
            .edit_message(
                press.chat_id,
                press.message_id,
                DefaultCatalogView::choose_mod_again(),
                Some(views::candidates_keyboard(&candidates)),
            )
            .await?;
        Ok(CallbackReply::silent())
    }

    async fn edit_plain(&self, press: &ButtonPress, text: &str) -> Result<()> {
        self.gateway
            .edit_message(press.chat_id, press.message_id, text, None)
            .await
    }

    /// Render a catalog page, replacing the previous page message.
    ///
    /// `origin` is the message whose button was pressed; without one the
    /// last page sent to the chat is replaced.
    async fn show_catalog(&self, chat_id: ChatId, page: usize, origin: Option<MessageId>) -> Result<()> {
        let mods = self.catalog.list_all().await?;

        let Some(rendered) = views::render_catalog_page(&mods, page) else {
            match origin {
                Some(message_id) => {
                    self.gateway
                        .edit_message(chat_id, message_id, DefaultCatalogView::catalog_empty(), None)
                        .await?;
                }
                None => {
                    self.gateway
                        .send_message(chat_id, DefaultCatalogView::catalog_empty(), None)
                        .await?;
                }
            }
            return Ok(());
        };

        // The map lock is never held across gateway calls
        let previous = self.last_pages.lock().await.remove(&chat_id);
        if let Some(stale) = origin.or(previous) {
            if let Err(e) = self.gateway.delete_message(chat_id, stale).await {
                warn!("Failed to delete previous catalog message: {e}");
            }
        }

        let sent = self
            .gateway
            .send_message(chat_id, &rendered.text, Some(rendered.keyboard))
            .await?;
        self.last_pages.lock().await.insert(chat_id, sent);
        debug!("Rendered catalog page {} in chat {}", rendered.page, chat_id.0);
        Ok(())
    }

    /// Last catalog page message sent to the chat
    pub async fn last_page_message(&self, chat_id: ChatId) -> Option<MessageId> {
        self.last_pages.lock().await.get(&chat_id).copied()
    }
}

/// Log a failed turn without propagating it to the dispatcher
pub fn log_turn_error(kind: &str, err: &anyhow::Error) {
    error!("{kind} handler error: {err:#}");
}
