//! Testing helpers and mock utilities.
//!
//! Provides a gateway that records every outbound call and convenient
//! constructors for mocked lookup providers.

use crate::bot::gateway::{ChatId, Keyboard, MessageId, MessagingGateway};
use crate::lookup::{CandidateMod, LookupError, MockLookupProvider};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

/// A single call made through the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `send_message`, with the ID handed back
    Send {
        /// Target chat
        chat_id: ChatId,
        /// ID assigned to the new message
        message_id: MessageId,
        /// Message text
        text: String,
        /// Attached keyboard
        keyboard: Option<Keyboard>,
    },
    /// `edit_message`
    Edit {
        /// Target chat
        chat_id: ChatId,
        /// Edited message
        message_id: MessageId,
        /// New text
        text: String,
        /// New keyboard
        keyboard: Option<Keyboard>,
    },
    /// `delete_message`
    Delete {
        /// Target chat
        chat_id: ChatId,
        /// Deleted message
        message_id: MessageId,
    },
    /// `answer_callback`
    Answer {
        /// Answered callback
        callback_id: String,
        /// Notification text
        text: Option<String>,
        /// Whether it was shown as an alert
        alert: bool,
    },
}

/// Gateway that records calls instead of talking to Telegram
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    next_id: AtomicI32,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(100),
        }
    }
}

impl RecordingGateway {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: GatewayCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    /// Remove and return all recorded calls
    pub fn take(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .map(|mut calls| std::mem::take(&mut *calls))
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageId> {
        let message_id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.record(GatewayCall::Send {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        self.record(GatewayCall::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.record(GatewayCall::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<()> {
        self.record(GatewayCall::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
            alert,
        });
        Ok(())
    }
}

/// Build `n` candidates named after `query`
#[must_use]
pub fn candidates(query: &str, n: usize) -> Vec<CandidateMod> {
    (0..n)
        .map(|i| CandidateMod {
            id: format!("{query}{i}"),
            name: format!("{query} mod {i}"),
            description: format!("Description {i}"),
            download_url: format!("https://modrinth.com/mod/{query}-{i}"),
        })
        .collect()
}

/// Create a mock lookup provider whose searches return `results`.
///
/// `fetch_by_id` resolves any ID found in `results`; other IDs fail as
/// provider-unavailable.
#[must_use]
pub fn mock_lookup_with(results: Vec<CandidateMod>) -> MockLookupProvider {
    let mut mock = MockLookupProvider::new();

    let search_results = results.clone();
    mock.expect_search()
        .returning(move |_| Ok(search_results.clone()));

    mock.expect_fetch_by_id().returning(move |id| {
        results
            .iter()
            .find(|c| c.id == id)
            .map(|c| crate::catalog::ModRecord {
                id: c.id.clone(),
                name: c.name.clone(),
                download_url: c.download_url.clone(),
            })
            .ok_or(LookupError::ProviderUnavailable(404))
    });

    mock
}
