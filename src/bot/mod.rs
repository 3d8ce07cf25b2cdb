/// Inline button actions and their encoding
pub mod callback;
/// Conversation state machine
pub mod controller;
/// Messaging gateway abstraction
pub mod gateway;
/// Telegram update handlers and dispatcher tree
pub mod handlers;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// Telegram implementation of the messaging gateway
pub mod telegram;
/// View layer for UI components (keyboards, messages)
pub mod views;

pub use controller::ConversationController;
pub use telegram::TelegramGateway;
