//! Transport-agnostic event and action types.
//!
//! The bot core only needs two inbound event shapes (numeric/command text
//! messages and button presses) and four outbound actions (send, edit,
//! delete, answer). Everything Telegram-specific lives in the channel
//! implementation.

use async_trait::async_trait;

/// Kind of chat an event came from; commands behave differently in each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    /// Group or supergroup
    Group,
}

/// The user behind an inbound event.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
}

/// A text message received from a chat.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub from: User,
    pub text: String,
}

/// A button press carrying an opaque payload string.
#[derive(Debug, Clone)]
pub struct CallbackQuery {
    pub id: String,
    pub chat_id: i64,
    /// Message the pressed button was attached to
    pub message_id: i64,
    pub from: User,
    pub data: String,
}

/// Unified inbound event stream consumed by the dispatcher.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Message(IncomingMessage),
    Callback(CallbackQuery),
}

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Outbound actions — implement for any messaging platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Human-readable transport name
    fn name(&self) -> &str;

    /// Send a message; returns the `message_id` for later editing
    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<i64>;

    /// Send a message with an inline keyboard; returns the `message_id`
    async fn send_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> anyhow::Result<i64>;

    /// Edit a message in place. An empty `buttons` grid removes the keyboard.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> anyhow::Result<()>;

    /// Delete a message. May fail when the platform forbids it.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> anyhow::Result<()>;

    /// Acknowledge a button press, optionally with a toast-style notice.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> anyhow::Result<()>;
}
