use super::traits::{
    CallbackQuery, ChatKind, ChatTransport, InboundEvent, IncomingMessage, InlineButton, User,
};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A command entry for the Telegram menu, registered per chat-kind scope.
#[derive(Debug, Clone)]
pub struct BotCommand {
    pub command: &'static str,
    pub description: &'static str,
}

/// Telegram channel — long-polls the Bot API for updates.
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
    /// Long-poll timeout passed to getUpdates, in seconds
    poll_timeout_secs: u64,
}

impl TelegramChannel {
    pub fn new(bot_token: String, poll_timeout_secs: u64) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
            poll_timeout_secs,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = resp.text().await?;
            anyhow::bail!("Telegram {method} failed: {err}");
        }

        Ok(resp.json().await?)
    }

    fn keyboard_json(buttons: Vec<Vec<InlineButton>>) -> serde_json::Value {
        let keyboard: Vec<Vec<serde_json::Value>> = buttons
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|btn| {
                        serde_json::json!({
                            "text": btn.text,
                            "callback_data": btn.callback_data
                        })
                    })
                    .collect()
            })
            .collect();
        serde_json::json!({ "inline_keyboard": keyboard })
    }

    /// Register the scoped command menu: the group commands differ from the
    /// private ones, mirroring how the router treats each chat kind.
    pub async fn set_my_commands(
        &self,
        private: &[BotCommand],
        group: &[BotCommand],
    ) -> anyhow::Result<()> {
        for (scope, commands) in [("all_private_chats", private), ("all_group_chats", group)] {
            let list: Vec<serde_json::Value> = commands
                .iter()
                .map(|c| serde_json::json!({ "command": c.command, "description": c.description }))
                .collect();
            let body = serde_json::json!({
                "commands": list,
                "scope": { "type": scope }
            });
            self.call("setMyCommands", &body).await?;
        }
        tracing::info!("Registered Telegram command menu");
        Ok(())
    }

    /// Check connectivity with getMe.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Long-poll getUpdates and feed parsed events into `tx`.
    pub async fn listen(&self, tx: mpsc::Sender<InboundEvent>) -> anyhow::Result<()> {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for updates...");

        loop {
            let body = serde_json::json!({
                "offset": offset,
                "timeout": self.poll_timeout_secs,
                "allowed_updates": ["message", "callback_query"]
            });

            let resp = match self.client.post(self.api_url("getUpdates")).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            let data: serde_json::Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                        offset = uid + 1;
                    }

                    let event = if let Some(callback) = update.get("callback_query") {
                        parse_callback_query(callback).map(InboundEvent::Callback)
                    } else if let Some(message) = update.get("message") {
                        parse_message(message).map(InboundEvent::Message)
                    } else {
                        None
                    };

                    let Some(event) = event else { continue };

                    if tx.send(event).await.is_err() {
                        // Dispatcher went away; stop listening.
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn parse_user(from: &serde_json::Value) -> Option<User> {
    Some(User {
        id: from.get("id")?.as_i64()?,
        first_name: from.get("first_name")?.as_str()?.to_string(),
    })
}

fn parse_chat_kind(chat: &serde_json::Value) -> Option<ChatKind> {
    match chat.get("type")?.as_str()? {
        "private" => Some(ChatKind::Private),
        "group" | "supergroup" => Some(ChatKind::Group),
        _ => None,
    }
}

/// Parse a `message` update into an [`IncomingMessage`]; non-text messages
/// and channel posts are skipped.
fn parse_message(message: &serde_json::Value) -> Option<IncomingMessage> {
    let chat = message.get("chat")?;
    Some(IncomingMessage {
        chat_id: chat.get("id")?.as_i64()?,
        chat_kind: parse_chat_kind(chat)?,
        from: parse_user(message.get("from")?)?,
        text: message.get("text")?.as_str()?.to_string(),
    })
}

/// Parse a `callback_query` update into a [`CallbackQuery`].
fn parse_callback_query(callback: &serde_json::Value) -> Option<CallbackQuery> {
    let message = callback.get("message")?;
    Some(CallbackQuery {
        id: callback.get("id")?.as_str()?.to_string(),
        chat_id: message.get("chat")?.get("id")?.as_i64()?,
        message_id: message.get("message_id")?.as_i64()?,
        from: parse_user(callback.get("from")?)?,
        data: callback.get("data")?.as_str()?.to_string(),
    })
}

#[async_trait]
impl ChatTransport for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<i64> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML"
        });

        let data = self.call("sendMessage", &body).await?;
        message_id_of(&data)
    }

    async fn send_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> anyhow::Result<i64> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "reply_markup": Self::keyboard_json(buttons)
        });

        let data = self.call("sendMessage", &body).await?;
        let message_id = message_id_of(&data)?;
        tracing::debug!("Sent keyboard message {message_id} to chat {chat_id}");
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
            "reply_markup": Self::keyboard_json(buttons)
        });

        self.call("editMessageText", &body).await?;
        tracing::debug!("Edited message {message_id} in chat {chat_id}");
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id
        });

        self.call("deleteMessage", &body).await?;
        tracing::debug!("Deleted message {message_id} in chat {chat_id}");
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> anyhow::Result<()> {
        let mut body = serde_json::json!({
            "callback_query_id": callback_id
        });
        if let Some(t) = text {
            body["text"] = serde_json::Value::String(t.to_string());
        }

        self.call("answerCallbackQuery", &body).await?;
        tracing::debug!("Answered callback query {callback_id}");
        Ok(())
    }
}

fn message_id_of(data: &serde_json::Value) -> anyhow::Result<i64> {
    data.get("result")
        .and_then(|r| r.get("message_id"))
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| anyhow::anyhow!("Missing message_id in response"))
}
