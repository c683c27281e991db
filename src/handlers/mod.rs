//! Inbound event dispatch: command routing, dialog resumption and button
//! presses.
//!
//! One dispatcher task consumes the whole event stream, so the load-mutate-
//! save cycle around a chat's session never interleaves with another event
//! for the same chat. Handlers receive the already-loaded session and commit
//! their own mutation before any outbound edit, so a transport failure never
//! loses state.

pub mod dialog;
pub mod join;

use crate::channels::{
    CallbackQuery, ChatKind, ChatTransport, InboundEvent, IncomingMessage,
};
use crate::session::{SessionData, SessionStore};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

const REPLY_ADD_TO_GROUP: &str = "Me adicione a um grupo!";
const REPLY_GROUP_HINT: &str = "Pra começar um novo consórcio, digite /novo";
const NOTICE_UNKNOWN_ACTION: &str = "Ação desconhecida.";

/// Context handed to every handler: the transport, the store and the scope
/// the session was loaded under.
pub struct EventCtx<'a> {
    pub transport: &'a dyn ChatTransport,
    pub store: &'a dyn SessionStore,
    pub scope_key: String,
    pub chat_id: i64,
}

impl EventCtx<'_> {
    /// Persist the session. Handlers call this after mutating and before any
    /// outbound network action that depends on the mutation.
    pub async fn commit(&self, session: &SessionData) -> Result<()> {
        self.store.save(&self.scope_key, session).await?;
        Ok(())
    }
}

/// Extract the command name from a message, if any: `/novo@SomeBot arg` →
/// `novo`.
fn command_of(text: &str) -> Option<&str> {
    let first = text.trim().split_whitespace().next()?;
    let cmd = first.strip_prefix('/')?;
    if cmd.is_empty() {
        return None;
    }
    cmd.split('@').next()
}

/// Routes inbound events to the command router, the dialog engine or the
/// join handler.
pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn SessionStore>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn ChatTransport>, store: Arc<dyn SessionStore>) -> Self {
        Self { transport, store }
    }

    /// Consume the event stream until the senders hang up.
    pub async fn run(&self, mut rx: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = rx.recv().await {
            if let Err(e) = self.handle_event(event).await {
                // Terminal for this event only; other chats and consortiums
                // are untouched.
                tracing::error!("Event handling failed: {e:#}");
            }
        }
        tracing::info!("Event stream closed, dispatcher stopping");
    }

    /// Sessions are scoped per chat so the creator's dialog and every later
    /// join in that chat see the same consortium repository.
    fn scope_key(chat_id: i64) -> String {
        chat_id.to_string()
    }

    pub async fn handle_event(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Message(msg) => self.handle_message(msg).await,
            InboundEvent::Callback(query) => self.handle_callback(query).await,
        }
    }

    async fn handle_message(&self, msg: IncomingMessage) -> Result<()> {
        let scope_key = Self::scope_key(msg.chat_id);
        let mut session = self.store.load(&scope_key).await?;
        let ctx = EventCtx {
            transport: self.transport.as_ref(),
            store: self.store.as_ref(),
            scope_key,
            chat_id: msg.chat_id,
        };

        if let Some(cmd) = command_of(&msg.text) {
            return self.handle_command(&ctx, &mut session, &msg, cmd).await;
        }

        if session
            .dialogs
            .contains_key(&SessionData::dialog_key(msg.from.id))
        {
            return dialog::advance(&ctx, &mut session, &msg).await;
        }

        // Ordinary chatter; nothing for the bot to do.
        Ok(())
    }

    async fn handle_command(
        &self,
        ctx: &EventCtx<'_>,
        session: &mut SessionData,
        msg: &IncomingMessage,
        cmd: &str,
    ) -> Result<()> {
        match (cmd, msg.chat_kind) {
            ("start", ChatKind::Private) | ("novo", ChatKind::Private) => {
                ctx.transport
                    .send_message(msg.chat_id, REPLY_ADD_TO_GROUP)
                    .await?;
                Ok(())
            }
            ("start", ChatKind::Group) => {
                ctx.transport
                    .send_message(msg.chat_id, REPLY_GROUP_HINT)
                    .await?;
                Ok(())
            }
            ("novo", ChatKind::Group) => dialog::start(ctx, session, msg).await,
            _ => {
                tracing::debug!("Ignoring unknown command /{cmd}");
                Ok(())
            }
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) -> Result<()> {
        let scope_key = Self::scope_key(query.chat_id);
        let mut session = self.store.load(&scope_key).await?;
        let ctx = EventCtx {
            transport: self.transport.as_ref(),
            store: self.store.as_ref(),
            scope_key,
            chat_id: query.chat_id,
        };

        if let Some(consortium_id) = query.data.strip_prefix("join:") {
            let consortium_id = consortium_id.to_string();
            return join::handle(&ctx, &mut session, &query, &consortium_id).await;
        }

        match query.data.as_str() {
            "yes" => dialog::confirm(&ctx, &mut session, &query, true).await,
            "no" => dialog::confirm(&ctx, &mut session, &query, false).await,
            other => {
                tracing::warn!("Unknown callback payload: {other}");
                ctx.transport
                    .answer_callback(&query.id, Some(NOTICE_UNKNOWN_ACTION))
                    .await?;
                Ok(())
            }
        }
    }
}
