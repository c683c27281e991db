//! Join-button handler.
//!
//! Reacts to a `join:<id>` press: appends the pressing user to the roster and
//! re-renders the card in place. The session is committed before the message
//! edit, so a transport failure cannot silently lose the join.

use super::EventCtx;
use crate::channels::{CallbackQuery, InlineButton};
use crate::consortium::{render, JoinOutcome, Participant};
use crate::session::SessionData;
use anyhow::Result;

const NOTICE_ALREADY_MEMBER: &str = "Você já está participando deste consórcio!";
const NOTICE_UNAVAILABLE: &str = "Este consórcio não está mais disponível.";
const NOTICE_FULL: &str = "A lista de participantes já está preenchida.";

pub async fn handle(
    ctx: &EventCtx<'_>,
    session: &mut SessionData,
    query: &CallbackQuery,
    consortium_id: &str,
) -> Result<()> {
    let Some(consortium) = session.consortiums.get_mut(consortium_id) else {
        tracing::warn!(
            "Join press for unknown consortium {consortium_id} in chat {}",
            query.chat_id
        );
        ctx.transport
            .answer_callback(&query.id, Some(NOTICE_UNAVAILABLE))
            .await?;
        return Ok(());
    };

    let participant = Participant::new(query.from.first_name.clone(), query.from.id);
    match consortium.join(participant) {
        JoinOutcome::AlreadyMember => {
            ctx.transport
                .answer_callback(&query.id, Some(NOTICE_ALREADY_MEMBER))
                .await?;
            Ok(())
        }
        JoinOutcome::Full => {
            ctx.transport
                .answer_callback(&query.id, Some(NOTICE_FULL))
                .await?;
            Ok(())
        }
        JoinOutcome::Joined { complete } => {
            let today = chrono::Local::now().date_naive();
            let card = render::render_card(consortium, today);
            let buttons = if complete {
                // Pool closed to new joins.
                Vec::new()
            } else {
                vec![vec![InlineButton::new(
                    "Participar",
                    format!("join:{consortium_id}"),
                )]]
            };

            tracing::info!(
                "User {} joined consortium {consortium_id} ({}/{})",
                query.from.id,
                consortium.participants_list.len(),
                consortium.participants
            );

            ctx.commit(session).await?;
            ctx.transport
                .edit_message(query.chat_id, query.message_id, &card, buttons)
                .await?;
            ctx.transport.answer_callback(&query.id, None).await?;
            Ok(())
        }
    }
}
