//! Driver for the consortium-creation dialog.
//!
//! `/novo` opens a dialog bound to the issuing user; subsequent messages from
//! that user walk the [`DialogStep`] machine until the Sim/Não press. Every
//! state change is committed before the next prompt goes out, so a restart
//! resumes mid-dialog.

use super::EventCtx;
use crate::channels::{CallbackQuery, IncomingMessage, InlineButton};
use crate::consortium::{render, Consortium, Participant};
use crate::dialog::{parse_amount, parse_participants, DialogStep};
use crate::session::SessionData;
use anyhow::Result;
use uuid::Uuid;

const PROMPT_AMOUNT: &str = "Qual o valor total do consórcio?";
const PROMPT_PARTICIPANTS: &str = "Quantos participantes?";
const REPROMPT_AMOUNT: &str =
    "Não entendi. Envie o valor total em números, por exemplo: 1200 ou 1500,50.";
const REPROMPT_PARTICIPANTS: &str =
    "Não entendi. Envie o número de participantes, por exemplo: 12.";
const NOTICE_STARTED: &str = "Consórcio iniciado";
const NOTICE_CANCELLED: &str = "Consórcio cancelado";
const NOTICE_NOT_OWNER: &str = "Somente quem iniciou a criação pode confirmar.";
const NOTICE_STALE: &str = "Esta confirmação não está mais ativa.";

/// Enter the dialog for the sending user. Re-entering restarts from the
/// amount question.
pub async fn start(
    ctx: &EventCtx<'_>,
    session: &mut SessionData,
    msg: &IncomingMessage,
) -> Result<()> {
    session
        .dialogs
        .insert(SessionData::dialog_key(msg.from.id), DialogStep::AwaitAmount);
    ctx.commit(session).await?;

    tracing::info!(
        "User {} opened a creation dialog in chat {}",
        msg.from.id,
        msg.chat_id
    );
    ctx.transport.send_message(ctx.chat_id, PROMPT_AMOUNT).await?;
    Ok(())
}

/// Advance the sending user's pending dialog with a text message.
pub async fn advance(
    ctx: &EventCtx<'_>,
    session: &mut SessionData,
    msg: &IncomingMessage,
) -> Result<()> {
    let key = SessionData::dialog_key(msg.from.id);
    let Some(step) = session.dialogs.get(&key).cloned() else {
        return Ok(());
    };

    match step {
        DialogStep::AwaitAmount => match parse_amount(&msg.text) {
            Some(amount) => {
                session
                    .dialogs
                    .insert(key, DialogStep::AwaitParticipants { amount });
                ctx.commit(session).await?;
                ctx.transport
                    .send_message(ctx.chat_id, PROMPT_PARTICIPANTS)
                    .await?;
            }
            None => {
                ctx.transport
                    .send_message(ctx.chat_id, REPROMPT_AMOUNT)
                    .await?;
            }
        },
        DialogStep::AwaitParticipants { amount } => match parse_participants(&msg.text) {
            Some(participants) => {
                session.dialogs.insert(
                    key,
                    DialogStep::AwaitConfirmation {
                        amount,
                        participants,
                    },
                );
                ctx.commit(session).await?;

                let buttons = vec![vec![
                    InlineButton::new("Sim", "yes"),
                    InlineButton::new("Não", "no"),
                ]];
                ctx.transport
                    .send_with_keyboard(
                        ctx.chat_id,
                        &render::summary_text(amount, participants),
                        buttons,
                    )
                    .await?;
            }
            None => {
                ctx.transport
                    .send_message(ctx.chat_id, REPROMPT_PARTICIPANTS)
                    .await?;
            }
        },
        DialogStep::AwaitConfirmation { .. } => {
            // Waiting on the Sim/Não press; stray text does not advance.
        }
    }
    Ok(())
}

/// Handle a Sim/Não press on the confirmation summary.
pub async fn confirm(
    ctx: &EventCtx<'_>,
    session: &mut SessionData,
    query: &CallbackQuery,
    approved: bool,
) -> Result<()> {
    let key = SessionData::dialog_key(query.from.id);
    let Some(DialogStep::AwaitConfirmation {
        amount,
        participants,
    }) = session.dialogs.get(&key).cloned()
    else {
        // Not this user's confirmation: someone else's press on the summary,
        // or a press on a long-dead message.
        let other_pending = session
            .dialogs
            .values()
            .any(|s| matches!(s, DialogStep::AwaitConfirmation { .. }));
        let notice = if other_pending { NOTICE_NOT_OWNER } else { NOTICE_STALE };
        ctx.transport.answer_callback(&query.id, Some(notice)).await?;
        return Ok(());
    };

    if !approved {
        session.dialogs.remove(&key);
        ctx.commit(session).await?;
        ctx.transport
            .answer_callback(&query.id, Some(NOTICE_CANCELLED))
            .await?;

        // Deleting can be forbidden (e.g. old message, missing rights); fall
        // back to editing the summary into the cancellation notice.
        if let Err(e) = ctx
            .transport
            .delete_message(query.chat_id, query.message_id)
            .await
        {
            tracing::debug!("Delete failed ({e}), editing summary instead");
            ctx.transport
                .edit_message(query.chat_id, query.message_id, NOTICE_CANCELLED, vec![])
                .await?;
        }
        return Ok(());
    }

    let consortium_id = Uuid::new_v4().to_string();
    let today = chrono::Local::now().date_naive();
    let creator = Participant::new(query.from.first_name.clone(), query.from.id);
    let consortium = Consortium::new(amount, participants, creator, today);
    let card = render::render_card(&consortium, today);

    session.consortiums.insert(consortium_id.clone(), consortium);
    session.dialogs.remove(&key);
    ctx.commit(session).await?;

    tracing::info!(
        "Consortium {consortium_id} created in chat {} ({amount} / {participants})",
        query.chat_id
    );

    ctx.transport
        .answer_callback(&query.id, Some(NOTICE_STARTED))
        .await?;
    let buttons = vec![vec![InlineButton::new(
        "Participar",
        format!("join:{consortium_id}"),
    )]];
    ctx.transport
        .edit_message(query.chat_id, query.message_id, &card, buttons)
        .await?;
    Ok(())
}
