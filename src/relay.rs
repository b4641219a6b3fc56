//! Direct-message listener for the anonymous reply flow: register message
//! links behind a confirmation message, then relay the eventual reply to
//! that confirmation into the linked channel.

use anyhow::Result;
use serenity::client::Context;
use serenity::model::channel::Message;
use serenity::model::id::MessageId;
use tracing::{debug, error, info, warn};

use crate::bot::AppState;
use crate::gateway::{self, GatewayError};
use crate::links::{self, MessageLink};
use crate::pending::ReplyTarget;

/// Confirmation text sent back when a link is registered.
const CONFIRMATION_TEXT: &str =
    "🔗 Link registered! Reply to this message and I'll post your reply anonymously.";

/// Handle a non-command direct message: either an anonymous reply to a
/// tracked confirmation, or free text that may carry message links.
pub async fn handle_direct_message(ctx: &Context, msg: &Message, state: &AppState) -> Result<()> {
    if let Some(confirmation_id) = msg.message_reference.as_ref().and_then(|r| r.message_id) {
        return relay_reply(ctx, msg, state, confirmation_id).await;
    }
    register_links(ctx, msg, state).await
}

async fn relay_reply(
    ctx: &Context,
    msg: &Message,
    state: &AppState,
    confirmation_id: MessageId,
) -> Result<()> {
    let target = {
        let mut pending = state.pending.lock().await;
        pending.take(confirmation_id)
    };
    // Replies to anything other than a live confirmation are ignored.
    let Some(target) = target else {
        debug!("Reply to untracked message {}", confirmation_id);
        return Ok(());
    };

    info!(
        "Relaying anonymous reply to message {} in channel {}",
        target.message_id, target.channel_id
    );
    // The entry is already consumed: a failed send is reported, not retried.
    match gateway::send_anonymous(ctx, target.channel_id, &msg.content, Some(target.message_id))
        .await
    {
        Ok(_) => {
            msg.react(&ctx.http, '✅').await.ok();
        }
        Err(err) => {
            error!("Failed to relay anonymous reply: {}", err);
            msg.channel_id
                .say(
                    &ctx.http,
                    "❌ I couldn't deliver your reply. The original message may be gone.",
                )
                .await?;
        }
    }
    Ok(())
}

async fn register_links(ctx: &Context, msg: &Message, state: &AppState) -> Result<()> {
    for link in links::parse_links(&msg.content) {
        register_one_link(ctx, msg, state, link).await?;
    }
    Ok(())
}

async fn register_one_link(
    ctx: &Context,
    msg: &Message,
    state: &AppState,
    link: MessageLink,
) -> Result<()> {
    if let Err(err) = gateway::fetch_guild_channel(ctx, link.channel_id).await {
        return notify_link_failure(ctx, msg, link, err).await;
    }

    let target = match gateway::fetch_message(ctx, link.channel_id, link.message_id).await {
        Ok(message) => message,
        Err(err) => return notify_link_failure(ctx, msg, link, err).await,
    };

    let confirmation = msg.channel_id.say(&ctx.http, CONFIRMATION_TEXT).await?;

    let mut pending = state.pending.lock().await;
    pending.register(
        confirmation.id,
        ReplyTarget {
            channel_id: target.channel_id,
            message_id: target.id,
        },
    );
    debug!(
        "Tracking confirmation {} -> message {} ({} pending)",
        confirmation.id,
        target.id,
        pending.len()
    );
    Ok(())
}

/// Report a per-link lookup failure to the user; unknown failures propagate.
async fn notify_link_failure(
    ctx: &Context,
    msg: &Message,
    link: MessageLink,
    err: GatewayError,
) -> Result<()> {
    let notice = match &err {
        GatewayError::ChannelNotFound => "❌ I couldn't find the channel that link points to.",
        GatewayError::MessageNotFound => "❌ I couldn't find the message that link points to.",
        GatewayError::PermissionDenied => {
            "❌ I'm not allowed to read the message that link points to."
        }
        _ => return Err(err.into()),
    };
    warn!(
        "Could not register link {}/{}/{}: {}",
        link.guild_id, link.channel_id, link.message_id, err
    );
    msg.channel_id.say(&ctx.http, notice).await?;
    Ok(())
}
