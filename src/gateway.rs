//! Thin adapter over serenity: home-guild selection, channel snapshots,
//! message fetches, and anonymous sends. Owns the translation from Discord
//! REST failures into the error kinds the relay logic branches on.

use serenity::builder::{CreateAllowedMentions, CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::client::Context;
use serenity::http::HttpError;
use serenity::model::channel::{ChannelType, GuildChannel, Message};
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::model::Colour;

use crate::resolver::ChannelEntry;

/// Footer stamped on every relayed embed.
pub const ANONYMOUS_FOOTER: &str = "Anonymous Message";

/// Failure kinds surfaced by the Discord adapter.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("bot has not joined any guild")]
    NoGuildJoined,
    #[error("channel not found")]
    ChannelNotFound,
    #[error("message not found")]
    MessageNotFound,
    #[error("missing permission")]
    PermissionDenied,
    #[error("gateway error: {0}")]
    Gateway(serenity::Error),
}

// Discord JSON error codes the relay cares about.
const UNKNOWN_CHANNEL: isize = 10003;
const UNKNOWN_MESSAGE: isize = 10008;
const MISSING_ACCESS: isize = 50001;
const MISSING_PERMISSIONS: isize = 50013;

fn classify(status: u16, code: isize) -> Option<GatewayError> {
    match code {
        UNKNOWN_CHANNEL => Some(GatewayError::ChannelNotFound),
        UNKNOWN_MESSAGE => Some(GatewayError::MessageNotFound),
        MISSING_ACCESS | MISSING_PERMISSIONS => Some(GatewayError::PermissionDenied),
        _ if status == 403 => Some(GatewayError::PermissionDenied),
        _ => None,
    }
}

impl From<serenity::Error> for GatewayError {
    fn from(err: serenity::Error) -> Self {
        if let serenity::Error::Http(HttpError::UnsuccessfulRequest(ref resp)) = err {
            if let Some(kind) = classify(resp.status_code.as_u16(), resp.error.code) {
                return kind;
            }
        }
        GatewayError::Gateway(err)
    }
}

/// Guild the bot serves: the configured id, else the first joined guild.
pub fn home_guild(ctx: &Context, configured: Option<u64>) -> Result<GuildId, GatewayError> {
    if let Some(id) = configured.filter(|&id| id != 0) {
        return Ok(GuildId::new(id));
    }
    ctx.cache
        .guilds()
        .first()
        .copied()
        .ok_or(GatewayError::NoGuildJoined)
}

fn sorted_text_channels(channels: impl IntoIterator<Item = GuildChannel>) -> Vec<GuildChannel> {
    let mut list: Vec<GuildChannel> = channels
        .into_iter()
        .filter(|c| c.kind == ChannelType::Text)
        .collect();
    // Discord hands channels back as a map; sort by position for a stable order.
    list.sort_by_key(|c| (c.position, c.id));
    list
}

/// All text channels of `guild`, ordered as they appear in the sidebar.
pub async fn text_channels(
    ctx: &Context,
    guild: GuildId,
) -> Result<Vec<ChannelEntry>, GatewayError> {
    let channels = guild.channels(&ctx.http).await?;
    Ok(sorted_text_channels(channels.into_values())
        .into_iter()
        .map(|c| ChannelEntry {
            id: c.id,
            name: c.name,
        })
        .collect())
}

/// Text channels the bot can currently post in.
pub async fn postable_channels(
    ctx: &Context,
    guild: GuildId,
) -> Result<Vec<ChannelEntry>, GatewayError> {
    let bot_id = ctx.cache.current_user().id;
    let channels = guild.channels(&ctx.http).await?;
    Ok(sorted_text_channels(channels.into_values())
        .into_iter()
        .filter(|c| {
            c.permissions_for_user(&ctx.cache, bot_id)
                .map(|perms| perms.send_messages())
                .unwrap_or(false)
        })
        .map(|c| ChannelEntry {
            id: c.id,
            name: c.name,
        })
        .collect())
}

/// Fetch the guild channel a permalink points at, by id.
pub async fn fetch_guild_channel(
    ctx: &Context,
    channel_id: ChannelId,
) -> Result<GuildChannel, GatewayError> {
    let channel = ctx.http.get_channel(channel_id).await?;
    channel.guild().ok_or(GatewayError::ChannelNotFound)
}

/// Fetch a message by id.
pub async fn fetch_message(
    ctx: &Context,
    channel_id: ChannelId,
    message_id: MessageId,
) -> Result<Message, GatewayError> {
    Ok(ctx.http.get_message(channel_id, message_id).await?)
}

/// Post an anonymous embed, optionally as a reply to an existing message.
///
/// Mentions are stripped so relayed text can never ping anyone.
pub async fn send_anonymous(
    ctx: &Context,
    channel_id: ChannelId,
    text: &str,
    reply_to: Option<MessageId>,
) -> Result<Message, GatewayError> {
    let embed = CreateEmbed::new()
        .description(text)
        .colour(Colour::BLUE)
        .footer(CreateEmbedFooter::new(ANONYMOUS_FOOTER));

    let mut builder = CreateMessage::new()
        .embed(embed)
        .allowed_mentions(CreateAllowedMentions::new());
    if let Some(message_id) = reply_to {
        builder = builder.reference_message((channel_id, message_id));
    }

    Ok(channel_id.send_message(&ctx.http, builder).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_channel_code_maps_to_channel_not_found() {
        assert!(matches!(
            classify(404, UNKNOWN_CHANNEL),
            Some(GatewayError::ChannelNotFound)
        ));
    }

    #[test]
    fn unknown_message_code_maps_to_message_not_found() {
        assert!(matches!(
            classify(404, UNKNOWN_MESSAGE),
            Some(GatewayError::MessageNotFound)
        ));
    }

    #[test]
    fn missing_access_and_permissions_map_to_permission_denied() {
        assert!(matches!(
            classify(403, MISSING_ACCESS),
            Some(GatewayError::PermissionDenied)
        ));
        assert!(matches!(
            classify(403, MISSING_PERMISSIONS),
            Some(GatewayError::PermissionDenied)
        ));
    }

    #[test]
    fn forbidden_status_maps_to_permission_denied() {
        assert!(matches!(
            classify(403, 0),
            Some(GatewayError::PermissionDenied)
        ));
    }

    #[test]
    fn unrecognized_failures_stay_unclassified() {
        assert!(classify(500, 0).is_none());
        assert!(classify(404, 10013).is_none());
    }
}
