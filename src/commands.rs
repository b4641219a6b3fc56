use anyhow::Result;
use serenity::client::Context;
use serenity::model::channel::Message;
use tracing::{info, warn};

use crate::bot::AppState;
use crate::gateway::{self, GatewayError};
use crate::resolver::{self, ChannelEntry};

/// Split `text` into command name and argument rest, if it starts with `prefix`.
pub fn parse_invocation<'a>(text: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = text.strip_prefix(prefix)?.trim_start();
    if rest.is_empty() {
        return None;
    }
    match rest.split_once(char::is_whitespace) {
        Some((name, args)) => Some((name, args.trim_start())),
        None => Some((rest, "")),
    }
}

/// Arguments of `anon`: a channel name, then the message body.
fn split_args(args: &str) -> Option<(&str, &str)> {
    let (name, rest) = args.split_once(char::is_whitespace)?;
    let body = rest.trim();
    if name.is_empty() || body.is_empty() {
        return None;
    }
    Some((name, body))
}

/// `!anon <channel-name> <message...>`: post an anonymous embed to a channel.
pub async fn run_anon(ctx: &Context, msg: &Message, state: &AppState, args: &str) -> Result<()> {
    let Some((channel_name, body)) = split_args(args) else {
        let mut reply = format!(
            "Please use the format: `{}anon channel-name Your message`\nAvailable channels:\n",
            state.config.discord.command_prefix
        );
        reply.push_str(&available_channels(ctx, state).await);
        msg.channel_id.say(&ctx.http, reply).await?;
        return Ok(());
    };

    info!("Received anon command for channel: {}", channel_name);

    let channels = match guild_text_channels(ctx, state).await {
        Ok(channels) => channels,
        Err(GatewayError::NoGuildJoined) => {
            warn!("Bot is not in any guild");
            msg.channel_id
                .say(&ctx.http, "❌ I couldn't find that channel.")
                .await?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let Some(target) = resolver::resolve(&channels, channel_name) else {
        let mut reply = String::from("❌ I couldn't find that channel. Available channels are:\n");
        reply.push_str(&available_channels(ctx, state).await);
        msg.channel_id.say(&ctx.http, reply).await?;
        return Ok(());
    };

    match gateway::send_anonymous(ctx, target.id, body, None).await {
        Ok(_) => {
            info!("Posted anonymous message to #{}", target.name);
            msg.channel_id
                .say(
                    &ctx.http,
                    format!(
                        "✅ Your anonymous message has been posted in #{}!",
                        target.name
                    ),
                )
                .await?;
        }
        Err(GatewayError::PermissionDenied) => {
            msg.channel_id
                .say(&ctx.http, "❌ I don't have permission to post in that channel.")
                .await?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

async fn guild_text_channels(
    ctx: &Context,
    state: &AppState,
) -> Result<Vec<ChannelEntry>, GatewayError> {
    let guild = gateway::home_guild(ctx, state.config.discord.guild_id)?;
    gateway::text_channels(ctx, guild).await
}

/// One `#name` line per channel the bot can post in, for error replies.
async fn available_channels(ctx: &Context, state: &AppState) -> String {
    let channels = match gateway::home_guild(ctx, state.config.discord.guild_id) {
        Ok(guild) => gateway::postable_channels(ctx, guild)
            .await
            .unwrap_or_default(),
        Err(_) => Vec::new(),
    };
    if channels.is_empty() {
        return "(none)".to_string();
    }
    channels
        .iter()
        .map(|c| format!("#{}", c.name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_args() {
        assert_eq!(
            parse_invocation("!anon general hi there", "!"),
            Some(("anon", "general hi there"))
        );
    }

    #[test]
    fn parses_command_without_args() {
        assert_eq!(parse_invocation("!anon", "!"), Some(("anon", "")));
    }

    #[test]
    fn rejects_unprefixed_text() {
        assert_eq!(parse_invocation("anon general hi", "!"), None);
        assert_eq!(parse_invocation("", "!"), None);
        assert_eq!(parse_invocation("!", "!"), None);
    }

    #[test]
    fn honors_configured_prefix() {
        assert_eq!(parse_invocation("?anon general hi", "?"), Some(("anon", "general hi")));
        assert_eq!(parse_invocation("!anon general hi", "?"), None);
    }

    #[test]
    fn split_args_separates_channel_from_body() {
        assert_eq!(split_args("general hello world"), Some(("general", "hello world")));
    }

    #[test]
    fn split_args_requires_both_parts() {
        assert_eq!(split_args(""), None);
        assert_eq!(split_args("general"), None);
        assert_eq!(split_args("general   "), None);
    }
}
