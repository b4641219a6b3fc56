use std::sync::OnceLock;

use regex::Regex;
use serenity::model::id::{ChannelId, GuildId, MessageId};

/// A Discord message permalink broken into its id triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLink {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"https?://discord\.com/channels/(\d+)/(\d+)/(\d+)")
            .expect("message link pattern is valid")
    })
}

/// Yield every message permalink in `text`, left to right.
///
/// Ids are not checked against the gateway; the caller decides what a
/// dangling link means. Malformed ids (overflow, zero) are skipped.
pub fn parse_links(text: &str) -> impl Iterator<Item = MessageLink> + '_ {
    link_pattern().captures_iter(text).filter_map(|caps| {
        let guild: u64 = caps[1].parse().ok()?;
        let channel: u64 = caps[2].parse().ok()?;
        let message: u64 = caps[3].parse().ok()?;
        // Snowflakes are never zero; the typed id constructors reject it.
        if guild == 0 || channel == 0 || message == 0 {
            return None;
        }
        Some(MessageLink {
            guild_id: GuildId::new(guild),
            channel_id: ChannelId::new(channel),
            message_id: MessageId::new(message),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(guild: u64, channel: u64, message: u64) -> MessageLink {
        MessageLink {
            guild_id: GuildId::new(guild),
            channel_id: ChannelId::new(channel),
            message_id: MessageId::new(message),
        }
    }

    #[test]
    fn extracts_single_link() {
        let found: Vec<_> =
            parse_links("check https://discord.com/channels/1/2/3 please").collect();
        assert_eq!(found, vec![link(1, 2, 3)]);
    }

    #[test]
    fn extracts_links_left_to_right() {
        let text = "first https://discord.com/channels/10/20/30, \
                    then https://discord.com/channels/11/21/31 after some text";
        let found: Vec<_> = parse_links(text).collect();
        assert_eq!(found, vec![link(10, 20, 30), link(11, 21, 31)]);
    }

    #[test]
    fn accepts_plain_http() {
        let found: Vec<_> = parse_links("http://discord.com/channels/4/5/6").collect();
        assert_eq!(found, vec![link(4, 5, 6)]);
    }

    #[test]
    fn ignores_text_without_links() {
        assert!(parse_links("no links here").next().is_none());
        assert!(parse_links("https://discord.com/channels/1/2").next().is_none());
        assert!(parse_links("https://example.com/channels/1/2/3").next().is_none());
    }

    #[test]
    fn rescanning_yields_same_sequence() {
        let text = "a https://discord.com/channels/7/8/9 b";
        let first: Vec<_> = parse_links(text).collect();
        let second: Vec<_> = parse_links(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn skips_ids_that_cannot_be_snowflakes() {
        assert!(parse_links("https://discord.com/channels/0/2/3").next().is_none());
        assert!(
            parse_links("https://discord.com/channels/1/2/999999999999999999999")
                .next()
                .is_none()
        );
    }
}
