use serenity::model::id::ChannelId;

/// Name/id snapshot of a guild text channel, detached from the gateway types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub id: ChannelId,
    pub name: String,
}

/// Find a text channel by user-supplied name.
///
/// A leading `#` is ignored. Exact matches win over case-insensitive ones;
/// within a pass, the first channel in `channels` order wins.
pub fn resolve<'a>(channels: &'a [ChannelEntry], name: &str) -> Option<&'a ChannelEntry> {
    let wanted = name.trim_start_matches('#');

    channels
        .iter()
        .find(|c| c.name == wanted)
        .or_else(|| channels.iter().find(|c| c.name.eq_ignore_ascii_case(wanted)))
}
