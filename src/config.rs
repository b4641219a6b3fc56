use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default = "default_relay_config")]
    pub relay: RelayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    /// Bot token; leave empty to use the DISCORD_TOKEN environment variable.
    #[serde(default)]
    pub bot_token: String,
    /// Guild the bot serves. When unset, the first joined guild is used.
    #[serde(default)]
    pub guild_id: Option<u64>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    /// Maximum number of pending anonymous replies tracked at once.
    #[serde(default = "default_pending_capacity")]
    pub pending_capacity: usize,
    /// Seconds a registered link waits for a reply before it is dropped.
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_pending_capacity() -> usize {
    256
}

fn default_pending_ttl_secs() -> u64 {
    86_400
}

fn default_relay_config() -> RelayConfig {
    RelayConfig {
        pending_capacity: default_pending_capacity(),
        pending_ttl_secs: default_pending_ttl_secs(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Bot token from the config file, falling back to DISCORD_TOKEN.
    pub fn token(&self) -> Result<String> {
        if !self.discord.bot_token.is_empty() {
            return Ok(self.discord.bot_token.clone());
        }
        match std::env::var("DISCORD_TOKEN") {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => bail!(
                "No bot token: set [discord] bot_token or the DISCORD_TOKEN environment variable"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            [discord]
            bot_token = "abc"
            guild_id = 42
            command_prefix = "?"

            [relay]
            pending_capacity = 8
            pending_ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.bot_token, "abc");
        assert_eq!(config.discord.guild_id, Some(42));
        assert_eq!(config.discord.command_prefix, "?");
        assert_eq!(config.relay.pending_capacity, 8);
        assert_eq!(config.relay.pending_ttl_secs, 60);
    }

    #[test]
    fn applies_defaults() {
        let config: Config = toml::from_str("[discord]\nbot_token = \"abc\"\n").unwrap();

        assert_eq!(config.discord.guild_id, None);
        assert_eq!(config.discord.command_prefix, "!");
        assert_eq!(config.relay.pending_capacity, 256);
        assert_eq!(config.relay.pending_ttl_secs, 86_400);
    }

    #[test]
    fn token_prefers_config_value() {
        let config: Config = toml::from_str("[discord]\nbot_token = \"abc\"\n").unwrap();
        assert_eq!(config.token().unwrap(), "abc");
    }

    #[test]
    fn rejects_config_without_discord_section() {
        assert!(toml::from_str::<Config>("[relay]\npending_capacity = 8\n").is_err());
    }
}
