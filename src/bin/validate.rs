//! Token validation probe.
//!
//! Connects to Discord with the configured token, prints the authenticated
//! account, and shuts down. Useful for checking credentials before
//! deploying the bot itself.
//!
//! Reads the same `config.toml` as the bot (path as the first argument),
//! falling back to the DISCORD_TOKEN environment variable.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serenity::client::{Client, Context, EventHandler};
use serenity::model::gateway::{GatewayIntents, Ready};

#[derive(Deserialize)]
struct Config {
    discord: DiscordSection,
}

#[derive(Deserialize)]
struct DiscordSection {
    #[serde(default)]
    bot_token: String,
}

struct Probe;

#[async_trait]
impl EventHandler for Probe {
    async fn ready(&self, ctx: Context, ready: Ready) {
        println!("Successfully logged in as {}", ready.user.name);
        ctx.shard.shutdown_clean();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let token = load_token(&config_path)?;

    let mut client = Client::builder(&token, GatewayIntents::empty())
        .event_handler(Probe)
        .await
        .context("Failed to create Discord client")?;
    client.start().await.context("Discord client error")?;

    Ok(())
}

fn load_token(path: &Path) -> Result<String> {
    let from_file = std::fs::read_to_string(path)
        .ok()
        .and_then(|content| toml::from_str::<Config>(&content).ok())
        .map(|config| config.discord.bot_token)
        .filter(|token| !token.is_empty());
    if let Some(token) = from_file {
        return Ok(token);
    }
    match std::env::var("DISCORD_TOKEN") {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => bail!(
            "No bot token: set [discord] bot_token in {} or the DISCORD_TOKEN environment variable",
            path.display()
        ),
    }
}
