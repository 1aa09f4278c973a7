//! # Feature: Activity
//!
//! Counts messages per guild and reports the count on request.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//! - **Toggleable**: true

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use log::info;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandHandler, EventObserver, Module};
use crate::commands::message::InboundMessage;

/// Key used for direct messages
const DM_KEY: &str = "dm";

#[derive(Default)]
pub struct ActivityModule {
    counts: DashMap<String, u64>,
}

impl ActivityModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, guild_id: Option<&str>) -> u64 {
        self.counts
            .get(guild_id.unwrap_or(DM_KEY))
            .map(|count| *count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl Module for ActivityModule {
    fn name(&self) -> &'static str {
        "activity"
    }

    async fn uninit(&self, _ctx: &CommandContext) -> Result<()> {
        let total: u64 = self.counts.iter().map(|entry| *entry.value()).sum();
        info!(
            "📊 Activity: {} messages across {} guilds this session",
            total,
            self.counts.len()
        );
        Ok(())
    }

    fn as_command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }

    fn as_observer(&self) -> Option<&dyn EventObserver> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for ActivityModule {
    fn command_names(&self) -> &'static [&'static str] {
        &["activity"]
    }

    async fn action(
        &self,
        _command: &str,
        _content: &str,
        msg: &InboundMessage,
        ctx: &CommandContext,
    ) -> Result<()> {
        let count = self.count(msg.guild_id.as_deref());
        let place = if msg.is_dm() { "here" } else { "on this server" };
        ctx.say(
            &msg.channel_id,
            &format!("📊 I've seen {count} messages {place} since I started."),
        )
        .await
    }
}

#[async_trait]
impl EventObserver for ActivityModule {
    async fn on_message(
        &self,
        _content: &str,
        msg: &InboundMessage,
        _ctx: &CommandContext,
    ) -> Result<()> {
        let key = msg.guild_id.as_deref().unwrap_or(DM_KEY);
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }
}
