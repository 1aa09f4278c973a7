//! Serenity adapter
//!
//! Converts gateway models into dispatcher events and sends replies over
//! the Discord HTTP API.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, GuildId};
use serenity::model::user::User;
use std::sync::Arc;

use crate::commands::context::ReplySink;
use crate::commands::message::{InboundMessage, MemberEvent};
use crate::core::response::split_for_message;

/// Sends replies through the Discord HTTP client
///
/// Long texts go out as several messages; serenity handles HTTP rate limits.
#[derive(Clone)]
pub struct SerenityReplySink {
    http: Arc<Http>,
}

impl SerenityReplySink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ReplySink for SerenityReplySink {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let channel = parse_channel_id(channel_id)?;
        for part in split_for_message(text) {
            channel.say(&self.http, part).await?;
        }
        Ok(())
    }
}

fn parse_channel_id(channel_id: &str) -> Result<ChannelId> {
    channel_id
        .parse::<u64>()
        .map(ChannelId)
        .map_err(|_| anyhow!("Invalid channel id '{channel_id}'"))
}

pub fn inbound_message(msg: &Message) -> InboundMessage {
    InboundMessage::new(
        msg.id.to_string(),
        msg.author.id.to_string(),
        msg.channel_id.to_string(),
        msg.guild_id.map(|g| g.to_string()),
        msg.content.clone(),
    )
}

pub fn member_event(guild_id: GuildId, user: &User) -> MemberEvent {
    MemberEvent::new(guild_id.to_string(), user.id.to_string())
}
