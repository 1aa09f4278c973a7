//! # Feature: Member Log
//!
//! Posts member joins and leaves to a log channel.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//! - **Toggleable**: true (unset `MEMBER_LOG_CHANNEL_ID` to turn off)

use anyhow::Result;
use async_trait::async_trait;
use log::info;

use crate::commands::context::CommandContext;
use crate::commands::handler::{EventObserver, Module};
use crate::commands::message::MemberEvent;

pub struct MemberLogModule {
    channel_id: Option<String>,
}

impl MemberLogModule {
    pub fn new(channel_id: Option<String>) -> Self {
        Self { channel_id }
    }

    async fn post(&self, ctx: &CommandContext, text: String) -> Result<()> {
        match &self.channel_id {
            Some(channel_id) => ctx.say(channel_id, &text).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Module for MemberLogModule {
    fn name(&self) -> &'static str {
        "member_log"
    }

    async fn init(&self, _ctx: &CommandContext) -> Result<()> {
        match &self.channel_id {
            Some(channel_id) => info!("👥 Member log posting to channel {channel_id}"),
            None => info!("👥 Member log disabled (MEMBER_LOG_CHANNEL_ID not set)"),
        }
        Ok(())
    }

    fn as_observer(&self) -> Option<&dyn EventObserver> {
        Some(self)
    }
}

#[async_trait]
impl EventObserver for MemberLogModule {
    async fn on_member_add(&self, event: &MemberEvent, ctx: &CommandContext) -> Result<()> {
        self.post(ctx, format!("📥 <@{}> joined the server.", event.member_id))
            .await
    }

    async fn on_member_remove(&self, event: &MemberEvent, ctx: &CommandContext) -> Result<()> {
        self.post(ctx, format!("📤 <@{}> left the server.", event.member_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::test_support::context;

    #[tokio::test]
    async fn test_posts_to_log_channel() {
        let (ctx, sink) = context(&[]);
        let module = MemberLogModule::new(Some("log".to_string()));
        let event = MemberEvent::new("guild", "7");

        module.on_member_add(&event, &ctx).await.unwrap();
        module.on_member_remove(&event, &ctx).await.unwrap();

        assert_eq!(
            sink.texts(),
            vec!["📥 <@7> joined the server.", "📤 <@7> left the server."]
        );
        assert_eq!(sink.channels(), vec!["log", "log"]);
    }

    #[tokio::test]
    async fn test_silent_without_channel() {
        let (ctx, sink) = context(&[]);
        let module = MemberLogModule::new(None);

        module.init(&ctx).await.unwrap();
        module
            .on_member_add(&MemberEvent::new("guild", "7"), &ctx)
            .await
            .unwrap();
        assert!(sink.texts().is_empty());
    }
}
