//! Utility commands
//!
//! Handles: help (h), ping, stats, limits
//!
//! - **Version**: 2.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.1.0: Add help listing every registered command and trigger
//! - 2.0.0: Prefix commands; add limits with admin override
//! - 1.0.0: Initial creation

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::info;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandHandler, Module};
use crate::commands::message::InboundMessage;

pub struct UtilityModule;

impl Module for UtilityModule {
    fn name(&self) -> &'static str {
        "utility"
    }

    fn as_command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for UtilityModule {
    fn command_names(&self) -> &'static [&'static str] {
        &["help", "h", "ping", "stats", "limits"]
    }

    async fn action(
        &self,
        command: &str,
        content: &str,
        msg: &InboundMessage,
        ctx: &CommandContext,
    ) -> Result<()> {
        match command {
            "help" | "h" => ctx.say(&msg.channel_id, &help_text(ctx)).await,
            "ping" => ctx.say(&msg.channel_id, "Pong!").await,
            "stats" => self.handle_stats(msg, ctx).await,
            "limits" => self.handle_limits(content, msg, ctx).await,
            _ => Ok(()),
        }
    }
}

impl UtilityModule {
    async fn handle_stats(&self, msg: &InboundMessage, ctx: &CommandContext) -> Result<()> {
        let uptime = (Utc::now() - ctx.started_at).num_seconds().max(0);

        let response = format!(
            "**Bot Stats**\n\
            ⏱️ Uptime: {}\n\
            ⚙️ Commands executed: {}\n\
            🚫 Rate limited: {}\n\
            🔒 Denied: {}\n\
            💥 Handler faults: {}\n\
            🪣 Tracked buckets: {}",
            format_uptime(uptime),
            ctx.stats.commands_executed(),
            ctx.stats.rate_limited(),
            ctx.stats.denied(),
            ctx.stats.handler_faults(),
            ctx.buckets.len()
        );

        ctx.say(&msg.channel_id, &response).await
    }

    async fn handle_limits(
        &self,
        content: &str,
        msg: &InboundMessage,
        ctx: &CommandContext,
    ) -> Result<()> {
        let mut args = content.split_whitespace();

        match args.next() {
            None => {
                let left = ctx.buckets.get(&msg.author_id);
                ctx.say(
                    &msg.channel_id,
                    &format!("You've still got {left} commands left"),
                )
                .await
            }
            Some("set") => {
                if !ctx.is_bot_admin(&msg.author_id) {
                    return ctx
                        .say(&msg.channel_id, "Only bot admins can change limits.")
                        .await;
                }

                let (Some(user), Some(value), None) = (args.next(), args.next(), args.next())
                else {
                    return ctx.say(&msg.channel_id, LIMITS_USAGE).await;
                };
                let Ok(value) = value.parse::<i32>() else {
                    return ctx
                        .say(&msg.channel_id, &format!("'{value}' is not a number."))
                        .await;
                };

                let user = parse_user_id(user);
                ctx.buckets.set(user, value);
                info!(
                    "🪣 Admin {} set keys of user {} to {}",
                    msg.author_id, user, value
                );
                ctx.say(&msg.channel_id, &format!("Set <@{user}> to {value} keys."))
                    .await
            }
            Some(_) => ctx.say(&msg.channel_id, LIMITS_USAGE).await,
        }
    }
}

fn help_text(ctx: &CommandContext) -> String {
    let list = |names: &[String]| {
        names
            .iter()
            .map(|name| format!("`{name}`"))
            .collect::<Vec<_>>()
            .join(" ")
    };

    format!(
        "**Available Commands:**\n{}\n\n**Triggers:**\n{}",
        list(&ctx.catalog.commands),
        list(&ctx.catalog.triggers)
    )
}

const LIMITS_USAGE: &str = "Usage: `limits` or `limits set <user> <value>`";

/// Accept a raw id or a mention (`<@id>`, `<@!id>`)
fn parse_user_id(raw: &str) -> &str {
    raw.strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|id| id.trim_start_matches('!'))
        .unwrap_or(raw)
}

fn format_uptime(total_secs: i64) -> String {
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::CommandCatalog;
    use crate::commands::handlers::test_support::{context, message};
    use crate::features::rate_limiting::BUCKET_INITIAL_FILL;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ping() {
        let (ctx, sink) = context(&[]);
        UtilityModule
            .action("ping", "", &message("1", "_ping"), &ctx)
            .await
            .unwrap();
        assert_eq!(sink.texts(), vec!["Pong!"]);
        assert_eq!(sink.channels(), vec!["chan"]);
    }

    #[tokio::test]
    async fn test_help_lists_registered_names() {
        let (mut ctx, sink) = context(&[]);
        ctx.catalog = Arc::new(CommandCatalog {
            commands: vec!["h".to_string(), "help".to_string(), "roll".to_string()],
            triggers: vec!["shrug".to_string()],
        });

        UtilityModule
            .action("h", "", &message("1", "_h"), &ctx)
            .await
            .unwrap();

        assert_eq!(
            sink.texts(),
            vec!["**Available Commands:**\n`h` `help` `roll`\n\n**Triggers:**\n`shrug`"]
        );
    }

    #[tokio::test]
    async fn test_stats_reports_counters() {
        let (ctx, sink) = context(&[]);
        ctx.stats.record_command();
        ctx.stats.record_command();
        ctx.stats.record_rate_limited();

        UtilityModule
            .action("stats", "", &message("1", "_stats"), &ctx)
            .await
            .unwrap();

        let text = &sink.texts()[0];
        assert!(text.contains("Commands executed: 2"));
        assert!(text.contains("Rate limited: 1"));
        assert!(text.contains("Handler faults: 0"));
    }

    #[tokio::test]
    async fn test_limits_shows_own_keys() {
        let (ctx, sink) = context(&[]);
        ctx.buckets.drain(2, "1").unwrap();

        UtilityModule
            .action("limits", "", &message("1", "_limits"), &ctx)
            .await
            .unwrap();
        assert_eq!(
            sink.texts(),
            vec![format!(
                "You've still got {} commands left",
                BUCKET_INITIAL_FILL - 2
            )]
        );
    }

    #[tokio::test]
    async fn test_limits_set_requires_admin() {
        let (ctx, sink) = context(&["admin"]);

        UtilityModule
            .action("limits", "set 7 30", &message("1", "_limits set 7 30"), &ctx)
            .await
            .unwrap();
        assert_eq!(sink.texts(), vec!["Only bot admins can change limits."]);
        assert_eq!(ctx.buckets.get("7"), BUCKET_INITIAL_FILL);

        UtilityModule
            .action("limits", "set <@!7> 30", &message("admin", "_limits"), &ctx)
            .await
            .unwrap();
        assert_eq!(ctx.buckets.get("7"), 30);
        assert_eq!(sink.texts()[1], "Set <@7> to 30 keys.");
    }

    #[tokio::test]
    async fn test_limits_set_rejects_bad_input() {
        let (ctx, sink) = context(&["admin"]);
        let msg = message("admin", "_limits");

        UtilityModule.action("limits", "set 7", &msg, &ctx).await.unwrap();
        UtilityModule.action("limits", "set 7 lots", &msg, &ctx).await.unwrap();
        UtilityModule.action("limits", "reset", &msg, &ctx).await.unwrap();

        let texts = sink.texts();
        assert_eq!(texts[0], LIMITS_USAGE);
        assert_eq!(texts[1], "'lots' is not a number.");
        assert_eq!(texts[2], LIMITS_USAGE);
        assert!(ctx.buckets.is_empty());
    }

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("123"), "123");
        assert_eq!(parse_user_id("<@123>"), "123");
        assert_eq!(parse_user_id("<@!123>"), "123");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(65), "1m 5s");
        assert_eq!(format_uptime(3_665), "1h 1m 5s");
        assert_eq!(format_uptime(90_065), "1d 1h 1m 5s");
    }
}
