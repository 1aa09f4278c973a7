//! Dice and coins
//!
//! Handles: roll, flip

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandHandler, Module};
use crate::commands::message::InboundMessage;

/// Sides of the die when `roll` gets no argument
pub const DEFAULT_ROLL_MAX: u32 = 100;

pub struct FunModule;

impl Module for FunModule {
    fn name(&self) -> &'static str {
        "fun"
    }

    fn as_command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for FunModule {
    fn command_names(&self) -> &'static [&'static str] {
        &["roll", "flip"]
    }

    async fn action(
        &self,
        command: &str,
        content: &str,
        msg: &InboundMessage,
        ctx: &CommandContext,
    ) -> Result<()> {
        let response = match command {
            "roll" => match parse_max(content) {
                Some(max) => format!("🎲 {}", rand::rng().random_range(1..=max)),
                None => "Please give me a positive number, e.g. `roll 20`".to_string(),
            },
            "flip" => {
                if rand::rng().random_bool(0.5) {
                    "🪙 Heads".to_string()
                } else {
                    "🪙 Tails".to_string()
                }
            }
            _ => return Ok(()),
        };

        ctx.say(&msg.channel_id, &response).await
    }
}

fn parse_max(content: &str) -> Option<u32> {
    match content.split_whitespace().next() {
        None => Some(DEFAULT_ROLL_MAX),
        Some(arg) => arg.parse::<u32>().ok().filter(|max| *max > 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handlers::test_support::{context, message};

    #[test]
    fn test_parse_max() {
        assert_eq!(parse_max(""), Some(DEFAULT_ROLL_MAX));
        assert_eq!(parse_max("20"), Some(20));
        assert_eq!(parse_max("6 please"), Some(6));
        assert_eq!(parse_max("0"), None);
        assert_eq!(parse_max("-3"), None);
        assert_eq!(parse_max("many"), None);
    }

    #[tokio::test]
    async fn test_roll_stays_in_range() {
        let (ctx, sink) = context(&[]);
        let msg = message("1", "_roll 6");

        for _ in 0..50 {
            FunModule.action("roll", "6", &msg, &ctx).await.unwrap();
        }

        for text in sink.texts() {
            let value: u32 = text.trim_start_matches("🎲 ").parse().unwrap();
            assert!((1..=6).contains(&value));
        }
    }

    #[tokio::test]
    async fn test_roll_one_is_always_one() {
        let (ctx, sink) = context(&[]);
        FunModule
            .action("roll", "1", &message("1", "_roll 1"), &ctx)
            .await
            .unwrap();
        assert_eq!(sink.texts(), vec!["🎲 1"]);
    }

    #[tokio::test]
    async fn test_roll_invalid_argument() {
        let (ctx, sink) = context(&[]);
        FunModule
            .action("roll", "zero", &message("1", "_roll zero"), &ctx)
            .await
            .unwrap();
        assert!(sink.texts()[0].starts_with("Please give me a positive number"));
    }

    #[tokio::test]
    async fn test_flip() {
        let (ctx, sink) = context(&[]);
        FunModule
            .action("flip", "", &message("1", "_flip"), &ctx)
            .await
            .unwrap();
        let text = &sink.texts()[0];
        assert!(text == "🪙 Heads" || text == "🪙 Tails");
    }
}
