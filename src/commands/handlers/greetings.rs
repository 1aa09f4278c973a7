//! Canned trigger responses

use crate::commands::handler::{Module, TriggerHandler};

pub struct GreetingsModule;

impl Module for GreetingsModule {
    fn name(&self) -> &'static str {
        "greetings"
    }

    fn as_trigger(&self) -> Option<&dyn TriggerHandler> {
        Some(self)
    }
}

impl TriggerHandler for GreetingsModule {
    fn triggers(&self) -> &'static [&'static str] {
        &["hi", "hello", "wave", "shrug", "tableflip", "lenny"]
    }

    fn response(&self, trigger: &str, _content: &str) -> String {
        match trigger {
            "hi" | "hello" | "wave" => ":wave:",
            "shrug" => "¯\\_(ツ)_/¯",
            "tableflip" => "(╯°□°）╯︵ ┻━┻",
            "lenny" => "( ͡° ͜ʖ ͡°)",
            _ => "",
        }
        .to_string()
    }
}
