//! Built-in modules
//!
//! - **Version**: 3.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 3.0.0: Prefix commands, triggers and observers instead of slash handlers
//! - 1.0.0: Initial creation

pub mod activity;
pub mod fun;
pub mod greetings;
pub mod member_log;
pub mod utility;

use std::sync::Arc;

use super::handler::Module;
use crate::core::config::Config;

/// Create all built-in modules, in registration order
///
/// Observers are notified in this order too.
pub fn create_all_modules(config: &Config) -> Vec<Arc<dyn Module>> {
    vec![
        Arc::new(utility::UtilityModule),
        Arc::new(fun::FunModule),
        Arc::new(greetings::GreetingsModule),
        Arc::new(activity::ActivityModule::new()),
        Arc::new(member_log::MemberLogModule::new(
            config.member_log_channel_id.clone(),
        )),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::CommandRegistry;

    fn config(member_log: Option<&str>) -> Config {
        Config::from_lookup(|key| match key {
            "DISCORD_TOKEN" => Some("token".to_string()),
            "MEMBER_LOG_CHANNEL_ID" => member_log.map(str::to_string),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_builtin_modules_register_cleanly() {
        let registry = CommandRegistry::build(create_all_modules(&config(None))).unwrap();

        for name in ["ping", "stats", "limits", "roll", "flip", "activity", "hi", "shrug"] {
            assert!(registry.contains(name), "{name} should be registered");
        }
        assert_eq!(registry.modules().len(), 5);
        assert_eq!(registry.observers().len(), 2);
    }

    #[test]
    fn test_module_names_are_unique() {
        let modules = create_all_modules(&config(Some("99")));
        let mut names: Vec<_> = modules.iter().map(|m| m.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), modules.len());
    }
}
