//! Command and trigger registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: One namespace for commands and triggers, duplicate names are fatal
//! - 1.0.0: Initial implementation for handler dispatch

use log::info;
use std::collections::HashMap;
use std::sync::Arc;

use super::context::CommandCatalog;
use super::error::DispatchError;
use super::handler::Module;

/// What a registered name resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Command,
    Trigger,
}

#[derive(Clone)]
pub struct RegistryEntry {
    pub kind: EntryKind,
    pub module: Arc<dyn Module>,
}

/// Registry mapping command and trigger names to modules
///
/// Built once from the full module list and immutable afterwards, so lookups
/// need no locking.
///
/// # Example
///
/// ```ignore
/// let registry = CommandRegistry::build(vec![Arc::new(Ping), Arc::new(Greetings)])?;
///
/// if let Some(entry) = registry.get("ping") {
///     assert_eq!(entry.kind, EntryKind::Command);
/// }
/// ```
#[derive(Clone, Default)]
pub struct CommandRegistry {
    entries: HashMap<String, RegistryEntry>,
    modules: Vec<Arc<dyn Module>>,
    observers: Vec<Arc<dyn Module>>,
}

impl CommandRegistry {
    /// Register every module's commands and triggers
    ///
    /// Fails on the first name that is already taken.
    pub fn build(modules: Vec<Arc<dyn Module>>) -> Result<Self, DispatchError> {
        let mut registry = Self::default();

        for module in modules {
            let mut listeners: Vec<&str> = Vec::new();

            if let Some(command) = module.as_command() {
                for &name in command.command_names() {
                    registry.insert(name, EntryKind::Command, &module)?;
                    listeners.push(name);
                }
            }

            if let Some(trigger) = module.as_trigger() {
                for &name in trigger.triggers() {
                    registry.insert(name, EntryKind::Trigger, &module)?;
                    listeners.push(name);
                }
            }

            let observes = module.as_observer().is_some();
            info!(
                "[PLUG] {} reacts to [ {} ]{}",
                module.name(),
                listeners.join(" "),
                if observes { " and observes events" } else { "" }
            );

            if observes {
                registry.observers.push(Arc::clone(&module));
            }
            registry.modules.push(module);
        }

        Ok(registry)
    }

    fn insert(
        &mut self,
        name: &str,
        kind: EntryKind,
        module: &Arc<dyn Module>,
    ) -> Result<(), DispatchError> {
        if let Some(occupant) = self.entries.get(name) {
            return Err(DispatchError::DuplicateName {
                name: name.to_string(),
                existing: occupant.module.name(),
                incoming: module.name(),
            });
        }

        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                kind,
                module: Arc::clone(module),
            },
        );
        Ok(())
    }

    /// Get the entry for a command or trigger name
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    /// Get the module handling `name`, if it is a command
    pub fn command(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.entries
            .get(name)
            .filter(|entry| entry.kind == EntryKind::Command)
            .map(|entry| &entry.module)
    }

    /// Get the module handling `name`, if it is a trigger
    pub fn trigger(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.entries
            .get(name)
            .filter(|entry| entry.kind == EntryKind::Trigger)
            .map(|entry| &entry.module)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered names
    ///
    /// Note: This counts names, not modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All modules in declaration order
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.modules.iter().any(|module| module.name() == name)
    }

    /// Modules with the observer capability, in declaration order
    pub fn observers(&self) -> &[Arc<dyn Module>] {
        &self.observers
    }

    /// Sorted command and trigger names
    pub fn catalog(&self) -> CommandCatalog {
        let owned = |kind: EntryKind| -> Vec<String> {
            self.names(kind).into_iter().map(str::to_string).collect()
        };
        CommandCatalog {
            commands: owned(EntryKind::Command),
            triggers: owned(EntryKind::Trigger),
        }
    }

    /// Sorted registered names of one kind
    pub fn names(&self, kind: EntryKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
