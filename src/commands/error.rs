use thiserror::Error;

/// Fatal startup errors of the dispatcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Two modules claim the same command or trigger name.
    ///
    /// Commands and triggers share one namespace, so a trigger can collide
    /// with a command too.
    #[error("Failed to load {incoming} because '{name}' was already registered by {existing}")]
    DuplicateName {
        name: String,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("Module {module} failed to initialize: {reason}")]
    InitFailed { module: &'static str, reason: String },
}
