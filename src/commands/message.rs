//! Gateway-independent inbound events
//!
//! The dispatcher never sees serenity models directly. The gateway adapter
//! normalizes every message and membership event into these types first.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

/// A chat message as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: String,
    pub author_id: String,
    pub channel_id: String,
    /// `None` for direct messages
    pub guild_id: Option<String>,
    pub content: String,
}

impl InboundMessage {
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        channel_id: impl Into<String>,
        guild_id: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            channel_id: channel_id.into(),
            guild_id,
            content: content.into(),
        }
    }

    pub fn is_dm(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// A member joined or left a guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEvent {
    pub guild_id: String,
    pub member_id: String,
}

impl MemberEvent {
    pub fn new(guild_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            member_id: member_id.into(),
        }
    }
}
