//! Platform boundary types.
//!
//! Everything the framework knows about the external chat platform lives here:
//! entity snapshots from the gateway cache, inbound event shapes, and the
//! [`Platform`] trait the host implements over its REST/gateway transport.

mod event;
mod traits;

pub use event::{
    GatewayEvent, Interaction, InteractionKind, InvocationSurface, OptionData, OptionValue,
    TextMessage,
};
pub use traits::{CommandPayload, PayloadChoice, PayloadOption, Platform, Reply};

use crate::permissions::Permissions;

/// Unique user identifier as issued by the platform.
pub type UserId = String;

/// Community ("guild"/"server") identifier.
pub type CommunityId = String;

/// Channel identifier.
pub type ChannelId = String;

/// Role identifier.
pub type RoleId = String;

/// Message identifier.
pub type MessageId = String;

/// Snapshot of a user from the gateway cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Display name, when set.
    pub global_name: Option<String>,
    /// Whether this account is an automated agent.
    pub bot: bool,
}

impl User {
    /// Display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

/// A user's membership in a community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub roles: Vec<RoleId>,
}

/// Snapshot of a community role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Permissions,
}

/// Broad channel classification. The framework only cares whether a channel is
/// a direct-message channel or belongs to a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    CommunityText,
    DirectMessage,
    Other,
}

/// Snapshot of a channel from the gateway cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: Option<String>,
    pub kind: ChannelKind,
    pub community: Option<CommunityId>,
}

/// An uploaded file attached to an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size: u64,
}

/// A user or role resolved from a mentionable argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mentionable {
    User(User),
    Role(Role),
}
