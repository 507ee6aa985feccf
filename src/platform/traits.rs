//! The `Platform` trait - the single seam between the framework and the
//! host's REST/gateway transport.
//!
//! Cache accessors are synchronous by contract: they answer from in-memory
//! gateway state only and never perform a network fetch. Everything that talks
//! to the wire is async and returns [`PlatformError`].

use super::{ChannelId, ChannelInfo, CommunityId, Member, MessageId, Role, RoleId, User, UserId};
use crate::error::PlatformError;
use crate::permissions::Permissions;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outbound reply payload for the originating cause.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub content: String,
    /// Only honored for interaction replies.
    pub ephemeral: bool,
    /// Message to reference, for text-cause replies.
    pub reference: Option<MessageId>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Bulk-publication payload for one command, in the platform's wire shape.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandPayload {
    pub name: String,
    pub description: String,
    /// Platform command type code: 1 = chat input, 2 = user context, 3 = message context.
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nsfw: bool,
    pub dm_permission: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub name_localizations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub description_localizations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PayloadOption>,
}

/// One argument node in a publication payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayloadOption {
    pub name: String,
    pub description: String,
    /// Platform option type code (1 = subcommand .. 11 = attachment).
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<PayloadChoice>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PayloadOption>,
}

/// A fixed choice for a string argument.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayloadChoice {
    pub name: String,
    pub value: String,
}

/// Host-implemented transport and cache surface.
#[async_trait]
pub trait Platform: Send + Sync {
    /// The automated account this framework operates as.
    fn agent_id(&self) -> UserId;

    /// Acknowledge an interaction to keep the platform's response window open.
    async fn acknowledge(&self, interaction_id: &str) -> Result<(), PlatformError>;

    /// Reply to an unacknowledged interaction.
    async fn reply_interaction(
        &self,
        interaction_id: &str,
        reply: Reply,
    ) -> Result<(), PlatformError>;

    /// Edit the original response of an acknowledged interaction.
    async fn edit_interaction_reply(
        &self,
        interaction_id: &str,
        reply: Reply,
    ) -> Result<(), PlatformError>;

    /// Create a message in a channel.
    async fn create_message(&self, channel: &ChannelId, reply: Reply) -> Result<(), PlatformError>;

    /// Best-effort direct message to a user.
    async fn create_direct_message(
        &self,
        user: &UserId,
        reply: Reply,
    ) -> Result<(), PlatformError>;

    /// Replace the global command list.
    async fn publish_global_commands(
        &self,
        payloads: Vec<CommandPayload>,
    ) -> Result<(), PlatformError>;

    /// Replace one community's command list.
    async fn publish_community_commands(
        &self,
        community: &CommunityId,
        payloads: Vec<CommandPayload>,
    ) -> Result<(), PlatformError>;

    fn cached_user(&self, id: &UserId) -> Option<User>;

    fn cached_member(&self, community: &CommunityId, user: &UserId) -> Option<Member>;

    fn cached_role(&self, community: &CommunityId, id: &RoleId) -> Option<Role>;

    fn cached_channel(&self, id: &ChannelId) -> Option<ChannelInfo>;

    /// Effective permissions of a user in a community, from cache.
    fn permissions_in_community(
        &self,
        community: &CommunityId,
        user: &UserId,
    ) -> Option<Permissions>;

    /// Effective permissions of a user in a channel, from cache.
    fn permissions_in_channel(&self, channel: &ChannelId, user: &UserId) -> Option<Permissions>;
}
