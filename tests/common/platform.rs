//! A recording, fully in-memory [`Platform`] implementation.
//!
//! Every transport call appends a compact line to the call log so tests
//! assert on exact pipeline behavior. Caches and permission tables are
//! seeded per test; publication and acknowledgement failures can be injected.

use async_trait::async_trait;
use commandeer::error::PlatformError;
use commandeer::permissions::Permissions;
use commandeer::platform::{
    ChannelId, ChannelInfo, CommandPayload, CommunityId, Member, Platform, Reply, Role, RoleId,
    User, UserId,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

pub const AGENT_ID: &str = "agent-1";

#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<String>>,
    users: Mutex<HashMap<UserId, User>>,
    members: Mutex<HashMap<(CommunityId, UserId), Member>>,
    roles: Mutex<HashMap<(CommunityId, RoleId), Role>>,
    channels: Mutex<HashMap<ChannelId, ChannelInfo>>,
    community_perms: Mutex<HashMap<(CommunityId, UserId), Permissions>>,
    channel_perms: Mutex<HashMap<(ChannelId, UserId), Permissions>>,
    published_global: Mutex<Vec<Vec<CommandPayload>>>,
    published_communities: Mutex<Vec<(CommunityId, Vec<CommandPayload>)>>,
    failing_communities: Mutex<HashSet<CommunityId>>,
    fail_acknowledge: AtomicBool,
    fail_global_publish: AtomicBool,
}

#[allow(dead_code)]
impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    // -- seeding --------------------------------------------------------

    pub fn seed_user(&self, user: User) {
        self.users.lock().insert(user.id.clone(), user);
    }

    pub fn seed_member(&self, community: &str, member: Member) {
        self.members
            .lock()
            .insert((community.to_string(), member.user_id.clone()), member);
    }

    pub fn seed_role(&self, community: &str, role: Role) {
        self.roles
            .lock()
            .insert((community.to_string(), role.id.clone()), role);
    }

    pub fn seed_channel(&self, channel: ChannelInfo) {
        self.channels.lock().insert(channel.id.clone(), channel);
    }

    pub fn grant_community(&self, community: &str, user: &str, perms: Permissions) {
        self.community_perms
            .lock()
            .insert((community.to_string(), user.to_string()), perms);
    }

    pub fn grant_channel(&self, channel: &str, user: &str, perms: Permissions) {
        self.channel_perms
            .lock()
            .insert((channel.to_string(), user.to_string()), perms);
    }

    // -- failure injection ----------------------------------------------

    pub fn fail_community_publish(&self, community: &str) {
        self.failing_communities.lock().insert(community.to_string());
    }

    pub fn fail_global_publish(&self) {
        self.fail_global_publish.store(true, Ordering::Release);
    }

    pub fn fail_acknowledge(&self) {
        self.fail_acknowledge.store(true, Ordering::Release);
    }

    // -- inspection -----------------------------------------------------

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Content of every outbound reply-like call, in order.
    pub fn reply_contents(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| {
                if let Some(rest) = call.strip_prefix("reply:") {
                    // reply:{id}:{content}:{ephemeral}; content may hold ':'.
                    let body = rest.splitn(2, ':').nth(1).unwrap_or("");
                    let content = body.rsplitn(2, ':').nth(1).unwrap_or("");
                    Some(content.to_string())
                } else if let Some(rest) = call
                    .strip_prefix("edit:")
                    .or_else(|| call.strip_prefix("msg:"))
                {
                    rest.splitn(2, ':').nth(1).map(str::to_string)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn published_global(&self) -> Vec<Vec<CommandPayload>> {
        self.published_global.lock().clone()
    }

    pub fn published_communities(&self) -> Vec<(CommunityId, Vec<CommandPayload>)> {
        self.published_communities.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    fn agent_id(&self) -> UserId {
        AGENT_ID.to_string()
    }

    async fn acknowledge(&self, interaction_id: &str) -> Result<(), PlatformError> {
        if self.fail_acknowledge.load(Ordering::Acquire) {
            return Err(PlatformError::Unavailable("acknowledge refused".into()));
        }
        self.record(format!("ack:{interaction_id}"));
        Ok(())
    }

    async fn reply_interaction(
        &self,
        interaction_id: &str,
        reply: Reply,
    ) -> Result<(), PlatformError> {
        self.record(format!(
            "reply:{interaction_id}:{}:{}",
            reply.content, reply.ephemeral
        ));
        Ok(())
    }

    async fn edit_interaction_reply(
        &self,
        interaction_id: &str,
        reply: Reply,
    ) -> Result<(), PlatformError> {
        self.record(format!("edit:{interaction_id}:{}", reply.content));
        Ok(())
    }

    async fn create_message(&self, channel: &ChannelId, reply: Reply) -> Result<(), PlatformError> {
        self.record(format!("msg:{channel}:{}", reply.content));
        Ok(())
    }

    async fn create_direct_message(
        &self,
        user: &UserId,
        reply: Reply,
    ) -> Result<(), PlatformError> {
        self.record(format!("dm:{user}:{}", reply.content));
        Ok(())
    }

    async fn publish_global_commands(
        &self,
        payloads: Vec<CommandPayload>,
    ) -> Result<(), PlatformError> {
        if self.fail_global_publish.load(Ordering::Acquire) {
            return Err(PlatformError::Unavailable("global publish refused".into()));
        }
        self.record(format!("publish_global:{}", payloads.len()));
        self.published_global.lock().push(payloads);
        Ok(())
    }

    async fn publish_community_commands(
        &self,
        community: &CommunityId,
        payloads: Vec<CommandPayload>,
    ) -> Result<(), PlatformError> {
        if self.failing_communities.lock().contains(community) {
            return Err(PlatformError::Request(format!(
                "community {community} rejected catalog"
            )));
        }
        self.record(format!("publish_community:{community}:{}", payloads.len()));
        self.published_communities
            .lock()
            .push((community.clone(), payloads));
        Ok(())
    }

    fn cached_user(&self, id: &UserId) -> Option<User> {
        self.users.lock().get(id).cloned()
    }

    fn cached_member(&self, community: &CommunityId, user: &UserId) -> Option<Member> {
        self.members
            .lock()
            .get(&(community.clone(), user.clone()))
            .cloned()
    }

    fn cached_role(&self, community: &CommunityId, id: &RoleId) -> Option<Role> {
        self.roles
            .lock()
            .get(&(community.clone(), id.clone()))
            .cloned()
    }

    fn cached_channel(&self, id: &ChannelId) -> Option<ChannelInfo> {
        self.channels.lock().get(id).cloned()
    }

    fn permissions_in_community(
        &self,
        community: &CommunityId,
        user: &UserId,
    ) -> Option<Permissions> {
        self.community_perms
            .lock()
            .get(&(community.clone(), user.clone()))
            .copied()
    }

    fn permissions_in_channel(&self, channel: &ChannelId, user: &UserId) -> Option<Permissions> {
        self.channel_perms
            .lock()
            .get(&(channel.clone(), user.clone()))
            .copied()
    }
}
