//! Per-invocation execution context.
//!
//! One `CommandContext` is built per accepted invocation and handed to every
//! hook in the pipeline. It owns the argument resolver, tracks interaction
//! acknowledgement, and carries the ephemeral once-latch: the first explicit
//! `set_ephemeral` call wins for the lifetime of the invocation, so a gating
//! step upstream of execution can pin visibility before the runner gets a say.

use crate::platform::{
    ChannelId, CommunityId, Interaction, InvocationSurface, Member, Platform, Reply, TextMessage,
    User,
};
use crate::resolver::ArgumentResolver;
use crate::error::PlatformError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tracing::debug;

/// The originating event behind an invocation.
#[derive(Debug, Clone)]
pub enum Cause {
    Interaction(Interaction),
    Message(TextMessage),
}

// Ephemeral latch states.
const EPH_UNSET: u8 = 0;
const EPH_FALSE: u8 = 1;
const EPH_TRUE: u8 = 2;

/// Everything a running command can see and do.
pub struct CommandContext {
    platform: Arc<dyn Platform>,
    cause: Cause,
    args: ArgumentResolver,
    /// Once-latched visibility for interaction replies.
    ephemeral: AtomicU8,
    /// Fallback visibility when the latch was never set.
    default_ephemeral: bool,
    acknowledged: AtomicBool,
}

impl CommandContext {
    pub(crate) fn new(
        platform: Arc<dyn Platform>,
        cause: Cause,
        args: ArgumentResolver,
        default_ephemeral: bool,
    ) -> Self {
        Self {
            platform,
            cause,
            args,
            ephemeral: AtomicU8::new(EPH_UNSET),
            default_ephemeral,
            acknowledged: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // Cause accessors
    // ========================================================================

    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn args(&self) -> &ArgumentResolver {
        &self.args
    }

    /// The invoking user.
    pub fn actor(&self) -> &User {
        match &self.cause {
            Cause::Interaction(i) => &i.user,
            Cause::Message(m) => &m.author,
        }
    }

    /// The invoking user's community membership, if delivered with the cause.
    pub fn member(&self) -> Option<&Member> {
        match &self.cause {
            Cause::Interaction(i) => i.member.as_ref(),
            Cause::Message(m) => m.member.as_ref(),
        }
    }

    pub fn community(&self) -> Option<&CommunityId> {
        match &self.cause {
            Cause::Interaction(i) => i.community.as_ref(),
            Cause::Message(m) => m.community.as_ref(),
        }
    }

    pub fn channel(&self) -> &ChannelId {
        match &self.cause {
            Cause::Interaction(i) => &i.channel,
            Cause::Message(m) => &m.channel,
        }
    }

    /// The structured surface the invocation arrived on, if any.
    pub fn surface(&self) -> Option<InvocationSurface> {
        match &self.cause {
            Cause::Interaction(i) => Some(i.surface),
            Cause::Message(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.cause, Cause::Message(_))
    }

    // ========================================================================
    // Ephemeral latch
    // ========================================================================

    /// Latch reply visibility. The first caller wins; later calls are ignored.
    pub fn set_ephemeral(&self, ephemeral: bool) {
        let value = if ephemeral { EPH_TRUE } else { EPH_FALSE };
        let _ = self.ephemeral.compare_exchange(
            EPH_UNSET,
            value,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Override the latch regardless of prior sets. Reserved for pipeline
    /// steps that must force visibility (e.g. permission denials).
    pub(crate) fn force_ephemeral(&self, ephemeral: bool) {
        let value = if ephemeral { EPH_TRUE } else { EPH_FALSE };
        self.ephemeral.store(value, Ordering::Release);
    }

    /// Drop any gating-time override and return to the configured default,
    /// leaving the latch open for the runner's first `set_ephemeral`.
    pub(crate) fn reset_ephemeral(&self) {
        self.ephemeral.store(EPH_UNSET, Ordering::Release);
    }

    pub fn ephemeral(&self) -> bool {
        match self.ephemeral.load(Ordering::Acquire) {
            EPH_TRUE => true,
            EPH_FALSE => false,
            _ => self.default_ephemeral,
        }
    }

    // ========================================================================
    // Replies
    // ========================================================================

    pub fn acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::Acquire)
    }

    /// Acknowledge the originating interaction so the platform's response
    /// window stays open. No-op for text causes and repeat calls.
    pub async fn acknowledge(&self) -> Result<(), PlatformError> {
        if let Cause::Interaction(i) = &self.cause
            && !self.acknowledged.swap(true, Ordering::AcqRel)
        {
            let result = self.platform.acknowledge(&i.id).await;
            if result.is_err() {
                // Nothing was sent; later replies must not route as edits.
                self.acknowledged.store(false, Ordering::Release);
            }
            return result;
        }
        Ok(())
    }

    /// Reply to the originating cause.
    ///
    /// Interactions: first reply answers the interaction directly (or edits
    /// the acknowledgement if one was sent); later replies edit the original
    /// response. Text causes: a channel message referencing the invocation.
    pub async fn reply(&self, content: impl Into<String>) -> Result<(), PlatformError> {
        self.reply_with(Reply::text(content)).await
    }

    pub async fn reply_with(&self, mut reply: Reply) -> Result<(), PlatformError> {
        match &self.cause {
            Cause::Interaction(i) => {
                reply.ephemeral = self.ephemeral();
                if self.acknowledged.swap(true, Ordering::AcqRel) {
                    self.platform.edit_interaction_reply(&i.id, reply).await
                } else {
                    self.platform.reply_interaction(&i.id, reply).await
                }
            }
            Cause::Message(m) => {
                reply.reference = Some(m.id.clone());
                match self.platform.create_message(&m.channel, reply.clone()).await {
                    Ok(()) => Ok(()),
                    Err(err) => {
                        // Channel unavailable: fall back to a direct message.
                        debug!(channel = %m.channel, error = %err, "channel reply failed, trying DM");
                        reply.reference = None;
                        self.platform
                            .create_direct_message(&m.author.id, reply)
                            .await
                            .map_err(|_| err)
                    }
                }
            }
        }
    }

    /// Post a plain message to the invocation's channel.
    pub async fn send(&self, content: impl Into<String>) -> Result<(), PlatformError> {
        self.platform
            .create_message(self.channel(), Reply::text(content))
            .await
    }

    /// Best-effort direct message to the actor.
    pub async fn direct_message(&self, content: impl Into<String>) -> Result<(), PlatformError> {
        self.platform
            .create_direct_message(&self.actor().id, Reply::text(content))
            .await
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("actor", &self.actor().id)
            .field("channel", self.channel())
            .field("text", &self.is_text())
            .field("acknowledged", &self.acknowledged())
            .finish_non_exhaustive()
    }
}
