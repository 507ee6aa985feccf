//! The Command entity.
//!
//! A command is declarative metadata (validated once, at load time) plus the
//! runtime cooldown map and an enabled/disabled state. Behavior is supplied by
//! a [`Runner`] trait object so third-party authors implement one trait and
//! hand the framework a definition.

mod arguments;
mod cooldown;

pub use arguments::{
    ArgumentConstraints, ArgumentKind, ArgumentSpec, ChannelKindFilter, Choice,
};
pub use cooldown::CooldownMap;

use crate::context::CommandContext;
use crate::error::DefinitionError;
use crate::permissions::Permissions;
use crate::platform::{CommandPayload, CommunityId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default bound on tracked cooldown actors per command.
const DEFAULT_COOLDOWN_CAPACITY: usize = 1000;

/// Result of running a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandOutcome {
    /// Ran successfully; the committed cooldown window stands.
    #[default]
    Success,
    /// Ran successfully; the just-committed cooldown window is cleared.
    SuccessNoCooldown,
    /// A non-fatal error occurred.
    PartialError,
    /// A command-fatal error occurred.
    Error,
}

/// Which invocation surfaces a command answers on. Defaults to slash only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surfaces {
    pub text: bool,
    pub slash: bool,
    pub message_context: bool,
    pub user_context: bool,
}

impl Default for Surfaces {
    fn default() -> Self {
        Self {
            text: false,
            slash: true,
            message_context: false,
            user_context: false,
        }
    }
}

impl Surfaces {
    /// Whether any structured (publishable) surface is enabled.
    pub fn structured(&self) -> bool {
        self.slash || self.message_context || self.user_context
    }
}

/// The four independent permission requirement masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandPermissions {
    /// Required of the agent in the community.
    pub agent_community: Option<Permissions>,
    /// Required of the agent in the channel.
    pub agent_channel: Option<Permissions>,
    /// Required of the actor in the community.
    pub actor_community: Option<Permissions>,
    /// Required of the actor in the channel.
    pub actor_channel: Option<Permissions>,
}

/// Result of a preliminary (module- or command-level) check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preliminary {
    pub pass: bool,
    pub message: Option<String>,
}

impl Preliminary {
    pub fn pass() -> Self {
        Self {
            pass: true,
            message: None,
        }
    }

    pub fn block(message: impl Into<Option<String>>) -> Self {
        Self {
            pass: false,
            message: message.into(),
        }
    }
}

/// Command behavior, implemented by command authors.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Pre-execution check at the command level. Default passes.
    async fn preliminary(&self, _ctx: &CommandContext) -> Preliminary {
        Preliminary::pass()
    }

    /// Execute the command.
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<CommandOutcome>;

    /// Post-execution hook; receives the outcome `run` produced.
    async fn postliminary(&self, _ctx: &CommandContext, _outcome: CommandOutcome) {}
}

/// Declarative command metadata. Construct one, pair it with a [`Runner`], and
/// validate via [`Command::new`].
#[derive(Debug, Clone, Default)]
pub struct CommandDefinition {
    pub name: String,
    /// Name used on the structured surface; defaults to `name`.
    pub slash_name: Option<String>,
    /// Extra text-invocation names.
    pub aliases: Vec<String>,
    pub description: String,
    pub name_localizations: BTreeMap<String, String>,
    pub description_localizations: BTreeMap<String, String>,
    /// Owning module id.
    pub module: String,
    /// Blocks disable-by-community-owner.
    pub guarded: bool,
    pub nsfw: bool,
    /// Requires a community context; direct-message causes are dropped.
    pub guild_only: bool,
    pub cooldown: Option<Duration>,
    /// Execution deadline; on expiry `timeout_result` is the outcome.
    pub timeout: Option<Duration>,
    pub timeout_result: Option<CommandOutcome>,
    /// Acknowledge the interaction before gating continues.
    pub defer: bool,
    /// Staged-availability allowlist of community ids.
    pub rollout: HashSet<CommunityId>,
    pub arguments: Vec<ArgumentSpec>,
    pub permissions: CommandPermissions,
    pub surfaces: Surfaces,
}

/// A validated, registered-or-registerable command.
pub struct Command {
    definition: CommandDefinition,
    cooldowns: CooldownMap,
    enabled: AtomicBool,
    runner: Box<dyn Runner>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.definition.name)
            .field("module", &self.definition.module)
            .field("enabled", &self.enabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Validate a definition and pair it with its runner.
    ///
    /// Fails fast on the load-time invariants: a name is mandatory, a command
    /// on the slash or text surface needs a description, and every command
    /// must declare its owning module.
    pub fn new(definition: CommandDefinition, runner: Box<dyn Runner>) -> Result<Self, DefinitionError> {
        Self::with_cooldown_capacity(definition, runner, DEFAULT_COOLDOWN_CAPACITY)
    }

    /// As [`Command::new`] with an explicit cooldown-map bound.
    pub fn with_cooldown_capacity(
        definition: CommandDefinition,
        runner: Box<dyn Runner>,
        capacity: usize,
    ) -> Result<Self, DefinitionError> {
        if definition.name.is_empty() {
            return Err(DefinitionError::MissingName);
        }
        if definition.description.is_empty()
            && (definition.surfaces.slash || definition.surfaces.text)
        {
            return Err(DefinitionError::MissingDescription {
                module: definition.module.clone(),
                name: definition.name.clone(),
            });
        }
        if definition.module.is_empty() {
            return Err(DefinitionError::MissingModule(definition.name.clone()));
        }
        let mut seen = HashSet::new();
        for arg in &definition.arguments {
            if !seen.insert(arg.name.as_str()) {
                return Err(DefinitionError::DuplicateArgument {
                    command: definition.name.clone(),
                    argument: arg.name.clone(),
                });
            }
        }
        if !definition.arguments.is_empty() && !definition.surfaces.structured()
            && !definition.surfaces.text
        {
            tracing::warn!(
                command = %definition.name,
                "command declares arguments but no surface that accepts them"
            );
        }
        let cooldowns = CooldownMap::new(
            capacity,
            definition.cooldown.unwrap_or(Duration::from_secs(0)),
        );
        Ok(Self {
            definition,
            cooldowns,
            enabled: AtomicBool::new(true),
            runner,
        })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Structured-surface name, falling back to the primary name.
    pub fn slash_name(&self) -> &str {
        self.definition
            .slash_name
            .as_deref()
            .unwrap_or(&self.definition.name)
    }

    pub fn aliases(&self) -> &[String] {
        &self.definition.aliases
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    pub fn module(&self) -> &str {
        &self.definition.module
    }

    pub fn guarded(&self) -> bool {
        self.definition.guarded
    }

    pub fn guild_only(&self) -> bool {
        self.definition.guild_only
    }

    pub fn defer(&self) -> bool {
        self.definition.defer
    }

    pub fn cooldown(&self) -> Option<Duration> {
        self.definition.cooldown
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.definition.timeout
    }

    pub fn timeout_result(&self) -> CommandOutcome {
        self.definition.timeout_result.unwrap_or(CommandOutcome::Error)
    }

    pub fn rollout(&self) -> &HashSet<CommunityId> {
        &self.definition.rollout
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.definition.arguments
    }

    pub fn permissions(&self) -> &CommandPermissions {
        &self.definition.permissions
    }

    pub fn surfaces(&self) -> Surfaces {
        self.definition.surfaces
    }

    pub fn cooldowns(&self) -> &CooldownMap {
        &self.cooldowns
    }

    /// Explicit Registered-Enabled / Registered-Disabled state.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn runner(&self) -> &dyn Runner {
        self.runner.as_ref()
    }

    /// Deterministic content string for the catalog fingerprint. Covers every
    /// field whose change requires a redeploy.
    pub(crate) fn fingerprint_input(&self) -> String {
        let d = &self.definition;
        let args = serde_json::to_string(&d.arguments).unwrap_or_default();
        let name_loc = serde_json::to_string(&d.name_localizations).unwrap_or_default();
        let desc_loc = serde_json::to_string(&d.description_localizations).unwrap_or_default();
        format!(
            "{}\x1f{}\x1f{}\x1f{}\x1f{}\x1f{}",
            self.slash_name(),
            args,
            d.description,
            d.permissions
                .actor_community
                .map(|p| p.0.to_string())
                .unwrap_or_else(|| "-".to_string()),
            name_loc,
            desc_loc,
        )
    }

    /// Platform command type code: user context wins over message context,
    /// which wins over chat input.
    fn payload_kind(&self) -> Result<u8, DefinitionError> {
        let s = self.definition.surfaces;
        if s.user_context {
            Ok(2)
        } else if s.message_context {
            Ok(3)
        } else if s.slash {
            Ok(1)
        } else {
            Err(DefinitionError::NoPublishableSurface {
                module: self.definition.module.clone(),
                name: self.definition.name.clone(),
            })
        }
    }

    /// Convert to the platform's bulk-publication payload.
    pub fn to_publication(&self) -> Result<CommandPayload, DefinitionError> {
        let kind = self.payload_kind()?;
        let d = &self.definition;
        Ok(CommandPayload {
            name: self.slash_name().to_string(),
            description: d.description.clone(),
            kind,
            nsfw: d.nsfw,
            dm_permission: !d.guild_only,
            default_member_permissions: d
                .permissions
                .actor_community
                .map(|p| p.0.to_string()),
            name_localizations: d.name_localizations.clone(),
            description_localizations: d.description_localizations.clone(),
            options: if kind == 1 {
                d.arguments.iter().map(ArgumentSpec::to_payload).collect()
            } else {
                Vec::new()
            },
        })
    }
}
