//! The dispatch pipeline.
//!
//! One inbound gateway event enters, runs a fixed gate chain, and either dies
//! silently at a gate, answers with a templated rejection, or reaches the
//! command's runner. Every fault is contained to its own invocation: the
//! pipeline never propagates errors to the caller, it emits them on the
//! dispatcher's error channel and falls back to a templated reply.
//!
//! Gate order: dispatcher enabled, event shape, name lookup, module state,
//! command state, community requirement, rollout, surface, acknowledgement,
//! cooldown, module preliminary, command preliminary, permissions. Only then
//! is reply visibility reset to the configured default, the cooldown
//! committed, and the runner executed.

use crate::command::{Command, CommandOutcome};
use crate::config::FrameworkConfig;
use crate::context::{Cause, CommandContext};
use crate::error::DispatchError;
use crate::messages;
use crate::permissions::{Permissions, describe_missing};
use crate::platform::{
    GatewayEvent, Interaction, InteractionKind, InvocationSurface, Platform, TextMessage, UserId,
};
use crate::registry::Registry;
use crate::resolver::ArgumentResolver;
use crate::telemetry::{DispatchTimer, spans};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};
use tracing::{Instrument, debug, error, warn};

const ERROR_CHANNEL_CAPACITY: usize = 64;

/// Routes gateway events through the gate chain to command runners.
pub struct Dispatcher {
    platform: Arc<dyn Platform>,
    registry: Arc<Registry>,
    prefix: String,
    enabled: AtomicBool,
    default_ephemeral: bool,
    intake_capacity: usize,
    errors: broadcast::Sender<DispatchError>,
}

impl Dispatcher {
    pub fn new(
        platform: Arc<dyn Platform>,
        registry: Arc<Registry>,
        config: &FrameworkConfig,
    ) -> Self {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            platform,
            registry,
            prefix: config.prefix.0.clone(),
            enabled: AtomicBool::new(config.dispatcher.enabled),
            default_ephemeral: config.dispatcher.default_ephemeral,
            intake_capacity: config.intake.channel_size,
            errors,
        }
    }

    /// Master switch. Events arriving while disabled are dropped silently.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Subscribe to contained per-invocation faults.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<DispatchError> {
        self.errors.subscribe()
    }

    /// Spawn the intake loop and hand back its bounded sender. The host feeds
    /// gateway events in; backpressure applies when the channel fills.
    pub fn spawn_intake(self: &Arc<Self>) -> mpsc::Sender<GatewayEvent> {
        let (tx, mut rx) = mpsc::channel(self.intake_capacity);
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            // One independent pipeline per event; invocations never block
            // each other.
            while let Some(event) = rx.recv().await {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { dispatcher.dispatch(event).await });
            }
            debug!("intake channel closed");
        });
        tx
    }

    /// Run one event through the pipeline. Never fails; faults are contained.
    pub async fn dispatch(&self, event: GatewayEvent) {
        if !self.is_enabled() {
            return;
        }
        match event {
            GatewayEvent::InteractionCreate(interaction) => {
                self.dispatch_interaction(interaction).await;
            }
            GatewayEvent::MessageCreate(message) => {
                self.dispatch_text(message).await;
            }
        }
    }

    async fn dispatch_interaction(&self, interaction: Interaction) {
        if interaction.kind != InteractionKind::ApplicationCommand || interaction.user.bot {
            return;
        }
        let Some(command) = self.registry.command(&interaction.name) else {
            debug!(name = %interaction.name, "unknown interaction command");
            return;
        };
        if !surface_accepts(&command, interaction.surface) {
            return;
        }
        let span = spans::invocation(
            command.name(),
            &interaction.user.id,
            interaction.community.as_deref(),
        );
        let args = ArgumentResolver::structured(
            interaction.options.clone(),
            Arc::clone(&self.platform),
            interaction.community.clone(),
        );
        let ctx = CommandContext::new(
            Arc::clone(&self.platform),
            Cause::Interaction(interaction),
            args,
            self.default_ephemeral,
        );
        self.run_pipeline(command, ctx).instrument(span).await;
    }

    async fn dispatch_text(&self, message: TextMessage) {
        if message.author.bot || message.author.id == self.platform.agent_id() {
            return;
        }
        let Some((name, tokens)) = parse_invocation(&self.prefix, &message.content) else {
            return;
        };
        let Some(command) = self.registry.command(&name) else {
            debug!(name = %name, "unknown text command");
            return;
        };
        if !command.surfaces().text {
            return;
        }
        let span = spans::invocation(command.name(), &message.author.id, message.community.as_deref());
        let args = ArgumentResolver::text(
            command.arguments(),
            &tokens,
            Arc::clone(&self.platform),
            message.community.clone(),
        );
        let ctx = CommandContext::new(
            Arc::clone(&self.platform),
            Cause::Message(message),
            args,
            self.default_ephemeral,
        );
        self.run_pipeline(command, ctx).instrument(span).await;
    }

    /// The shared gate chain after command resolution.
    async fn run_pipeline(&self, command: Arc<Command>, ctx: CommandContext) {
        let _timer = DispatchTimer::new(command.name());

        // Registry state gates. All silent.
        if !self.registry.module_enabled(command.module()) || !command.is_enabled() {
            return;
        }
        if command.guild_only() && ctx.community().is_none() {
            return;
        }
        if !command.rollout().is_empty()
            && !ctx
                .community()
                .is_some_and(|community| command.rollout().contains(community))
        {
            return;
        }

        // Keep the platform's response window open before slow gates run.
        if command.defer()
            && !ctx.is_text()
            && let Err(err) = ctx.acknowledge().await
        {
            self.emit(DispatchError::Acknowledge {
                command: command.name().to_string(),
                detail: err.to_string(),
            });
            self.gate_reply(&command, &ctx, messages::PROCESS_ERROR).await;
            return;
        }

        // Cooldown read gate.
        let actor = ctx.actor().id.clone();
        if command.cooldown().is_some()
            && let Some(expires_at) = command.cooldowns().active(&actor)
        {
            let expires_unix = chrono::Utc::now().timestamp()
                + expires_at.saturating_duration_since(Instant::now()).as_secs() as i64;
            self.gate_reply(&command, &ctx, &messages::cooldown_message(expires_unix))
                .await;
            return;
        }

        // Module then command preliminary checks.
        if let Some(module) = self.registry.module(command.module()) {
            let check = module.hooks().preliminary(&ctx).await;
            if !check.pass {
                let msg = check
                    .message
                    .unwrap_or_else(|| messages::MODULE_PRELIM_FAIL.to_string());
                self.gate_reply(&command, &ctx, &msg).await;
                return;
            }
        }
        let check = command.runner().preliminary(&ctx).await;
        if !check.pass {
            let msg = check
                .message
                .unwrap_or_else(|| messages::COMMAND_PRELIM_FAIL.to_string());
            self.gate_reply(&command, &ctx, &msg).await;
            return;
        }

        if !self.permission_gate(&command, &ctx).await {
            return;
        }

        // Gating is over: drop any forced visibility and hand the latch to
        // the runner.
        ctx.reset_ephemeral();

        // Commit the cooldown before execution so a concurrent invocation
        // from the same actor hits the read gate. The window between the read
        // above and this commit is accepted as best-effort.
        let scheduled = command.cooldown().map(|cooldown| {
            let expiry = command.cooldowns().commit(&actor, cooldown);
            // Self-expiry sweep; only removes the window it scheduled.
            let command = Arc::clone(&command);
            let actor = actor.clone();
            tokio::spawn(async move {
                tokio::time::sleep(cooldown).await;
                command.cooldowns().clear_if_scheduled(&actor, expiry);
            });
            expiry
        });

        let outcome = self.execute(&command, &ctx).await;

        match outcome {
            CommandOutcome::Success | CommandOutcome::PartialError => {}
            // The runner explicitly waived the cooldown.
            CommandOutcome::SuccessNoCooldown => command.cooldowns().clear(&actor),
            CommandOutcome::Error => {
                if let Some(scheduled) = scheduled {
                    command.cooldowns().clear_if_scheduled(&actor, scheduled);
                }
            }
        }

        command.runner().postliminary(&ctx, outcome).await;
        if let Some(module) = self.registry.module(command.module()) {
            module.hooks().postliminary(&ctx, outcome).await;
        }
    }

    /// Run the command, enforcing its deadline. Faults become outcomes.
    async fn execute(&self, command: &Arc<Command>, ctx: &CommandContext) -> CommandOutcome {
        let run = command.runner().run(ctx);
        let result = match command.timeout() {
            Some(deadline) => match tokio::time::timeout(deadline, run).await {
                Ok(result) => result,
                Err(_) => {
                    self.emit(DispatchError::Timeout {
                        command: command.name().to_string(),
                        timeout_ms: command.timeout().map(|d| d.as_millis() as u64).unwrap_or(0),
                    });
                    return command.timeout_result();
                }
            },
            None => run.await,
        };
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(command = %command.name(), error = %err, "command execution failed");
                self.emit(DispatchError::Execution {
                    command: command.name().to_string(),
                    detail: err.to_string(),
                });
                self.gate_reply(command, ctx, messages::EXECUTION_ERROR).await;
                CommandOutcome::Error
            }
        }
    }

    /// Evaluate the command's declared permission masks against cached
    /// effective permissions. Only community causes are gated; a cache miss
    /// is a contained fault, not a pass.
    async fn permission_gate(&self, command: &Arc<Command>, ctx: &CommandContext) -> bool {
        let Some(community) = ctx.community() else {
            return true;
        };
        let required = command.permissions();
        let agent = self.platform.agent_id();
        let actor = ctx.actor().id.clone();
        let channel = ctx.channel().clone();

        let checks: [(Option<Permissions>, &UserId, bool, bool); 4] = [
            (required.agent_community, &agent, true, false),
            (required.agent_channel, &agent, true, true),
            (required.actor_community, &actor, false, false),
            (required.actor_channel, &actor, false, true),
        ];

        for (mask, subject, refer_self, channel_scope) in checks {
            let Some(mask) = mask else { continue };
            if mask.is_empty() {
                continue;
            }
            let held = if channel_scope {
                self.platform.permissions_in_channel(&channel, subject)
            } else {
                self.platform.permissions_in_community(community, subject)
            };
            let Some(held) = held else {
                self.emit(DispatchError::PermissionEvaluation {
                    command: command.name().to_string(),
                    detail: format!("no cached permissions for {subject}"),
                });
                self.gate_reply(command, ctx, messages::UNKNOWN_ERROR).await;
                return false;
            };
            // Administrator short-circuits individual bits.
            if held.has(Permissions::ADMINISTRATOR) || held.has(mask) {
                continue;
            }
            let missing = held.missing(mask);
            // The precise shortfall only goes to the log; the reply stays
            // generic so required masks are not enumerated in channel.
            debug!(
                command = %command.name(),
                subject = %subject,
                detail = %describe_missing(missing, refer_self),
                "permission gate rejected"
            );
            self.gate_reply(command, ctx, messages::GENERIC_PERMISSION_ERROR)
                .await;
            return false;
        }
        true
    }

    /// Answer a gate rejection. Always ephemeral on interaction surfaces;
    /// delivery failure is itself a contained fault.
    async fn gate_reply(&self, command: &Arc<Command>, ctx: &CommandContext, message: &str) {
        ctx.force_ephemeral(true);
        if let Err(err) = ctx.reply(message).await {
            self.emit(DispatchError::Gating {
                command: command.name().to_string(),
                detail: err.to_string(),
            });
        }
    }

    fn emit(&self, error: DispatchError) {
        warn!(error_code = error.error_code(), error = %error, "dispatch fault");
        let _ = self.errors.send(error);
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.prefix)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

/// Split a prefixed text message into a command name and its raw tokens.
fn parse_invocation(prefix: &str, content: &str) -> Option<(String, Vec<String>)> {
    let rest = content.strip_prefix(prefix)?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?.to_string();
    Some((name, tokens.map(str::to_string).collect()))
}

/// Whether the command answers on the interaction's structured surface.
fn surface_accepts(command: &Command, surface: InvocationSurface) -> bool {
    let surfaces = command.surfaces();
    match surface {
        InvocationSurface::ChatInput => surfaces.slash,
        InvocationSurface::MessageContext => surfaces.message_context,
        InvocationSurface::UserContext => surfaces.user_context,
    }
}
