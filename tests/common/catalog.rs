//! Command, module, and event fixtures.

use async_trait::async_trait;
use commandeer::command::{
    Command, CommandDefinition, CommandOutcome, Preliminary, Runner, Surfaces,
};
use commandeer::context::CommandContext;
use commandeer::module::{ModuleDefinition, ModuleHooks, ModuleResolver};
use commandeer::platform::{
    GatewayEvent, Interaction, InteractionKind, InvocationSurface, OptionValue, TextMessage, User,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Runners
// ============================================================================

/// Replies with a fixed string, optionally after a delay, and returns a fixed
/// outcome.
pub struct ReplyRunner {
    pub reply: String,
    pub outcome: CommandOutcome,
    pub delay: Option<Duration>,
}

#[allow(dead_code)]
impl ReplyRunner {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            outcome: CommandOutcome::Success,
            delay: None,
        }
    }

    pub fn outcome(mut self, outcome: CommandOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Runner for ReplyRunner {
    async fn run(&self, ctx: &CommandContext) -> anyhow::Result<CommandOutcome> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        ctx.reply(self.reply.clone()).await?;
        Ok(self.outcome)
    }
}

/// Always fails execution.
pub struct FailRunner;

#[async_trait]
impl Runner for FailRunner {
    async fn run(&self, _ctx: &CommandContext) -> anyhow::Result<CommandOutcome> {
        anyhow::bail!("deliberate failure")
    }
}

/// Blocks at its own preliminary check.
#[allow(dead_code)]
pub struct SelfBlockingRunner {
    pub message: Option<String>,
}

#[async_trait]
impl Runner for SelfBlockingRunner {
    async fn preliminary(&self, _ctx: &CommandContext) -> Preliminary {
        Preliminary::block(self.message.clone())
    }

    async fn run(&self, _ctx: &CommandContext) -> anyhow::Result<CommandOutcome> {
        anyhow::bail!("must not execute")
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// Records lifecycle hook invocations into a shared journal.
#[derive(Clone)]
pub struct JournalingHooks {
    pub label: String,
    pub journal: Arc<Mutex<Vec<String>>>,
    pub fail_on_load: bool,
}

#[allow(dead_code)]
impl JournalingHooks {
    pub fn new(label: impl Into<String>, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label: label.into(),
            journal,
            fail_on_load: false,
        }
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_on_load = true;
        self
    }
}

#[async_trait]
impl ModuleHooks for JournalingHooks {
    async fn on_load(&self) -> anyhow::Result<()> {
        self.journal.lock().push(format!("{}:on_load", self.label));
        if self.fail_on_load {
            anyhow::bail!("load refused")
        }
        Ok(())
    }

    async fn on_unload(&self) -> anyhow::Result<()> {
        self.journal.lock().push(format!("{}:on_unload", self.label));
        Ok(())
    }
}

/// Serves pre-built definitions in order; errors when exhausted.
#[derive(Default)]
pub struct QueueResolver {
    queue: Mutex<VecDeque<ModuleDefinition>>,
}

#[allow(dead_code)]
impl QueueResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, definition: ModuleDefinition) {
        self.queue.lock().push_back(definition);
    }
}

#[async_trait]
impl ModuleResolver for QueueResolver {
    async fn resolve(&self, id: &str) -> anyhow::Result<ModuleDefinition> {
        self.queue
            .lock()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no definition queued for {id}"))
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// Base definition: slash and text surfaces, owned by `module`.
#[allow(dead_code)]
pub fn definition(module: &str, name: &str) -> CommandDefinition {
    CommandDefinition {
        name: name.to_string(),
        description: format!("the {name} command"),
        module: module.to_string(),
        surfaces: Surfaces {
            text: true,
            ..Surfaces::default()
        },
        ..Default::default()
    }
}

/// A ping command answering "Pong!" on slash and text surfaces.
#[allow(dead_code)]
pub fn ping_command(module: &str) -> Command {
    Command::new(definition(module, "ping"), Box::new(ReplyRunner::new("Pong!"))).unwrap()
}

/// A utility module holding only `ping`.
#[allow(dead_code)]
pub fn ping_module() -> ModuleDefinition {
    ModuleDefinition::new("util", "utility commands").with_command(ping_command("util"))
}

// ============================================================================
// Events
// ============================================================================

#[allow(dead_code)]
pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: format!("user-{id}"),
        global_name: None,
        bot: false,
    }
}

#[allow(dead_code)]
pub fn bot_user(id: &str) -> User {
    User {
        bot: true,
        ..user(id)
    }
}

/// A chat-input interaction with no options.
#[allow(dead_code)]
pub fn interaction(name: &str, actor: User, community: Option<&str>) -> GatewayEvent {
    interaction_with(name, actor, community, Vec::new())
}

#[allow(dead_code)]
pub fn interaction_with(
    name: &str,
    actor: User,
    community: Option<&str>,
    options: Vec<OptionValue>,
) -> GatewayEvent {
    GatewayEvent::InteractionCreate(Interaction {
        id: format!("ix-{name}"),
        kind: InteractionKind::ApplicationCommand,
        surface: InvocationSurface::ChatInput,
        name: name.to_string(),
        options,
        user: actor,
        member: None,
        community: community.map(str::to_string),
        channel: "chan-1".to_string(),
    })
}

/// A prefixed text message in `chan-1`.
#[allow(dead_code)]
pub fn text(content: &str, actor: User, community: Option<&str>) -> GatewayEvent {
    GatewayEvent::MessageCreate(TextMessage {
        id: "msg-1".to_string(),
        content: content.to_string(),
        author: actor,
        member: None,
        community: community.map(str::to_string),
        channel: "chan-1".to_string(),
    })
}
