//! The Module entity.
//!
//! A module is a named bundle of commands with optional lifecycle and gating
//! hooks. Modules are the unit of registration, unload, reload, and
//! enable/disable; commands only exist inside one.

use crate::command::{Command, CommandOutcome, Preliminary};
use crate::context::CommandContext;
use crate::error::DefinitionError;
use crate::event::EventDeclaration;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Module-level lifecycle and gating hooks. Every method has a passing or
/// no-op default so simple modules implement nothing.
#[async_trait]
pub trait ModuleHooks: Send + Sync {
    /// Runs first during registration, before anything is indexed.
    async fn on_register(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs during registration, after `on_register`.
    async fn on_load(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs at the start of a reload, before the old module's `on_unload`.
    async fn on_reload(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs during unload, after the module's commands leave the indices.
    async fn on_unload(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Pre-execution check applied to every command in the module.
    async fn preliminary(&self, _ctx: &CommandContext) -> Preliminary {
        Preliminary::pass()
    }

    /// Post-execution hook applied to every command in the module.
    async fn postliminary(&self, _ctx: &CommandContext, _outcome: CommandOutcome) {}
}

/// Hook set for modules that need none.
pub struct NoHooks;

#[async_trait]
impl ModuleHooks for NoHooks {}

/// A module as supplied by its author or a [`ModuleResolver`].
pub struct ModuleDefinition {
    pub id: String,
    pub description: String,
    /// Blocks operator disable.
    pub guarded: bool,
    pub version: Option<String>,
    pub commands: Vec<Command>,
    pub events: Vec<EventDeclaration>,
    pub hooks: Box<dyn ModuleHooks>,
}

impl ModuleDefinition {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            guarded: false,
            version: None,
            commands: Vec::new(),
            events: Vec::new(),
            hooks: Box::new(NoHooks),
        }
    }

    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn with_event(mut self, event: EventDeclaration) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_hooks(mut self, hooks: Box<dyn ModuleHooks>) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Produces a fresh [`ModuleDefinition`] for an id, so the registry can
/// re-materialize a module during reload without the host keeping builders
/// around.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    async fn resolve(&self, id: &str) -> anyhow::Result<ModuleDefinition>;
}

/// A validated, registered-or-registerable module.
pub struct Module {
    id: String,
    description: String,
    guarded: bool,
    version: Option<String>,
    commands: Vec<Arc<Command>>,
    events: Vec<EventDeclaration>,
    hooks: Box<dyn ModuleHooks>,
    enabled: AtomicBool,
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("commands", &self.commands.len())
            .field("enabled", &self.enabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Module {
    /// Validate a definition: the id is mandatory and every supplied command
    /// must claim this module as its owner.
    pub fn new(definition: ModuleDefinition) -> Result<Self, DefinitionError> {
        if definition.id.is_empty() {
            return Err(DefinitionError::MissingName);
        }
        for command in &definition.commands {
            if command.module() != definition.id {
                return Err(DefinitionError::ModuleMismatch {
                    module: definition.id.clone(),
                    claimed: command.module().to_string(),
                    command: command.name().to_string(),
                });
            }
        }
        Ok(Self {
            id: definition.id,
            description: definition.description,
            guarded: definition.guarded,
            version: definition.version,
            commands: definition.commands.into_iter().map(Arc::new).collect(),
            events: definition.events,
            hooks: definition.hooks,
            enabled: AtomicBool::new(true),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn guarded(&self) -> bool {
        self.guarded
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    pub fn events(&self) -> &[EventDeclaration] {
        &self.events
    }

    pub fn hooks(&self) -> &dyn ModuleHooks {
        self.hooks.as_ref()
    }

    /// Explicit Registered-Enabled / Registered-Disabled state.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}
