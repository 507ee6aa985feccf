//! Unified error handling for commandeer.
//!
//! One `thiserror` enum per concern, each with an `error_code()` label for
//! structured logging. Configuration faults fail fast at load time; dispatch
//! faults are contained per invocation and never cross invocation boundaries.

use thiserror::Error;

// ============================================================================
// Definition Errors (command/module construction)
// ============================================================================

/// Malformed command or module definitions. Raised at construction so a broken
/// definition can never reach dispatch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("command requires a name")]
    MissingName,

    #[error("missing command description for {module}:{name}")]
    MissingDescription { module: String, name: String },

    #[error("missing module for command {0}")]
    MissingModule(String),

    #[error("command {module}:{name} has no structured surface to publish")]
    NoPublishableSurface { module: String, name: String },

    #[error("argument {argument} of {command} duplicates a declared name")]
    DuplicateArgument { command: String, argument: String },

    #[error("command {command} claims module {claimed} but was supplied to {module}")]
    ModuleMismatch {
        module: String,
        claimed: String,
        command: String,
    },
}

impl DefinitionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingName => "missing_name",
            Self::MissingDescription { .. } => "missing_description",
            Self::MissingModule(_) => "missing_module",
            Self::NoPublishableSurface { .. } => "no_publishable_surface",
            Self::DuplicateArgument { .. } => "duplicate_argument",
            Self::ModuleMismatch { .. } => "module_mismatch",
        }
    }
}

// ============================================================================
// Registry Errors (catalog lifecycle)
// ============================================================================

/// Errors from module registration, unload, reload, and publication.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module {0} is disabled")]
    ModuleDisabled(String),

    #[error("module {0} is already registered")]
    ModuleAlreadyRegistered(String),

    #[error("module {0} is not registered")]
    ModuleNotRegistered(String),

    #[error("no module resolver installed; cannot resolve {0}")]
    NoResolver(String),

    #[error("module resolver failed for {id}: {reason}")]
    ResolveFailed { id: String, reason: String },

    #[error("command name {name} collides with an existing command")]
    CommandCollision { name: String },

    #[error("alias {alias} of {command} collides with an existing entry")]
    AliasCollision { command: String, alias: String },

    #[error("command {0} is not registered")]
    CommandNotRegistered(String),

    #[error("command {0} is guarded and cannot be disabled")]
    CommandGuarded(String),

    #[error("module {0} is guarded and cannot be disabled")]
    ModuleGuarded(String),

    #[error("invalid definition: {0}")]
    Definition(#[from] DefinitionError),

    #[error("{hook} hook failed for module {module}: {source}")]
    Hook {
        module: String,
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("global publication failed: {0}")]
    Publication(#[from] PlatformError),
}

impl RegistryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ModuleDisabled(_) => "module_disabled",
            Self::ModuleAlreadyRegistered(_) => "module_already_registered",
            Self::ModuleNotRegistered(_) => "module_not_registered",
            Self::NoResolver(_) => "no_resolver",
            Self::ResolveFailed { .. } => "resolve_failed",
            Self::CommandCollision { .. } => "command_collision",
            Self::AliasCollision { .. } => "alias_collision",
            Self::CommandNotRegistered(_) => "command_not_registered",
            Self::CommandGuarded(_) => "command_guarded",
            Self::ModuleGuarded(_) => "module_guarded",
            Self::Definition(_) => "definition",
            Self::Hook { .. } => "hook_failed",
            Self::Publication(_) => "publication",
        }
    }
}

// ============================================================================
// Argument Errors (resolver)
// ============================================================================

/// Argument-resolution failures. Absence of an optional argument is never an
/// error; this type only signals conditions tests must distinguish from absence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// Attachment retrieval through a text cause is explicitly unsupported.
    #[error("attachment arguments are not supported for text invocations")]
    TextAttachmentsUnsupported,
}

impl ArgumentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TextAttachmentsUnsupported => "text_attachments_unsupported",
        }
    }
}

// ============================================================================
// Platform Errors (transport boundary)
// ============================================================================

/// Failures reported by the host's transport implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("platform request failed: {0}")]
    Request(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

impl PlatformError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "request_failed",
            Self::NotFound(_) => "not_found",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

// ============================================================================
// Dispatch Faults (observable errors from the pipeline)
// ============================================================================

/// A contained fault from one invocation pipeline. Emitted on the dispatcher's
/// error channel; cloneable so multiple observers can receive it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("acknowledgement failed for {command}: {detail}")]
    Acknowledge { command: String, detail: String },

    #[error("permission evaluation faulted for {command}: {detail}")]
    PermissionEvaluation { command: String, detail: String },

    #[error("command {command} failed: {detail}")]
    Execution { command: String, detail: String },

    #[error("command {command} exceeded its {timeout_ms}ms deadline")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("gating chain faulted for {command}: {detail}")]
    Gating { command: String, detail: String },
}

impl DispatchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Acknowledge { .. } => "acknowledge_failed",
            Self::PermissionEvaluation { .. } => "permission_evaluation",
            Self::Execution { .. } => "execution",
            Self::Timeout { .. } => "timeout",
            Self::Gating { .. } => "gating",
        }
    }
}
