//! commandeer - a command-dispatch framework for chat platforms.
//!
//! The host owns the gateway connection and the REST transport; this crate
//! owns everything between an inbound event and a command's business logic:
//!
//! - [`registry::Registry`] - the module catalog, invocation index, operator
//!   enable/disable intent, catalog fingerprinting, and bulk publication.
//! - [`dispatcher::Dispatcher`] - the per-event gate chain: state gates,
//!   cooldowns, permission masks, module/command preliminary checks, deadline
//!   enforcement, and outcome handling.
//! - [`command::Command`] / [`module::Module`] - validated entities pairing
//!   declarative metadata with author-supplied behavior traits.
//! - [`resolver::ArgumentResolver`] - typed argument access over both
//!   pre-parsed interaction options and tokenized text.
//! - [`context::CommandContext`] - the per-invocation handle commands reply
//!   through.
//!
//! The platform seam is [`platform::Platform`]; implement it over your
//! transport and hand the framework an `Arc<dyn Platform>`.

pub mod command;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod messages;
pub mod module;
pub mod permissions;
pub mod platform;
pub mod registry;
pub mod resolver;
pub mod telemetry;

pub use command::{
    ArgumentKind, ArgumentSpec, Command, CommandDefinition, CommandOutcome, CommandPermissions,
    Preliminary, Runner, Surfaces,
};
pub use config::{ConfigError, FrameworkConfig};
pub use context::{Cause, CommandContext};
pub use dispatcher::Dispatcher;
pub use error::{
    ArgumentError, DefinitionError, DispatchError, PlatformError, RegistryError,
};
pub use event::{EventBinding, EventDeclaration, EventHandler};
pub use module::{Module, ModuleDefinition, ModuleHooks, ModuleResolver, NoHooks};
pub use permissions::Permissions;
pub use platform::{GatewayEvent, Platform};
pub use registry::{PublishReport, Registry, RegistryNotice};
pub use resolver::ArgumentResolver;
