//! Module-declared gateway event handlers.
//!
//! Modules can subscribe to raw gateway traffic beyond command invocations.
//! The framework does not own the gateway connection, so it never attaches
//! listeners itself: the registry collects each registered module's
//! declarations into [`EventBinding`]s and hands the active list to the host,
//! which wires them to its connection and honors the `once` flag.

use crate::platform::{GatewayEvent, Platform};
use async_trait::async_trait;
use std::sync::Arc;

/// A module-authored gateway event handler.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(
        &self,
        platform: Arc<dyn Platform>,
        event: &GatewayEvent,
    ) -> anyhow::Result<()>;
}

/// An event subscription as declared inside a module definition.
pub struct EventDeclaration {
    /// Host-facing label for the subscription.
    pub label: String,
    /// Detach after the first delivery.
    pub once: bool,
    pub handler: Arc<dyn EventHandler>,
}

impl EventDeclaration {
    pub fn new(label: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            label: label.into(),
            once: false,
            handler,
        }
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

impl std::fmt::Debug for EventDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDeclaration")
            .field("label", &self.label)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

/// A declaration bound to its owning module, as returned to the host. Bindings
/// disappear from the active list when their module unloads, so hosts should
/// re-query after lifecycle changes.
#[derive(Clone)]
pub struct EventBinding {
    pub module: String,
    pub label: String,
    pub once: bool,
    pub handler: Arc<dyn EventHandler>,
}

impl EventBinding {
    pub(crate) fn bind(module: &str, declaration: &EventDeclaration) -> Self {
        Self {
            module: module.to_string(),
            label: declaration.label.clone(),
            once: declaration.once,
            handler: Arc::clone(&declaration.handler),
        }
    }
}

impl std::fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBinding")
            .field("module", &self.module)
            .field("label", &self.label)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}
