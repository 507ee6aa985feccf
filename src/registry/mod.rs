//! The module catalog.
//!
//! The registry owns every registered module, the flat invocation index the
//! dispatcher resolves names through, and the operator's enable/disable
//! intent. Lifecycle operations (register, unload, reload, publish) serialize
//! on one async lock; reads are lock-free concurrent-map lookups so dispatch
//! never waits on a reload in progress.
//!
//! Registration is atomic: every collision is checked before the first index
//! mutation, so a rejected module leaves no trace.

mod fingerprint;
mod publish;

pub use fingerprint::catalog_fingerprint;
pub use publish::PublishReport;

use crate::command::Command;
use crate::config::FrameworkConfig;
use crate::error::RegistryError;
use crate::event::EventBinding;
use crate::module::{Module, ModuleDefinition, ModuleResolver};
use crate::platform::{CommunityId, Platform};
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{info, warn};

/// Lifecycle notifications, broadcast to any number of observers.
#[derive(Debug, Clone)]
pub enum RegistryNotice {
    ModuleRegistered { module: String, commands: usize },
    CommandLoaded { module: String, command: String },
    EventRegistered { module: String, label: String },
    ModuleUnloaded { module: String },
    ModuleReloaded { module: String },
    ModuleEnabled { module: String },
    ModuleDisabled { module: String },
    CommandEnabled { command: String },
    CommandDisabled { command: String },
    PublicationFailed { community: CommunityId, code: &'static str },
}

const NOTICE_CAPACITY: usize = 64;

/// The module catalog and invocation index.
pub struct Registry {
    platform: Arc<dyn Platform>,
    modules: DashMap<String, Arc<Module>>,
    /// Every invocable name (primary, structured, alias) to its command.
    index: DashMap<String, Arc<Command>>,
    /// Operator intent; survives unload and re-applies on registration.
    disabled_modules: DashSet<String>,
    disabled_commands: DashSet<String>,
    resolver: RwLock<Option<Arc<dyn ModuleResolver>>>,
    /// Serializes all lifecycle mutation.
    lifecycle: Mutex<()>,
    notices: broadcast::Sender<RegistryNotice>,
    default_cooldown_capacity: usize,
}

impl Registry {
    pub fn new(platform: Arc<dyn Platform>, config: &FrameworkConfig) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            platform,
            modules: DashMap::new(),
            index: DashMap::new(),
            disabled_modules: DashSet::new(),
            disabled_commands: DashSet::new(),
            resolver: RwLock::new(None),
            lifecycle: Mutex::new(()),
            notices,
            default_cooldown_capacity: config.cooldowns.capacity,
        }
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryNotice> {
        self.notices.subscribe()
    }

    /// Install the resolver used by [`Registry::register_id`] and
    /// [`Registry::reload`].
    pub fn set_resolver(&self, resolver: Arc<dyn ModuleResolver>) {
        *self.resolver.write() = Some(resolver);
    }

    /// Configured cooldown-map bound, for hosts constructing commands via
    /// [`Command::with_cooldown_capacity`].
    pub fn default_cooldown_capacity(&self) -> usize {
        self.default_cooldown_capacity
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Resolve any invocable name (primary, structured, or alias).
    pub fn command(&self, name: &str) -> Option<Arc<Command>> {
        self.index.get(name).map(|e| Arc::clone(e.value()))
    }

    pub fn module(&self, id: &str) -> Option<Arc<Module>> {
        self.modules.get(id).map(|e| Arc::clone(e.value()))
    }

    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.modules.iter().map(|e| Arc::clone(e.value())).collect()
    }

    /// Every registered command, one entry per command regardless of aliases.
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.modules
            .iter()
            .flat_map(|e| e.value().commands().to_vec())
            .collect()
    }

    /// Gateway subscriptions declared by currently enabled modules. Hosts
    /// should re-query after any lifecycle change.
    pub fn event_bindings(&self) -> Vec<EventBinding> {
        self.modules
            .iter()
            .filter(|e| e.value().is_enabled())
            .flat_map(|e| {
                let module = e.value();
                module
                    .events()
                    .iter()
                    .map(|decl| EventBinding::bind(module.id(), decl))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Register a module.
    ///
    /// Validation, the operator-disable check, every name-collision check, and
    /// the `on_register`/`on_load` hooks all run before the first index
    /// mutation; any failure leaves the registry untouched. Returns the
    /// module's gateway subscriptions for the host to wire.
    pub async fn register(
        &self,
        definition: ModuleDefinition,
    ) -> Result<Vec<EventBinding>, RegistryError> {
        let _guard = self.lifecycle.lock().await;
        self.register_locked(definition).await
    }

    /// Resolve a module id through the installed resolver and register it.
    pub async fn register_id(&self, id: &str) -> Result<Vec<EventBinding>, RegistryError> {
        let _guard = self.lifecycle.lock().await;
        let definition = self.resolve(id).await?;
        self.register_locked(definition).await
    }

    /// Unload a module, removing every one of its names from the invocation
    /// index. Operator disable-intent for the module is kept. The `on_unload`
    /// hook runs after removal; its failure is reported but the module stays
    /// unloaded.
    pub async fn unload(&self, id: &str) -> Result<(), RegistryError> {
        let _guard = self.lifecycle.lock().await;
        self.unload_locked(id).await
    }

    /// Re-materialize a registered module through the resolver and swap it in.
    ///
    /// The fresh definition is resolved and validated before anything is torn
    /// down, so a failed resolve or a name collision leaves the old module
    /// running. Hook order: old `on_reload`, old `on_unload`, then the fresh
    /// module's `on_register` and `on_load`; if a fresh hook fails the old
    /// module is restored. `on_reload` preceding `on_unload` is part of the
    /// hook contract: it is the outgoing module's only reload signal.
    /// Returns the fresh module's gateway subscriptions.
    pub async fn reload(&self, id: &str) -> Result<Vec<EventBinding>, RegistryError> {
        let _guard = self.lifecycle.lock().await;

        let old = self
            .modules
            .get(id)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| RegistryError::ModuleNotRegistered(id.to_string()))?;
        let definition = self.resolve(id).await?;
        let fresh = Module::new(definition)?;

        // Collisions checked against the index minus the outgoing module.
        let old_keys: Vec<String> = old
            .commands()
            .iter()
            .flat_map(|c| invocation_keys(c))
            .collect();
        self.check_collisions(&fresh, &old_keys)?;

        old.hooks().on_reload().await.map_err(|source| RegistryError::Hook {
            module: id.to_string(),
            hook: "on_reload",
            source,
        })?;
        old.hooks().on_unload().await.map_err(|source| RegistryError::Hook {
            module: id.to_string(),
            hook: "on_unload",
            source,
        })?;

        for key in &old_keys {
            self.index.remove(key);
        }
        self.modules.remove(id);

        let fresh_hooks = match fresh.hooks().on_register().await {
            Err(source) => Err(("on_register", source)),
            Ok(()) => fresh.hooks().on_load().await.map_err(|s| ("on_load", s)),
        };
        if let Err((hook, source)) = fresh_hooks {
            // Restore the outgoing module; its own load hooks already ran at
            // original registration and are not re-run.
            self.insert_module(Arc::clone(&old));
            warn!(module = %id, hook, "reload hooks failed; previous module restored");
            return Err(RegistryError::Hook {
                module: id.to_string(),
                hook,
                source,
            });
        }

        let bindings = self.insert_module(Arc::new(fresh));
        info!(module = %id, "module reloaded");
        self.notify(RegistryNotice::ModuleReloaded {
            module: id.to_string(),
        });
        Ok(bindings)
    }

    async fn register_locked(
        &self,
        definition: ModuleDefinition,
    ) -> Result<Vec<EventBinding>, RegistryError> {
        let module = Module::new(definition)?;
        let id = module.id().to_string();

        if self.disabled_modules.contains(&id) {
            return Err(RegistryError::ModuleDisabled(id));
        }
        if self.modules.contains_key(&id) {
            return Err(RegistryError::ModuleAlreadyRegistered(id));
        }
        self.check_collisions(&module, &[])?;

        module
            .hooks()
            .on_register()
            .await
            .map_err(|source| RegistryError::Hook {
                module: id.clone(),
                hook: "on_register",
                source,
            })?;
        module.hooks().on_load().await.map_err(|source| RegistryError::Hook {
            module: id.clone(),
            hook: "on_load",
            source,
        })?;

        let commands = module.commands().len();
        let bindings = self.insert_module(Arc::new(module));
        info!(module = %id, commands, "module registered");
        self.notify(RegistryNotice::ModuleRegistered {
            module: id,
            commands,
        });
        Ok(bindings)
    }

    async fn unload_locked(&self, id: &str) -> Result<(), RegistryError> {
        let (_, module) = self
            .modules
            .remove(id)
            .ok_or_else(|| RegistryError::ModuleNotRegistered(id.to_string()))?;
        for command in module.commands() {
            for key in invocation_keys(command) {
                self.index.remove(&key);
            }
        }
        info!(module = %id, "module unloaded");
        self.notify(RegistryNotice::ModuleUnloaded {
            module: id.to_string(),
        });

        module.hooks().on_unload().await.map_err(|source| RegistryError::Hook {
            module: id.to_string(),
            hook: "on_unload",
            source,
        })
    }

    async fn resolve(&self, id: &str) -> Result<ModuleDefinition, RegistryError> {
        let resolver = self
            .resolver
            .read()
            .clone()
            .ok_or_else(|| RegistryError::NoResolver(id.to_string()))?;
        resolver
            .resolve(id)
            .await
            .map_err(|err| RegistryError::ResolveFailed {
                id: id.to_string(),
                reason: err.to_string(),
            })
    }

    /// Reject any name the incoming module would claim that is already taken,
    /// ignoring names owned by an outgoing module during reload. Also rejects
    /// duplicates within the incoming module itself.
    fn check_collisions(&self, module: &Module, ignore: &[String]) -> Result<(), RegistryError> {
        let mut claimed = std::collections::HashSet::new();
        for command in module.commands() {
            for (key, is_alias) in labeled_keys(command) {
                let taken = !claimed.insert(key.clone())
                    || (self.index.contains_key(&key) && !ignore.contains(&key));
                if taken {
                    return Err(if is_alias {
                        RegistryError::AliasCollision {
                            command: command.name().to_string(),
                            alias: key,
                        }
                    } else {
                        RegistryError::CommandCollision { name: key }
                    });
                }
            }
        }
        Ok(())
    }

    /// Index a validated module, re-applying operator command-disable intent.
    /// Returns the module's gateway subscriptions.
    fn insert_module(&self, module: Arc<Module>) -> Vec<EventBinding> {
        module.set_enabled(!self.disabled_modules.contains(module.id()));
        for command in module.commands() {
            command.set_enabled(!self.disabled_commands.contains(command.name()));
            for key in invocation_keys(command) {
                self.index.insert(key, Arc::clone(command));
            }
            self.notify(RegistryNotice::CommandLoaded {
                module: module.id().to_string(),
                command: command.name().to_string(),
            });
        }
        let bindings: Vec<EventBinding> = module
            .events()
            .iter()
            .map(|decl| EventBinding::bind(module.id(), decl))
            .collect();
        for binding in &bindings {
            self.notify(RegistryNotice::EventRegistered {
                module: binding.module.clone(),
                label: binding.label.clone(),
            });
        }
        self.modules.insert(module.id().to_string(), module);
        bindings
    }

    // ========================================================================
    // Operator intent
    // ========================================================================

    /// Disable a module. Intent is remembered even if the module is not
    /// currently registered, and blocks future registration until enabled.
    /// Guarded modules refuse.
    pub fn disable_module(&self, id: &str) -> Result<(), RegistryError> {
        if let Some(module) = self.modules.get(id) {
            if module.guarded() {
                return Err(RegistryError::ModuleGuarded(id.to_string()));
            }
            module.set_enabled(false);
        }
        self.disabled_modules.insert(id.to_string());
        self.notify(RegistryNotice::ModuleDisabled {
            module: id.to_string(),
        });
        Ok(())
    }

    pub fn enable_module(&self, id: &str) {
        self.disabled_modules.remove(id);
        if let Some(module) = self.modules.get(id) {
            module.set_enabled(true);
        }
        self.notify(RegistryNotice::ModuleEnabled {
            module: id.to_string(),
        });
    }

    /// Disable a command by any of its invocable names. Guarded commands
    /// refuse.
    pub fn disable_command(&self, name: &str) -> Result<(), RegistryError> {
        let command = self
            .command(name)
            .ok_or_else(|| RegistryError::CommandNotRegistered(name.to_string()))?;
        if command.guarded() {
            return Err(RegistryError::CommandGuarded(command.name().to_string()));
        }
        self.disabled_commands.insert(command.name().to_string());
        command.set_enabled(false);
        self.notify(RegistryNotice::CommandDisabled {
            command: command.name().to_string(),
        });
        Ok(())
    }

    pub fn enable_command(&self, name: &str) -> Result<(), RegistryError> {
        let command = self
            .command(name)
            .ok_or_else(|| RegistryError::CommandNotRegistered(name.to_string()))?;
        self.disabled_commands.remove(command.name());
        command.set_enabled(true);
        self.notify(RegistryNotice::CommandEnabled {
            command: command.name().to_string(),
        });
        Ok(())
    }

    /// Whether a command's owning module is currently registered and enabled.
    pub fn module_enabled(&self, id: &str) -> bool {
        self.modules.get(id).is_some_and(|m| m.is_enabled())
    }

    // ========================================================================
    // Publication
    // ========================================================================

    /// Digest of the publishable catalog. Stable across registration order;
    /// runtime enable/disable does not change it.
    pub fn fingerprint(&self) -> String {
        let commands = self.commands();
        catalog_fingerprint(commands.iter().map(Arc::as_ref))
    }

    /// Publish the full catalog to the platform. A global-catalog failure
    /// aborts; per-community failures are reported in the [`PublishReport`]
    /// and as [`RegistryNotice::PublicationFailed`] notices.
    pub async fn publish(&self) -> Result<PublishReport, RegistryError> {
        let _guard = self.lifecycle.lock().await;
        let commands = self.commands();
        let fingerprint = catalog_fingerprint(commands.iter().map(Arc::as_ref));
        let report = publish::publish_catalog(&self.platform, &commands, fingerprint).await?;
        for (community, err) in &report.failed {
            self.notify(RegistryNotice::PublicationFailed {
                community: community.clone(),
                code: err.error_code(),
            });
        }
        Ok(report)
    }

    fn notify(&self, notice: RegistryNotice) {
        // Delivery is best-effort; a full or observer-less channel drops.
        let _ = self.notices.send(notice);
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.modules.len())
            .field("index", &self.index.len())
            .finish_non_exhaustive()
    }
}

/// Every name a command can be invoked through.
fn invocation_keys(command: &Command) -> Vec<String> {
    labeled_keys(command).into_iter().map(|(k, _)| k).collect()
}

fn labeled_keys(command: &Command) -> Vec<(String, bool)> {
    let mut keys = vec![(command.name().to_string(), false)];
    if command.slash_name() != command.name() {
        keys.push((command.slash_name().to_string(), false));
    }
    for alias in command.aliases() {
        keys.push((alias.clone(), true));
    }
    keys
}
