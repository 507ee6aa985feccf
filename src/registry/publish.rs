//! Bulk command publication.
//!
//! The catalog splits by rollout: commands with no rollout list replace the
//! global catalog, commands with one are grouped per community. A global
//! failure aborts publication; community failures are isolated, logged, and
//! reported, so one bad community never blocks the rest of a rollout.

use crate::command::Command;
use crate::error::{PlatformError, RegistryError};
use crate::platform::{CommandPayload, CommunityId, Platform};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one catalog publication.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Catalog fingerprint at publication time.
    pub fingerprint: String,
    /// Commands in the global catalog.
    pub global: usize,
    /// Communities that received a scoped catalog.
    pub communities: usize,
    /// Communities whose scoped publication failed.
    pub failed: Vec<(CommunityId, PlatformError)>,
}

pub(super) async fn publish_catalog(
    platform: &Arc<dyn Platform>,
    commands: &[Arc<Command>],
    fingerprint: String,
) -> Result<PublishReport, RegistryError> {
    let mut global: Vec<CommandPayload> = Vec::new();
    let mut scoped: HashMap<CommunityId, Vec<CommandPayload>> = HashMap::new();

    for command in commands {
        if !command.surfaces().structured() {
            continue;
        }
        let payload = command.to_publication()?;
        if command.rollout().is_empty() {
            global.push(payload);
        } else {
            for community in command.rollout() {
                scoped
                    .entry(community.clone())
                    .or_default()
                    .push(payload.clone());
            }
        }
    }

    let global_count = global.len();
    platform.publish_global_commands(global).await?;
    info!(commands = global_count, fingerprint = %fingerprint, "published global catalog");

    let communities = scoped.len();
    let results = join_all(scoped.into_iter().map(|(community, payloads)| async move {
        let count = payloads.len();
        let result = platform.publish_community_commands(&community, payloads).await;
        (community, count, result)
    }))
    .await;

    let mut failed = Vec::new();
    for (community, count, result) in results {
        match result {
            Ok(()) => info!(community = %community, commands = count, "published community catalog"),
            Err(err) => {
                warn!(
                    community = %community,
                    error_code = err.error_code(),
                    error = %err,
                    "community catalog publication failed"
                );
                failed.push((community, err));
            }
        }
    }

    Ok(PublishReport {
        fingerprint,
        global: global_count,
        communities,
        failed,
    })
}
