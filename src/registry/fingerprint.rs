//! Catalog fingerprinting.
//!
//! A stable digest over everything the platform would need to see republished.
//! Hosts compare it against the last published value to skip redundant bulk
//! publications on boot.

use crate::command::Command;
use sha2::{Digest, Sha256};

/// Digest the publishable subset of a command list.
///
/// Commands are sorted by structured-surface name (length first, then
/// lexicographically) so registration order never changes the result. Only
/// publication-relevant fields contribute; aliases, cooldowns, and runtime
/// state do not.
pub fn catalog_fingerprint<'a>(commands: impl Iterator<Item = &'a Command>) -> String {
    let mut entries: Vec<(String, String)> = commands
        .filter(|c| c.surfaces().structured())
        .map(|c| (c.slash_name().to_string(), c.fingerprint_input()))
        .collect();
    entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let mut hasher = Sha256::new();
    for (_, input) in &entries {
        hasher.update(input.as_bytes());
        hasher.update([0x1e]);
    }
    hex_digest(hasher)
}

fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
