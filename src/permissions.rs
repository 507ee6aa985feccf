//! Permission bitmasks and missing-permission formatting.
//!
//! Permissions are a 64-bit mask in the platform's bit layout. Commands declare
//! up to four independent requirement masks (agent/actor x community/channel);
//! the dispatcher checks them against cached effective permissions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of platform permissions as a 64-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub u64);

/// Bit-to-name table for the permissions the framework can describe.
/// Unknown bits still compare correctly; they just format as a raw bit.
const NAMES: &[(u64, &str)] = &[
    (1 << 0, "Create Invite"),
    (1 << 1, "Kick Members"),
    (1 << 2, "Ban Members"),
    (1 << 3, "Administrator"),
    (1 << 4, "Manage Channels"),
    (1 << 5, "Manage Community"),
    (1 << 6, "Add Reactions"),
    (1 << 7, "View Audit Log"),
    (1 << 10, "View Channel"),
    (1 << 11, "Send Messages"),
    (1 << 13, "Manage Messages"),
    (1 << 14, "Embed Links"),
    (1 << 15, "Attach Files"),
    (1 << 16, "Read Message History"),
    (1 << 17, "Mention Everyone"),
    (1 << 27, "Manage Nicknames"),
    (1 << 28, "Manage Roles"),
    (1 << 30, "Manage Webhooks"),
    (1 << 40, "Moderate Members"),
];

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const CREATE_INVITE: Permissions = Permissions(1 << 0);
    pub const KICK_MEMBERS: Permissions = Permissions(1 << 1);
    pub const BAN_MEMBERS: Permissions = Permissions(1 << 2);
    pub const ADMINISTRATOR: Permissions = Permissions(1 << 3);
    pub const MANAGE_CHANNELS: Permissions = Permissions(1 << 4);
    pub const MANAGE_COMMUNITY: Permissions = Permissions(1 << 5);
    pub const ADD_REACTIONS: Permissions = Permissions(1 << 6);
    pub const VIEW_AUDIT_LOG: Permissions = Permissions(1 << 7);
    pub const VIEW_CHANNEL: Permissions = Permissions(1 << 10);
    pub const SEND_MESSAGES: Permissions = Permissions(1 << 11);
    pub const MANAGE_MESSAGES: Permissions = Permissions(1 << 13);
    pub const EMBED_LINKS: Permissions = Permissions(1 << 14);
    pub const ATTACH_FILES: Permissions = Permissions(1 << 15);
    pub const READ_MESSAGE_HISTORY: Permissions = Permissions(1 << 16);
    pub const MENTION_EVERYONE: Permissions = Permissions(1 << 17);
    pub const MANAGE_NICKNAMES: Permissions = Permissions(1 << 27);
    pub const MANAGE_ROLES: Permissions = Permissions(1 << 28);
    pub const MANAGE_WEBHOOKS: Permissions = Permissions(1 << 30);
    pub const MODERATE_MEMBERS: Permissions = Permissions(1 << 40);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `required` is present in this mask.
    pub fn has(self, required: Permissions) -> bool {
        self.0 & required.0 == required.0
    }

    /// Bits of `required` not present in this mask.
    pub fn missing(self, required: Permissions) -> Permissions {
        Permissions(required.0 & !self.0)
    }

    /// Human-readable names for the bits set in this mask.
    pub fn names(self) -> Vec<String> {
        let mut named = 0u64;
        let mut out: Vec<String> = NAMES
            .iter()
            .filter(|(bit, _)| self.0 & bit != 0)
            .inspect(|(bit, _)| named |= bit)
            .map(|(_, name)| (*name).to_string())
            .collect();
        // Bits without a table entry format as raw bit positions.
        let mut rest = self.0 & !named;
        while rest != 0 {
            let bit = rest.trailing_zeros();
            out.push(format!("1<<{bit}"));
            rest &= rest - 1;
        }
        out
    }
}

impl BitOr for Permissions {
    type Output = Permissions;
    fn bitor(self, rhs: Permissions) -> Permissions {
        Permissions(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Permissions) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(", "))
    }
}

/// Format a missing-permission sentence for the log or the user.
///
/// `refer_self` selects agent-side wording ("I") over actor-side wording ("you").
pub fn describe_missing(missing: Permissions, refer_self: bool) -> String {
    let names = missing.names();
    let plural = if names.len() == 1 { "" } else { "s" };
    format!(
        "In order to run this command, {} need the {} permission{}.",
        if refer_self { "I" } else { "you" },
        names
            .iter()
            .map(|n| format!("`{n}`"))
            .collect::<Vec<_>>()
            .join(", "),
        plural,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_and_missing() {
        let held = Permissions::SEND_MESSAGES | Permissions::EMBED_LINKS;
        assert!(held.has(Permissions::SEND_MESSAGES));
        assert!(!held.has(Permissions::KICK_MEMBERS));
        assert_eq!(
            held.missing(Permissions::SEND_MESSAGES | Permissions::KICK_MEMBERS),
            Permissions::KICK_MEMBERS
        );
        assert!(held.missing(Permissions::EMBED_LINKS).is_empty());
    }

    #[test]
    fn test_describe_missing_actor_single() {
        let msg = describe_missing(Permissions::KICK_MEMBERS, false);
        assert_eq!(
            msg,
            "In order to run this command, you need the `Kick Members` permission."
        );
    }

    #[test]
    fn test_describe_missing_agent_plural() {
        let msg = describe_missing(Permissions::BAN_MEMBERS | Permissions::MANAGE_ROLES, true);
        assert!(msg.starts_with("In order to run this command, I need the "));
        assert!(msg.contains("`Ban Members`"));
        assert!(msg.contains("`Manage Roles`"));
        assert!(msg.ends_with("permissions."));
    }

    #[test]
    fn test_unknown_bit_formats_as_raw() {
        let names = Permissions(1 << 55).names();
        assert_eq!(names, vec!["1<<55".to_string()]);
    }
}
