//! User-facing reply templates.
//!
//! Gated rejections and fault fallbacks always answer with one of these
//! messages; nothing else in the crate composes user-visible prose.

/// An error occurred before the command reached execution.
pub const PROCESS_ERROR: &str = "An error occurred while trying to process this command.";

/// An error occurred inside the gating chain or execution.
pub const EXECUTION_ERROR: &str = "An error occurred while trying to execute the command.";

/// Module preliminary check failed without a custom message.
pub const MODULE_PRELIM_FAIL: &str = "You don't have the permissions to run this command.";

/// Command preliminary check failed without a custom message.
pub const COMMAND_PRELIM_FAIL: &str = "You don't have the permissions to run this command.";

/// Permission evaluation failed. Intentionally generic; the specific missing
/// permissions only go to the log, never the user.
pub const GENERIC_PERMISSION_ERROR: &str = "You don't have the permissions to run this command.";

/// Permission evaluation itself faulted.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";

/// Cooldown rejection, with `{remainingTime}` interpolated as a relative-time
/// marker the platform renders client-side.
const COOLDOWN: &str = "You're on cooldown! You can run this command {remainingTime}.";

/// Build the cooldown rejection for a window expiring at `expires_unix`
/// (seconds). The `<t:..:R>` marker renders as relative time on the platform.
pub fn cooldown_message(expires_unix: i64) -> String {
    COOLDOWN.replace("{remainingTime}", &format!("<t:{expires_unix}:R>"))
}
