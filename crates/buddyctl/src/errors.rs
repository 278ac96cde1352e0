//! Exit status for buddyctl
//!
//! Library errors carry their own sysexits-style code; anything else is a
//! general failure.

use buddy_shared::BuddyError;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: u8 = 1;

/// Exit status for a failed command. The first [`BuddyError`] in the context
/// chain decides.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BuddyError>())
        .and_then(|e| u8::try_from(e.code()).ok())
        .unwrap_or(EXIT_GENERAL_ERROR)
}
