//! Scoped override of the process umask.
//!
//! The umask is process-wide. A guard must bound exactly one script's
//! execution and guards must never overlap across threads. Restoration is
//! covered by `tests/umask_guard.rs`, which owns its whole process.

use nix::libc::mode_t;
use nix::sys::stat::{Mode, umask};
use tracing::debug;

/// Sets the umask on creation and restores the previous value on drop.
#[derive(Debug)]
#[must_use = "the umask is restored as soon as the guard is dropped"]
pub struct UmaskGuard {
    previous: Mode,
}

impl UmaskGuard {
    pub fn set(mask: u32) -> Self {
        let previous = umask(Mode::from_bits_truncate(mask as mode_t));
        debug!(umask = format!("{mask:04o}"), "umask set");
        Self { previous }
    }
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        umask(self.previous);
        debug!(
            umask = format!("{:04o}", self.previous.bits()),
            "umask restored"
        );
    }
}
