//! Notification permission check.
//!
//! The core never blocks on permission: scheduling calls are issued either
//! way. The check result is only forwarded to callers that want to prompt.

use std::sync::atomic::{AtomicU8, Ordering};

/// Platform notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Host has not reported a state yet.
    Unknown,
}

/// Source of the current notification permission state.
pub trait NotificationPermission: Send + Sync {
    fn status(&self) -> PermissionStatus;
}

/// Permission state pushed in by the host (for example after a platform
/// permission dialog).
#[derive(Debug, Default)]
pub struct SharedPermission {
    state: AtomicU8,
}

const UNKNOWN: u8 = 0;
const GRANTED: u8 = 1;
const DENIED: u8 = 2;

impl SharedPermission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, status: PermissionStatus) {
        let raw = match status {
            PermissionStatus::Unknown => UNKNOWN,
            PermissionStatus::Granted => GRANTED,
            PermissionStatus::Denied => DENIED,
        };
        self.state.store(raw, Ordering::Release);
    }
}

impl NotificationPermission for SharedPermission {
    fn status(&self) -> PermissionStatus {
        match self.state.load(Ordering::Acquire) {
            GRANTED => PermissionStatus::Granted,
            DENIED => PermissionStatus::Denied,
            _ => PermissionStatus::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationPermission, PermissionStatus, SharedPermission};

    #[test]
    fn shared_permission_starts_unknown_and_tracks_updates() {
        let permission = SharedPermission::new();
        assert_eq!(permission.status(), PermissionStatus::Unknown);
        permission.set(PermissionStatus::Denied);
        assert_eq!(permission.status(), PermissionStatus::Denied);
        permission.set(PermissionStatus::Granted);
        assert_eq!(permission.status(), PermissionStatus::Granted);
    }
}
