//! Single display-name profile.
//!
//! The app has no accounts; the "login" screen only records a name to greet
//! the user with. The name lives under its own key, next to the reminders.

use crate::repo::reminder_repo::{PersistenceError, PersistenceResult};
use crate::storage::KeyValueStore;

/// Key under which the display name is persisted.
pub const DISPLAY_NAME_KEY: &str = "username";

/// Display-name persistence over a key-value collaborator.
pub struct ProfileStore<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> ProfileStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Returns the saved display name, if any.
    pub fn display_name(&self) -> PersistenceResult<Option<String>> {
        Ok(self.kv.get(DISPLAY_NAME_KEY)?)
    }

    /// Saves a trimmed display name. Blank input clears the profile.
    pub fn set_display_name(&self, name: &str) -> PersistenceResult<Option<String>> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            self.kv
                .remove(DISPLAY_NAME_KEY)
                .map_err(PersistenceError::from)?;
            return Ok(None);
        }
        self.kv.set(DISPLAY_NAME_KEY, trimmed)?;
        Ok(Some(trimmed.to_string()))
    }
}
