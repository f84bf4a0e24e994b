//! The acting user recorded on audit entries.

use serde::{Deserialize, Serialize};

/// Sentinel actor id used when no session is present.
pub const SYSTEM_ACTOR_ID: &str = "system";

/// Sentinel actor name used when no session is present.
pub const UNKNOWN_ACTOR_NAME: &str = "unknown";

/// An identified user, or the system sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Backend user id (admins and instructors share one id space).
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Actor {
    /// Create an actor.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The sentinel actor for anonymous or background actions.
    pub fn system() -> Self {
        Self::new(SYSTEM_ACTOR_ID, UNKNOWN_ACTOR_NAME)
    }

    /// Whether this is the sentinel actor.
    pub fn is_system(&self) -> bool {
        self.id == SYSTEM_ACTOR_ID
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}
