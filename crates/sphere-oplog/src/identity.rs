//! Identity providers for the recorder.

use std::sync::RwLock;

use sphere_core::traits::identity::IdentityProvider;
use sphere_core::types::actor::Actor;

/// A fixed identity, e.g. from CLI flags. `None` means anonymous.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    actor: Option<Actor>,
}

impl StaticIdentity {
    /// Always report `actor`.
    pub fn new(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    /// Always report nobody.
    pub fn anonymous() -> Self {
        Self { actor: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Option<Actor> {
        self.actor.clone()
    }
}

/// The signed-in user of a running session, updated on login and logout.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    current: RwLock<Option<Actor>>,
}

impl SessionIdentity {
    /// Create a session with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful login.
    pub fn sign_in(&self, actor: Actor) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(actor);
    }

    /// Record a logout. Returns the actor that was signed in.
    pub fn sign_out(&self) -> Option<Actor> {
        self.current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_actor(&self) -> Option<Actor> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
