//! Identity provider trait.

use crate::types::actor::Actor;

/// Single source of truth for "who is acting right now".
///
/// Returns `None` when nobody is signed in; callers substitute
/// [`Actor::system`].
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// The currently signed-in actor, if any.
    fn current_actor(&self) -> Option<Actor>;
}
