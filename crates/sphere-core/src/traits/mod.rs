//! Collaborator traits defined in `sphere-core` and implemented by other crates.

pub mod identity;
pub mod store;

pub use identity::IdentityProvider;
pub use store::KeyValueStore;
