//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Workflows depend
//! only on these traits, not on concrete implementations.

mod key_value;
mod letter_gateway;

pub use key_value::{KeyValueStore, USER_EMAIL_KEY};
pub use letter_gateway::LetterGateway;
