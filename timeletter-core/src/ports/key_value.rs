//! Durable key-value port - where the session identity survives restarts

use crate::domain::result::Result;

/// Key holding the remembered user email
pub const USER_EMAIL_KEY: &str = "userEmail";

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
