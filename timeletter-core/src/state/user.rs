use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::{KeyValueStore, USER_EMAIL_KEY};

/// The session identity
///
/// `is_authenticated` only means an email is known; nothing is verified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub email: Option<String>,
    pub is_authenticated: bool,
}

#[derive(Debug, Clone)]
pub enum UserAction {
    SetEmail(Option<String>),
    Logout,
    /// Restore the identity persisted by an earlier session
    LoadStored,
}

/// Identity store mirrored to the `userEmail` key
pub struct UserStore {
    state: UserState,
    storage: Arc<dyn KeyValueStore>,
}

impl UserStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state: UserState::default(),
            storage,
        }
    }

    pub fn state(&self) -> &UserState {
        &self.state
    }

    pub fn email(&self) -> Option<&str> {
        self.state.email.as_deref()
    }

    pub fn dispatch(&mut self, action: UserAction) -> Result<()> {
        match action {
            UserAction::SetEmail(Some(email)) => {
                let email = email.trim().to_string();
                if email.is_empty() {
                    return self.dispatch(UserAction::SetEmail(None));
                }
                self.storage.set(USER_EMAIL_KEY, &email)?;
                self.set_state(Some(email));
            }
            UserAction::SetEmail(None) | UserAction::Logout => {
                self.storage.remove(USER_EMAIL_KEY)?;
                self.set_state(None);
            }
            UserAction::LoadStored => {
                let stored = self
                    .storage
                    .get(USER_EMAIL_KEY)?
                    .filter(|email| !email.trim().is_empty());
                self.set_state(stored);
            }
        }
        Ok(())
    }

    fn set_state(&mut self, email: Option<String>) {
        self.state = UserState {
            is_authenticated: email.is_some(),
            email,
        };
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
