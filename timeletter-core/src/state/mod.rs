//! Client-side state stores
//!
//! Each store owns its state and exposes a single `dispatch` that applies
//! one action. Page workflows hold the stores through a [`Session`](crate::services::Session).

mod letters;
mod user;

pub use letters::{LetterAction, LetterState, LetterStore};
pub use user::{UserAction, UserState, UserStore};
