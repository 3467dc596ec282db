//! Core domain entities
//!
//! Letters, validation rules and timestamp helpers. Pure data and pure
//! functions - no I/O.

pub mod datetime;
mod letter;
pub mod result;
pub mod validation;

pub use letter::{
    title_for, CreateLetterRequest, CreateLetterResponse, HealthStatus, HistoryResponse, Letter,
    LetterDetail, LetterStatus, LetterSummary,
};
pub use validation::{Field, ValidationError, ValidationResult};
