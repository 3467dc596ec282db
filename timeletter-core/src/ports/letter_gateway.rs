//! Letter gateway port - the remote time letter service

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{
    CreateLetterRequest, CreateLetterResponse, HealthStatus, HistoryResponse, LetterDetail,
};

/// Remote letter service abstraction
///
/// Every failure is normalized into [`crate::Error`] whose `Display` is the
/// message to show the user. Implementations do not retry.
#[async_trait]
pub trait LetterGateway: Send + Sync {
    /// Schedule a new letter
    ///
    /// `delivery_time` may be any form accepted by
    /// [`crate::domain::datetime::parse_timestamp`]; it is sent as absolute UTC.
    async fn create_letter(&self, request: &CreateLetterRequest) -> Result<CreateLetterResponse>;

    /// Letters addressed to `email`, in server order. No letters is `Ok` with an empty list.
    async fn get_history(&self, email: &str) -> Result<HistoryResponse>;

    /// Full record of a single letter
    async fn get_letter(&self, letter_id: &str) -> Result<LetterDetail>;

    /// Liveness probe
    async fn health_check(&self) -> Result<HealthStatus>;
}
