//! One-time handoff between compose and confirm
//!
//! Compose leaves the accepted letter under a fresh token; confirm takes it
//! back exactly once. Entries expire after [`HANDOFF_TTL_MINUTES`] whether
//! or not anyone reads them.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of an unread handoff entry
pub const HANDOFF_TTL_MINUTES: i64 = 10;

pub fn handoff_ttl() -> Duration {
    Duration::minutes(HANDOFF_TTL_MINUTES)
}

/// What the confirm page shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPayload {
    pub letter_id: String,
    pub content: String,
    pub delivery_email: String,
    pub delivery_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandoffToken(String);

impl HandoffToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HandoffToken {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl std::fmt::Display for HandoffToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct Entry {
    payload: ConfirmPayload,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct HandoffStore {
    entries: HashMap<HandoffToken, Entry>,
}

impl HandoffStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, payload: ConfirmPayload) -> HandoffToken {
        self.put_at(payload, Utc::now())
    }

    pub fn put_at(&mut self, payload: ConfirmPayload, now: DateTime<Utc>) -> HandoffToken {
        self.evict_expired(now);
        let token = HandoffToken::generate();
        self.entries.insert(
            token.clone(),
            Entry {
                payload,
                stored_at: now,
            },
        );
        token
    }

    /// Remove and return the payload; `None` if unknown, taken or expired
    pub fn take(&mut self, token: &HandoffToken) -> Option<ConfirmPayload> {
        self.take_at(token, Utc::now())
    }

    pub fn take_at(&mut self, token: &HandoffToken, now: DateTime<Utc>) -> Option<ConfirmPayload> {
        self.evict_expired(now);
        self.entries.remove(token).map(|entry| entry.payload)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_expired(&mut self, now: DateTime<Utc>) {
        self.entries
            .retain(|_, entry| now - entry.stored_at < handoff_ttl());
    }
}
