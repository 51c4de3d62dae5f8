//! Session persistence for resume-on-restart.
//!
//! The stored record is durable-enough local state, not a source of truth:
//! anything unreadable is treated as "no membership" by the caller.

use crate::state::QueueMembership;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub mod file;
pub mod memory;

/// Wire form of a persisted membership. Field layout matches the record the
/// web client keeps in browser local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub in_queue: bool,
    pub position: u32,
    pub timestamp: String,
}

impl SessionRecord {
    pub fn from_membership(membership: &QueueMembership) -> Self {
        let timestamp = OffsetDateTime::from(membership.joined_at)
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string());
        Self {
            in_queue: true,
            position: membership.position,
            timestamp,
        }
    }

    /// Reconstruct a membership, or `None` for records that do not describe
    /// an in-progress wait (not queued, position 0, unparseable join time).
    pub fn membership(&self) -> Option<QueueMembership> {
        if !self.in_queue || self.position == 0 {
            return None;
        }
        let joined_at = OffsetDateTime::parse(&self.timestamp, &Rfc3339)
            .ok()
            .map(SystemTime::from)?;
        Some(QueueMembership {
            position: self.position,
            joined_at,
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read session record: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse session record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

pub trait SessionStore: Send + Sync {
    /// `Ok(None)` means no record exists; errors mean the record could not
    /// be read or parsed and the caller should fail open.
    fn load(&self) -> Result<Option<SessionRecord>, StoreError>;
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}
