//! Point-in-time snapshots of a running machine.
//!
//! A snapshot records where a machine is and how it got there. Handlers and
//! the user context are closures and arbitrary data, so they are not part of
//! it; snapshots are meant for inspection, logging and tests rather than for
//! restoring a machine.

use crate::core::{StateHistory, StateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for the snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable view of a machine's configuration at one instant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Snapshot format version
    pub version: u32,

    /// Identifier assigned to the machine when it was constructed
    pub machine_id: Uuid,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    pub running: bool,

    /// Innermost current state
    pub current: StateId,

    /// Names from the root down to the current state
    pub current_path: Vec<String>,

    /// Every state whose active flag is set, in arena order
    pub active: Vec<StateId>,

    pub history: StateHistory,
}

impl MachineSnapshot {
    pub(crate) fn capture(
        machine_id: Uuid,
        running: bool,
        current: StateId,
        current_path: Vec<String>,
        active: Vec<StateId>,
        history: StateHistory,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            machine_id,
            taken_at: Utc::now(),
            running,
            current,
            current_path,
            active,
            history,
        }
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    /// Encode in the compact bincode format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(self)
    }
}
