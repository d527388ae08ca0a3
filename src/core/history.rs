//! Transition history tracking.
//!
//! Machines append a [`TransitionRecord`] for every completed transition so
//! callers can trace how the current configuration was reached.

use super::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single completed transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State the machine was in when the transition fired
    pub from: StateId,
    /// State the machine settled in
    pub to: StateId,
    pub from_name: String,
    pub to_name: String,
    /// Name of the event that triggered the transition
    pub trigger: String,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded history of transitions.
///
/// Once `capacity` records are held the oldest is dropped first. A capacity
/// of zero disables recording.
///
/// # Example
///
/// ```rust
/// use hierarch::core::StateHistory;
///
/// let history = StateHistory::with_capacity(8);
/// assert!(history.is_empty());
/// assert!(history.duration().is_none());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}

impl StateHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a record, trimming the oldest entries beyond capacity.
    pub fn record(&mut self, record: TransitionRecord) {
        if self.capacity == 0 {
            return;
        }
        self.transitions.push_back(record);
        while self.transitions.len() > self.capacity {
            self.transitions.pop_front();
        }
    }

    /// Names of the states traversed: the source of the oldest retained
    /// record, then the target of each record.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(first.from_name.as_str());
        }
        path.extend(self.transitions.iter().map(|t| t.to_name.as_str()));
        path
    }

    /// Time between the first and last retained records.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &TransitionRecord> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
