//! Smoothed-score snapshots
//!
//! The smoother needs yesterday's value; this module defines where it comes
//! from. `SnapshotStore` is the collaborator contract, and
//! `InMemorySnapshotStore` is a JSON-persistable implementation with a bounded
//! per-handle history.

use crate::error::ComputeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Default number of daily snapshots kept per handle
pub const DEFAULT_HISTORY_DAYS: usize = 30;

/// One smoothed score recorded for a day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    /// Full-precision smoothed score
    pub smoothed_score: f64,
}

/// Storage for the previous smoothed score of each handle.
///
/// Handles are case-insensitive.
pub trait SnapshotStore {
    /// Most recent smoothed score recorded for the handle
    fn previous_smoothed_score(&self, handle: &str) -> Option<f64>;

    /// Most recent smoothed score recorded strictly before `date`
    fn smoothed_score_before(&self, handle: &str, date: NaiveDate) -> Option<f64>;

    /// Record the smoothed score for `date`, replacing any value for that day
    fn record_snapshot(
        &mut self,
        handle: &str,
        smoothed_score: f64,
        date: NaiveDate,
    ) -> Result<(), ComputeError>;
}

/// Snapshot store kept in memory and persisted as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemorySnapshotStore {
    /// Snapshots per lowercased handle, oldest first
    snapshots: BTreeMap<String, VecDeque<Snapshot>>,
    /// Maximum snapshots per handle
    history_days: usize,
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DAYS)
    }
}

impl InMemorySnapshotStore {
    /// Create a store keeping `history_days` snapshots per handle
    pub fn new(history_days: usize) -> Self {
        Self {
            snapshots: BTreeMap::new(),
            history_days: history_days.max(1),
        }
    }

    /// Snapshots recorded for a handle, oldest first
    pub fn history(&self, handle: &str) -> Vec<Snapshot> {
        self.snapshots
            .get(&key(handle))
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of handles with at least one snapshot
    pub fn handle_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Load a store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn previous_smoothed_score(&self, handle: &str) -> Option<f64> {
        self.snapshots
            .get(&key(handle))
            .and_then(|h| h.back())
            .map(|s| s.smoothed_score)
    }

    fn smoothed_score_before(&self, handle: &str, date: NaiveDate) -> Option<f64> {
        self.snapshots
            .get(&key(handle))?
            .iter()
            .rev()
            .find(|s| s.date < date)
            .map(|s| s.smoothed_score)
    }

    fn record_snapshot(
        &mut self,
        handle: &str,
        smoothed_score: f64,
        date: NaiveDate,
    ) -> Result<(), ComputeError> {
        if !smoothed_score.is_finite() {
            return Err(ComputeError::SnapshotError(format!(
                "refusing to record non-finite score for {handle}"
            )));
        }

        let history = self.snapshots.entry(key(handle)).or_default();
        match history.back_mut() {
            Some(last) if last.date == date => {
                last.smoothed_score = smoothed_score;
                return Ok(());
            }
            Some(last) if last.date > date => {
                return Err(ComputeError::SnapshotError(format!(
                    "snapshot for {date} is older than latest {} for {handle}",
                    last.date
                )));
            }
            _ => {}
        }

        history.push_back(Snapshot {
            date,
            smoothed_score,
        });
        while history.len() > self.history_days {
            history.pop_front();
        }
        Ok(())
    }
}

fn key(handle: &str) -> String {
    handle.trim().to_lowercase()
}
