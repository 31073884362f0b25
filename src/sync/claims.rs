//! Track IDs claimed by the current run.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::TrackId;

/// Set of track IDs this run has decided to add.
///
/// Claiming is check-and-insert under one lock, so two workers can never
/// both decide to submit the same track.
#[derive(Debug, Default)]
pub struct ClaimSet {
    claimed: Mutex<HashSet<TrackId>>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<TrackId>> {
        self.claimed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim every candidate not claimed yet. Returns the accepted IDs in
    /// candidate order.
    pub fn claim(&self, candidates: &[TrackId]) -> Vec<TrackId> {
        let mut claimed = self.lock();
        candidates
            .iter()
            .filter(|id| claimed.insert((*id).clone()))
            .cloned()
            .collect()
    }

    /// Give up claims whose submission failed.
    pub fn release(&self, ids: &[TrackId]) {
        let mut claimed = self.lock();
        for id in ids {
            claimed.remove(id);
        }
    }

}

#[cfg(test)]
impl ClaimSet {
    fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
