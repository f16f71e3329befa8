use std::collections::HashSet;

use crate::model::SubmissionId;

use super::ResultStore;

/// Remembers which submissions have already been turned into applied
/// results, so repeated polls that still report those jobs terminal are
/// skipped instead of re-fetched.
#[derive(Debug, Default)]
pub struct SubmissionTracker {
    handled: HashSet<SubmissionId>,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_handled(&mut self, id: SubmissionId) {
        self.handled.insert(id);
    }

    pub fn is_handled(&self, id: SubmissionId) -> bool {
        self.handled.contains(&id)
    }

    /// Marks every archived result's submission handled. Runs at the start
    /// of each poll cycle: a result the user can already browse must never
    /// be applied a second time.
    pub fn mark_all_saved(&mut self, store: &ResultStore) {
        for result in store.saved() {
            self.handled.insert(result.submission_id);
        }
    }
}

#[cfg(test)]
#[path = "../tests/results/tracker_tests.rs"]
mod tests;
