use anyhow::{Result, bail};

use crate::model::{SubmissionId, ToolResult};

/// Holds the single displayed result plus the browsable archive of saved
/// results.
///
/// A result lives in at most one of the two slots at any time, the archive
/// never contains two results with the same submission id, and whenever the
/// current slot changes every saved result is forced non-visible so the
/// default display mode shows at most one result.
#[derive(Debug, Default)]
pub struct ResultStore {
    current: Option<ToolResult>,
    saved: Vec<ToolResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ToolResult> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut ToolResult> {
        self.current.as_mut()
    }

    pub fn saved(&self) -> &[ToolResult] {
        &self.saved
    }

    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    pub fn contains_saved(&self, id: SubmissionId) -> bool {
        self.saved.iter().any(|r| r.submission_id == id)
    }

    /// Installs `result` as the current result. Any previous current result
    /// is deleted first, and all saved results are hidden.
    pub fn set_current(&mut self, result: ToolResult) {
        let _ = self.delete_current();
        self.current = Some(result);
        for saved in &mut self.saved {
            saved.visible = false;
        }
    }

    /// Moves the current result into the archive.
    ///
    /// The original viewer called this without checking for a current result
    /// and would archive an empty slot; here that is an invalid-state error.
    pub fn save_current(&mut self) -> Result<()> {
        if self.current.is_none() {
            bail!("no current result to save");
        }
        self.archive_current();
        Ok(())
    }

    /// Infallible form used by reconciliation, which has already established
    /// that a current result exists.
    pub(super) fn archive_current(&mut self) {
        if let Some(result) = self.current.take() {
            self.push_saved(result);
        }
    }

    /// Appends to the archive unless a result with the same submission id is
    /// already there.
    pub(super) fn push_saved(&mut self, result: ToolResult) {
        if self.contains_saved(result.submission_id) {
            return;
        }
        self.saved.push(result);
    }

    /// Removes a saved result by submission id; the detached result comes
    /// back marked non-visible. Absent ids are a no-op.
    pub fn delete_saved(&mut self, id: SubmissionId) -> Option<ToolResult> {
        let idx = self.saved.iter().position(|r| r.submission_id == id)?;
        let mut removed = self.saved.remove(idx);
        removed.visible = false;
        Some(removed)
    }

    /// Clears the current slot; the detached result comes back marked
    /// non-visible. Idempotent when the slot is already empty.
    pub fn delete_current(&mut self) -> Option<ToolResult> {
        let mut removed = self.current.take()?;
        removed.visible = false;
        Some(removed)
    }
}

#[cfg(test)]
#[path = "../tests/results/store_tests.rs"]
mod tests;
