use tracing::debug;

use crate::model::ToolResult;

use super::ResultStore;

/// Where a newly fetched result ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// The result took over the current slot.
    Current,
    /// The result was filed into the archive.
    Saved,
    /// The result was already known and was dropped.
    Duplicate,
}

/// Applies the "most recent submission wins" policy to one fetched result:
/// an empty current slot is taken outright, a newer submission archives the
/// current result and replaces it, an older unseen submission is filed into
/// the archive, and anything already known is dropped.
///
/// Callers run this under the viewer state lock so the read-modify-write of
/// the current slot is atomic with respect to other reconciliations.
pub fn reconcile(store: &mut ResultStore, result: ToolResult) -> Reconciled {
    let Some(current_id) = store.current().map(|r| r.submission_id) else {
        debug!(submission = %result.submission_id, "result takes empty current slot");
        store.set_current(result);
        return Reconciled::Current;
    };

    if result.submission_id > current_id {
        debug!(submission = %result.submission_id, superseded = %current_id, "newer result becomes current");
        store.archive_current();
        store.set_current(result);
        Reconciled::Current
    } else if result.submission_id != current_id && !store.contains_saved(result.submission_id) {
        debug!(submission = %result.submission_id, "older result filed into archive");
        store.push_saved(result);
        Reconciled::Saved
    } else {
        Reconciled::Duplicate
    }
}

#[cfg(test)]
#[path = "../tests/results/reconcile_tests.rs"]
mod tests;
