//! Recurring job-status polling for one viewer.
//!
//! Each tick marks archived results handled, asks the server for the full
//! job-status snapshot, fetches the result of every successfully finished
//! submission that has not been applied yet, and reconciles each fetched
//! result against the store. No failure is fatal to the loop; everything is
//! retried on a later tick.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::model::{ExperimentId, JobStatus, SubmissionId};
use crate::remote::ToolService;
use crate::results::{SubmissionTracker, reconcile};
use crate::viewer::{ViewerState, lock_state};

/// Give up fetching a completed job's result after this many failed
/// attempts; the submission is then marked handled so the loop stops
/// retrying it.
pub const MAX_FETCH_ATTEMPTS: u32 = 8;

/// Handle to the recurring polling task.
///
/// The task ticks until [`JobMonitor::stop`] is awaited; once `stop`
/// returns, no further tick can fire.
pub struct JobMonitor {
    handle: JoinHandle<()>,
    stop_tx: watch::Sender<bool>,
}

impl JobMonitor {
    /// Spawns the polling task. The first tick fires one `period` after the
    /// spawn, matching a viewer that starts monitoring right after
    /// submitting.
    pub fn spawn(
        service: Arc<dyn ToolService>,
        state: Arc<Mutex<ViewerState>>,
        experiment: ExperimentId,
        period: Duration,
    ) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticks = tokio::time::interval_at(start, period);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut fetch_attempts: HashMap<SubmissionId, u32> = HashMap::new();
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticks.tick() => {
                        poll_once(service.as_ref(), &state, &experiment, &mut fetch_attempts).await;
                    }
                }
            }
            debug!(experiment = %experiment, "job monitor stopped");
        });
        Self { handle, stop_tx }
    }

    /// Signals the task and waits for it to wind down. A tick already in
    /// progress runs to completion first; no tick starts afterwards.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.handle.await;
    }

    /// Teardown fallback for callers that cannot await.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

async fn poll_once(
    service: &dyn ToolService,
    state: &Mutex<ViewerState>,
    experiment: &ExperimentId,
    fetch_attempts: &mut HashMap<SubmissionId, u32>,
) {
    // Idempotency boundary: anything the user can already browse in the
    // archive must never be applied again, whatever this tick reports.
    {
        let mut guard = lock_state(state);
        let st = &mut *guard;
        st.tracker.mark_all_saved(&st.results);
    }

    let statuses = match service.job_statuses(experiment).await {
        Ok(statuses) => statuses,
        Err(err) => {
            warn!(
                experiment = %experiment,
                error = %format!("{err:#}"),
                "job status query failed; retrying next tick"
            );
            return;
        }
    };

    let pending = {
        let guard = lock_state(state);
        pending_submissions(&statuses, &guard.tracker)
    };

    for submission_id in pending {
        let result = match service.tool_result(experiment, submission_id).await {
            Ok(result) => result,
            Err(err) => {
                let attempts = fetch_attempts.entry(submission_id).or_insert(0);
                *attempts += 1;
                if *attempts >= MAX_FETCH_ATTEMPTS {
                    warn!(
                        submission = %submission_id,
                        attempts = *attempts,
                        error = %format!("{err:#}"),
                        "giving up on result fetch"
                    );
                    lock_state(state).tracker.mark_handled(submission_id);
                    fetch_attempts.remove(&submission_id);
                } else {
                    warn!(
                        submission = %submission_id,
                        attempts = *attempts,
                        error = %format!("{err:#}"),
                        "result fetch failed; retrying next tick"
                    );
                }
                continue;
            }
        };
        fetch_attempts.remove(&submission_id);

        // Marking and reconciling happen under one lock acquisition, so two
        // reconciliations can never interleave their view of the current
        // slot.
        let mut guard = lock_state(state);
        let st = &mut *guard;
        st.tracker.mark_handled(submission_id);
        let outcome = reconcile(&mut st.results, result);
        debug!(submission = %submission_id, ?outcome, "reconciled tool result");
    }

    if let Some(current) = lock_state(state).results.current_mut() {
        current.visible = true;
    }
}

/// Successful terminal jobs not yet handled, oldest submission first so a
/// backlog promotes each result at most once on its way to the newest.
fn pending_submissions(statuses: &[JobStatus], tracker: &SubmissionTracker) -> Vec<SubmissionId> {
    let mut pending: Vec<SubmissionId> = statuses
        .iter()
        .filter(|st| st.is_successful() && !tracker.is_handled(st.submission_id))
        .map(|st| st.submission_id)
        .collect();
    pending.sort_unstable();
    pending.dedup();
    pending
}

#[cfg(test)]
#[path = "tests/monitor_tests.rs"]
mod tests;
