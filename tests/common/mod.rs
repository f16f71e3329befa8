use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use stackview::model::{
    ExperimentId, JobState, JobStatus, SubmissionId, Tool, ToolResult,
};
use stackview::remote::{SubmitRequest, ToolService};

pub fn experiment() -> ExperimentId {
    ExperimentId("exp-1".to_string())
}

pub fn result(id: u64) -> ToolResult {
    ToolResult {
        submission_id: SubmissionId(id),
        tool_name: "clustering".to_string(),
        name: format!("result-{id}"),
        result_type: None,
        payload: serde_json::Value::Null,
        visible: false,
    }
}

pub fn terminated(id: u64) -> JobStatus {
    JobStatus {
        submission_id: SubmissionId(id),
        state: JobState::Terminated,
        exitcode: Some(0),
    }
}

pub fn running(id: u64) -> JobStatus {
    JobStatus {
        submission_id: SubmissionId(id),
        state: JobState::Running,
        exitcode: None,
    }
}

pub fn failed(id: u64) -> JobStatus {
    JobStatus {
        submission_id: SubmissionId(id),
        state: JobState::Terminated,
        exitcode: Some(1),
    }
}

/// Scripted stand-in for the server-side tool API.
///
/// Status polls pop scripted snapshots front-first; once the script runs
/// out, the last snapshot repeats (a quiet server keeps reporting the same
/// terminal jobs). Result fetches and submits can be made to fail a set
/// number of times to exercise the retry paths.
#[derive(Default)]
pub struct ScriptedToolService {
    script: Mutex<Vec<Vec<JobStatus>>>,
    last_snapshot: Mutex<Vec<JobStatus>>,
    results: Mutex<HashMap<SubmissionId, ToolResult>>,
    fetch_failures: Mutex<HashMap<SubmissionId, u32>>,
    status_failures: Mutex<u32>,
    fail_submits: AtomicBool,

    status_calls: AtomicUsize,
    fetch_calls: Mutex<HashMap<SubmissionId, usize>>,
    submissions: Mutex<Vec<SubmitRequest>>,
}

impl ScriptedToolService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_statuses(&self, statuses: Vec<JobStatus>) {
        self.script.lock().unwrap().push(statuses);
    }

    pub fn insert_result(&self, result: ToolResult) {
        self.results
            .lock()
            .unwrap()
            .insert(result.submission_id, result);
    }

    /// The next `times` fetches of `id` fail before fetches succeed again.
    pub fn fail_fetches(&self, id: SubmissionId, times: u32) {
        self.fetch_failures.lock().unwrap().insert(id, times);
    }

    /// The next `times` status queries fail.
    pub fn fail_statuses(&self, times: u32) {
        *self.status_failures.lock().unwrap() = times;
    }

    pub fn fail_submits(&self, fail: bool) {
        self.fail_submits.store(fail, Ordering::SeqCst);
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self, id: SubmissionId) -> usize {
        self.fetch_calls.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    pub fn submissions(&self) -> Vec<SubmitRequest> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolService for ScriptedToolService {
    async fn submit_tool(&self, _experiment: &ExperimentId, request: SubmitRequest) -> Result<()> {
        if self.fail_submits.load(Ordering::SeqCst) {
            return Err(anyhow!("scripted submit failure"));
        }
        self.submissions.lock().unwrap().push(request);
        Ok(())
    }

    async fn job_statuses(&self, _experiment: &ExperimentId) -> Result<Vec<JobStatus>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut failures = self.status_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(anyhow!("scripted status failure"));
            }
        }
        let mut script = self.script.lock().unwrap();
        let snapshot = if script.is_empty() {
            self.last_snapshot.lock().unwrap().clone()
        } else {
            let snapshot = script.remove(0);
            *self.last_snapshot.lock().unwrap() = snapshot.clone();
            snapshot
        };
        Ok(snapshot)
    }

    async fn tool_result(
        &self,
        _experiment: &ExperimentId,
        submission_id: SubmissionId,
    ) -> Result<ToolResult> {
        *self.fetch_calls.lock().unwrap().entry(submission_id).or_insert(0) += 1;
        {
            let mut failures = self.fetch_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&submission_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(anyhow!("scripted fetch failure"));
                }
            }
        }
        self.results
            .lock()
            .unwrap()
            .get(&submission_id)
            .cloned()
            .ok_or_else(|| anyhow!("no scripted result for submission {}", submission_id))
    }

    async fn tools(&self) -> Result<Vec<Tool>> {
        Ok(vec![Tool {
            name: "clustering".to_string(),
            description: "k-means over selected features".to_string(),
            icon: None,
        }])
    }
}
