//! Ports to the server-side tool API, plus the reqwest client that speaks
//! the real REST surface.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::model::{ExperimentId, JobStatus, SubmissionId, Tool, ToolResult};

mod http_client;
mod types;

pub use self::types::SubmitRequest;

/// Narrow contract the viewer and job monitor consume. Implemented by
/// [`HttpToolClient`] in production and by scripted fakes in tests.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// Fire-and-forget start of a server-side job. `Ok` means the request
    /// round-tripped, not that the job will succeed.
    async fn submit_tool(&self, experiment: &ExperimentId, request: SubmitRequest) -> Result<()>;

    /// Snapshot of every known job for the experiment.
    async fn job_statuses(&self, experiment: &ExperimentId) -> Result<Vec<JobStatus>>;

    /// Full result body for one completed submission.
    async fn tool_result(
        &self,
        experiment: &ExperimentId,
        submission_id: SubmissionId,
    ) -> Result<ToolResult>;

    /// Descriptors of the tools the server offers.
    async fn tools(&self) -> Result<Vec<Tool>>;
}

pub struct HttpToolClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpToolClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("stackview")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("build reqwest client")?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
