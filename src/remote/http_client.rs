use super::*;

use super::types::DataEnvelope;

impl HttpToolClient {
    pub(super) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(super) fn ensure_ok(
        &self,
        resp: reqwest::Response,
        label: &str,
    ) -> Result<reqwest::Response> {
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("{} endpoint not found (check the server url and experiment id)", label);
        }
        resp.error_for_status()
            .with_context(|| format!("{} status", label))
    }

    async fn try_submit(&self, url: &str, request: &SubmitRequest) -> Result<()> {
        let resp = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .context("submit tool request")?;
        self.ensure_ok(resp, "submit tool")?;
        Ok(())
    }
}

#[async_trait]
impl ToolService for HttpToolClient {
    async fn submit_tool(&self, experiment: &ExperimentId, request: SubmitRequest) -> Result<()> {
        const ATTEMPTS: usize = 3;
        let url = self.url(&format!(
            "/api/experiments/{}/tools/request",
            experiment.as_str()
        ));
        let mut last: Option<anyhow::Error> = None;
        for i in 0..ATTEMPTS {
            match self.try_submit(&url, &request).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    last = Some(err);
                    if i + 1 < ATTEMPTS {
                        tokio::time::sleep(std::time::Duration::from_millis(200 * (1 << i))).await;
                    }
                }
            }
        }
        Err(last
            .unwrap_or_else(|| anyhow::anyhow!("unknown error"))
            .context("submit tool"))
    }

    async fn job_statuses(&self, experiment: &ExperimentId) -> Result<Vec<JobStatus>> {
        let url = self.url(&format!(
            "/api/experiments/{}/tools/status",
            experiment.as_str()
        ));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("query job statuses")?;
        let envelope: DataEnvelope<Vec<JobStatus>> = self
            .ensure_ok(resp, "job status")?
            .json()
            .await
            .context("parse job status response")?;
        Ok(envelope.data)
    }

    async fn tool_result(
        &self,
        experiment: &ExperimentId,
        submission_id: SubmissionId,
    ) -> Result<ToolResult> {
        let url = self.url(&format!(
            "/api/experiments/{}/tools/result?submission_id={}",
            experiment.as_str(),
            submission_id
        ));
        let resp = self.client.get(&url).send().await.context("fetch tool result")?;
        let envelope: DataEnvelope<ToolResult> = self
            .ensure_ok(resp, "tool result")?
            .json()
            .await
            .with_context(|| format!("parse result for submission {}", submission_id))?;
        Ok(envelope.data)
    }

    async fn tools(&self) -> Result<Vec<Tool>> {
        let resp = self
            .client
            .get(self.url("/api/tools"))
            .send()
            .await
            .context("list tools")?;
        let envelope: DataEnvelope<Vec<Tool>> = self
            .ensure_ok(resp, "list tools")?
            .json()
            .await
            .context("parse tools response")?;
        Ok(envelope.data)
    }
}
