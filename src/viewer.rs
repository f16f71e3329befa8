//! The viewer: owns the result store, submission tracker, channels, and the
//! recurring job monitor for one experiment.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::model::{
    Channel, ExperimentId, PlaneState, SubmissionId, Tool, ToolResult, ToolSession, make_uuid,
};
use crate::monitor::JobMonitor;
use crate::remote::{SubmitRequest, ToolService};
use crate::results::{ResultStore, SubmissionTracker};

/// Everything a viewer mutates from both its UI surface and the polling
/// task. One mutex serializes all of it, so each reconciliation is a single
/// read-modify-write of the current slot.
#[derive(Debug, Default)]
pub struct ViewerState {
    pub results: ResultStore,
    pub tracker: SubmissionTracker,
    pub channels: Vec<Channel>,
    pub plane: PlaneState,
}

pub(crate) fn lock_state(state: &Mutex<ViewerState>) -> MutexGuard<'_, ViewerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Viewer {
    id: String,
    experiment: ExperimentId,
    service: Arc<dyn ToolService>,
    state: Arc<Mutex<ViewerState>>,
    monitor: Option<JobMonitor>,
}

impl Viewer {
    pub fn new(experiment: ExperimentId, service: Arc<dyn ToolService>) -> Result<Self> {
        Ok(Self {
            id: make_uuid().context("generate viewer id")?,
            experiment,
            service,
            state: Arc::new(Mutex::new(ViewerState::default())),
            monitor: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn experiment(&self) -> &ExperimentId {
        &self.experiment
    }

    pub async fn tools(&self) -> Result<Vec<Tool>> {
        self.service.tools().await
    }

    // --- result surface ---

    pub fn current_result(&self) -> Option<ToolResult> {
        lock_state(&self.state).results.current().cloned()
    }

    pub fn saved_results(&self) -> Vec<ToolResult> {
        lock_state(&self.state).results.saved().to_vec()
    }

    pub fn has_current_result(&self) -> bool {
        lock_state(&self.state).results.has_current()
    }

    pub fn set_current_result(&self, result: ToolResult) {
        lock_state(&self.state).results.set_current(result);
    }

    /// Archives the current result. Fails when no current result exists.
    pub fn save_current_result(&self) -> Result<()> {
        lock_state(&self.state).results.save_current()
    }

    pub fn delete_saved_result(&self, id: SubmissionId) -> Option<ToolResult> {
        lock_state(&self.state).results.delete_saved(id)
    }

    pub fn delete_current_result(&self) -> Option<ToolResult> {
        lock_state(&self.state).results.delete_current()
    }

    // --- channels and plane coordination ---

    /// Registers a channel. The channel is snapped to the viewer's plane on
    /// the way in so it can never lag behind the others.
    pub fn add_channel(&self, mut channel: Channel) {
        let mut st = lock_state(&self.state);
        channel.set_plane(st.plane.zplane, st.plane.tpoint);
        st.channels.push(channel);
    }

    pub fn channels(&self) -> Vec<Channel> {
        lock_state(&self.state).channels.clone()
    }

    pub fn current_tpoint(&self) -> u32 {
        lock_state(&self.state).plane.tpoint
    }

    pub fn current_zplane(&self) -> u32 {
        lock_state(&self.state).plane.zplane
    }

    /// Moves every channel to the new time point, keeping the current
    /// z-plane. The fan-out happens before the viewer records the new value;
    /// channel plane updates are pure local mutations, so the operation is
    /// total across channels.
    pub fn set_tpoint(&self, tpoint: u32) {
        let mut guard = lock_state(&self.state);
        let st = &mut *guard;
        for channel in &mut st.channels {
            channel.set_plane(st.plane.zplane, tpoint);
        }
        st.plane.tpoint = tpoint;
    }

    /// Moves every channel to the new z-plane, keeping the current time
    /// point.
    pub fn set_zplane(&self, zplane: u32) {
        let mut guard = lock_state(&self.state);
        let st = &mut *guard;
        for channel in &mut st.channels {
            channel.set_plane(zplane, st.plane.tpoint);
        }
        st.plane.zplane = zplane;
    }

    pub fn max_tpoint(&self) -> u32 {
        lock_state(&self.state)
            .channels
            .iter()
            .map(|ch| ch.bounds.max_tpoint)
            .max()
            .unwrap_or(0)
    }

    pub fn min_tpoint(&self) -> u32 {
        lock_state(&self.state)
            .channels
            .iter()
            .map(|ch| ch.bounds.min_tpoint)
            .min()
            .unwrap_or(0)
    }

    pub fn max_zplane(&self) -> u32 {
        lock_state(&self.state)
            .channels
            .iter()
            .map(|ch| ch.bounds.max_zplane)
            .max()
            .unwrap_or(0)
    }

    pub fn min_zplane(&self) -> u32 {
        lock_state(&self.state)
            .channels
            .iter()
            .map(|ch| ch.bounds.min_zplane)
            .min()
            .unwrap_or(0)
    }

    // --- submission and monitoring ---

    /// Starts a server-side tool job. `true` means the request round-tripped
    /// without transport error; whether the job succeeds is only learned
    /// later through polling.
    pub async fn send_tool_request(
        &self,
        session: &ToolSession,
        payload: serde_json::Value,
    ) -> bool {
        let request = SubmitRequest {
            session_uuid: session.uuid.clone(),
            tool_name: session.tool_name.clone(),
            payload,
        };
        match self.service.submit_tool(&self.experiment, request).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    experiment = %self.experiment,
                    tool = %session.tool_name,
                    error = %format!("{err:#}"),
                    "tool submit failed"
                );
                false
            }
        }
    }

    /// Starts the recurring job monitor, replacing a still-running one.
    pub async fn start_monitoring(&mut self, period: Duration) {
        self.stop_monitoring().await;
        self.monitor = Some(JobMonitor::spawn(
            self.service.clone(),
            self.state.clone(),
            self.experiment.clone(),
            period,
        ));
    }

    /// Stops the job monitor; once this returns no further tick can fire.
    pub async fn stop_monitoring(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.stop().await;
        }
    }

    /// Viewer teardown: cancels the polling task.
    pub async fn destroy(mut self) {
        self.stop_monitoring().await;
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        // Teardown without an await point: the task is aborted rather than
        // joined.
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
        }
    }
}
