use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the server when a tool job is submitted.
/// Ids are allocated in submission order, so a higher id is a more
/// recent submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperimentId(pub String);

impl ExperimentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn make_uuid() -> anyhow::Result<String> {
    // 16 bytes of entropy, hex-encoded.
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("getrandom: {:?}", e))?;
    let mut out = String::with_capacity(32);
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}

/// One client-side tool session; a session keeps its uuid across repeated
/// submissions so the server can group the jobs it spawned.
#[derive(Clone, Debug)]
pub struct ToolSession {
    pub uuid: SessionId,
    pub tool_name: String,
}

impl ToolSession {
    pub fn new(tool_name: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            uuid: SessionId(make_uuid()?),
            tool_name: tool_name.into(),
        })
    }
}

/// Server-side tool descriptor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub icon: Option<String>,
}

/// Decoded result of one completed tool job.
///
/// `visible` is runtime display state, never part of the wire form; a result
/// arrives hidden and is only shown once it occupies the current slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub submission_id: SubmissionId,
    pub tool_name: String,
    pub name: String,

    #[serde(default)]
    pub result_type: Option<String>,

    /// Tool-specific body, passed through to the embedding layer untouched.
    #[serde(default)]
    pub payload: serde_json::Value,

    #[serde(skip)]
    pub visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    New,
    Submitted,
    Running,
    Stopped,
    Terminating,
    Terminated,

    #[serde(other)]
    Unknown,
}

impl JobState {
    /// States in which the job's result is ready to be collected.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Terminating | JobState::Terminated)
    }
}

/// One entry of the server's job-status snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobStatus {
    pub submission_id: SubmissionId,
    pub state: JobState,

    #[serde(default)]
    pub exitcode: Option<i32>,
}

impl JobStatus {
    pub fn is_successful(&self) -> bool {
        self.state.is_terminal() && self.exitcode == Some(0)
    }
}

/// The (time point, z-plane) coordinate shared by every channel of a viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaneState {
    pub tpoint: u32,
    pub zplane: u32,
}

/// Plane range a channel's layers cover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaneBounds {
    pub min_tpoint: u32,
    pub max_tpoint: u32,
    pub min_zplane: u32,
    pub max_zplane: u32,
}

/// One image channel of the viewport. Rendering is out of scope here; the
/// channel only tracks which plane its layers should display.
#[derive(Clone, Debug)]
pub struct Channel {
    pub name: String,
    pub bounds: PlaneBounds,
    plane: PlaneState,
}

impl Channel {
    pub fn new(name: impl Into<String>, bounds: PlaneBounds) -> Self {
        Self {
            name: name.into(),
            bounds,
            plane: PlaneState::default(),
        }
    }

    /// Pure local mutation; layers pick the new plane up on the next redraw.
    pub fn set_plane(&mut self, zplane: u32, tpoint: u32) {
        self.plane = PlaneState { tpoint, zplane };
    }

    pub fn plane(&self) -> PlaneState {
        self.plane
    }
}
