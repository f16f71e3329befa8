//! Wire types for the tool API. The server wraps every payload in a `data`
//! envelope.

use serde::{Deserialize, Serialize};

use crate::model::SessionId;

#[derive(Debug, Deserialize)]
pub(super) struct DataEnvelope<T> {
    pub(super) data: T,
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmitRequest {
    pub session_uuid: SessionId,
    pub tool_name: String,
    pub payload: serde_json::Value,
}
