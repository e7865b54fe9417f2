use serde::{Deserialize, Serialize};

use crate::wire::QosSample;

/// Events the listener broadcasts to application logic:
/// - `Ready` once the destination path is bound
/// - `Sample` for every decoded datagram
/// - `Error` for channel-level failures (e.g. bind failure)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum QosEvent {
    Ready { path: String },
    Sample { sample: QosSample, efficiency: f64 },
    Error { reason: String },
}
