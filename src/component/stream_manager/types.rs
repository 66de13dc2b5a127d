use super::capture_worker::CaptureWorker;
use super::frame_buffer::FrameBuffer;
use crate::component::thumbnail_mosaic::MosaicError;
use serde::{Serialize, Serializer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream {0} not found")]
    NotFound(String),
    #[error("no frames captured")]
    EmptyCapture,
    #[error("encode failed: {0}")]
    EncodeFailure(#[from] MosaicError),
    #[error("failed to spawn capture worker: {0}")]
    WorkerSpawn(#[source] io::Error),
}

/// 登錄表中的單一串流
pub(crate) struct StreamRecord {
    pub source: String,
    pub started_at: Duration,
    pub buffer: Arc<FrameBuffer>,
    pub worker: CaptureWorker,
}

/// `list` 回傳的串流摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSummary {
    pub frames_captured: usize,
    #[serde(rename = "url")]
    pub source: String,
    #[serde(rename = "running_time")]
    pub running_time_secs: f64,
}

/// 單一串流的狀態，包含已結束但尚未停止的串流
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamStatus {
    #[serde(flatten)]
    pub summary: StreamSummary,
    pub alive: bool,
}

/// `stop_all` 中每個串流的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    Error(String),
}

impl StopOutcome {
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

impl Serialize for StopOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
