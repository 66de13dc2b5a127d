//! 串流擷取與生命週期管理元件
//!
//! 每個串流由一條擷取執行緒依固定間隔取樣，影格存入共用緩衝區；
//! 停止時取最亮的影格組成拼貼圖。

mod capture_worker;
mod frame_buffer;
mod main;
mod types;

pub use capture_worker::{CaptureJob, CaptureWorker, POLL_INTERVAL};
pub use frame_buffer::FrameBuffer;
pub use main::{ManagerOptions, StreamManager};
pub use types::{StopOutcome, StreamError, StreamStatus, StreamSummary};
