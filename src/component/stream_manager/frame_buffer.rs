use crate::tools::Frame;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 擷取執行緒與管理者共用的影格緩衝區
///
/// 只允許附加；讀取端取得的是當下內容的快照。
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Mutex<Vec<Arc<Frame>>>,
}

impl FrameBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn frames(&self) -> MutexGuard<'_, Vec<Arc<Frame>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 附加一張影格並回傳附加後的數量
    pub fn push(&self, frame: Frame) -> usize {
        let mut frames = self.frames();
        frames.push(Arc::new(frame));
        frames.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames().is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Frame>> {
        self.frames().clone()
    }
}
