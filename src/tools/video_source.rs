use anyhow::Result;
use image::RgbImage;
use std::fmt;
use std::sync::Arc;

/// 擷取到的單一影格（RGB8）
pub type Frame = RgbImage;

/// 影像來源：負責開啟串流，回傳可逐格讀取的 reader
pub trait VideoSource: Send + Sync {
    fn open(&self, location: &str) -> Result<Box<dyn FrameReader>>;
}

/// 已開啟的串流
///
/// `read_frame` 回傳 `Ok(None)` 代表串流結束。
/// 釋放資源由 `Drop` 負責。
pub trait FrameReader: Send {
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// 讓其他執行緒可以中斷卡在 `read_frame` 裡的讀取
    fn abort_handle(&self) -> Option<AbortHandle> {
        None
    }
}

/// 強制中斷讀取的把手，可跨執行緒複製
#[derive(Clone)]
pub struct AbortHandle(Arc<dyn Fn() + Send + Sync>);

impl AbortHandle {
    pub fn new(abort: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(abort))
    }

    pub fn abort(&self) {
        (self.0)();
    }
}

impl fmt::Debug for AbortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AbortHandle")
    }
}
