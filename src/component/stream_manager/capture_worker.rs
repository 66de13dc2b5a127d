use super::frame_buffer::FrameBuffer;
use crate::tools::{AbortHandle, Clock, VideoSource, resolve_source_location};
use anyhow::{Result, anyhow};
use log::{error, info, warn};
use std::any::Any;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 擷取迴圈檢查停止信號的最大間隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 每累積多少張影格記錄一次進度
const PROGRESS_LOG_EVERY: usize = 10;

/// 單一串流的擷取參數
#[derive(Debug, Clone)]
pub struct CaptureJob {
    pub stream_id: String,
    pub source: String,
    pub interval: Duration,
    pub data_root: PathBuf,
}

/// 執行中的擷取執行緒
///
/// 終止流程：設定停止信號 → 等待寬限時間 → 透過來源的 abort handle
/// 強制中斷讀取 → 無限期 join。`terminate` 回傳後緩衝區不會再被寫入。
pub struct CaptureWorker {
    stream_id: String,
    stop_signal: Arc<AtomicBool>,
    abort_slot: Arc<Mutex<Option<AbortHandle>>>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    pub fn spawn(
        job: CaptureJob,
        source: Arc<dyn VideoSource>,
        clock: Arc<dyn Clock>,
        buffer: Arc<FrameBuffer>,
    ) -> io::Result<Self> {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let abort_slot = Arc::new(Mutex::new(None));
        let stream_id = job.stream_id.clone();
        let short_id = stream_id.get(..8).unwrap_or(&stream_id);

        let handle = {
            let stop_signal = Arc::clone(&stop_signal);
            let abort_slot = Arc::clone(&abort_slot);
            thread::Builder::new()
                .name(format!("capture-{short_id}"))
                .spawn(move || {
                    capture_loop(
                        &job,
                        source.as_ref(),
                        clock.as_ref(),
                        &buffer,
                        &stop_signal,
                        &abort_slot,
                    );
                })?
        };

        Ok(Self {
            stream_id,
            stop_signal,
            abort_slot,
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 停止擷取並等待執行緒完全結束
    ///
    /// 執行緒 panic 時回傳錯誤；無論結果如何，回傳後執行緒都已結束。
    pub fn terminate(&mut self, grace: Duration) -> Result<()> {
        self.stop_signal.store(true, Ordering::SeqCst);

        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let deadline = Instant::now() + grace;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }

        if !handle.is_finished() {
            let abort = self
                .abort_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(abort) = abort {
                warn!("串流 {} 未在寬限時間內停止，強制中斷讀取", self.stream_id);
                abort.abort();
            }
        }

        handle.join().map_err(|payload| {
            anyhow!("capture worker panicked: {}", panic_message(payload.as_ref()))
        })
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// 依固定間隔取樣：距離上次取樣滿 `interval` 才讀下一格
///
/// 開啟失敗、讀取失敗或串流結束都只會結束迴圈，不會重試。
pub(crate) fn capture_loop(
    job: &CaptureJob,
    source: &dyn VideoSource,
    clock: &dyn Clock,
    buffer: &FrameBuffer,
    stop_signal: &AtomicBool,
    abort_slot: &Mutex<Option<AbortHandle>>,
) {
    let stream_id = job.stream_id.as_str();
    info!("開始擷取串流 {stream_id}");

    let location = resolve_source_location(&job.data_root, &job.source);
    let mut reader = match source.open(&location) {
        Ok(reader) => reader,
        Err(e) => {
            error!("串流 {stream_id} 無法開啟來源 {}: {e:#}", job.source);
            return;
        }
    };
    *abort_slot.lock().unwrap_or_else(PoisonError::into_inner) = reader.abort_handle();

    let mut last_sample: Option<Duration> = None;

    while !stop_signal.load(Ordering::SeqCst) {
        let now = clock.now();
        if let Some(last) = last_sample {
            let elapsed = now.saturating_sub(last);
            if elapsed < job.interval {
                clock.sleep((job.interval - elapsed).min(POLL_INTERVAL));
                continue;
            }
        }

        last_sample = Some(now);
        match reader.read_frame() {
            Ok(Some(frame)) => {
                let count = buffer.push(frame);
                if count % PROGRESS_LOG_EVERY == 0 {
                    info!("串流 {stream_id}: 已擷取 {count} 張影格");
                }
            }
            Ok(None) => {
                info!("串流 {stream_id} 已結束");
                break;
            }
            Err(e) => {
                warn!("串流 {stream_id} 讀取影格失敗: {e:#}");
                break;
            }
        }
    }

    *abort_slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    drop(reader);
    info!("關閉串流 {stream_id} 的擷取");
}
