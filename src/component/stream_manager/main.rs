use super::capture_worker::{CaptureJob, CaptureWorker};
use super::frame_buffer::FrameBuffer;
use super::types::{StopOutcome, StreamError, StreamRecord, StreamStatus, StreamSummary};
use crate::component::thumbnail_mosaic::{
    DEFAULT_JPEG_QUALITY, MAX_TILES, compose_mosaic, grid_side, rank_by_brightness,
};
use crate::config::Settings;
use crate::tools::{Clock, Frame, VideoSource};
use log::{error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub data_root: PathBuf,
    pub default_interval: Duration,
    pub termination_grace: Duration,
    pub jpeg_quality: u8,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            default_interval: Duration::from_secs(1),
            termination_grace: Duration::from_millis(500),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ManagerOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            data_root: settings.data_root.clone(),
            default_interval: settings.default_capture_interval(),
            termination_grace: settings.termination_grace(),
            jpeg_quality: settings.jpeg_quality,
        }
    }
}

/// 串流生命週期管理
///
/// 持有全部串流的登錄表。所有對登錄表的讀寫都在同一把鎖內完成，
/// 而 join 執行緒、排序與編碼都在鎖外進行。
pub struct StreamManager {
    streams: Mutex<HashMap<String, StreamRecord>>,
    source: Arc<dyn VideoSource>,
    clock: Arc<dyn Clock>,
    options: ManagerOptions,
}

impl StreamManager {
    pub fn new(source: Arc<dyn VideoSource>, clock: Arc<dyn Clock>, options: ManagerOptions) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            source,
            clock,
            options,
        }
    }

    fn streams(&self) -> MutexGuard<'_, HashMap<String, StreamRecord>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn normalize_interval(&self, requested_secs: Option<f64>) -> Duration {
        requested_secs
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|interval| !interval.is_zero())
            .unwrap_or(self.options.default_interval)
    }

    /// 開始擷取新串流並回傳其 id
    ///
    /// 不檢查來源是否可讀；無法開啟的來源只會表現為 0 張影格。
    pub fn start(&self, source: &str, interval_secs: Option<f64>) -> Result<String, StreamError> {
        let interval = self.normalize_interval(interval_secs);

        // 執行緒在鎖外建立，鎖內只做 id 檢查與插入
        loop {
            let stream_id = Uuid::new_v4().to_string();
            let buffer = Arc::new(FrameBuffer::new());
            let started_at = self.clock.now();
            let job = CaptureJob {
                stream_id: stream_id.clone(),
                source: source.to_string(),
                interval,
                data_root: self.options.data_root.clone(),
            };
            let mut worker = CaptureWorker::spawn(
                job,
                Arc::clone(&self.source),
                Arc::clone(&self.clock),
                Arc::clone(&buffer),
            )
            .map_err(StreamError::WorkerSpawn)?;

            {
                let mut streams = self.streams();
                if !streams.contains_key(&stream_id) {
                    streams.insert(
                        stream_id.clone(),
                        StreamRecord {
                            source: source.to_string(),
                            started_at,
                            buffer,
                            worker,
                        },
                    );
                    drop(streams);

                    info!(
                        "已建立串流 {stream_id}: {source}（間隔 {:.3}s）",
                        interval.as_secs_f64()
                    );
                    return Ok(stream_id);
                }
            }

            warn!("串流 id {stream_id} 重複，重新產生");
            if let Err(e) = worker.terminate(self.options.termination_grace) {
                warn!("重複 id 的擷取執行緒異常結束: {e:#}");
            }
        }
    }

    fn summarize(&self, record: &StreamRecord) -> StreamSummary {
        StreamSummary {
            frames_captured: record.buffer.len(),
            source: record.source.clone(),
            running_time_secs: self.clock.now().saturating_sub(record.started_at).as_secs_f64(),
        }
    }

    /// 列出擷取執行緒仍在運作的串流
    pub fn list(&self) -> BTreeMap<String, StreamSummary> {
        let active: BTreeMap<_, _> = self
            .streams()
            .iter()
            .filter(|(_, record)| record.worker.is_alive())
            .map(|(id, record)| (id.clone(), self.summarize(record)))
            .collect();

        info!("目前有 {} 個運作中的串流", active.len());
        active
    }

    pub fn status(&self, stream_id: &str) -> Result<StreamStatus, StreamError> {
        let streams = self.streams();
        let record = streams
            .get(stream_id)
            .ok_or_else(|| StreamError::NotFound(stream_id.to_string()))?;

        Ok(StreamStatus {
            summary: self.summarize(record),
            alive: record.worker.is_alive(),
        })
    }

    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.streams().len()
    }

    /// 停止串流並回傳最亮影格組成的 JPEG 拼貼
    ///
    /// 無論成功與否，串流都會從登錄表移除。
    pub fn stop(&self, stream_id: &str) -> Result<Vec<u8>, StreamError> {
        info!("停止串流 {stream_id}");

        let Some(mut record) = self.streams().remove(stream_id) else {
            warn!("找不到串流 {stream_id}");
            return Err(StreamError::NotFound(stream_id.to_string()));
        };

        if record.worker.is_alive() {
            info!("終止串流 {stream_id} 的擷取執行緒");
        }
        if let Err(e) = record.worker.terminate(self.options.termination_grace) {
            warn!("串流 {stream_id} 的擷取執行緒異常結束: {e:#}");
        }

        let frame_count = record.buffer.len();
        info!("串流 {stream_id} 共擷取 {frame_count} 張影格");

        if frame_count == 0 {
            warn!("串流 {stream_id} 沒有擷取到任何影格");
            return Err(StreamError::EmptyCapture);
        }

        let frames = record.buffer.snapshot();
        drop(record);

        let ranked = rank_by_brightness(&frames, MAX_TILES);
        let top_frames: Vec<&Frame> = ranked.indices.iter().map(|&i| frames[i].as_ref()).collect();

        let side = grid_side(top_frames.len());
        info!(
            "串流 {stream_id} 建立 {side}x{side} 網格，共 {} 張影格",
            top_frames.len()
        );

        let mosaic = compose_mosaic(&top_frames, self.options.jpeg_quality).map_err(|e| {
            error!("串流 {stream_id} 拼貼圖編碼失敗: {e}");
            StreamError::from(e)
        })?;

        info!("串流 {stream_id} 拼貼圖完成（{} bytes）", mosaic.len());
        Ok(mosaic)
    }

    /// 停止全部串流，不產生拼貼圖
    ///
    /// 單一串流終止失敗不影響其他串流；結束後登錄表一定是空的。
    pub fn stop_all(&self) -> BTreeMap<String, StopOutcome> {
        let records = std::mem::take(&mut *self.streams());
        info!("停止所有串流，共 {} 個", records.len());

        let mut results = BTreeMap::new();
        for (stream_id, mut record) in records {
            let outcome = match record.worker.terminate(self.options.termination_grace) {
                Ok(()) => StopOutcome::Stopped,
                Err(e) => {
                    error!("停止串流 {stream_id} 失敗: {e:#}");
                    StopOutcome::Error(format!("{e:#}"))
                }
            };
            results.insert(stream_id, outcome);
        }

        info!("已清除 {} 個串流", results.len());
        results
    }
}
