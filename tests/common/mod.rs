//! 測試用的模擬影像來源
//!
//! 來源字串決定行為：
//! - `fixture:<亮度,亮度,...>` 依序回傳指定亮度的灰階影格後結束
//! - `live` 持續產生影格直到被停止
//! - `panic` 第一次讀取時 panic
//! - 其他字串一律開啟失敗

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use image::Rgb;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use stream_mosaic::component::StreamManager;
use stream_mosaic::component::stream_manager::ManagerOptions;
use stream_mosaic::tools::{Frame, FrameReader, SystemClock, VideoSource};

pub struct MockSource;

impl VideoSource for MockSource {
    fn open(&self, location: &str) -> Result<Box<dyn FrameReader>> {
        if let Some(values) = location.strip_prefix("fixture:") {
            let values = values
                .split(',')
                .map(|v| v.trim().parse::<u8>())
                .collect::<Result<VecDeque<_>, _>>()?;
            return Ok(Box::new(FixtureReader { values }));
        }

        match location {
            "live" => Ok(Box::new(LiveReader { next: 0 })),
            "panic" => Ok(Box::new(PanickingReader)),
            _ => Err(anyhow!("unreachable source: {location}")),
        }
    }
}

pub fn gray_frame(value: u8) -> Frame {
    Frame::from_pixel(32, 24, Rgb([value, value, value]))
}

struct FixtureReader {
    values: VecDeque<u8>,
}

impl FrameReader for FixtureReader {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.values.pop_front().map(gray_frame))
    }
}

struct LiveReader {
    next: u8,
}

impl FrameReader for LiveReader {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        thread::sleep(Duration::from_millis(2));
        self.next = self.next.wrapping_add(17);
        Ok(Some(gray_frame(self.next)))
    }
}

struct PanickingReader;

impl FrameReader for PanickingReader {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        panic!("mock decoder crashed");
    }
}

pub fn fixture(values: &[u8]) -> String {
    let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("fixture:{}", joined.join(","))
}

/// 預設擷取間隔縮短為 5ms，避免測試等待過久
pub fn test_manager() -> StreamManager {
    StreamManager::new(
        Arc::new(MockSource),
        Arc::new(SystemClock::new()),
        ManagerOptions {
            data_root: "/nonexistent/stream_mosaic".into(),
            default_interval: Duration::from_millis(5),
            termination_grace: Duration::from_millis(200),
            ..ManagerOptions::default()
        },
    )
}

pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// 等待串流的擷取執行緒自然結束
pub fn wait_for_exit(manager: &StreamManager, stream_id: &str) {
    let exited = wait_until(Duration::from_secs(5), || {
        manager.status(stream_id).is_ok_and(|status| !status.alive)
    });
    assert!(exited, "串流 {stream_id} 未在時限內結束");
}

/// 取得拼貼圖中第 `index` 格（由左至右、由上至下）中心的亮度
pub fn tile_center_value(mosaic: &image::RgbImage, side: u32, index: u32) -> u8 {
    let tile = mosaic.width() / side;
    let x = (index % side) * tile + tile / 2;
    let y = (index / side) * tile + tile / 2;
    mosaic.get_pixel(x, y)[0]
}
