//! E2E 測試 - 使用 ffmpeg 產生的測試影片驗證完整流程
//!
//! 需要 ffmpeg 與 ffprobe，找不到時跳過

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stream_mosaic::component::StreamManager;
use stream_mosaic::component::stream_manager::{ManagerOptions, StreamError};
use stream_mosaic::config::FfmpegSettings;
use stream_mosaic::tools::{FfmpegSource, SystemClock, VideoSource, probe_stream};

fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|bin| {
        Command::new(bin)
            .arg("-version")
            .output()
            .is_ok_and(|o| o.status.success())
    })
}

/// 產生 2 秒、10fps、160x120 的測試影片
fn generate_clip(path: &Path) {
    let status = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=160x120:rate=10:duration=2",
            "-pix_fmt",
            "yuv420p",
            "-y",
        ])
        .arg(path)
        .status()
        .unwrap();
    assert!(status.success(), "無法產生測試影片");
}

fn manager_for(data_root: &Path) -> StreamManager {
    StreamManager::new(
        Arc::new(FfmpegSource::new(FfmpegSettings::default())),
        Arc::new(SystemClock::new()),
        ManagerOptions {
            data_root: data_root.to_path_buf(),
            default_interval: Duration::from_millis(20),
            termination_grace: Duration::from_millis(500),
            ..ManagerOptions::default()
        },
    )
}

#[test]
fn test_ffmpeg_source_reads_all_frames() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg/ffprobe");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.mp4");
    generate_clip(&clip);

    let clip_location = clip.to_string_lossy().to_string();
    let info = probe_stream("ffprobe", &clip_location, "udp").unwrap();
    assert_eq!((info.width, info.height), (160, 120));

    let source = FfmpegSource::new(FfmpegSettings::default());
    let mut reader = source.open(&clip_location).unwrap();
    let mut count = 0;
    while let Some(frame) = reader.read_frame().unwrap() {
        assert_eq!(frame.dimensions(), (160, 120));
        count += 1;
    }
    // 2 秒 x 10fps，容許編碼器在結尾多或少一格
    assert!((19..=21).contains(&count), "讀到 {count} 張影格");
}

#[test]
fn test_local_clip_produces_full_grid() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg/ffprobe");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    generate_clip(&dir.path().join("clip.mp4"));

    let manager = manager_for(dir.path());
    // 只給檔名，應解析到 data_root 底下的本地檔案
    let id = manager.start("clip.mp4", None).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while manager.status(&id).unwrap().alive && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(manager.status(&id).unwrap().summary.frames_captured >= 9);

    let jpeg = manager.stop(&id).unwrap();
    let mosaic = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((mosaic.width(), mosaic.height()), (900, 900));
}

#[test]
fn test_missing_file_is_empty_capture() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg/ffprobe");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let manager = manager_for(dir.path());
    let id = manager.start("missing.mp4", None).unwrap();

    std::thread::sleep(Duration::from_millis(300));
    assert!(matches!(manager.stop(&id), Err(StreamError::EmptyCapture)));
}
