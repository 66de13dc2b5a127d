use super::ffprobe_info::{is_rtsp, probe_stream};
use super::video_source::{AbortHandle, Frame, FrameReader, VideoSource};
use crate::config::FfmpegSettings;
use anyhow::{Context, Result, anyhow};
use log::debug;
use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

/// 以 ffmpeg 子程序解碼的影像來源
///
/// 先用 ffprobe 取得尺寸，再讓 ffmpeg 以 rgb24 rawvideo 輸出到 stdout，
/// 每次讀取固定 `寬 x 高 x 3` 位元組即為一格。
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    settings: FfmpegSettings,
}

impl FfmpegSource {
    #[must_use]
    pub const fn new(settings: FfmpegSettings) -> Self {
        Self { settings }
    }

    fn build_command(&self, location: &str) -> Command {
        let mut command = Command::new(&self.settings.ffmpeg_path);
        command.args(["-hide_banner", "-loglevel", "error"]);
        if is_rtsp(location) {
            command.args(["-rtsp_transport", self.settings.rtsp_transport.as_str()]);
        }
        // ffprobe 回報的是未旋轉的尺寸，解碼輸出必須保持一致
        command
            .arg("-noautorotate")
            .arg("-i")
            .arg(location)
            .args(["-an", "-sn", "-dn", "-pix_fmt", "rgb24", "-f", "rawvideo", "-"]);
        command
    }
}

impl VideoSource for FfmpegSource {
    fn open(&self, location: &str) -> Result<Box<dyn FrameReader>> {
        let info = probe_stream(
            &self.settings.ffprobe_path,
            location,
            &self.settings.rtsp_transport,
        )?;
        debug!(
            "串流資訊 {location}: {}x{}, fps={:?}",
            info.width, info.height, info.frame_rate
        );

        let mut child = self
            .build_command(location)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("無法啟動 ffmpeg: {location}"))?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!("無法取得 ffmpeg stdout"));
        };

        Ok(Box::new(FfmpegReader {
            stdout,
            child: Arc::new(Mutex::new(child)),
            width: info.width,
            height: info.height,
        }))
    }
}

struct FfmpegReader {
    stdout: ChildStdout,
    child: Arc<Mutex<Child>>,
    width: u32,
    height: u32,
}

impl FfmpegReader {
    const fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl FrameReader for FfmpegReader {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut buffer = vec![0u8; self.frame_len()];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e).context("讀取 ffmpeg 輸出失敗"),
        }

        Frame::from_raw(self.width, self.height, buffer)
            .map(Some)
            .ok_or_else(|| anyhow!("影格大小不符: {}x{}", self.width, self.height))
    }

    fn abort_handle(&self) -> Option<AbortHandle> {
        let child = Arc::clone(&self.child);
        Some(AbortHandle::new(move || {
            let mut child = child.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = child.kill();
        }))
    }
}

impl Drop for FfmpegReader {
    fn drop(&mut self) {
        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = child.kill();
        let _ = child.wait();
    }
}
