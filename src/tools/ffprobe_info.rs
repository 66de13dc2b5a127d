use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<f64>,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    streams: Option<Vec<StreamEntry>>,
}

#[derive(Deserialize)]
struct StreamEntry {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

/// 使用 ffprobe 取得串流的視訊尺寸
pub fn probe_stream(ffprobe: &str, location: &str, rtsp_transport: &str) -> Result<StreamInfo> {
    let mut command = Command::new(ffprobe);
    command.args(["-v", "quiet", "-print_format", "json", "-show_streams"]);
    if is_rtsp(location) {
        command.args(["-rtsp_transport", rtsp_transport]);
    }

    let output = command
        .arg(location)
        .output()
        .with_context(|| format!("無法執行 ffprobe: {location}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe 執行失敗: {}", stderr.trim());
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("無法解析串流資訊: {location}"))
}

fn parse_probe_output(raw: &str) -> Result<StreamInfo> {
    let probe: FfprobeOutput = serde_json::from_str(raw).context("無法解析 ffprobe 輸出")?;

    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or_else(|| anyhow::anyhow!("找不到視訊串流"))?;

    let width = video_stream
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| anyhow::anyhow!("無法取得影片寬度"))?;
    let height = video_stream
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| anyhow::anyhow!("無法取得影片高度"))?;

    let frame_rate = video_stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate);

    Ok(StreamInfo {
        width,
        height,
        frame_rate,
    })
}

pub fn is_rtsp(location: &str) -> bool {
    location.starts_with("rtsp://") || location.starts_with("rtsps://")
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok()
}
