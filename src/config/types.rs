use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegSettings {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// RTSP 來源使用的傳輸協定（udp 或 tcp）
    pub rtsp_transport: String,
}

impl Default for FfmpegSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            rtsp_transport: "udp".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_address: String,
    /// 本地影片檔案的根目錄，同名檔案優先於遠端 URL
    pub data_root: PathBuf,
    pub log_dir: PathBuf,
    pub default_capture_interval_secs: f64,
    /// 終止擷取執行緒時，強制中斷前的等待時間
    pub termination_grace_ms: u64,
    pub jpeg_quality: u8,
    pub ffmpeg: FfmpegSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            data_root: PathBuf::from("data"),
            log_dir: PathBuf::from("logs"),
            default_capture_interval_secs: 1.0,
            termination_grace_ms: 500,
            jpeg_quality: 95,
            ffmpeg: FfmpegSettings::default(),
        }
    }
}

impl Settings {
    /// 設定檔中的預設擷取間隔；不合法時退回 1 秒
    #[must_use]
    pub fn default_capture_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.default_capture_interval_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(1))
    }

    #[must_use]
    pub const fn termination_grace(&self) -> Duration {
        Duration::from_millis(self.termination_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"bind_address": "127.0.0.1:9000", "ffmpeg": {"rtsp_transport": "tcp"}}"#)
                .unwrap();

        assert_eq!(settings.bind_address, "127.0.0.1:9000");
        assert_eq!(settings.jpeg_quality, 95);
        assert_eq!(settings.ffmpeg.rtsp_transport, "tcp");
        assert_eq!(settings.ffmpeg.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_invalid_default_interval_falls_back() {
        let mut settings = Settings::default();
        assert_eq!(settings.default_capture_interval(), Duration::from_secs(1));

        settings.default_capture_interval_secs = -3.0;
        assert_eq!(settings.default_capture_interval(), Duration::from_secs(1));

        settings.default_capture_interval_secs = 0.25;
        assert_eq!(settings.default_capture_interval(), Duration::from_millis(250));
    }
}
