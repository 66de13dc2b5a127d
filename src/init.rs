use crate::tools::ensure_directory_exists;
use anyhow::{Context, Result};
use chrono::Local;
use env_logger::{Builder, Env, Target};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// 初始化 logger：同時輸出到 stderr 與 `<log_dir>/log_<時間>.log`
///
/// 預設等級 info，可用 `RUST_LOG` 覆寫。
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    ensure_directory_exists(log_dir)?;

    let log_path = log_dir.join(log_file_name(&Local::now()));
    let file = File::create(&log_path)
        .with_context(|| format!("無法建立日誌檔案: {}", log_path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {} - {}",
                buf.timestamp_millis(),
                record.target(),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init()
        .context("無法初始化 logger")?;

    Ok(log_path)
}

fn log_file_name(now: &chrono::DateTime<Local>) -> String {
    format!("log_{}.log", now.format("%Y-%m-%d_%H-%M-%S"))
}

struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // stderr 寫入失敗不應影響檔案紀錄
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(log_file_name(&now), "log_2024-03-09_07-05-01.log");
    }

    #[test]
    fn test_tee_writer_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tee.log");
        let mut writer = TeeWriter {
            file: File::create(&path).unwrap(),
        };

        writer.write_all(b"hello log\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello log\n");
    }
}
