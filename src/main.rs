use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use stream_mosaic::component::StreamManager;
use stream_mosaic::component::stream_manager::ManagerOptions;
use stream_mosaic::config::{DEFAULT_SETTINGS_PATH, Settings, save_settings};
use stream_mosaic::signal::setup_shutdown_signal;
use stream_mosaic::tools::{FfmpegSource, SystemClock};
use stream_mosaic::{init, server};

#[derive(Parser)]
#[command(version, about = "串流亮度縮圖拼貼服務")]
struct Cli {
    /// 設定檔路徑
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 啟動 HTTP 伺服器（預設）
    Serve {
        /// 覆寫設定檔中的監聽位址
        #[arg(long)]
        bind: Option<String>,
    },
    /// 寫出目前設定（不存在時為預設值）到設定檔
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::InitConfig => {
            save_settings(&settings, &cli.config)?;
            println!("設定已寫入 {}", cli.config.display());
            Ok(())
        }
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                settings.bind_address = bind;
            }
            serve(settings).await
        }
    }
}

async fn serve(settings: Settings) -> Result<()> {
    let log_path = init::init(&settings.log_dir)?;
    info!("日誌檔案: {}", log_path.display());

    let shutdown_signal = setup_shutdown_signal()?;
    let manager = Arc::new(StreamManager::new(
        Arc::new(FfmpegSource::new(settings.ffmpeg.clone())),
        Arc::new(SystemClock::new()),
        ManagerOptions::from_settings(&settings),
    ));

    server::run(&settings, manager, shutdown_signal).await?;

    info!("Program exited normally");
    Ok(())
}
