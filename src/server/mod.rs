//! HTTP 控制介面
//!
//! 對外提供 start / list / status / stop / stop-all，實際邏輯都在
//! [`StreamManager`]。

mod routes;

pub use routes::{AppState, router};

use crate::component::StreamManager;
use crate::config::Settings;
use crate::signal::ShutdownSignal;
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;

/// 啟動伺服器直到收到關閉信號，結束前停止所有串流
pub async fn run(
    settings: &Settings,
    manager: Arc<StreamManager>,
    shutdown_signal: ShutdownSignal,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&settings.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", settings.bind_address))?;

    info!("伺服器啟動: http://{}", settings.bind_address);
    info!("本地影片目錄: {}", settings.data_root.display());

    let app = router(AppState::new(Arc::clone(&manager)));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown_signal.wait().await })
        .await
        .context("Server error")?;

    info!("伺服器已停止，釋放所有串流");
    let results = tokio::task::spawn_blocking(move || manager.stop_all())
        .await
        .context("停止串流時發生錯誤")?;
    let failed = results.values().filter(|outcome| !outcome.is_stopped()).count();
    info!("已停止 {} 個串流，失敗 {failed} 個", results.len());

    Ok(())
}
