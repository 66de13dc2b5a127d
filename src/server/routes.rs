use crate::component::StreamManager;
use crate::component::stream_manager::StreamError;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Form, FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<StreamManager>,
    pub start_time: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(manager: Arc<StreamManager>) -> Self {
        Self {
            manager,
            start_time: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start", post(handle_start))
        .route("/list", get(handle_list))
        .route("/status/{stream_id}", get(handle_status).post(handle_status))
        .route("/stop/{stream_id}", post(handle_stop))
        .route("/stop", post(handle_stop_all))
        .route("/health", get(handle_health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct StartForm {
    rtsp_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartQuery {
    capture_interval: Option<f64>,
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(_) => error_body(StatusCode::NOT_FOUND, "not found"),
            Self::EmptyCapture => error_body(StatusCode::BAD_REQUEST, "no frames captured"),
            Self::EncodeFailure(_) => error_body(StatusCode::INTERNAL_SERVER_ERROR, "encode failed"),
            Self::WorkerSpawn(_) => error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to spawn capture worker",
            ),
        }
    }
}

fn join_failure(e: &JoinError) -> Response {
    error!("背景工作失敗: {e}");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

/// 從 urlencoded 或 multipart 表單取出 `rtsp_url`
async fn read_rtsp_url(request: Request) -> Option<String> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let rtsp_url = if is_multipart {
        let mut multipart = Multipart::from_request(request, &()).await.ok()?;
        let mut found = None;
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some("rtsp_url") {
                found = field.text().await.ok();
                break;
            }
        }
        found
    } else {
        let Form(form) = Form::<StartForm>::from_request(request, &()).await.ok()?;
        form.rtsp_url
    };

    rtsp_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

async fn handle_start(
    State(state): State<AppState>,
    query: Result<Query<StartQuery>, QueryRejection>,
    request: Request,
) -> Response {
    info!("收到新的串流請求");

    let Ok(Query(query)) = query else {
        warn!("capture_interval 參數格式錯誤");
        return (StatusCode::BAD_REQUEST, "Invalid capture_interval").into_response();
    };

    let Some(rtsp_url) = read_rtsp_url(request).await else {
        warn!("請求缺少 RTSP URL");
        return (StatusCode::BAD_REQUEST, "Missing RTSP URL").into_response();
    };

    match state.manager.start(&rtsp_url, query.capture_interval) {
        Ok(stream_id) => Json(json!({
            "status": "Video stream started",
            "stream_id": stream_id,
        }))
        .into_response(),
        Err(e) => {
            error!("無法建立串流 {rtsp_url}: {e}");
            e.into_response()
        }
    }
}

async fn handle_list(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "active_streams": state.manager.list() }))
}

async fn handle_status(State(state): State<AppState>, Path(stream_id): Path<String>) -> Response {
    match state.manager.status(&stream_id) {
        Ok(status) => Json(status).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_stop(State(state): State<AppState>, Path(stream_id): Path<String>) -> Response {
    let manager = Arc::clone(&state.manager);
    match tokio::task::spawn_blocking(move || manager.stop(&stream_id)).await {
        Ok(Ok(jpeg)) => ([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => join_failure(&e),
    }
}

async fn handle_stop_all(State(state): State<AppState>) -> Response {
    let manager = Arc::clone(&state.manager);
    match tokio::task::spawn_blocking(move || manager.stop_all()).await {
        Ok(results) => Json(json!({ "results": results })).into_response(),
        Err(e) => join_failure(&e),
    }
}

async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "streams": state.manager.stream_count(),
    }))
}
