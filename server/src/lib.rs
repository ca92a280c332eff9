pub mod config;
pub mod error;
pub mod registry;
pub mod validation;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info};

use cloning_core::{
    archive::ARCHIVE_FILE_NAME, EngineLoader, JobRequest, ModelCoordinator, ModelState,
    Orchestrator,
};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::registry::ArchiveRegistry;
use crate::validation::validate_process_request;

pub static START_TIME: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ModelCoordinator>,
    pub orchestrator: Arc<Orchestrator>,
    pub registry: Arc<ArchiveRegistry>,
    pub request_count: Arc<AtomicU64>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(loader: Arc<dyn EngineLoader>, config: ServerConfig) -> Self {
        let coordinator = Arc::new(ModelCoordinator::new(loader));
        let orchestrator = Arc::new(
            Orchestrator::new(coordinator.clone()).with_max_chunk_len(config.max_chunk_len),
        );
        let registry = Arc::new(ArchiveRegistry::new(config.archive_ttl()));
        Self {
            coordinator,
            orchestrator,
            registry,
            request_count: Arc::new(AtomicU64::new(0)),
            config,
        }
    }
}

/// Routes only; the middleware stack is applied by `main`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/status", get(model_status))
        .route("/process-voice", post(process_voice))
        .route("/download/{name}", get(download_archive))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
}

pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_loading: bool,
}

pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    let status = state.coordinator.status();
    Json(ServiceInfo {
        service: "Voice Cloning Backend",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        model_loaded: status.state == ModelState::Ready,
        model_loading: status.state == ModelState::Loading,
    })
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub model_loaded: bool,
    pub model_loading: bool,
    pub ready: bool,
}

pub async fn model_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.coordinator.status();
    Json(StatusResponse {
        model_loaded: status.state == ModelState::Ready,
        model_loading: status.state == ModelState::Loading,
        ready: status.is_ready,
    })
}

#[derive(Serialize)]
pub struct ProcessVoiceResponse {
    pub success: bool,
    pub message: String,
    pub files_generated: usize,
    pub download_path: String,
}

pub async fn process_voice(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessVoiceResponse>, ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let mut text_content: Option<String> = None;
    let mut voice_mode = "Single Speaker".to_string();
    let mut language = "en".to_string();
    let mut speaker_paths = Vec::new();

    // Uploaded reference recordings live only as long as this job.
    let upload_dir = tempfile::tempdir()
        .map_err(|e| ApiError::Internal(format!("failed to create upload directory: {e}")))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(format!("malformed multipart request: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("text_content") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Upload(format!("unreadable text_content: {e}")))?;
                text_content = Some(value);
            }
            Some("voice_mode") => {
                voice_mode = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Upload(format!("unreadable voice_mode: {e}")))?;
            }
            Some("language") => {
                language = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Upload(format!("unreadable language: {e}")))?;
            }
            Some("speaker_files") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Upload(format!("unreadable speaker file: {e}")))?;
                let path = upload_dir
                    .path()
                    .join(format!("speaker_{}.wav", speaker_paths.len() + 1));
                tokio::fs::write(&path, &data)
                    .await
                    .map_err(|e| ApiError::Internal(format!("failed to store upload: {e}")))?;
                speaker_paths.push(path);
            }
            _ => {}
        }
    }

    let text_content = text_content
        .ok_or_else(|| ApiError::InvalidInput("No text content provided".to_string()))?;
    validate_process_request(&text_content, &voice_mode, speaker_paths.len())?;

    info!(
        voice_mode = %voice_mode,
        speakers = speaker_paths.len(),
        text_len = text_content.len(),
        "processing voice cloning request"
    );

    // No streaming progress across the boundary; the fractions only show
    // up in the server log.
    let result = state
        .orchestrator
        .run(
            JobRequest {
                text: text_content,
                reference_audio: speaker_paths,
                language,
            },
            |progress| debug!(progress = progress as f64, "job progress"),
        )
        .await?;

    let files_generated = result.outputs.len();
    let job_id = state.registry.insert(result);

    Ok(Json(ProcessVoiceResponse {
        success: true,
        message: "Voice cloning completed successfully".to_string(),
        files_generated,
        download_path: format!("/download/{job_id}"),
    }))
}

pub async fn download_archive(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let result = state
        .registry
        .take(&name)
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    // Read before the result drops; dropping it deletes the files.
    let bytes = tokio::fs::read(&result.archive_path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to read archive: {e}")))?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub request_count: u64,
    pub uptime_seconds: u64,
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    let mut system = sysinfo::System::new();
    system.refresh_cpu();
    system.refresh_memory();

    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0);

    Json(MetricsResponse {
        cpu_usage_percent: system.global_cpu_info().cpu_usage(),
        memory_used_mb: system.used_memory() / 1024 / 1024,
        memory_total_mb: system.total_memory() / 1024 / 1024,
        request_count: state.request_count.load(Ordering::Relaxed),
        uptime_seconds: uptime,
    })
}
