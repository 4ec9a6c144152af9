//! HTTP control surface: every endpoint is a thin translation of a
//! request into a storage or player-controller call. All responses are
//! JSON; failures become `{"error": message}` at this boundary and never
//! propagate as unhandled faults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::paths;
use crate::player::PlayerController;
use crate::storage::{self, MediaFile, MediaKind};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    player: Arc<Mutex<PlayerController>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let player = PlayerController::new(
            config.player_command.clone(),
            config.playlist_path.clone(),
        );
        Self {
            config: Arc::new(config),
            player: Arc::new(Mutex::new(player)),
        }
    }
}

#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/videos", get(list_videos))
        .route("/api/videos/upload", post(upload_video))
        .route("/api/video/play", post(play_video))
        .route("/api/screen/clear", post(clear_screen))
        .route("/api/images", get(list_images))
        .route("/api/images/upload", post(upload_image))
        .route("/api/images/{filename}", get(serve_image))
        .route("/api/image/play", post(play_image))
        .route("/api/screensaver", post(activate_screensaver))
        .route("/api/status", get(get_status))
        .route("/api/execute", post(execute_command))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let addr = SocketAddr::new(
        config
            .bind_address
            .parse()
            .with_context(|| format!("invalid bind address '{}'", config.bind_address))?,
        config.port,
    );
    let router = app(AppState::new(config));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;
    info!(%addr, "kiosk server listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut term) = signal(SignalKind::terminate()) {
            term.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// JSON error envelope; every handler failure leaves as one of these.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) | Error::UnsupportedPlatform { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::CommandNotAllowed(_) => StatusCode::FORBIDDEN,
            Error::PlayerNotFound | Error::Launch(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn list_videos(State(state): State<AppState>) -> Result<Json<Vec<MediaFile>>, ApiError> {
    let videos = storage::list_files(&state.config.video_directory, MediaKind::Video)?;
    info!(count = videos.len(), "listed videos");
    Ok(Json(videos))
}

async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let (name, bytes) = read_upload_field(multipart, "video").await?;
    let stored = storage::save_upload(
        &state.config.video_directory,
        MediaKind::Video,
        &name,
        &bytes,
    )?;
    info!(name = %stored.name, "video uploaded");
    Ok(Json(json!({
        "status": "success",
        "message": "Video uploaded successfully",
        "path": stored.path,
        "name": stored.name,
    })))
}

#[derive(Debug, Deserialize)]
struct PlayVideoRequest {
    path: Option<PathBuf>,
    #[serde(default, rename = "loop")]
    looping: bool,
}

async fn play_video(
    State(state): State<AppState>,
    payload: Result<Json<PlayVideoRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::bad_request("No data provided"))?;
    let path = validate_play_path(
        request.path.as_deref(),
        &state.config.video_directory,
        MediaKind::Video,
        "video",
    )?;

    let mut player = state.player.lock().await;
    player.play_video(&path, request.looping).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Video playback started",
    })))
}

#[derive(Debug, Deserialize)]
struct PlayImageRequest {
    path: Option<PathBuf>,
}

async fn play_image(
    State(state): State<AppState>,
    payload: Result<Json<PlayImageRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::bad_request("No data provided"))?;
    let path = validate_play_path(
        request.path.as_deref(),
        &state.config.image_directory,
        MediaKind::Image,
        "image",
    )?;

    let mut player = state.player.lock().await;
    player.show_image(&path).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Image display started",
    })))
}

/// Shared validation for the play-by-path endpoints, checked in order:
/// path present, contained in the media root, existing on disk, and
/// carrying an allowed extension.
fn validate_play_path(
    path: Option<&Path>,
    root: &Path,
    kind: MediaKind,
    label: &str,
) -> Result<PathBuf, ApiError> {
    let Some(path) = path else {
        return Err(ApiError::bad_request(format!("No {label} path provided")));
    };
    let path = paths::lexical_absolute(path);
    if !paths::is_contained(&path, root) {
        warn!(path = %path.display(), root = %root.display(), "rejected path outside media root");
        return Err(ApiError::bad_request(format!("Invalid {label} path")));
    }
    if !path.exists() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("{} file not found", capitalize(label)),
        ));
    }
    if !kind.matches(&path) {
        return Err(ApiError::bad_request(format!("Invalid {label} file type")));
    }
    Ok(path)
}

async fn clear_screen(State(state): State<AppState>) -> Json<Value> {
    let mut player = state.player.lock().await;
    player.kill_all().await;
    Json(json!({
        "status": "success",
        "message": "All processes terminated and screen cleared successfully",
    }))
}

async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let (name, bytes) = read_upload_field(multipart, "image").await?;
    if !MediaKind::Image.matches(Path::new(&name)) {
        return Err(ApiError::bad_request("Invalid image format"));
    }
    let stored = storage::save_upload(
        &state.config.image_directory,
        MediaKind::Image,
        &name,
        &bytes,
    )?;
    info!(name = %stored.name, "image uploaded");
    Ok(Json(json!({
        "status": "success",
        "message": "Image uploaded successfully",
        "path": stored.path,
        "name": stored.name,
    })))
}

async fn serve_image(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, ApiError> {
    // The route only matches a single segment, but the decoded value can
    // still smuggle separators.
    if filename.contains(['/', '\\']) || filename == ".." {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "Image not found"));
    }
    let path = state.config.image_directory.join(&filename);
    let bytes = std::fs::read(&path)
        .map_err(|_| ApiError::new(StatusCode::NOT_FOUND, "Image not found"))?;
    let mut response = Response::new(bytes.into());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type_for(&path)),
    );
    Ok(response)
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Serialize)]
struct ImageEntry {
    name: String,
    path: PathBuf,
    url: String,
}

async fn list_images(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ImageEntry>>, ApiError> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:{}", state.config.bind_address, state.config.port));

    let images = storage::list_files(&state.config.image_directory, MediaKind::Image)?
        .into_iter()
        .map(|file| ImageEntry {
            url: format!("http://{host}/api/images/{}", file.name),
            name: file.name,
            path: file.path,
        })
        .collect::<Vec<_>>();
    info!(count = images.len(), "listed images");
    Ok(Json(images))
}

async fn activate_screensaver(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let mut player = state.player.lock().await;
    player.kill_all().await;

    let images: Vec<PathBuf> =
        storage::list_files(&state.config.image_directory, MediaKind::Image)?
            .into_iter()
            .map(|file| file.path)
            .collect();
    player
        .start_slideshow(&images, state.config.image_duration_secs)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Screensaver activated with image slideshow",
    })))
}

async fn get_status(State(state): State<AppState>) -> Json<Value> {
    let player = state.player.lock().await;
    let status = player.status();
    Json(json!({
        "status": "running",
        "video_playing": status.video_playing,
        "screensaver_active": status.screensaver_active,
        "looping": status.looping,
    }))
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    command: Option<String>,
}

async fn execute_command(
    State(state): State<AppState>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::bad_request("No data provided"))?;
    let Some(command) = request.command else {
        return Err(ApiError::bad_request("No command provided"));
    };

    let player = state.player.lock().await;
    player.run_allowed_command(&command).await.map_err(|err| match err {
        Error::Io(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Command execution failed: {err}"),
        ),
        other => ApiError::from(other),
    })?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Command {command} executed successfully"),
    })))
}

async fn read_upload_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(err.to_string()))?
    {
        if field.name() == Some(field_name) {
            let name = field.file_name().unwrap_or_default().to_string();
            if name.is_empty() {
                return Err(ApiError::bad_request("No selected file"));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::bad_request(err.to_string()))?;
            return Ok((name, bytes));
        }
    }
    Err(ApiError::bad_request(format!(
        "No {field_name} file provided"
    )))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn content_types_follow_the_extension() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a.gif")), "image/gif");
        assert_eq!(content_type_for(Path::new("a")), "application/octet-stream");
    }

    #[test]
    fn play_validation_order_is_containment_existence_extension() {
        let root = Path::new("/data/videos");
        let outside = validate_play_path(
            Some(Path::new("/data/videos-evil/a.mp4")),
            root,
            MediaKind::Video,
            "video",
        )
        .unwrap_err();
        assert_eq!(outside.status, StatusCode::BAD_REQUEST);

        let missing = validate_play_path(
            Some(Path::new("/data/videos/a.mp4")),
            root,
            MediaKind::Video,
            "video",
        )
        .unwrap_err();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let absent = validate_play_path(None, root, MediaKind::Video, "video").unwrap_err();
        assert_eq!(absent.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn contained_existing_file_with_bad_extension_is_rejected() {
        let tmp = tempdir().unwrap();
        let bad = tmp.path().join("notes.txt");
        std::fs::write(&bad, b"x").unwrap();

        let err = validate_play_path(Some(bad.as_path()), tmp.path(), MediaKind::Video, "video")
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let ok_path = tmp.path().join("a.mp4");
        std::fs::write(&ok_path, b"x").unwrap();
        let resolved =
            validate_play_path(Some(ok_path.as_path()), tmp.path(), MediaKind::Video, "video")
                .unwrap();
        assert_eq!(resolved, paths::lexical_absolute(&ok_path));
    }
}
