//! HTTP server for batch cleaning.
//!
//! Files are uploaded with a transform name, cleaned by the dispatcher on a
//! blocking thread and returned as a single ZIP archive.
//!
//! # API Endpoints
//!
//! | Method | Path                    | Description                              |
//! |--------|-------------------------|------------------------------------------|
//! | GET    | `/health`               | Health check                             |
//! | GET    | `/api/transforms`       | Registered transforms                    |
//! | POST   | `/api/upload`           | Multipart `files[]` + `transform`        |
//! | GET    | `/api/download/{name}`  | Fetch an archive, deleted once served    |
//! | GET    | `/api/logs`             | SSE stream for real-time logs            |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State},
    http::{header, Method},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_error, log_info, log_success, log_warning, LOG_BROADCASTER};
use super::types::{reject, ApiError, TransformListResponse, UploadResponse};
use crate::archive::{archive_name, zip_outputs};
use crate::config::ServerConfig;
use crate::dispatch::{sanitize_filename, Dispatcher};
use crate::error::ServerError;
use crate::registry::TransformRegistry;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<TransformRegistry>,
    pub upload_dir: PathBuf,
    pub download_dir: PathBuf,
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let work = config.work_area()?;
    let state = AppState {
        registry: Arc::new(TransformRegistry::with_builtin()),
        upload_dir: work.upload_dir.clone(),
        download_dir: work.download_dir.clone(),
    };
    let app = router(state, config.max_upload_bytes());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Limpieza server running on http://localhost:{}", config.port);
    println!("   GET  /api/transforms       - Available transforms");
    println!("   POST /api/upload           - Upload CSV files");
    println!("   GET  /api/download/{{name}}  - Download results");
    println!("   GET  /api/logs             - SSE log stream");
    println!("   GET  /health               - Health check");
    println!();
    println!(
        "📁 Work area: {}{}",
        work.upload_dir.parent().unwrap_or(work.upload_dir.as_path()).display(),
        if work.is_temporary() { " (temporary)" } else { "" }
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Temporary work area is removed here
    drop(work);
    Ok(())
}

/// Build the application router
pub fn router(state: AppState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/transforms", get(list_transforms))
        .route("/api/upload", post(upload_csv))
        .route("/api/download/{name}", get(download))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "limpieza",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "transforms": "GET /api/transforms",
            "upload": "POST /api/upload",
            "download": "GET /api/download/{name}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn list_transforms(State(state): State<AppState>) -> Json<TransformListResponse> {
    Json(TransformListResponse {
        transforms: state.registry.list(),
    })
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Per-job upload and output folders, removed on drop
struct JobDirs {
    input: PathBuf,
    output: PathBuf,
}

impl JobDirs {
    fn create(state: &AppState, job_id: &Uuid) -> std::io::Result<Self> {
        let dirs = Self {
            input: state.upload_dir.join(job_id.to_string()),
            output: state.download_dir.join(format!("job_{}", job_id)),
        };
        fs::create_dir_all(&dirs.input)?;
        fs::create_dir_all(&dirs.output)?;
        Ok(dirs)
    }
}

impl Drop for JobDirs {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.input);
        let _ = fs::remove_dir_all(&self.output);
    }
}

fn is_csv_name(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
}

/// A saved upload path that does not collide with earlier ones
fn upload_path(dir: &Path, file_name: &str) -> PathBuf {
    let name = sanitize_filename(file_name);
    let candidate = dir.join(&name);
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| dir.join(format!("{}_{}", n, name)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Batch upload endpoint
async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let job_id = Uuid::new_v4();
    let dirs = JobDirs::create(&state, &job_id).map_err(reject)?;

    let mut transform: Option<String> = None;
    let mut received = 0usize;
    let mut inputs: Vec<PathBuf> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| reject(ServerError::BadRequest(format!("Multipart error: {}", e))))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files[]" | "files" | "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| reject(ServerError::BadRequest(format!("Read error: {}", e))))?;
                if file_name.is_empty() {
                    continue;
                }
                received += 1;
                if !is_csv_name(&file_name) {
                    log_warning(format!("Ignoring {}: only .csv files are accepted", file_name));
                    continue;
                }
                let path = upload_path(&dirs.input, &file_name);
                tokio::fs::write(&path, &bytes).await.map_err(reject)?;
                inputs.push(path);
            }
            "transform" | "script_name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| reject(ServerError::BadRequest(format!("Read error: {}", e))))?;
                transform = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    if received == 0 {
        return Err(reject(ServerError::BadRequest("No files selected".into())));
    }
    let transform =
        transform.ok_or_else(|| reject(ServerError::BadRequest("No transform selected".into())))?;
    if inputs.is_empty() {
        return Err(reject(ServerError::BadRequest("No allowed files (.csv only)".into())));
    }

    log_info("=".repeat(60));
    log_info(format!("📄 Job {}: {} file(s) with '{}'", job_id, inputs.len(), transform));

    let dispatcher = Dispatcher::new(state.registry.clone(), &dirs.output);
    let report = tokio::task::spawn_blocking(move || dispatcher.run_detailed(&transform, &inputs))
        .await
        .map_err(|e| reject(ServerError::Internal(format!("Processing task failed: {}", e))))?
        .map_err(|e| {
            log_error(format!("Job {} failed: {}", job_id, e));
            reject(e)
        })?;

    let outputs = report.outputs();
    if outputs.is_empty() {
        return Err(reject(ServerError::BadRequest("No files were processed successfully".into())));
    }

    let archive = unique_archive_name(&state.download_dir, &job_id);
    let dest = state.download_dir.join(&archive);
    tokio::task::spawn_blocking(move || zip_outputs(&outputs, &dest))
        .await
        .map_err(|e| reject(ServerError::Internal(format!("Archive task failed: {}", e))))?
        .map_err(reject)?;

    let response = UploadResponse::new(job_id, &report, &archive);
    log_success(format!("Job {}: {}", job_id, response.message));
    drop(dirs);
    Ok(Json(response))
}

fn unique_archive_name(dir: &Path, job_id: &Uuid) -> String {
    let name = archive_name();
    if !dir.join(&name).exists() {
        return name;
    }
    let short: String = job_id.simple().to_string().chars().take(8).collect();
    name.replace(".zip", &format!("_{}.zip", short))
}

fn is_safe_download_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

/// Serve a result file, then delete it
async fn download(
    State(state): State<AppState>,
    UrlPath(name): UrlPath<String>,
) -> Result<Response, ApiError> {
    if !is_safe_download_name(&name) {
        return Err(reject(ServerError::BadRequest(format!("Invalid file name: {}", name))));
    }

    let path = state.download_dir.join(&name);
    if !path.is_file() {
        return Err(reject(ServerError::NotFound(name)));
    }
    let bytes = tokio::fs::read(&path).await.map_err(reject)?;
    if let Err(e) = tokio::fs::remove_file(&path).await {
        log_warning(format!("Could not remove {}: {}", name, e));
    }

    let content_type = if name.to_ascii_lowercase().ends_with(".zip") {
        "application/zip"
    } else {
        "text/csv"
    };
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", name)),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use tempfile::{tempdir, TempDir};

    const TOPES_ROW: &str = "Soporte,ana@example.com,Ventas,14,01/04/2025,08:00,16:00,24:00 - 08:00,8";

    async fn spawn_app() -> (String, AppState, TempDir) {
        let dir = tempdir().unwrap();
        let state = AppState {
            registry: Arc::new(TransformRegistry::with_builtin()),
            upload_dir: dir.path().join("uploads"),
            download_dir: dir.path().join("downloads"),
        };
        fs::create_dir_all(&state.upload_dir).unwrap();
        fs::create_dir_all(&state.download_dir).unwrap();

        let app = router(state.clone(), 1024 * 1024);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), state, dir)
    }

    fn csv_part(name: &str, content: &str) -> reqwest::multipart::Part {
        reqwest::multipart::Part::bytes(content.as_bytes().to_vec())
            .file_name(name.to_string())
            .mime_str("text/csv")
            .unwrap()
    }

    #[test]
    fn test_download_name_guard() {
        assert!(is_safe_download_name("resultados_20250401_083000.zip"));
        assert!(!is_safe_download_name("../secreto.zip"));
        assert!(!is_safe_download_name("a/b.zip"));
        assert!(!is_safe_download_name("a\\b.zip"));
        assert!(!is_safe_download_name(""));
    }

    #[test]
    fn test_is_csv_name() {
        assert!(is_csv_name("topes.CSV"));
        assert!(!is_csv_name("topes.xlsx"));
        assert!(!is_csv_name("csv"));
    }

    #[tokio::test]
    async fn test_transforms_listed() {
        let (base, _state, _dir) = spawn_app().await;
        let body: Value = reqwest::get(format!("{}/api/transforms", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let names: Vec<&str> = body["transforms"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names, vec!["conexiones", "metrics_new_scheme", "programadas", "rq", "topes"]);
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let (base, state, _dir) = spawn_app().await;
        let client = reqwest::Client::new();
        let form = reqwest::multipart::Form::new()
            .text("transform", "topes")
            .part("files[]", csv_part("topes semana.csv", &format!("{}\n", TOPES_ROW)))
            .part("files[]", csv_part("notas.txt", "hola"));

        let response = client
            .post(format!("{}/api/upload", base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["transform"], "topes");

        // Only the archive is left behind
        let archive = body["download"].as_str().unwrap().to_string();
        let left: Vec<String> = fs::read_dir(&state.download_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(left, vec![archive.clone()]);
        assert_eq!(fs::read_dir(&state.upload_dir).unwrap().count(), 0);

        let bytes = client
            .get(format!("{}{}", base, body["downloadUrl"].as_str().unwrap()))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(zip.len(), 1);
        let mut entry = zip.by_index(0).unwrap();
        assert!(entry.name().ends_with(")_topes_semana.csv"));
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert!(content.contains("2025-04-01"));

        // Served once
        let again = client
            .get(format!("{}/api/download/{}", base, archive))
            .send()
            .await
            .unwrap();
        assert_eq!(again.status(), 404);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let (base, state, _dir) = spawn_app().await;
        let client = reqwest::Client::new();

        let unknown = reqwest::multipart::Form::new()
            .text("transform", "nomina")
            .part("files[]", csv_part("topes.csv", TOPES_ROW));
        let response = client
            .post(format!("{}/api/upload", base))
            .multipart(unknown)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("nomina"));

        let no_csv = reqwest::multipart::Form::new()
            .text("transform", "topes")
            .part("files[]", csv_part("notas.txt", "hola"));
        let response = client
            .post(format!("{}/api/upload", base))
            .multipart(no_csv)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let all_skipped = reqwest::multipart::Form::new()
            .text("transform", "topes")
            .part("files[]", csv_part("corto.csv", "a,b,c\n"));
        let response = client
            .post(format!("{}/api/upload", base))
            .multipart(all_skipped)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        assert_eq!(fs::read_dir(&state.download_dir).unwrap().count(), 0);
        assert_eq!(fs::read_dir(&state.upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_missing_and_traversal() {
        let (base, _state, _dir) = spawn_app().await;
        let missing = reqwest::get(format!("{}/api/download/resultados_x.zip", base))
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);

        let sneaky = reqwest::get(format!("{}/api/download/..%5Csecreto.zip", base))
            .await
            .unwrap();
        assert_eq!(sneaky.status(), 400);
    }
}
