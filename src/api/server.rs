//! API server
//!
//! HTTP host for the harness, built on Axum. One server session owns one store:
//! bulk generation can be started once per session and runs in the background,
//! queries are refused while another is still running, and the export endpoint
//! serves the database image as a `db.sqlite` download.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowfarm::api::ApiServer;
//! use rowfarm::{HarnessConfig, StoreHandle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarnessConfig::default();
//!     let handle = StoreHandle::new();
//!     handle.initialize(config.store_source()).await?;
//!
//!     let server = ApiServer::new("127.0.0.1:8080".parse()?, handle, config);
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

use crate::config::HarnessConfig;
use crate::database::{Exporter, StoreHandle, SNAPSHOT_FILE_NAME, SNAPSHOT_MIME_TYPE};
use crate::error::Error;
use crate::generator::{BulkGenerator, FrameScheduler};
use crate::names::Names;
use crate::query::QueryExecutor;
use crate::types::QueryResult;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// API server
pub struct ApiServer {
    /// Server address
    addr: SocketAddr,
    state: Arc<AppState>,
}

/// Query execution request
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteQueryRequest {
    /// Raw user input
    pub query: String,
}

/// Query execution response
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteQueryResponse {
    /// Structured outcome
    pub result: QueryResult,
    /// Display rendering of the outcome
    pub rendered: String,
}

/// Bulk generation status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressResponse {
    /// Latest reported logical row count
    pub rows: u64,
    /// A run has been started and has not ended
    pub running: bool,
    /// The run reached its final report
    pub finished: bool,
    /// Failure that aborted the run, if any
    pub error: Option<String>,
}

/// Error body for refused or failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason
    pub error: String,
}

struct AppState {
    handle: StoreHandle,
    config: HarnessConfig,
    executor: QueryExecutor,
    exporter: Exporter,
    generation_started: AtomicBool,
    generation_running: AtomicBool,
    generation_finished: AtomicBool,
    generation_rows: AtomicU64,
    generation_error: Mutex<Option<String>>,
    query_running: AtomicBool,
}

impl ApiServer {
    /// Create a new API server
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to
    /// * `handle` - Store served by this session
    /// * `config` - Generation settings
    pub fn new(addr: SocketAddr, handle: StoreHandle, config: HarnessConfig) -> Self {
        let state = AppState {
            executor: QueryExecutor::new(handle.clone()),
            exporter: Exporter::new(handle.clone()),
            handle,
            config,
            generation_started: AtomicBool::new(false),
            generation_running: AtomicBool::new(false),
            generation_finished: AtomicBool::new(false),
            generation_rows: AtomicU64::new(0),
            generation_error: Mutex::new(None),
            query_running: AtomicBool::new(false),
        };
        Self {
            addr,
            state: Arc::new(state),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/generate", post(start_generation))
            .route("/progress", get(generation_progress))
            .route("/query", post(execute_query))
            .route("/export", get(export_snapshot))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(Arc::clone(&self.state))
    }

    /// Start the API server
    ///
    /// This method serves requests until the process stops.
    pub async fn start(&self) -> crate::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("API server listening on {}", self.addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

fn refuse(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        Error::InvalidItemCount(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "ready": state.handle.is_ready(),
    }))
}

/// Start the one bulk generation run of this session
async fn start_generation(State(state): State<Arc<AppState>>) -> Response {
    if state.generation_started.swap(true, Ordering::SeqCst) {
        return refuse(StatusCode::CONFLICT, "generation already started");
    }

    let run = BulkGenerator::new(state.handle.clone())
        .with_progress_interval(state.config.progress_interval)
        .generate(
            state.config.total_items,
            FrameScheduler::new(state.config.frame_interval()),
            Names::from_seed(state.config.seed),
        );
    let mut run = match run {
        Ok(run) => run,
        Err(e) => {
            state.generation_started.store(false, Ordering::SeqCst);
            return refuse(error_status(&e), e.to_string());
        }
    };

    let total_items = run.total_items();
    state.generation_running.store(true, Ordering::SeqCst);
    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        while let Some(step) = run.next().await {
            match step {
                Ok(progress) => task_state
                    .generation_rows
                    .store(progress.rows(), Ordering::SeqCst),
                Err(e) => {
                    error!("background generation failed: {}", e);
                    if let Ok(mut slot) = task_state.generation_error.lock() {
                        *slot = Some(e.to_string());
                    }
                    break;
                }
            }
        }
        task_state
            .generation_finished
            .store(run.is_finished(), Ordering::SeqCst);
        task_state.generation_running.store(false, Ordering::SeqCst);
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "total_items": total_items })),
    )
        .into_response()
}

/// Report the latest progress of the background run
async fn generation_progress(State(state): State<Arc<AppState>>) -> Json<ProgressResponse> {
    let error = state
        .generation_error
        .lock()
        .map(|slot| slot.clone())
        .unwrap_or_else(|_| Some("progress state poisoned".to_string()));
    let running = state.generation_running.load(Ordering::SeqCst);
    Json(ProgressResponse {
        rows: state.generation_rows.load(Ordering::SeqCst),
        running,
        finished: !running && error.is_none() && state.generation_finished.load(Ordering::SeqCst),
        error,
    })
}

/// Execute query endpoint
async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteQueryRequest>,
) -> Response {
    if state.query_running.swap(true, Ordering::SeqCst) {
        return refuse(StatusCode::CONFLICT, "a query is already running");
    }
    let outcome = state.executor.execute(&request.query);
    state.query_running.store(false, Ordering::SeqCst);

    match outcome {
        Ok(result) => {
            let rendered = result.render();
            Json(ExecuteQueryResponse { result, rendered }).into_response()
        }
        Err(e) => refuse(error_status(&e), e.to_string()),
    }
}

/// Serve the database image as a download
async fn export_snapshot(State(state): State<Arc<AppState>>) -> Response {
    match state.exporter.export_snapshot() {
        Ok(snapshot) => (
            [
                (header::CONTENT_TYPE, SNAPSHOT_MIME_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", SNAPSHOT_FILE_NAME),
                ),
            ],
            snapshot.into_bytes(),
        )
            .into_response(),
        Err(e) => {
            warn!("export failed: {}", e);
            refuse(error_status(&e), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Store, StoreSource, Table};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn server(config: HarnessConfig) -> ApiServer {
        let handle = StoreHandle::from_store(Store::open(&StoreSource::Memory).unwrap());
        ApiServer::new("127.0.0.1:0".parse().unwrap(), handle, config)
    }

    fn small_config() -> HarnessConfig {
        HarnessConfig {
            total_items: 50,
            progress_interval: 10,
            frame_interval_ms: 1,
            ..HarnessConfig::default()
        }
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn query_request(query: &str) -> Request<Body> {
        Request::post("/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(&ExecuteQueryRequest {
                    query: query.to_string(),
                })
                .unwrap(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = server(small_config())
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ready"], true);
    }

    #[tokio::test]
    async fn test_query_success_and_failure() {
        let router = server(small_config()).router();

        let response = router.clone().oneshot(query_request(" select 1 ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: ExecuteQueryResponse = body_json(response).await;
        assert!(body.result.is_success());
        assert!(body.rendered.starts_with("executed in "));

        let response = router.oneshot(query_request("not sql")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: ExecuteQueryResponse = body_json(response).await;
        assert!(!body.result.is_success());
    }

    #[tokio::test]
    async fn test_export_download_headers() {
        let response = server(small_config())
            .router()
            .oneshot(Request::get("/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/vnd.sqlite3"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"db.sqlite\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"SQLite format 3\0"));
    }

    #[tokio::test]
    async fn test_generation_runs_once_per_session() {
        let server = server(small_config());
        let router = server.router();

        let first = router
            .clone()
            .oneshot(Request::post("/generate").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::ACCEPTED);

        let second = router
            .clone()
            .oneshot(Request::post("/generate").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let mut progress = ProgressResponse::default();
        for _ in 0..200 {
            let response = router
                .clone()
                .oneshot(Request::get("/progress").body(Body::empty()).unwrap())
                .await
                .unwrap();
            progress = body_json(response).await;
            if progress.finished {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(progress.finished);
        assert_eq!(progress.rows, 150);
        assert_eq!(progress.error, None);
        let store = server.state.handle.ready().unwrap();
        assert_eq!(store.count(Table::Items).unwrap(), 49);
    }

    #[tokio::test]
    async fn test_not_ready_store() {
        let server = ApiServer::new(
            "127.0.0.1:0".parse().unwrap(),
            StoreHandle::new(),
            small_config(),
        );
        let response = server.router().oneshot(query_request("select 1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
