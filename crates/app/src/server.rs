//! HTTP surface: a single-page UI plus a small JSON API over per-user sessions.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pdf_qa_core::{ChatMessage, ErrorKind, Pipeline, PdfUpload, ProcessReport, QaError, Session};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    session_ttl: Duration,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Sessions untouched for longer than `ttl` are dropped along with their index.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    async fn create_session(&self) -> Uuid {
        self.evict_idle_sessions().await;

        let id = Uuid::new_v4();
        let entry = SessionEntry {
            session: Arc::new(Mutex::new(Session::new(Arc::clone(&self.pipeline)))),
            last_seen: Instant::now(),
        };
        self.sessions.lock().await.insert(id, entry);
        id
    }

    /// The map lock is only held for the lookup; work happens under the
    /// session's own lock.
    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
        entry.last_seen = Instant::now();
        Ok(Arc::clone(&entry.session))
    }

    async fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }

    async fn evict_idle_sessions(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() <= self.session_ttl);

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "idle sessions evicted");
        }
        evicted
    }
}

#[derive(Debug)]
pub enum ApiError {
    Qa(QaError),
    SessionNotFound(Uuid),
    BadRequest(String),
}

impl From<QaError> for ApiError {
    fn from(value: QaError) -> Self {
        ApiError::Qa(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Qa(error) => {
                let status = match error.kind() {
                    ErrorKind::Validation => StatusCode::BAD_REQUEST,
                    ErrorKind::Document => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorKind::Service => StatusCode::BAD_GATEWAY,
                };
                (status, error.to_string())
            }
            ApiError::SessionNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("unknown session {id}"))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub ready: bool,
    pub latest_reply: Option<String>,
    pub history: Vec<ChatMessage>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health_check))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", axum::routing::delete(delete_session))
        .route(
            "/api/sessions/:id/documents",
            post(process_documents).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/sessions/:id/questions", post(ask_question))
        .route("/api/sessions/:id/history", get(session_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, bind: SocketAddr, max_upload_bytes: usize) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("serving PDF question answering on http://{}", listener.local_addr()?);

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut ticks = time::interval(sweeper.session_ttl.max(Duration::from_secs(1)));
        loop {
            ticks.tick().await;
            sweeper.evict_idle_sessions().await;
        }
    });

    axum::serve(listener, router(state, max_upload_bytes)).await?;
    Ok(())
}

async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.create_session().await;
    info!(%session_id, "session created");
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.remove_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

async fn process_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProcessReport>, ApiError> {
    let session = state.session(id).await?;
    let mut multipart = multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::BadRequest(format!("failed to read multipart field: {error}")))?
    {
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload-{}.pdf", uploads.len() + 1));
        let bytes = field
            .bytes()
            .await
            .map_err(|error| ApiError::BadRequest(format!("failed to read {file_name}: {error}")))?;

        if bytes.is_empty() {
            continue;
        }
        uploads.push(PdfUpload::new(file_name, bytes.to_vec()));
    }

    info!(%id, files = uploads.len(), "processing uploaded documents");
    let report = session.lock().await.process(&uploads).await?;
    Ok(Json(report))
}

async fn ask_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let session = state.session(id).await?;
    let Json(request) = request.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let mut session = session.lock().await;
    let answer = session.ask(&request.question).await?;

    Ok(Json(AnswerResponse {
        answer: answer.answer,
        history: session.history(),
    }))
}

async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = state.session(id).await?;
    let session = session.lock().await;

    Ok(Json(HistoryResponse {
        ready: session.is_ready(),
        latest_reply: session.latest_reply().map(str::to_string),
        history: session.history(),
    }))
}
