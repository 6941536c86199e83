//! HTTP handlers. Each one validates its payload, calls a single [`Tutor`](docent_agent::Tutor)
//! operation and maps the result to JSON.

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use docent_agent::{AnswerFeedback, ChatReply, PracticeQuestion, Reply};
use docent_memory::{DocumentStatus, IndexState};
use docent_session::SessionSummary;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Multipart field carrying the uploaded document.
const FILE_FIELD: &str = "file";

/// Body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The learner's question.
    pub message: String,
}

/// Body of `POST /tutor/evaluate`.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    /// The quiz question that was asked.
    pub question: String,
    /// The learner's answer.
    pub user_answer: String,
}

/// Body of `POST /conversational/chat`.
#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    /// Session the turn belongs to.
    pub session_id: String,
    /// The learner's message.
    pub message: String,
}

/// Body of `POST /conversational/question`.
#[derive(Debug, Deserialize)]
pub struct PracticeRequest {
    /// Session to ask in.
    pub session_id: String,
    /// Topic to ask about. Defaults to the session's current topic.
    #[serde(default)]
    pub topic: Option<String>,
}

/// Body of `POST /conversational/evaluate`.
#[derive(Debug, Deserialize)]
pub struct SessionEvaluateRequest {
    /// Session the answer counts toward.
    pub session_id: String,
    /// The practice question that was asked.
    pub question: String,
    /// The learner's answer.
    pub user_answer: String,
}

/// Body of `POST /conversational/reset`.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    /// Session to forget.
    pub session_id: String,
}

/// Response to a successful upload.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Always true.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
    /// Number of indexed chunks.
    pub chunk_count: usize,
    /// The loaded document.
    pub document: DocumentStatus,
}

/// Response of `GET /document/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Whether a document is loaded.
    pub document_loaded: bool,
    /// Indexed chunks, 0 when nothing is loaded.
    pub chunks_count: usize,
    /// The loaded document, if any.
    pub document: Option<DocumentStatus>,
}

impl From<IndexState> for StatusResponse {
    fn from(state: IndexState) -> Self {
        match state {
            IndexState::Ready(status) => Self {
                document_loaded: true,
                chunks_count: status.chunk_count,
                document: Some(status),
            },
            IndexState::NotReady => Self {
                document_loaded: false,
                chunks_count: 0,
                document: None,
            },
        }
    }
}

/// Every Docent route, without middleware.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/chat", post(chat))
        .route("/tutor/question", get(tutor_question))
        .route("/tutor/evaluate", post(tutor_evaluate))
        .route("/session/start", post(start_session))
        .route("/clear", post(clear))
        .route("/document/status", get(document_status))
        .route("/conversational/chat", post(conversational_chat))
        .route("/conversational/question", post(conversational_question))
        .route("/conversational/evaluate", post(conversational_evaluate))
        .route("/conversational/progress/{session_id}", get(conversational_progress))
        .route("/conversational/reset", post(conversational_reset))
}

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text()))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let status = StatusResponse::from(state.tutor.status().await);
    Json(json!({
        "status": "healthy",
        "service": "docent",
        "document_loaded": status.document_loaded,
        "chunks_count": status.chunks_count,
    }))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<DocumentResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

        let document = state
            .tutor
            .upload(&file_name, bytes.to_vec())
            .await
            .map_err(ApiError::upload)?;
        info!(file_name = %file_name, chunks = document.chunk_count, "Document ready");

        return Ok(Json(DocumentResponse {
            success: true,
            message: "Document processed successfully. Ready for chat and tutor modes!".to_string(),
            chunk_count: document.chunk_count,
            document,
        }));
    }
    Err(ApiError::bad_request("No file provided in the 'file' field"))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    let request = payload(body)?;
    Ok(Json(state.tutor.chat(&request.message).await?))
}

async fn tutor_question(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let question = state.tutor.quiz_question().await?;
    Ok(Json(json!({ "question": question })))
}

async fn tutor_evaluate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<EvaluateRequest>, JsonRejection>,
) -> ApiResult<Json<AnswerFeedback>> {
    let request = payload(body)?;
    let feedback = state
        .tutor
        .evaluate_answer(&request.question, &request.user_answer, None)
        .await?;
    Ok(Json(feedback))
}

async fn start_session(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let token = state.tutor.start_session().await?;
    Ok(Json(json!({
        "success": true,
        "message": "New session started - all previous document data cleared",
        "timestamp": token,
    })))
}

async fn clear(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    state.tutor.clear().await?;
    Ok(Json(json!({
        "success": true,
        "message": "All document data cleared",
    })))
}

async fn document_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.tutor.status().await.into())
}

async fn conversational_chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ConversationRequest>, JsonRejection>,
) -> ApiResult<Json<Reply>> {
    let request = payload(body)?;
    let reply = state
        .tutor
        .converse(&request.session_id, &request.message)
        .await?;
    Ok(Json(reply))
}

async fn conversational_question(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PracticeRequest>, JsonRejection>,
) -> ApiResult<Json<PracticeQuestion>> {
    let request = payload(body)?;
    let question = state
        .tutor
        .practice_question(&request.session_id, request.topic.as_deref())
        .await?;
    Ok(Json(question))
}

async fn conversational_evaluate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SessionEvaluateRequest>, JsonRejection>,
) -> ApiResult<Json<AnswerFeedback>> {
    let request = payload(body)?;
    let feedback = state
        .tutor
        .evaluate_answer(
            &request.question,
            &request.user_answer,
            Some(request.session_id.as_str()),
        )
        .await?;
    Ok(Json(feedback))
}

async fn conversational_progress(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionSummary>> {
    Ok(Json(state.tutor.progress(&session_id).await?))
}

async fn conversational_reset(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ResetRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let request = payload(body)?;
    let existed = state.tutor.reset_session(&request.session_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Session reset",
        "existed": existed,
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::server::{GatewayServer, ServerConfig};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use docent_agent::{CompletionRequest, LlmBackend, LlmClient, Tutor};
    use docent_core::DocentResult;
    use docent_memory::{
        Chunker, DocumentIndex, InMemoryVectorStore, LocalEmbedding, RetrievalConfig,
        RetrievalEngine,
    };
    use docent_session::InMemorySessionStore;
    use std::time::Duration;
    use tower::ServiceExt;

    struct FixedBackend;

    #[async_trait]
    impl LlmBackend for FixedBackend {
        async fn complete(&self, _request: &CompletionRequest) -> DocentResult<String> {
            Ok("SCORE: 8\nCORRECT POINTS:\n- Good".to_string())
        }
    }

    fn app() -> Router {
        let index = Arc::new(DocumentIndex::new(Arc::new(InMemoryVectorStore::new()), 32));
        let retrieval = Arc::new(RetrievalEngine::new(
            Arc::new(LocalEmbedding::new(32)),
            index,
            Chunker::new(200, 20),
            Duration::from_secs(5),
        ));
        let llm = Arc::new(LlmClient::from_backend(Arc::new(FixedBackend), Duration::from_secs(5)));
        let tutor = Arc::new(Tutor::new(
            retrieval,
            Arc::new(InMemorySessionStore::new()),
            llm,
            RetrievalConfig::default(),
        ));
        GatewayServer::build(tutor, &ServerConfig::default())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_without_document_is_bad_request() {
        let response = app()
            .oneshot(json_request("POST", "/chat", json!({ "message": "what is it?" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().starts_with("No document uploaded"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_unprocessable() {
        let response = app()
            .oneshot(json_request("POST", "/chat", json!({ "text": "wrong field" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn test_document_status_empty() {
        let response = app()
            .oneshot(Request::get("/document/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["document_loaded"], false);
        assert_eq!(body["chunks_count"], 0);
    }

    #[tokio::test]
    async fn test_conversational_evaluate_without_document() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/conversational/evaluate",
                json!({ "session_id": "s1", "question": "q?", "user_answer": "an answer" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["score"], 8);
        assert_eq!(body["is_correct"], true);
        assert_eq!(body["session_info"]["questions_asked"], 1);
    }

    #[tokio::test]
    async fn test_progress_rejects_oversized_session_id() {
        let long_id = "x".repeat(200);
        let response = app()
            .oneshot(
                Request::get(format!("/conversational/progress/{long_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
