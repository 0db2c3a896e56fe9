//! HTTP chat adapter.
//!
//! # Endpoints
//!
//! - POST /api/chat - Send one message, receive the planner's reply
//! - GET /api/conversations/:id - Inspect a conversation's session
//! - DELETE /api/conversations/:id - Forget a conversation
//! - GET /api/health - Liveness and conversation count

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::{
    core::{ConversationId, SessionStore, Stage, TripPlanner},
    error::{PlannerError, Result},
    services::ItineraryGenerator,
    types::TurnStatus,
};

/// Shared by every request handler
struct AppState<G> {
    planner: Arc<TripPlanner<G>>,
    store: SessionStore,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            planner: Arc::clone(&self.planner),
            store: self.store.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omit to start a new conversation
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: ConversationId,
    pub reply: String,
    pub stage: Stage,
    pub status: TurnStatus,
}

/// Build the chat router around a planner and its session store
pub fn router<G>(planner: Arc<TripPlanner<G>>, store: SessionStore) -> Router
where
    G: ItineraryGenerator + 'static,
{
    let state = AppState { planner, store };

    Router::new()
        .route("/api/chat", post(chat_handler::<G>))
        .route(
            "/api/conversations/:id",
            get(conversation_handler::<G>).delete(delete_handler::<G>),
        )
        .route("/api/health", get(health_handler::<G>))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve<G>(
    planner: Arc<TripPlanner<G>>,
    store: SessionStore,
    addr: SocketAddr,
) -> Result<()>
where
    G: ItineraryGenerator + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| PlannerError::Config(format!("failed to bind {addr}: {err}")))?;

    let local_addr = listener
        .local_addr()
        .map_err(|err| PlannerError::Config(format!("failed to read local address: {err}")))?;
    info!("trip planner listening on http://{}", local_addr);

    axum::serve(listener, router(planner, store))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| PlannerError::Http(format!("server error: {err}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn chat_handler<G: ItineraryGenerator + 'static>(
    State(state): State<AppState<G>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let conversation_id = request
        .conversation_id
        .unwrap_or_else(ConversationId::generate);

    let turn = state
        .store
        .take_turn_detailed(&*state.planner, &conversation_id, &request.message)
        .await;

    Json(ChatResponse {
        conversation_id,
        stage: turn.session.stage(),
        reply: turn.reply,
        status: turn.status,
    })
}

async fn conversation_handler<G: ItineraryGenerator + 'static>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Response {
    let id = ConversationId::new(id);
    match state.store.snapshot(&id).await {
        Some(session) => Json(session).into_response(),
        None => not_found(&id),
    }
}

async fn delete_handler<G: ItineraryGenerator + 'static>(
    State(state): State<AppState<G>>,
    Path(id): Path<String>,
) -> Response {
    let id = ConversationId::new(id);
    if state.store.remove(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&id)
    }
}

async fn health_handler<G: ItineraryGenerator + 'static>(
    State(state): State<AppState<G>>,
) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "conversations": state.store.len(),
    }))
}

fn not_found(id: &ConversationId) -> Response {
    PlannerError::ConversationNotFound(id.to_string()).into_response()
}

impl IntoResponse for PlannerError {
    fn into_response(self) -> Response {
        let status = match &self {
            PlannerError::ConversationNotFound(_) => StatusCode::NOT_FOUND,
            PlannerError::RateLimit { .. } => StatusCode::TOO_MANY_REQUESTS,
            PlannerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ if self.is_generation_failure() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self.to_error_payload())).into_response()
    }
}
