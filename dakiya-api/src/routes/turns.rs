//! Turn and conversation endpoints
//!
//! - POST /api/v1/turns - Process one utterance
//! - GET  /api/v1/conversations/{id} - Inspect a conversation
//! - POST /api/v1/conversations/{id}/abandon - Reset before completion
//! - POST /api/v1/conversations/{id}/retry - Retry after a transport failure

use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use dakiya_core::{Conversation, ConversationId, ConversationStatus};
use dakiya_engine::TurnOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequest {
    /// Continue this conversation; omit to start a new one.
    pub conversation_id: Option<ConversationId>,
    pub utterance: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbandonResponse {
    pub conversation_id: ConversationId,
    pub status: ConversationStatus,
}

/// POST /api/v1/turns
pub async fn submit_turn(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> ApiResult<Json<TurnOutcome>> {
    let outcome = state
        .engine
        .submit_turn(request.conversation_id, &request.utterance)
        .await?;
    Ok(Json(outcome))
}

/// GET /api/v1/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> ApiResult<Json<Conversation>> {
    let snapshot = state.engine.conversation(id).await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/conversations/{id}/abandon
pub async fn abandon(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> ApiResult<Json<AbandonResponse>> {
    let status = state.engine.abandon(id).await?;
    Ok(Json(AbandonResponse {
        conversation_id: id,
        status,
    }))
}

/// POST /api/v1/conversations/{id}/retry
pub async fn retry_submission(
    State(state): State<AppState>,
    Path(id): Path<ConversationId>,
) -> ApiResult<Json<TurnOutcome>> {
    let outcome = state.engine.retry_submission(id).await?;
    Ok(Json(outcome))
}

/// Create the turn/conversation router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/turns", post(submit_turn))
        .route("/conversations/:id", get(get_conversation))
        .route("/conversations/:id/abandon", post(abandon))
        .route("/conversations/:id/retry", post(retry_submission))
        .with_state(state)
}
