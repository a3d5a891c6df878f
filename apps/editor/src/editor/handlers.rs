//! Axum route handlers for editor sessions.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::editor::autosave::SaveOutcome;
use crate::editor::blocks::{Block, BlockId, EntryId};
use crate::editor::session::{EditorSession, SessionView};
use crate::editor::store::Edit;
use crate::errors::AppError;
use crate::notifications::Notification;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddBlockRequest {
    #[serde(rename = "type")]
    pub block_type: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveBlockRequest {
    pub index: usize,
    pub direction: i32,
}

#[derive(Debug, Deserialize)]
pub struct AddSkillRequest {
    pub skill: String,
}

/// Result of an edit plus the session state after it.
#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_id: Option<Uuid>,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub outcome: SaveOutcome,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub markdown: String,
}

async fn respond(session: &EditorSession, applied: bool, created_id: Option<Uuid>) -> Json<EditResponse> {
    Json(EditResponse {
        applied,
        created_id,
        session: session.view().await,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Loads the profile and opens a new editing session seeded from it.
pub async fn handle_open_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let session = EditorSession::open(state.profiles.clone(), &state.session_settings()).await?;
    let view = session.view().await;
    state
        .sessions
        .write()
        .await
        .insert(session.id(), Arc::new(session));
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.session(id).await?;
    Ok(Json(session.view().await))
}

/// DELETE /api/v1/sessions/:id
///
/// Flushes a pending autosave, then forgets the session.
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<SaveOutcome>>, AppError> {
    let session = state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let outcome = session.close().await;
    info!("Session {id} closed");
    Ok(Json(outcome))
}

// ────────────────────────────────────────────────────────────────────────────
// Block edits
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/blocks
pub async fn handle_add_block(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddBlockRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    let block_id = session.add_block(&req.block_type).await?;
    Ok(respond(&session, true, Some(block_id)).await)
}

/// PUT /api/v1/sessions/:id/blocks/:block_id
///
/// Replaces the whole block; the body must carry the same id.
pub async fn handle_update_block(
    State(state): State<AppState>,
    Path((id, block_id)): Path<(Uuid, BlockId)>,
    Json(block): Json<Block>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    session.update_block(block_id, block).await?;
    Ok(respond(&session, true, None).await)
}

/// DELETE /api/v1/sessions/:id/blocks/:block_id
pub async fn handle_delete_block(
    State(state): State<AppState>,
    Path((id, block_id)): Path<(Uuid, BlockId)>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    let edit = session.delete_block(block_id).await;
    Ok(respond(&session, edit == Edit::Applied, None).await)
}

/// POST /api/v1/sessions/:id/blocks/move
pub async fn handle_move_block(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveBlockRequest>,
) -> Result<Json<EditResponse>, AppError> {
    if req.direction != 1 && req.direction != -1 {
        return Err(AppError::Validation(
            "direction must be -1 or 1".to_string(),
        ));
    }
    let session = state.session(id).await?;
    let edit = session.move_block(req.index, req.direction).await;
    Ok(respond(&session, edit == Edit::Applied, None).await)
}

/// POST /api/v1/sessions/:id/blocks/:block_id/toggle
pub async fn handle_toggle_block(
    State(state): State<AppState>,
    Path((id, block_id)): Path<(Uuid, BlockId)>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    session.toggle_block(block_id).await?;
    Ok(respond(&session, true, None).await)
}

// ────────────────────────────────────────────────────────────────────────────
// Entry and skill edits
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/blocks/:block_id/entries
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path((id, block_id)): Path<(Uuid, BlockId)>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    let entry_id = session.add_entry(block_id).await?;
    Ok(respond(&session, true, Some(entry_id)).await)
}

/// PUT /api/v1/sessions/:id/blocks/:block_id/entries/:entry_id
pub async fn handle_update_entry(
    State(state): State<AppState>,
    Path((id, block_id, entry_id)): Path<(Uuid, BlockId, EntryId)>,
    Json(fields): Json<Value>,
) -> Result<Json<EditResponse>, AppError> {
    if !fields.is_object() {
        return Err(AppError::Validation("entry must be a JSON object".to_string()));
    }
    let session = state.session(id).await?;
    session.update_entry(block_id, entry_id, fields).await?;
    Ok(respond(&session, true, None).await)
}

/// DELETE /api/v1/sessions/:id/blocks/:block_id/entries/:entry_id
pub async fn handle_delete_entry(
    State(state): State<AppState>,
    Path((id, block_id, entry_id)): Path<(Uuid, BlockId, EntryId)>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    session.delete_entry(block_id, entry_id).await?;
    Ok(respond(&session, true, None).await)
}

/// POST /api/v1/sessions/:id/blocks/:block_id/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Path((id, block_id)): Path<(Uuid, BlockId)>,
    Json(req): Json<AddSkillRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    session.add_skill(block_id, &req.skill).await?;
    Ok(respond(&session, true, None).await)
}

/// DELETE /api/v1/sessions/:id/blocks/:block_id/skills/:index
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    Path((id, block_id, index)): Path<(Uuid, BlockId, usize)>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    session.remove_skill(block_id, index).await?;
    Ok(respond(&session, true, None).await)
}

// ────────────────────────────────────────────────────────────────────────────
// History, save, preview
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/undo
pub async fn handle_undo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    let edit = session.undo().await;
    Ok(respond(&session, edit == Edit::Applied, None).await)
}

/// POST /api/v1/sessions/:id/redo
pub async fn handle_redo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.session(id).await?;
    let edit = session.redo().await;
    Ok(respond(&session, edit == Edit::Applied, None).await)
}

/// POST /api/v1/sessions/:id/save
///
/// Manual save. A failed save is reported in the body, not as an HTTP error.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    let session = state.session(id).await?;
    let outcome = session.save().await;
    Ok(Json(SaveResponse {
        outcome,
        session: session.view().await,
    }))
}

/// GET /api/v1/sessions/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewResponse>, AppError> {
    let session = state.session(id).await?;
    Ok(Json(PreviewResponse {
        markdown: session.preview().await,
    }))
}

/// GET /api/v1/sessions/:id/notifications
pub async fn handle_notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let session = state.session(id).await?;
    Ok(Json(session.drain_notifications()))
}
