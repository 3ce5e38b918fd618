// handlers/protected/messages.rs - /api/messages

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::{Message, MessageThread};
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::messages::CreateMessageRequest;
use crate::state::AppState;

/**
 * GET /api/messages - Threads visible to the caller
 *
 * Roots are messages without a parent, newest first; replies nest under the
 * message they answer in send order.
 *
 * Output:
 * ```json
 * {
 *   "success": true,
 *   "data": [
 *     {
 *       "id": "...",
 *       "content": "Kickoff moved to Friday",
 *       "sender_name": "Pat",
 *       "reply_count": 1,
 *       "unread_count": 1,
 *       "replies": [ { "id": "...", "content": "Works for me", "replies": [] } ]
 *     }
 *   ]
 * }
 * ```
 */
pub async fn messages_list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<MessageThread>> {
    Ok(ApiResponse::success(state.messages.list(&principal).await?))
}

/// POST /api/messages - Send a message or reply (`parent_id` set)
pub async fn messages_create(
    State(state): State<AppState>,
    principal: Principal,
    WithRejection(Json(request), _): JsonBody<CreateMessageRequest>,
) -> ApiResult<Message> {
    Ok(ApiResponse::created(state.messages.create(&principal, request).await?))
}

/// PUT /api/messages/:id/read - Idempotent; only the recipient or an admin
pub async fn messages_mark_read(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Message> {
    Ok(ApiResponse::success(state.messages.mark_read(&principal, id).await?))
}

/// DELETE /api/messages/:id - Sender or admin
pub async fn messages_delete(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    state.messages.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
