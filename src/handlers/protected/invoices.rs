// handlers/protected/invoices.rs - /api/invoices

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::invoice::InvoiceListing;
use crate::database::models::Invoice;
use crate::handlers::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::invoices::InvoiceRequest;
use crate::state::AppState;

/// GET /api/invoices - Every invoice for admins, a client's own otherwise
pub async fn invoices_list(State(state): State<AppState>, principal: Principal) -> ApiResult<Vec<InvoiceListing>> {
    Ok(ApiResponse::success(state.invoices.list(&principal).await?))
}

/**
 * POST /api/invoices - Create an invoice (ADMIN)
 *
 * Expected Input:
 * ```json
 * {
 *   "number": "INV-2024-001",
 *   "client_id": "...",
 *   "project_id": "...",
 *   "amount": "1500.00",
 *   "currency": "USD",
 *   "status": "SENT",
 *   "due_date": "2024-02-01T00:00:00Z"
 * }
 * ```
 */
pub async fn invoices_create(
    State(state): State<AppState>,
    principal: Principal,
    WithRejection(Json(request), _): JsonBody<InvoiceRequest>,
) -> ApiResult<Invoice> {
    Ok(ApiResponse::created(state.invoices.create(&principal, request).await?))
}

/// PUT /api/invoices/:id - Setting status PAID stamps `paid_at` once
pub async fn invoices_update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    WithRejection(Json(request), _): JsonBody<InvoiceRequest>,
) -> ApiResult<Invoice> {
    Ok(ApiResponse::success(state.invoices.update(&principal, id, request).await?))
}

/// DELETE /api/invoices/:id
pub async fn invoices_delete(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    state.invoices.delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
