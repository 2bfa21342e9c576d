//! Audit API Routes
//!
//! `GET /api/audit/:ticker` returns the success or error envelope, always
//! with HTTP 200.

use audit_core::AuditResponse;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};

use crate::request_id::RequestId;
use crate::AppState;

pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/api/audit/:ticker", get(get_audit))
}

async fn get_audit(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    request_id: Option<Extension<RequestId>>,
) -> Json<AuditResponse> {
    let response = state.auditor.audit_response(&ticker).await;
    if let Some(Extension(RequestId(id))) = request_id {
        tracing::debug!(request_id = %id, "Audit of {} success={}", ticker, response.is_success());
    }
    Json(response)
}
