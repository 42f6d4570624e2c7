//! Audit Logs Admin API
//!
//! Read-only endpoints over the append-only audit trail.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::domain::AuditLog;
use crate::error::PlatformError;
use crate::repository::AuditLogRepository;

/// Audit log response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub action: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            action: log.action.as_str().to_string(),
            description: log.description,
            metadata: log.metadata,
            created_at: log.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditLogsQuery {
    /// Maximum number of entries to return
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Audit logs service state
#[derive(Clone)]
pub struct AuditLogsState {
    pub audit_log_repo: Arc<AuditLogRepository>,
}

/// Most recent audit entries
#[utoipa::path(
    get,
    path = "/recent",
    tag = "audit-logs",
    params(AuditLogsQuery),
    responses(
        (status = 200, description = "Recent audit logs", body = [AuditLogResponse]),
    )
)]
pub async fn recent_audit_logs(
    State(state): State<AuditLogsState>,
    Query(query): Query<AuditLogsQuery>,
) -> Result<Json<Vec<AuditLogResponse>>, PlatformError> {
    let logs = state.audit_log_repo.find_recent(query.limit.clamp(1, 500)).await?;
    Ok(Json(logs.into_iter().map(Into::into).collect()))
}

/// Audit entries for one user
#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tag = "audit-logs",
    params(
        ("user_id" = String, Path, description = "User id"),
        AuditLogsQuery,
    ),
    responses(
        (status = 200, description = "Audit logs for the user", body = [AuditLogResponse]),
    )
)]
pub async fn user_audit_logs(
    State(state): State<AuditLogsState>,
    Path(user_id): Path<String>,
    Query(query): Query<AuditLogsQuery>,
) -> Result<Json<Vec<AuditLogResponse>>, PlatformError> {
    let logs = state
        .audit_log_repo
        .find_by_user(&user_id, query.limit.clamp(1, 500))
        .await?;
    Ok(Json(logs.into_iter().map(Into::into).collect()))
}

/// Create the audit logs router
pub fn audit_logs_router(state: AuditLogsState) -> Router {
    Router::new()
        .route("/recent", get(recent_audit_logs))
        .route("/user/:user_id", get(user_audit_logs))
        .with_state(state)
}
