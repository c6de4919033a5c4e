//! Admin-only activity log routes.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::activity::ActivityRecord;
use crate::services::activity::{self, ACTIVITY_CAP};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/activity — most recent audit records.
pub async fn recent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ActivityQuery>,
) -> Json<ApiResponse<Vec<ActivityRecord>>> {
    let limit = params.limit.unwrap_or(5).min(ACTIVITY_CAP);
    ApiResponse::success(activity::recent(&state.db, limit))
}

/// GET /api/v1/activity/export — CSV download of the retained log.
pub async fn export(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Response, AppError> {
    let records = activity::recent(&state.db, ACTIVITY_CAP);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["event_type", "username", "timestamp", "description"])
        .map_err(|e| AppError::Internal(format!("CSV write failed: {e}")))?;
    for record in &records {
        writer
            .write_record([
                record.event_type.as_str(),
                &record.username,
                &record.timestamp,
                &record.description,
            ])
            .map_err(|e| AppError::Internal(format!("CSV write failed: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV flush failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"audit_logs_export.csv\"",
            ),
        ],
        bytes,
    )
        .into_response())
}
