//! Check-in/out routes for the session user.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::checkin::CheckinRecord;
use crate::models::user::Role;
use crate::services::checkin::{self, CheckinStatusView};
use crate::AppState;

/// POST /api/v1/checkin
pub async fn check_in(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<CheckinStatusView>>, AppError> {
    checkin::check_in(&state.db, &current_user.username)?;
    Ok(ApiResponse::success(checkin::current_status(
        &state.db,
        &current_user.username,
    )))
}

/// POST /api/v1/checkout
pub async fn check_out(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<CheckinStatusView>>, AppError> {
    checkin::check_out(&state.db, &current_user.username)?;
    Ok(ApiResponse::success(checkin::current_status(
        &state.db,
        &current_user.username,
    )))
}

/// GET /api/v1/checkin/status
pub async fn status(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Json<ApiResponse<CheckinStatusView>> {
    ApiResponse::success(checkin::current_status(&state.db, &current_user.username))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    /// Admins may inspect another user's history (or all users when the
    /// filter is omitted).
    pub username: Option<String>,
}

/// GET /api/v1/checkin/history
pub async fn history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<CheckinRecord>>>, AppError> {
    let limit = params.limit.unwrap_or(5);
    let records = if current_user.role == Role::Admin {
        checkin::history(&state.db, params.username.as_deref(), limit)
    } else {
        if params.username.is_some() {
            return Err(AppError::Forbidden(
                "Only admins may view other users' history".to_string(),
            ));
        }
        checkin::history(&state.db, Some(&current_user.username), limit)
    };
    Ok(ApiResponse::success(records))
}
