//! Admin-only user administration routes.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::activity::EventType;
use crate::models::user::{AccountView, Role};
use crate::services::account;
use crate::services::activity;
use crate::services::auth::normalize_username;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub q: Option<String>,
}

/// GET /api/v1/users — filtered listing.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserSearchQuery>,
) -> Result<Json<ApiResponse<Vec<AccountView>>>, AppError> {
    let views = account::search(
        &state.db,
        params.role.as_deref(),
        params.status.as_deref(),
        params.q.as_deref(),
    )?;
    Ok(ApiResponse::success(views))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

/// POST /api/v1/users — admin user creation with profile in one call.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<AccountView>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = account::create(&state.db, &body.username, &body.password, Some(&body.email))?;
    if !created {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    let name = if body.name.is_empty() {
        body.username.clone()
    } else {
        body.name.clone()
    };
    account::upsert_profile(&state.db, &body.username, &name, &body.email, body.role)?;

    let key = normalize_username(&body.username);
    activity::record(
        &state.db,
        EventType::UserCreated,
        &admin.username,
        format!("New user {key} created with email {}", body.email),
    )?;

    let accounts = state.db.accounts.read()?;
    let account = accounts
        .get(&key)
        .ok_or_else(|| AppError::Internal(format!("account {key} missing after create")))?;
    Ok(ApiResponse::success(AccountView::from_entry(&key, account)))
}

/// DELETE /api/v1/users/{username}
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    if !account::delete(&state.db, &username, &admin.username)? {
        return Err(AppError::NotFound(format!("User {username} not found")));
    }
    Ok(ApiResponse::success("User deleted"))
}

/// POST /api/v1/users/{username}/lock — toggle the administrator lock.
pub async fn toggle_lock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<AccountView>>, AppError> {
    if !account::toggle_lock(&state.db, &username, &admin.username)? {
        return Err(AppError::NotFound(format!("User {username} not found")));
    }
    let key = normalize_username(&username);
    let accounts = state.db.accounts.read()?;
    let account = accounts
        .get(&key)
        .ok_or_else(|| AppError::NotFound(format!("User {key} not found")))?;
    Ok(ApiResponse::success(AccountView::from_entry(&key, account)))
}
