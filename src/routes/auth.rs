//! Authentication routes: login, signup, logout, current profile.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::activity::EventType;
use crate::models::user::{AccountView, Role};
use crate::services::account::{self, ProfileUpdate};
use crate::services::auth::{self as auth_service, normalize_username};
use crate::services::activity;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Credential-check outcome for the UI. Failures are reported here with
/// the exact policy message, never as an HTTP error.
#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
    pub remaining_lockout_minutes: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginOutcome>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let key = normalize_username(&body.username);
    let check = auth_service::check_credentials(&state.db, &body.username, &body.password)?;

    if !check.success {
        let description = if check.remaining_lockout_minutes > 0 {
            format!(
                "Account locked - {} minutes remaining",
                check.remaining_lockout_minutes
            )
        } else {
            check.message.clone()
        };
        activity::record(&state.db, EventType::LoginFailed, &key, description)?;
        return Ok(ApiResponse::success(LoginOutcome {
            success: false,
            message: check.message,
            remaining_lockout_minutes: check.remaining_lockout_minutes,
            username: key,
            token: None,
            role: None,
        }));
    }

    // The role travels with the check outcome; a re-read here could race
    // with a concurrent delete and mint a session for a gone account.
    let role = check
        .role
        .ok_or_else(|| AppError::Internal("credential check succeeded without a role".to_string()))?;
    let token = state.sessions.create(&key, role);
    activity::record(
        &state.db,
        EventType::LoginSuccess,
        &key,
        format!("User {key} logged in successfully"),
    )?;

    Ok(ApiResponse::success(LoginOutcome {
        success: true,
        message: check.message,
        remaining_lockout_minutes: 0,
        username: key,
        token: Some(token),
        role: Some(role),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

/// POST /api/v1/auth/signup — self-service registration with the User role.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Json<ApiResponse<AccountView>>, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = account::create(&state.db, &body.username, &body.password, Some(&body.email))?;
    if !created {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    account::upsert_profile(&state.db, &body.username, &body.username, &body.email, Role::User)?;

    let key = normalize_username(&body.username);
    activity::record(
        &state.db,
        EventType::UserCreated,
        &key,
        format!("New user {key} created with default role"),
    )?;

    let accounts = state.db.accounts.read()?;
    let account = accounts
        .get(&key)
        .ok_or_else(|| AppError::Internal(format!("account {key} missing after signup")))?;
    Ok(ApiResponse::success(AccountView::from_entry(&key, account)))
}

/// POST /api/v1/auth/logout — drops the server-side session.
pub async fn logout(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    state.sessions.remove(&current_user.token);
    activity::record(
        &state.db,
        EventType::Logout,
        &current_user.username,
        "User logged out",
    )?;
    Ok(ApiResponse::success("Logged out successfully"))
}

/// GET /api/v1/auth/me — current user profile.
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<AccountView>>, AppError> {
    let accounts = state.db.accounts.read()?;
    let account = accounts
        .get(&current_user.username)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", current_user.username)))?;
    Ok(ApiResponse::success(AccountView::from_entry(
        &current_user.username,
        account,
    )))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub new_username: Option<String>,
    pub name: String,
    pub email: String,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// PUT /api/v1/profile — update the session user's profile. On a rename
/// the session is rebound to the new username.
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<AccountView>>, AppError> {
    let view = account::update_profile(
        &state.db,
        ProfileUpdate {
            username: current_user.username.clone(),
            new_username: body.new_username,
            name: body.name,
            email: body.email,
            current_password: body.current_password,
            new_password: body.new_password,
            confirm_password: body.confirm_password,
        },
    )?;

    if view.username != current_user.username {
        state.sessions.rebind(&current_user.token, &view.username);
    }
    Ok(ApiResponse::success(view))
}
