//! Route definitions for the Study Space API.

pub mod activity;
pub mod auth;
pub mod checkin;
pub mod health;
pub mod users;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router. Shared between `main` and the
/// integration tests.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/profile", put(auth::update_profile))
        .route("/users", get(users::list).post(users::create))
        .route("/users/{username}", delete(users::remove))
        .route("/users/{username}/lock", post(users::toggle_lock))
        .route("/activity", get(activity::recent))
        .route("/activity/export", get(activity::export))
        .route("/checkin", post(checkin::check_in))
        .route("/checkout", post(checkin::check_out))
        .route("/checkin/status", get(checkin::status))
        .route("/checkin/history", get(checkin::history));

    Router::new()
        .route("/health/live", get(health::live))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
