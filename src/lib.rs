pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::session::SessionStore;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
    pub sessions: SessionStore,
    pub config: config::AppConfig,
}
