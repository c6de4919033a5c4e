use std::env;

/// Application configuration loaded from environment variables. Every key
/// has a default so the server runs out of the box.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: String,
    pub host: String,
    pub port: u16,
    pub default_admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            default_admin_password: env::var("DEFAULT_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin123".to_string()),
        }
    }
}
