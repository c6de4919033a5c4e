use std::net::SocketAddr;

use mimalloc::MiMalloc;
use study_space::config::AppConfig;
use study_space::db::Db;
use study_space::services::{account, session::SessionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_space=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let db = Db::open(&config.data_dir);

    // The system must never be unrecoverable: the default admin always
    // exists and is unlocked after startup.
    account::ensure_default_admin(&db, &config.default_admin_password)?;

    let state = study_space::AppState {
        db,
        sessions: SessionStore::new(),
        config: config.clone(),
    };
    let app = study_space::routes::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(host = %addr, "Starting Study Space API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
