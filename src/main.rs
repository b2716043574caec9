use std::sync::Arc;

use faculty_admin::api::{ApiClient, ReqwestTransport};
use faculty_admin::config::AppConfig;
use faculty_admin::routes::router;
use faculty_admin::session::{Session, SqliteSessionStore};
use faculty_admin::state::AppState;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "faculty_admin=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    let store = SqliteSessionStore::new(pool.clone());
    store.migrate().await?;

    let transport = Arc::new(ReqwestTransport::new()?);
    let api = ApiClient::new(config.api_base.clone(), transport, Session::new(Arc::new(store)));

    let state = AppState {
        db: pool,
        api: Arc::new(api),
    };

    let app = router(state);

    info!("backend API at {}", config.api_base);
    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
