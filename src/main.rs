use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use songrec_api::api::{create_router, AppState};
use songrec_api::config::Config;
use songrec_api::db::{create_pool, run_migrations, PgRecommendationRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&pool).await?;

    let repository = Arc::new(PgRecommendationRepository::new(pool));
    let state = AppState::with_repository(repository);

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
