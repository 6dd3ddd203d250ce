use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use ambassador::config::Config;
use ambassador::db::connect_to_db;
use ambassador::routes::build_router;
use ambassador::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ambassador=debug,sqlx=warn")),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Starting Ambassador API");

    let db = connect_to_db(&config).await?;
    let app = build_router(AppState::new(db));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Listening");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
