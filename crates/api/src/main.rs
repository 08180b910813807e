use std::env;

use anyhow::Result;
use wayfarer_api::build_app;
use wayfarer_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfarer_api");

    let bind = env::var("WAYFARER_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let app = build_app()?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "wayfarer api started");

    axum::serve(listener, app).await?;
    Ok(())
}
