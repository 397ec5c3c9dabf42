use anyhow::Result;
use std::sync::Arc;

use tabletalk::config::Config;
use tabletalk::service::ChatService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; log level comes from RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Arc::new(Config::load());

    // Create the chat service and its HTTP router
    let service = ChatService::new(config.clone())?;
    let router = service.router();

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        model = %config.inference.model,
        "Starting {} v{}",
        config.server.name,
        config.server.version
    );

    axum::serve(listener, router).await?;
    Ok(())
}
