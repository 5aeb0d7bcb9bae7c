use std::sync::Arc;

use anyhow::Result;
use common::ShareRegistry;
use tracing::info;
use tracing_subscriber::EnvFilter;

use web::{
    AppState, config::AppConfig, create_router, mailer, sweeper::start_sweeper,
    templates::Templates,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting Sanchar file-sharing service");

    let registry = ShareRegistry::new(config.registry.limits());
    let mailer = mailer::from_config(&config.smtp)?;
    let templates = Arc::new(Templates::new()?);

    let mut scheduler = start_sweeper(registry.clone(), &config.registry.sweep_schedule).await?;

    let app_state = AppState {
        registry,
        templates,
        mailer,
        public_base_url: config.server.public_base_url.clone(),
    };

    // Start the web server
    let app = create_router(app_state, &config.server);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Sanchar listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down Sanchar");
        })
        .await?;

    scheduler.shutdown().await?;

    Ok(())
}
