mod config;
mod error;
mod images;
mod media;
mod routes;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use config::AppConfig;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gallery_api=info".parse()?),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(
        cloud_name = %config.cloud_name,
        api_base_url = %config.api_base_url,
        delivery_base_url = %config.delivery_base_url,
        list_max_results = config.list_max_results,
        upload_max_bytes = config.upload_max_bytes,
        upstream_timeout_secs = config.upstream_timeout.map(|timeout| timeout.as_secs()),
        "Gallery proxy configured"
    );

    let state = AppState::from_config(config)?;
    let router = app_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        routes = "/images, /api/cloudinary, /healthz",
        "Serving gallery images"
    );
    axum::serve(listener, router).await?;
    Ok(())
}
