use parcel_server::config::Config;
use parcel_server::state::AppState;
use parcel_server::{api, sweeper};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parcel_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let http_port = config.http_port;

    tracing::info!("Starting parcel-server (env: {})", config.environment);

    let state = AppState::new(config).await?;

    sweeper::spawn_expiry_sweeper(state.clone());
    sweeper::spawn_rate_limit_cleanup(&state);

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("parcel-server HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("parcel-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
