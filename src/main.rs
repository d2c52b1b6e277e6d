use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::sync::mpsc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{info, warn};

use stockroom_api::{
    app_router, config, db, events, handlers::AppServices, notifications::LogNotifier, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!(
        environment = %cfg.environment,
        "Starting stockroom-api v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    if cfg.auto_migrate {
        db::run_migrations(&db_pool)
            .await
            .context("database migration failed")?;
    }

    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = events::EventSender::new(event_tx);
    tokio::spawn(events::process_events(event_rx));

    let db_pool = Arc::new(db_pool);
    let notifier = Arc::new(LogNotifier::new(cfg.admin_email.clone()));
    let services = AppServices::new(
        db_pool.clone(),
        Arc::new(event_sender.clone()),
        notifier,
    );

    let state = Arc::new(AppState {
        db: db_pool,
        config: cfg.clone(),
        event_sender,
        services,
    });

    let cors = build_cors(&cfg)?;
    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            cfg.request_timeout_secs,
        )))
        .layer(cors);

    let ip: IpAddr = cfg
        .host
        .parse()
        .with_context(|| format!("invalid host address: {}", cfg.host))?;
    let addr = SocketAddr::new(ip, cfg.port);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down cleanly");
    Ok(())
}

/// Explicit origins when configured; permissive only in development or when
/// explicitly allowed.
fn build_cors(cfg: &config::AppConfig) -> anyhow::Result<CorsLayer> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if let Some(origins) = cfg.cors_allowed_origins.as_deref() {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin: {}", origin))
            })
            .collect::<anyhow::Result<_>>()?;

        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any));
    }

    if cfg.should_allow_permissive_cors() {
        warn!("CORS is permissive; configure cors_allowed_origins for production");
        return Ok(CorsLayer::permissive());
    }

    anyhow::bail!("cors_allowed_origins must be set outside development")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
