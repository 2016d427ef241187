//! The binary entry point for the application.

use std::sync::Arc;
use std::time::Duration;

use app_core::config::Config;
use app_core::graph::{DEFAULT_GRAPH_URL, GraphClientFactory, GraphFactory};
use app_core::jwt::{JwtConfig, JwtService, TokenManager};
use app_core::middleware::request_response_logger;
use app_core::password::{Argon2Hasher, Hasher};
use axum::http::StatusCode;
use axum::{Json, Router, middleware, routing};
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use sea_orm::{ConnectOptions, Database};
use tokio::signal;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(fmt::format::FmtSpan::CLOSE),
        )
        .init();

    if let Err(err) = run().await {
        tracing::error!("Application failed to start: {err}");
        std::process::exit(1);
    }
}

/// Initializes all dependencies and starts the web server.
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // The config file is reloaded when it changes, so `facebook.*` flags take
    // effect without a restart.
    let config = Arc::new(
        Config::builder("config/config.yaml")
            .watch_interval(Duration::from_secs(5))
            .watch()
            .build()?,
    );

    let mut db_opt = ConnectOptions::new(config.get::<String>("database.url")?);
    db_opt
        .min_connections(config.get("database.min_connections")?)
        .max_connections(config.get("database.max_connections")?)
        .connect_timeout(Duration::from_secs(config.get("database.connect_timeout_secs")?))
        .acquire_timeout(Duration::from_secs(config.get("database.acquire_timeout_secs")?))
        .idle_timeout(Duration::from_secs(config.get("database.idle_timeout_secs")?))
        .max_lifetime(Duration::from_secs(config.get("database.max_lifetime_secs")?))
        .sqlx_logging(config.get("database.sqlx_logging")?)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db_pool = Arc::new(Database::connect(db_opt).await?);

    let rds_manager = RedisConnectionManager::new(config.get::<String>("redis.url")?)?;
    let rds_pool = Pool::builder()
        .max_size(config.get::<u32>("redis.max_connections")?)
        .build(rds_manager)
        .await?;

    let hasher: Arc<dyn Hasher> = Arc::new(Argon2Hasher::new());

    let token_manager: Arc<dyn TokenManager> = Arc::new(JwtService::new(JwtConfig {
        access_secret: config.get("jwt.access_secret")?,
        refresh_secret: config.get("jwt.refresh_secret")?,
        access_exp_secs: config.get("jwt.access_expiration_secs")?,
        refresh_exp_secs: config.get("jwt.refresh_expiration_secs")?,
        issuer: config.get("jwt.issuer")?,
        audience: config.get("jwt.audience")?,
    }));

    let graph_timeout = Duration::from_secs(config.get_or("facebook.timeout_secs", 10));
    let http = reqwest::Client::builder().timeout(graph_timeout).build()?;
    let graph_url = config.get_or("facebook.graph_url", DEFAULT_GRAPH_URL.to_string());
    let graphs: Arc<dyn GraphFactory> = Arc::new(GraphClientFactory::new(http, graph_url));

    let connect_state = connect::new(connect::Dependency {
        db: db_pool,
        rds: rds_pool,
        config: config.clone(),
        hasher,
        token: token_manager.clone(),
        graphs,
    });

    let timeout_secs = Duration::from_secs(config.get::<u64>("server.timeout_secs")?);
    let app = Router::new()
        .merge(connect::create_router(connect_state, token_manager))
        .route(
            "/",
            routing::get(|| async { Json(serde_json::json!({"message": "Hello from fbconnect"})) }),
        )
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"message": "Endpoint not found"})),
            )
        })
        .method_not_allowed_fallback(|| async {
            (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(serde_json::json!({"message": "Method not allowed"})),
            )
        })
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_response_logger))
                .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout_secs)),
        );

    let server_address = config.get::<String>("server.address")?;
    let listener = tokio::net::TcpListener::bind(&server_address).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    let (shutdown_tx, _) = broadcast::channel(1);
    spawn_shutdown_listener(shutdown_tx.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_tx.subscribe().recv().await.ok();
            tracing::info!("Server is shutting down gracefully...");
        })
        .await?;

    Ok(())
}

/// Spawns a background task to listen for system shutdown signals.
fn spawn_shutdown_listener(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("Failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                },
                Err(err) => {
                    tracing::error!("Failed to install SIGTERM handler: {err}");
                    std::future::pending::<()>().await;
                },
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("Received SIGINT (Ctrl+C)")},
            _ = terminate => { tracing::info!("Received SIGTERM")},
        }

        if shutdown_tx.send(()).is_err() {
            tracing::error!("Failed to send shutdown signal");
        }
    });
}
