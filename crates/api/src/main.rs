use std::net::SocketAddr;
use std::sync::Arc;

use notifications_api::config::ServerConfig;
use notifications_api::router::build_app_router;
use notifications_api::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notifications_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        async_emails = config.async_emails,
        allow_editing_companies = config.allow_editing_companies,
        mock_registries = config.mock_registries,
        "Loaded server configuration"
    );
    if config.notifications_token.is_none() {
        tracing::warn!("NOTIFICATIONS_TOKEN is not set; GET /fetch will refuse every call");
    }
    if config.async_emails {
        tracing::info!("Trigger and resend are queued; run notifications-worker to deliver them");
    }

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = notifications_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    notifications_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    notifications_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let mailer = notifications_mailer::mailer_from_env().expect("Failed to configure the mailer");

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let config = Arc::new(config);
    let app = build_app_router(
        AppState {
            pool,
            config: Arc::clone(&config),
            mailer,
        },
        &config,
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Notifications API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!(signal = "SIGINT", "Shutting down"),
        () = terminate => tracing::info!(signal = "SIGTERM", "Shutting down"),
    }
}
