use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notifications_worker=debug,notifications_mailer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = notifications_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    notifications_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    let mailer = notifications_mailer::mailer_from_env().context("Failed to configure mailer")?;
    let dispatcher = notifications_mailer::Dispatcher::new(pool.clone(), mailer);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    notifications_worker::run(
        pool,
        dispatcher,
        notifications_worker::WorkerConfig::from_env(),
        cancel,
    )
    .await;
    Ok(())
}
