use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bilancio={level},server={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let db = sea_orm::Database::connect(&settings.database.url).await?;
    Migrator::up(&db, None).await?;

    let ledger = ledger::Ledger::builder().database(db).build().await?;
    ledger.ensure_system_buckets().await?;

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    server::run_with_graceful_shutdown(
        ledger,
        settings.server.api_token,
        listener,
        shutdown_signal(),
    )
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM; in-flight requests drain afterwards.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install SIGINT handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!("failed to install SIGTERM handler: {err}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
