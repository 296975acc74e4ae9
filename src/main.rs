use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use tenant_boot::{
    bootstrap::SelfHealingBootstrapper,
    config::ConfigSnapshot,
    infrastructure::{
        database::{DataStore, DatabaseManager},
        password::Argon2PasswordHasher,
    },
    logging::init_logging,
    presentation::create_router,
    queue::{InMemoryMessageQueue, QueueActivator},
    sessions::{SessionOrchestrator, SessionRegistry},
    startup::{StartupSequence, StoreRetry},
    AppState,
};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "❌ Failed to listen for shutdown signal");
        return;
    }
    info!("🛑 Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Arc::new(ConfigSnapshot::from_env().context("Failed to read configuration")?);
    init_logging(&config.log_format)?;

    if let Err(e) = config.validate() {
        error!(missing = ?config.missing_required(), "❌ {}", e);
        return Err(e).context("Configuration is incomplete");
    }

    let hasher = Arc::new(Argon2PasswordHasher::new(&config.password_hash)?);
    // Reachability is checked by the startup sequence, after the listener is up.
    let store: Arc<dyn DataStore> = Arc::new(
        DatabaseManager::open(&config.database, config.probe_timeout)
            .await
            .context("Failed to configure the MongoDB client")?,
    );

    let sessions = Arc::new(SessionRegistry::new());
    let state = AppState {
        config: Arc::clone(&config),
        store: Arc::clone(&store),
        hasher: hasher.clone(),
        sessions: Arc::clone(&sessions),
        started_at: Instant::now(),
    };

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;

    info!("🚀 Server started successfully on port {}", config.port);
    info!("📊 Health check: http://localhost:{}/api/health", config.port);
    info!(database = ?config.database.summary(), "🗄️ Database");

    let sequence = StartupSequence::new(
        Arc::clone(&store),
        SelfHealingBootstrapper::new(store, hasher),
        SessionOrchestrator::new(sessions, config.session_start_timeout),
        QueueActivator::new(Arc::new(InMemoryMessageQueue::new())),
    )
    .with_store_retry(StoreRetry {
        max_attempts: config.db_connect_attempts,
        delay: config.db_connect_delay,
    });
    tokio::spawn(async move {
        let report = sequence.run().await;
        let degraded = !report.store_reachable
            || report.bootstrap.is_degraded()
            || report.queue_error.is_some();
        if degraded {
            warn!(
                store_reachable = report.store_reachable,
                bootstrap = %report.bootstrap,
                queue_error = ?report.queue_error,
                "⚠️ Server is running degraded; run `diagnose` for details"
            );
        }
    });

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
