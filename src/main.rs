use boutique_api::api::AppState;
use boutique_api::config::{AppConfig, StorageBackend};
use boutique_api::storage::{MemoryStore, MongoStore, Store};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("🚀 Starting boutique API server");

    // Load configuration
    let config = AppConfig::load()?;
    info!("📋 Configuration loaded");
    info!("   - Storage: {}", config.database.backend);
    info!("   - Server: {}", config.bind_addr());
    info!("   - Token TTL: {} days", config.auth.token_ttl_days);
    if config.auth.uses_default_secret() {
        warn!("⚠️  auth.jwt_secret is the built-in default; set JWT_SECRET in production");
    }
    if !config.auth.admin_email_suffix.is_empty() {
        warn!(
            suffix = %config.auth.admin_email_suffix,
            "Registrations with this email suffix are granted admin"
        );
    }

    // Initialize storage
    let store: Arc<dyn Store> = match config.database.backend {
        StorageBackend::Mongo => {
            info!("💾 Connecting to MongoDB...");
            Arc::new(MongoStore::connect(&config.database.uri, &config.database.name).await?)
        }
        StorageBackend::Memory => {
            warn!("💾 Using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };
    info!("✅ Storage ready");

    let state = AppState::new(store, &config.auth);
    let app = boutique_api::app(state, &config.cors);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("📡 Available endpoints:");
    info!("   GET   /api/health                - Health check");
    info!("   POST  /api/auth/register         - Create account");
    info!("   POST  /api/auth/login            - Sign in");
    info!("   GET   /api/cart                  - Current cart");
    info!("   POST  /api/cart                  - Replace cart");
    info!("   GET   /api/orders                - My orders");
    info!("   POST  /api/orders                - Place order");
    info!("   GET   /api/appointments          - My appointments");
    info!("   POST  /api/appointments          - Book appointment");
    info!("   GET   /api/admin/orders          - All orders (admin)");
    info!("   PATCH /api/admin/orders/{{id}}     - Set order status (admin)");
    info!("   GET   /api/admin/appointments    - All appointments (admin)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
