//! GraphGate - Federated Schema Governance Gateway
//!
//! Mediates schema changes between internal services and an external
//! federated-graph composition platform. Services push schema versions
//! through the deployment API; GraphGate records immutable versions and
//! a deployment ledger locally, activates the new version, and
//! synchronizes it with the upstream platform, compensating the ledger
//! when the remote side rejects or is unreachable.

use graphgate_api::config::Settings;
use graphgate_api::db;
use graphgate_api::routes::create_router;
use graphgate_api::state::AppState;
use graphgate_api::upstream::HttpUpstreamClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting GraphGate - Federated Schema Governance Gateway...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    if settings.upstream.token.is_empty() {
        warn!("⚠️  UPSTREAM_TOKEN not set, composition platform calls will be unauthenticated");
    }

    // The upstream client is built exactly once and injected everywhere
    let upstream = Arc::new(HttpUpstreamClient::new(&settings.upstream)?);

    // Initialize database pool - REQUIRED (no fallback to in-memory)
    let pool = match db::init_pool(&settings.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ FATAL: Failed to initialize database pool: {}", e);
            error!("DATABASE_URL must be set in .env and database must be accessible");
            return Err(e);
        }
    };

    // Create registry tables if they don't exist
    if let Err(e) = db::ensure_tables(&pool).await {
        warn!("⚠️  Warning creating tables: {}", e);
    }

    let state = Arc::new(AppState::new(pool, upstream));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Targets ───");
    info!("   POST /api/targets                - Create a deployment target");
    info!("   GET  /api/targets                - List deployment targets");
    info!("   GET  /api/targets/:id            - Get a deployment target");
    info!("");
    info!("   ─── Deployments ───");
    info!("   POST /api/deployments            - Deploy a schema version");
    info!("   POST /api/deployments/rollback   - Roll back to a stored version");
    info!("   GET  /api/deployments?target=    - Deployment history for a target");
    info!("   GET  /api/deployments/:id        - Get a deployment attempt");
    info!("");
    info!("   ─── Schemas ───");
    info!("   GET  /api/schemas/active         - Active version for (target, name)");
    info!("   POST /api/schemas/validate       - Validate against the upstream platform");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,graphgate_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
