//! Database connection management
//!
//! Builds the registry connection pool and bootstraps the schema
//! tables on startup.

use crate::config::DatabaseConfig;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

/// Create the connection pool, with TLS when the configuration demands
/// it (managed providers such as Neon refuse plain connections).
pub async fn init_pool(config: &DatabaseConfig) -> anyhow::Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = if config.require_tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| anyhow::anyhow!("Failed to create TLS pool: {}", e))?
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| anyhow::anyhow!("Failed to create pool: {}", e))?
    };

    // Verify the pool actually reaches the database before serving
    let client = pool.get().await
        .map_err(|e| anyhow::anyhow!("Failed to get pool connection: {}", e))?;
    client.query_one("SELECT 1 as ok", &[])
        .await
        .map_err(|e| anyhow::anyhow!("Failed to verify database connection: {}", e))?;

    info!("✅ Database connection successful (TLS: {})", config.require_tls);
    Ok(pool)
}

/// Create registry tables if they don't exist
pub async fn ensure_tables(pool: &Pool) -> anyhow::Result<()> {
    let client = pool.get().await?;

    client.execute(
        "CREATE TABLE IF NOT EXISTS deployment_targets (
            id UUID PRIMARY KEY,
            name VARCHAR(255) UNIQUE NOT NULL,
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        &[],
    ).await?;

    client.execute(
        "CREATE TABLE IF NOT EXISTS logical_schemas (
            id UUID PRIMARY KEY,
            target_id UUID NOT NULL REFERENCES deployment_targets(id) ON DELETE CASCADE,
            name VARCHAR(255) NOT NULL,
            active_version_id UUID,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (target_id, name)
        )",
        &[],
    ).await?;

    client.execute(
        "CREATE TABLE IF NOT EXISTS schema_versions (
            id UUID PRIMARY KEY,
            logical_schema_id UUID NOT NULL REFERENCES logical_schemas(id) ON DELETE CASCADE,
            sequence BIGINT NOT NULL,
            label VARCHAR(255) NOT NULL,
            sdl TEXT NOT NULL,
            checksum VARCHAR(64) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            UNIQUE (logical_schema_id, sequence)
        )",
        &[],
    ).await?;

    client.execute(
        "CREATE TABLE IF NOT EXISTS deployment_attempts (
            id UUID PRIMARY KEY,
            target_id UUID NOT NULL REFERENCES deployment_targets(id) ON DELETE CASCADE,
            version_id UUID NOT NULL REFERENCES schema_versions(id) ON DELETE CASCADE,
            status VARCHAR(20) NOT NULL,
            failure_reason TEXT,
            started_at TIMESTAMPTZ NOT NULL,
            finished_at TIMESTAMPTZ
        )",
        &[],
    ).await?;

    // Indexes for the hot queries
    let _ = client.execute(
        "CREATE INDEX IF NOT EXISTS idx_schema_versions_schema_id
         ON schema_versions(logical_schema_id)",
        &[],
    ).await;
    let _ = client.execute(
        "CREATE INDEX IF NOT EXISTS idx_deployment_attempts_target_started
         ON deployment_attempts(target_id, started_at DESC)",
        &[],
    ).await;

    info!("✅ Registry tables initialized");
    Ok(())
}
