//! Application state management
//!
//! Contains shared state accessible across all handlers. The upstream
//! client is constructed once in main and injected here; nothing else
//! in the process builds one.

use crate::deploy::Deployer;
use crate::registry::TargetService;
use crate::upstream::UpstreamClient;
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Registry connection pool
    pub db_pool: Pool,

    /// Deployment target directory
    pub targets: TargetService,

    /// The deployment orchestrator (core workflow)
    pub deployer: Deployer,

    /// Upstream composition platform client (validate pass-through)
    pub upstream: Arc<dyn UpstreamClient>,
}

impl AppState {
    pub fn new(pool: Pool, upstream: Arc<dyn UpstreamClient>) -> Self {
        let targets = TargetService::new(pool.clone());
        let deployer = Deployer::new(pool.clone(), upstream.clone());

        Self {
            db_pool: pool,
            targets,
            deployer,
            upstream,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
