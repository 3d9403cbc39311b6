//! Deployment target directory
//!
//! Simple data access for targets (variants): creation, listing, and
//! resolution by id or name. The deploy core only ever reads identity
//! from here.

use crate::error::AppError;
use crate::models::{DeploymentTarget, TargetRef};
use chrono::Utc;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

#[derive(Clone)]
pub struct TargetService {
    pool: Pool,
}

fn target_from_row(row: &Row) -> DeploymentTarget {
    DeploymentTarget {
        id: row.get(0),
        name: row.get(1),
        description: row.get(2),
        created_at: row.get(3),
    }
}

impl TargetService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new deployment target
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<DeploymentTarget, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                "INSERT INTO deployment_targets (id, name, description, created_at)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, name, description, created_at",
                &[&Uuid::new_v4(), &name, &description, &Utc::now()],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint") {
                    AppError::Conflict(format!("Target '{}' already exists", name))
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(target_from_row(&row))
    }

    /// List all deployment targets
    pub async fn list(&self) -> Result<Vec<DeploymentTarget>, AppError> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT id, name, description, created_at
                 FROM deployment_targets ORDER BY created_at DESC",
                &[],
            )
            .await?;

        Ok(rows.iter().map(target_from_row).collect())
    }

    /// Find a target by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DeploymentTarget>, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, name, description, created_at
                 FROM deployment_targets WHERE id = $1",
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(target_from_row))
    }

    /// Find a target by its human-readable name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<DeploymentTarget>, AppError> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, name, description, created_at
                 FROM deployment_targets WHERE name = $1",
                &[&name],
            )
            .await?;

        Ok(row.as_ref().map(target_from_row))
    }

    /// Resolve a typed target reference, failing with `TargetNotFound`
    /// when it points at nothing.
    pub async fn resolve(&self, target: &TargetRef) -> Result<DeploymentTarget, AppError> {
        let resolved = match target {
            TargetRef::Id(id) => self.find_by_id(*id).await?,
            TargetRef::Name(name) => self.find_by_name(name).await?,
        };

        resolved.ok_or_else(|| AppError::TargetNotFound(target.to_string()))
    }

    /// Resolve an opaque identifier string: treat it as an id first, then
    /// fall back to a name lookup. When a value is valid as both, the id
    /// match wins. This convenience lives here so the deploy core only
    /// ever sees typed references.
    pub async fn resolve_identifier(&self, raw: &str) -> Result<DeploymentTarget, AppError> {
        if let Ok(id) = raw.parse::<Uuid>() {
            if let Some(target) = self.find_by_id(id).await? {
                return Ok(target);
            }
        }

        self.find_by_name(raw)
            .await?
            .ok_or_else(|| AppError::TargetNotFound(raw.to_string()))
    }
}
