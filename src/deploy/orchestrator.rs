//! Deployment orchestrator
//!
//! Drives the atomic deploy workflow: persist a new schema version
//! locally, activate it, publish it upstream, and reconcile the ledger
//! with the outcome.
//!
//! Known limitation, by contract: local activation happens before the
//! remote publish confirms. A crash between activation and publish
//! leaves the pointer on an unconfirmed version with the ledger row
//! still PENDING as the operator's signal; a rejected publish leaves
//! the pointer on the rejected version with the row FAILED. This is a
//! compensating-transaction pattern, not atomicity across both systems.

use crate::error::AppError;
use crate::models::{DeploymentAttempt, DeploymentStatus, TargetRef};
use crate::registry::{DeploymentLedger, SchemaStore, TargetService};
use crate::upstream::UpstreamClient;
use deadpool_postgres::Pool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct Deployer {
    pool: Pool,
    targets: TargetService,
    upstream: Arc<dyn UpstreamClient>,
}

impl Deployer {
    /// Single construction point; the upstream client is injected here
    /// and nowhere else.
    pub fn new(pool: Pool, upstream: Arc<dyn UpstreamClient>) -> Self {
        let targets = TargetService::new(pool.clone());
        Self {
            pool,
            targets,
            upstream,
        }
    }

    /// Deploy a new schema version to a target.
    ///
    /// One transaction covers the local steps (find-or-create schema,
    /// append version, ledger insert, activation). The upstream publish
    /// is awaited while that transaction is open; whatever the outcome,
    /// the attempt reaches a terminal state before the call returns or
    /// the error propagates. Only writers to the same logical schema
    /// block on an in-flight deploy.
    pub async fn deploy(
        &self,
        target: &TargetRef,
        schema_name: &str,
        sdl: &str,
        label: &str,
        dry_run: bool,
    ) -> Result<DeploymentAttempt, AppError> {
        // Resolve before any row is written: an unknown target must
        // leave no trace in the ledger.
        let target = self.targets.resolve(target).await?;

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let schema = SchemaStore::find_or_create(&*tx, target.id, schema_name).await?;
        let version = SchemaStore::append_version(&*tx, schema.id, sdl, label).await?;
        let attempt = DeploymentLedger::create_attempt(&*tx, target.id, version.id).await?;

        if dry_run {
            // Rehearsal: the version is stored for provenance but never
            // activated, and the upstream is not contacted.
            let attempt =
                DeploymentLedger::mark_terminal(&*tx, attempt.id, DeploymentStatus::Succeeded, None)
                    .await?;
            tx.commit().await?;

            info!(
                target = %target.name,
                schema = %schema_name,
                sequence = version.sequence,
                "dry-run deployment recorded"
            );
            return Ok(attempt);
        }

        SchemaStore::activate_version(&*tx, schema.id, version.id).await?;

        match self
            .upstream
            .publish(&target.name, schema_name, sdl, label)
            .await
        {
            Ok(outcome) if outcome.accepted => {
                let attempt = DeploymentLedger::mark_terminal(
                    &*tx,
                    attempt.id,
                    DeploymentStatus::Succeeded,
                    None,
                )
                .await?;
                tx.commit().await?;

                info!(
                    target = %target.name,
                    schema = %schema_name,
                    sequence = version.sequence,
                    launch_url = outcome.launch_url.as_deref().unwrap_or(""),
                    "schema version published"
                );
                Ok(attempt)
            }
            Ok(outcome) => {
                let reason = outcome.rejection_reason();
                DeploymentLedger::mark_terminal(
                    &*tx,
                    attempt.id,
                    DeploymentStatus::Failed,
                    Some(&reason),
                )
                .await?;
                tx.commit().await?;

                warn!(
                    target = %target.name,
                    schema = %schema_name,
                    reason = %reason,
                    "publish rejected by composition platform"
                );
                Err(AppError::CompositionRejected(
                    outcome
                        .composition_errors
                        .into_iter()
                        .map(|e| e.message)
                        .collect(),
                ))
            }
            Err(err) => {
                let reason = err.to_string();
                DeploymentLedger::mark_terminal(
                    &*tx,
                    attempt.id,
                    DeploymentStatus::Failed,
                    Some(&reason),
                )
                .await?;
                tx.commit().await?;

                warn!(
                    target = %target.name,
                    schema = %schema_name,
                    error = %reason,
                    "publish failed in transit"
                );
                Err(err)
            }
        }
    }

    /// Re-activate a previously stored version, locally only.
    ///
    /// No upstream call is made: rollback assumes the version was
    /// accepted upstream when it was first published. Rolling back to a
    /// version that never was diverges local and remote state with no
    /// automatic detection.
    pub async fn rollback(
        &self,
        target_id: Uuid,
        version_id: Uuid,
    ) -> Result<DeploymentAttempt, AppError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let version = SchemaStore::get_version(&*tx, version_id)
            .await?
            .ok_or(AppError::VersionNotFound(version_id))?;

        // A version id must not be replayable onto a foreign target.
        let schema = SchemaStore::find_by_id(&*tx, version.logical_schema_id)
            .await?
            .ok_or(AppError::VersionNotFound(version_id))?;
        if schema.target_id != target_id {
            return Err(AppError::VersionNotFound(version_id));
        }

        let attempt = DeploymentLedger::create_attempt(&*tx, target_id, version.id).await?;
        SchemaStore::activate_version(&*tx, schema.id, version.id).await?;
        let attempt =
            DeploymentLedger::mark_terminal(&*tx, attempt.id, DeploymentStatus::Succeeded, None)
                .await?;
        tx.commit().await?;

        info!(
            schema = %schema.name,
            sequence = version.sequence,
            "active version rolled back"
        );
        Ok(attempt)
    }
}
