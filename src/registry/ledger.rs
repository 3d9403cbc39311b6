//! Deployment ledger
//!
//! One row per deployment attempt, independent of the orchestration
//! decisions. Rows are appended as `PENDING` and finished exactly once;
//! nothing here is ever deleted.

use crate::error::AppError;
use crate::models::{DeploymentAttempt, DeploymentRecord, DeploymentStatus};
use chrono::Utc;
use tokio_postgres::{GenericClient, Row};
use uuid::Uuid;

pub struct DeploymentLedger;

fn attempt_from_row(row: &Row) -> Result<DeploymentAttempt, AppError> {
    let status: String = row.get(3);
    Ok(DeploymentAttempt {
        id: row.get(0),
        target_id: row.get(1),
        version_id: row.get(2),
        status: DeploymentStatus::from_db(&status)?,
        failure_reason: row.get(4),
        started_at: row.get(5),
        finished_at: row.get(6),
    })
}

fn record_from_row(row: &Row) -> Result<DeploymentRecord, AppError> {
    let status: String = row.get(3);
    Ok(DeploymentRecord {
        id: row.get(0),
        target_id: row.get(1),
        version_id: row.get(2),
        status: DeploymentStatus::from_db(&status)?,
        failure_reason: row.get(4),
        started_at: row.get(5),
        finished_at: row.get(6),
        target_name: row.get(7),
        schema_name: row.get(8),
        version_sequence: row.get(9),
        version_label: row.get(10),
        version_checksum: row.get(11),
    })
}

impl DeploymentLedger {
    /// Insert a `PENDING` attempt with `started_at = now`
    pub async fn create_attempt(
        client: &impl GenericClient,
        target_id: Uuid,
        version_id: Uuid,
    ) -> Result<DeploymentAttempt, AppError> {
        let attempt = DeploymentAttempt {
            id: Uuid::new_v4(),
            target_id,
            version_id,
            status: DeploymentStatus::Pending,
            failure_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        };

        client
            .execute(
                "INSERT INTO deployment_attempts
                 (id, target_id, version_id, status, failure_reason, started_at, finished_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &attempt.id,
                    &attempt.target_id,
                    &attempt.version_id,
                    &attempt.status.as_str(),
                    &attempt.failure_reason,
                    &attempt.started_at,
                    &attempt.finished_at,
                ],
            )
            .await?;

        Ok(attempt)
    }

    /// Finish an attempt: set the terminal status and `finished_at`, once.
    ///
    /// The failure reason is persisted only for `FAILED` and cleared for
    /// every other status. Fails with `NotFound` when the id does not
    /// exist or the attempt already reached a terminal state.
    pub async fn mark_terminal(
        client: &impl GenericClient,
        attempt_id: Uuid,
        status: DeploymentStatus,
        failure_reason: Option<&str>,
    ) -> Result<DeploymentAttempt, AppError> {
        let reason = match status {
            DeploymentStatus::Failed => failure_reason,
            _ => None,
        };

        let row = client
            .query_opt(
                "UPDATE deployment_attempts
                 SET status = $2, failure_reason = $3, finished_at = $4
                 WHERE id = $1 AND finished_at IS NULL
                 RETURNING id, target_id, version_id, status, failure_reason, started_at, finished_at",
                &[&attempt_id, &status.as_str(), &reason, &Utc::now()],
            )
            .await?;

        match row {
            Some(row) => attempt_from_row(&row),
            None => Err(AppError::NotFound(format!(
                "Deployment attempt {} not found or already finished",
                attempt_id
            ))),
        }
    }

    /// Attempts for a target, most recent first, with version metadata
    pub async fn list_by_target(
        client: &impl GenericClient,
        target_id: Uuid,
    ) -> Result<Vec<DeploymentRecord>, AppError> {
        let rows = client
            .query(
                "SELECT a.id, a.target_id, a.version_id, a.status, a.failure_reason,
                        a.started_at, a.finished_at,
                        t.name, s.name, v.sequence, v.label, v.checksum
                 FROM deployment_attempts a
                 JOIN deployment_targets t ON t.id = a.target_id
                 JOIN schema_versions v ON v.id = a.version_id
                 JOIN logical_schemas s ON s.id = v.logical_schema_id
                 WHERE a.target_id = $1
                 ORDER BY a.started_at DESC",
                &[&target_id],
            )
            .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Single attempt with target and version joined
    pub async fn get_by_id(
        client: &impl GenericClient,
        attempt_id: Uuid,
    ) -> Result<DeploymentRecord, AppError> {
        let row = client
            .query_opt(
                "SELECT a.id, a.target_id, a.version_id, a.status, a.failure_reason,
                        a.started_at, a.finished_at,
                        t.name, s.name, v.sequence, v.label, v.checksum
                 FROM deployment_attempts a
                 JOIN deployment_targets t ON t.id = a.target_id
                 JOIN schema_versions v ON v.id = a.version_id
                 JOIN logical_schemas s ON s.id = v.logical_schema_id
                 WHERE a.id = $1",
                &[&attempt_id],
            )
            .await?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(AppError::NotFound(format!(
                "Deployment attempt {} not found",
                attempt_id
            ))),
        }
    }
}
