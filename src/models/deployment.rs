//! Deployment attempt models

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a deployment attempt.
///
/// Deploys move `Pending -> Succeeded` or `Pending -> Failed`; both are
/// terminal. `RolledBack` is reserved for operator tooling and is never
/// produced by the deploy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Pending,
    Succeeded,
    Failed,
    RolledBack,
}

impl DeploymentStatus {
    /// Text representation stored in the ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "PENDING",
            DeploymentStatus::Succeeded => "SUCCEEDED",
            DeploymentStatus::Failed => "FAILED",
            DeploymentStatus::RolledBack => "ROLLED_BACK",
        }
    }

    pub fn from_db(value: &str) -> Result<Self, AppError> {
        match value {
            "PENDING" => Ok(DeploymentStatus::Pending),
            "SUCCEEDED" => Ok(DeploymentStatus::Succeeded),
            "FAILED" => Ok(DeploymentStatus::Failed),
            "ROLLED_BACK" => Ok(DeploymentStatus::RolledBack),
            other => Err(AppError::Internal(format!(
                "Unknown deployment status in ledger: {}",
                other
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeploymentStatus::Pending)
    }
}

/// One record per deploy-or-rollback invocation.
///
/// Append-then-update lifecycle: inserted as `Pending`, finished exactly
/// once when `finished_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentAttempt {
    pub id: Uuid,
    pub target_id: Uuid,
    pub version_id: Uuid,
    pub status: DeploymentStatus,
    /// Populated only when the attempt failed
    pub failure_reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Deployment attempt joined with its target and version metadata,
/// as returned by the ledger history queries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub id: Uuid,
    pub target_id: Uuid,
    pub target_name: String,
    pub version_id: Uuid,
    pub schema_name: String,
    pub version_sequence: i64,
    pub version_label: String,
    pub version_checksum: String,
    pub status: DeploymentStatus,
    pub failure_reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_round_trip() {
        for status in [
            DeploymentStatus::Pending,
            DeploymentStatus::Succeeded,
            DeploymentStatus::Failed,
            DeploymentStatus::RolledBack,
        ] {
            assert_eq!(DeploymentStatus::from_db(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        assert!(DeploymentStatus::from_db("EXPLODED").is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!DeploymentStatus::Pending.is_terminal());
        assert!(DeploymentStatus::Succeeded.is_terminal());
        assert!(DeploymentStatus::Failed.is_terminal());
        assert!(DeploymentStatus::RolledBack.is_terminal());
    }
}
