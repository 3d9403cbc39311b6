//! Deployment target (variant) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Isolation boundary (environment) under which logical schemas live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTarget {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Typed reference to a deployment target.
///
/// Core APIs never take an ambiguous string; callers resolve raw
/// identifiers through the route-layer adapter first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    Id(Uuid),
    Name(String),
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetRef::Id(id) => write!(f, "{}", id),
            TargetRef::Name(name) => write!(f, "{}", name),
        }
    }
}
