//! Logical schema and schema version models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named, persistent identity for a schema within a deployment target.
///
/// Created lazily on first deploy; mutated only to move the
/// active-version pointer, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalSchema {
    pub id: Uuid,
    pub target_id: Uuid,
    pub name: String,
    /// Nullable until the first successful (non-dry-run) deploy
    pub active_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One immutable, content-addressed snapshot of schema text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersion {
    pub id: Uuid,
    pub logical_schema_id: Uuid,
    /// Strictly increasing per logical schema, assigned under the
    /// schema row lock
    pub sequence: i64,
    pub label: String,
    pub sdl: String,
    /// Lowercase hex SHA-256 of the raw SDL bytes
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}
