//! Version store
//!
//! Owns logical schemas and their immutable version history. Every
//! operation takes a `GenericClient` so the orchestrator can run the
//! whole deploy sequence on one transaction; `find_or_create` locks the
//! logical-schema row for the rest of that transaction, which is what
//! keeps sequence assignment race-free under concurrent deploys.

use crate::error::AppError;
use crate::models::{LogicalSchema, SchemaVersion};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio_postgres::{GenericClient, Row};
use uuid::Uuid;

pub struct SchemaStore;

fn logical_schema_from_row(row: &Row) -> LogicalSchema {
    LogicalSchema {
        id: row.get(0),
        target_id: row.get(1),
        name: row.get(2),
        active_version_id: row.get(3),
        created_at: row.get(4),
    }
}

fn version_from_row(row: &Row) -> SchemaVersion {
    SchemaVersion {
        id: row.get(0),
        logical_schema_id: row.get(1),
        sequence: row.get(2),
        label: row.get(3),
        sdl: row.get(4),
        checksum: row.get(5),
        created_at: row.get(6),
    }
}

impl SchemaStore {
    /// Content checksum: lowercase hex SHA-256 over the raw SDL bytes.
    /// Identical text (including whitespace) always hashes identically.
    pub fn checksum(sdl: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(sdl.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Return the logical schema for `(target_id, name)`, creating it with
    /// no active version on first use.
    ///
    /// Must run inside the deploy transaction: the returned row is held
    /// `FOR UPDATE` (or implicitly by our own insert), serializing
    /// concurrent deploys to the same schema name. A concurrent creator
    /// makes our insert a no-op and the follow-up select blocks until the
    /// winner commits.
    pub async fn find_or_create(
        client: &impl GenericClient,
        target_id: Uuid,
        name: &str,
    ) -> Result<LogicalSchema, AppError> {
        let inserted = client
            .query_opt(
                "INSERT INTO logical_schemas (id, target_id, name, created_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (target_id, name) DO NOTHING
                 RETURNING id, target_id, name, active_version_id, created_at",
                &[&Uuid::new_v4(), &target_id, &name, &Utc::now()],
            )
            .await?;

        if let Some(row) = inserted {
            return Ok(logical_schema_from_row(&row));
        }

        let row = client
            .query_one(
                "SELECT id, target_id, name, active_version_id, created_at
                 FROM logical_schemas
                 WHERE target_id = $1 AND name = $2
                 FOR UPDATE",
                &[&target_id, &name],
            )
            .await?;

        Ok(logical_schema_from_row(&row))
    }

    /// Append a new immutable version with `sequence = count + 1`.
    ///
    /// The count is only safe under the row lock taken by
    /// `find_or_create`; the unique `(logical_schema_id, sequence)`
    /// constraint turns any locking regression into a hard error instead
    /// of silent duplicates.
    pub async fn append_version(
        client: &impl GenericClient,
        logical_schema_id: Uuid,
        sdl: &str,
        label: &str,
    ) -> Result<SchemaVersion, AppError> {
        let count: i64 = client
            .query_one(
                "SELECT COUNT(*) FROM schema_versions WHERE logical_schema_id = $1",
                &[&logical_schema_id],
            )
            .await?
            .get(0);

        let version = SchemaVersion {
            id: Uuid::new_v4(),
            logical_schema_id,
            sequence: count + 1,
            label: label.to_string(),
            sdl: sdl.to_string(),
            checksum: Self::checksum(sdl),
            created_at: Utc::now(),
        };

        client
            .execute(
                "INSERT INTO schema_versions
                 (id, logical_schema_id, sequence, label, sdl, checksum, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &version.id,
                    &version.logical_schema_id,
                    &version.sequence,
                    &version.label,
                    &version.sdl,
                    &version.checksum,
                    &version.created_at,
                ],
            )
            .await?;

        Ok(version)
    }

    /// Move the active-version pointer. Re-activating the version that is
    /// already active is a no-op.
    pub async fn activate_version(
        client: &impl GenericClient,
        logical_schema_id: Uuid,
        version_id: Uuid,
    ) -> Result<(), AppError> {
        client
            .execute(
                "UPDATE logical_schemas
                 SET active_version_id = $2
                 WHERE id = $1 AND active_version_id IS DISTINCT FROM $2",
                &[&logical_schema_id, &version_id],
            )
            .await?;

        Ok(())
    }

    /// Look up a logical schema without locking it
    pub async fn find(
        client: &impl GenericClient,
        target_id: Uuid,
        name: &str,
    ) -> Result<Option<LogicalSchema>, AppError> {
        let row = client
            .query_opt(
                "SELECT id, target_id, name, active_version_id, created_at
                 FROM logical_schemas WHERE target_id = $1 AND name = $2",
                &[&target_id, &name],
            )
            .await?;

        Ok(row.as_ref().map(logical_schema_from_row))
    }

    /// Look up a logical schema by its id
    pub async fn find_by_id(
        client: &impl GenericClient,
        logical_schema_id: Uuid,
    ) -> Result<Option<LogicalSchema>, AppError> {
        let row = client
            .query_opt(
                "SELECT id, target_id, name, active_version_id, created_at
                 FROM logical_schemas WHERE id = $1",
                &[&logical_schema_id],
            )
            .await?;

        Ok(row.as_ref().map(logical_schema_from_row))
    }

    /// Resolve the currently active version for `(target, name)`, or
    /// `None` when the schema does not exist or nothing was activated yet.
    pub async fn get_active_version(
        client: &impl GenericClient,
        target_id: Uuid,
        name: &str,
    ) -> Result<Option<SchemaVersion>, AppError> {
        let row = client
            .query_opt(
                "SELECT v.id, v.logical_schema_id, v.sequence, v.label, v.sdl, v.checksum, v.created_at
                 FROM logical_schemas s
                 JOIN schema_versions v ON v.id = s.active_version_id
                 WHERE s.target_id = $1 AND s.name = $2",
                &[&target_id, &name],
            )
            .await?;

        Ok(row.as_ref().map(version_from_row))
    }

    /// Look up a version by id (used by rollback)
    pub async fn get_version(
        client: &impl GenericClient,
        version_id: Uuid,
    ) -> Result<Option<SchemaVersion>, AppError> {
        let row = client
            .query_opt(
                "SELECT id, logical_schema_id, sequence, label, sdl, checksum, created_at
                 FROM schema_versions WHERE id = $1",
                &[&version_id],
            )
            .await?;

        Ok(row.as_ref().map(version_from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_checksum_is_stable() {
        let sdl = "type Query { a: String }";
        assert_eq!(SchemaStore::checksum(sdl), SchemaStore::checksum(sdl));
    }

    #[test]
    fn test_checksum_is_whitespace_sensitive() {
        assert_ne!(
            SchemaStore::checksum("type Query { a: String }"),
            SchemaStore::checksum("type Query {  a: String }"),
        );
    }

    #[test]
    fn test_checksum_shape() {
        let digest = SchemaStore::checksum("type Query { a: String }");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, digest.to_lowercase());
    }
}
