//! Deployment workflow routes

use crate::error::{validation_error, AppError};
use crate::models::{DeploymentAttempt, DeploymentRecord, SuccessResponse, TargetRef};
use crate::registry::DeploymentLedger;
use crate::routes::targets::validate_identifier;
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    /// Target id or name; ids win when a value is valid as both
    #[validate(length(min = 1, message = "Target identifier is required"))]
    pub target: String,

    #[validate(length(min = 1, max = 255, message = "Schema name must be between 1 and 255 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub schema_name: String,

    #[validate(length(min = 1, message = "SDL must not be empty"))]
    pub sdl: String,

    #[validate(length(min = 1, max = 255, message = "Version label must be between 1 and 255 characters"))]
    pub label: String,

    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    #[validate(length(min = 1, message = "Target identifier is required"))]
    pub target: String,
    pub version_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DeploymentListQuery {
    pub target: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResponse {
    pub attempt: DeploymentAttempt,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentListResponse {
    pub deployments: Vec<DeploymentRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecordResponse {
    pub deployment: DeploymentRecord,
}

/// Deploy a new schema version to a target
pub async fn deploy_schema(
    State(state): State<SharedState>,
    Json(payload): Json<DeployRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<DeploymentResponse>>), AppError> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    // Opaque-identifier convenience lives here; the orchestrator only
    // sees a typed reference.
    let target = state.targets.resolve_identifier(&payload.target).await?;

    let attempt = state
        .deployer
        .deploy(
            &TargetRef::Id(target.id),
            &payload.schema_name,
            &payload.sdl,
            &payload.label,
            payload.dry_run,
        )
        .await?;

    let message = if payload.dry_run {
        "Dry run recorded"
    } else {
        "Schema deployed"
    };

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(message, DeploymentResponse { attempt })),
    ))
}

/// Roll the active pointer back to a previously stored version
pub async fn rollback_deployment(
    State(state): State<SharedState>,
    Json(payload): Json<RollbackRequest>,
) -> Result<Json<SuccessResponse<DeploymentResponse>>, AppError> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let target = state.targets.resolve_identifier(&payload.target).await?;
    let attempt = state.deployer.rollback(target.id, payload.version_id).await?;

    Ok(Json(SuccessResponse::with_data(
        "Rollback applied",
        DeploymentResponse { attempt },
    )))
}

/// List deployment attempts for a target, most recent first
pub async fn list_deployments(
    State(state): State<SharedState>,
    Query(query): Query<DeploymentListQuery>,
) -> Result<Json<SuccessResponse<DeploymentListResponse>>, AppError> {
    let target = state.targets.resolve_identifier(&query.target).await?;

    let client = state.db_pool.get().await?;
    let deployments = DeploymentLedger::list_by_target(&**client, target.id).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} deployments", deployments.len()),
        DeploymentListResponse { deployments },
    )))
}

/// Get a single deployment attempt with its target and version
pub async fn get_deployment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<DeploymentRecordResponse>>, AppError> {
    let client = state.db_pool.get().await?;
    let deployment = DeploymentLedger::get_by_id(&**client, id).await?;

    Ok(Json(SuccessResponse::with_data(
        "Deployment retrieved",
        DeploymentRecordResponse { deployment },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_request_rejects_empty_sdl() {
        let request = DeployRequest {
            target: "prod".to_string(),
            schema_name: "inventory".to_string(),
            sdl: String::new(),
            label: "v1".to_string(),
            dry_run: false,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_deploy_request_accepts_well_formed_input() {
        let request = DeployRequest {
            target: "prod".to_string(),
            schema_name: "inventory".to_string(),
            sdl: "type Query { a: String }".to_string(),
            label: "v1".to_string(),
            dry_run: true,
        };
        assert!(request.validate().is_ok());
    }
}
