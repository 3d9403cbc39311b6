//! Schema lookup and upstream validation routes

use crate::error::{validation_error, AppError};
use crate::models::{SchemaVersion, SuccessResponse};
use crate::registry::SchemaStore;
use crate::routes::targets::validate_identifier;
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ActiveSchemaQuery {
    pub target: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSchemaResponse {
    pub version: SchemaVersion,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSchemaRequest {
    #[validate(length(min = 1, message = "Target identifier is required"))]
    pub target: String,

    #[validate(length(min = 1, max = 255, message = "Schema name must be between 1 and 255 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub schema_name: String,

    #[validate(length(min = 1, message = "SDL must not be empty"))]
    pub sdl: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSchemaResponse {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Get the currently active schema version for (target, name)
pub async fn get_active_schema(
    State(state): State<SharedState>,
    Query(query): Query<ActiveSchemaQuery>,
) -> Result<Json<SuccessResponse<ActiveSchemaResponse>>, AppError> {
    let target = state.targets.resolve_identifier(&query.target).await?;

    let client = state.db_pool.get().await?;
    let version = SchemaStore::get_active_version(&**client, target.id, &query.name)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No active version for schema '{}' in target '{}'",
                query.name, target.name
            ))
        })?;

    Ok(Json(SuccessResponse::with_data(
        "Active version retrieved",
        ActiveSchemaResponse { version },
    )))
}

/// Validate a schema against the upstream composition platform without
/// recording anything locally
pub async fn validate_schema(
    State(state): State<SharedState>,
    Json(payload): Json<ValidateSchemaRequest>,
) -> Result<Json<SuccessResponse<ValidateSchemaResponse>>, AppError> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let target = state.targets.resolve_identifier(&payload.target).await?;

    let outcome = state
        .upstream
        .validate(&target.name, &payload.schema_name, &payload.sdl)
        .await?;

    Ok(Json(SuccessResponse::with_data(
        if outcome.valid {
            "Schema is composable"
        } else {
            "Schema failed composition checks"
        },
        ValidateSchemaResponse {
            valid: outcome.valid,
            errors: outcome.errors.into_iter().map(|e| e.message).collect(),
        },
    )))
}
