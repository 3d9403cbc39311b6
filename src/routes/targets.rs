//! Deployment target routes

use crate::error::{validation_error, AppError};
use crate::models::{DeploymentTarget, SuccessResponse};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetRequest {
    #[validate(length(min = 1, max = 255, message = "Target name must be between 1 and 255 characters"))]
    #[validate(custom(function = "validate_identifier"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResponse {
    pub target: DeploymentTarget,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetListResponse {
    pub targets: Vec<DeploymentTarget>,
}

/// Validate a target or schema name
pub(crate) fn validate_identifier(name: &str) -> Result<(), validator::ValidationError> {
    // Names must start with a letter and contain only letters, digits,
    // underscores, and hyphens
    let re = regex::Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap();

    if !re.is_match(name) {
        let mut err = validator::ValidationError::new("invalid_identifier");
        err.message = Some(
            "Invalid name. Must start with a letter and contain only letters, digits, underscores, and hyphens.".into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Create a new deployment target
pub async fn create_target(
    State(state): State<SharedState>,
    Json(payload): Json<CreateTargetRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<TargetResponse>>), AppError> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let target = state
        .targets
        .create(&payload.name, payload.description.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Target created", TargetResponse { target })),
    ))
}

/// List all deployment targets
pub async fn list_targets(
    State(state): State<SharedState>,
) -> Result<Json<SuccessResponse<TargetListResponse>>, AppError> {
    let targets = state.targets.list().await?;

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} targets", targets.len()),
        TargetListResponse { targets },
    )))
}

/// Get a deployment target by id
pub async fn get_target(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<TargetResponse>>, AppError> {
    let target = state
        .targets
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::TargetNotFound(id.to_string()))?;

    Ok(Json(SuccessResponse::with_data("Target retrieved", TargetResponse { target })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("prod").is_ok());
        assert!(validate_identifier("staging-eu_1").is_ok());
        assert!(validate_identifier("1prod").is_err());
        assert!(validate_identifier("prod environment").is_err());
        assert!(validate_identifier("").is_err());
    }
}
