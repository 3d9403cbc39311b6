//! HTTP implementation of the upstream client
//!
//! Talks to the composition platform over HTTPS with a bearer
//! credential. A response body that decodes into the expected shape is
//! always treated as a real answer, even on a non-2xx status; anything
//! else (connect error, timeout, undecodable body) is
//! `UpstreamUnavailable`.

use crate::config::UpstreamConfig;
use crate::error::AppError;
use crate::upstream::{PublishOutcome, UpstreamClient, ValidationOutcome};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub struct HttpUpstreamClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateRequest<'a> {
    target: &'a str,
    schema_name: &'a str,
    sdl: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishRequest<'a> {
    target: &'a str,
    schema_name: &'a str,
    sdl: &'a str,
    revision: &'a str,
}

impl HttpUpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build upstream HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamUnavailable(format!("request to {} failed: {}", path, e))
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("reading {} response failed: {}", path, e))
        })?;

        match serde_json::from_slice::<T>(&bytes) {
            Ok(decoded) => Ok(decoded),
            Err(e) if status.is_success() => Err(AppError::UpstreamUnavailable(format!(
                "unexpected {} response body: {}",
                path, e
            ))),
            Err(_) => Err(AppError::UpstreamUnavailable(format!(
                "upstream returned {} for {}",
                status, path
            ))),
        }
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn validate(
        &self,
        target_name: &str,
        schema_name: &str,
        sdl: &str,
    ) -> Result<ValidationOutcome, AppError> {
        debug!(target = %target_name, schema = %schema_name, "validating schema upstream");

        self.post_json(
            "/api/composition/validate",
            &ValidateRequest {
                target: target_name,
                schema_name,
                sdl,
            },
        )
        .await
    }

    async fn publish(
        &self,
        target_name: &str,
        schema_name: &str,
        sdl: &str,
        revision_label: &str,
    ) -> Result<PublishOutcome, AppError> {
        debug!(
            target = %target_name,
            schema = %schema_name,
            revision = %revision_label,
            "publishing schema upstream"
        );

        self.post_json(
            "/api/composition/publish",
            &PublishRequest {
                target: target_name,
                schema_name,
                sdl,
                revision: revision_label,
            },
        )
        .await
    }
}
