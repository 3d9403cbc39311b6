//! Upstream composition platform client
//!
//! Stateless adapter for the two remote operations (validate, publish).
//! No retry and no caching here: CI callers own retries, and keeping
//! this client dumb keeps the deploy transaction short-lived.

pub mod client;

pub use client::HttpUpstreamClient;

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One problem reported by upstream validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationProblem {
    pub message: String,
}

/// One composition error reported by a rejected publish
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionProblem {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Outcome of a validate call. `valid = false` is a normal negative
/// result, not a transport failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<ValidationProblem>,
}

/// Outcome of a publish call. `accepted = false` with composition errors
/// is a normal negative result, not a transport failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishOutcome {
    pub accepted: bool,
    pub composition_errors: Vec<CompositionProblem>,
    pub launch_url: Option<String>,
}

impl PublishOutcome {
    /// Human-readable summary of a rejection, for the ledger's
    /// failure-reason column.
    pub fn rejection_reason(&self) -> String {
        if self.composition_errors.is_empty() {
            return "Publish rejected by composition platform".to_string();
        }
        self.composition_errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// The two remote operations against the composition platform.
///
/// Injected into the orchestrator at construction time so tests can
/// substitute a scripted double. Transport failures surface as
/// `AppError::UpstreamUnavailable`.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn validate(
        &self,
        target_name: &str,
        schema_name: &str,
        sdl: &str,
    ) -> Result<ValidationOutcome, AppError>;

    async fn publish(
        &self,
        target_name: &str,
        schema_name: &str,
        sdl: &str,
        revision_label: &str,
    ) -> Result<PublishOutcome, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejection_reason_joins_messages() {
        let outcome = PublishOutcome {
            accepted: false,
            composition_errors: vec![
                CompositionProblem {
                    message: "bad type".to_string(),
                    code: Some("E001".to_string()),
                },
                CompositionProblem {
                    message: "unknown directive".to_string(),
                    code: None,
                },
            ],
            launch_url: None,
        };
        assert_eq!(outcome.rejection_reason(), "bad type; unknown directive");
    }

    #[test]
    fn test_rejection_reason_without_errors() {
        let outcome = PublishOutcome::default();
        assert_eq!(
            outcome.rejection_reason(),
            "Publish rejected by composition platform"
        );
    }

    #[test]
    fn test_decode_accepted_publish() {
        let outcome: PublishOutcome = serde_json::from_str(
            r#"{"accepted": true, "compositionErrors": [], "launchUrl": "https://studio.example/launch/42"}"#,
        )
        .unwrap();
        assert!(outcome.accepted);
        assert!(outcome.composition_errors.is_empty());
        assert_eq!(
            outcome.launch_url.as_deref(),
            Some("https://studio.example/launch/42")
        );
    }

    #[test]
    fn test_decode_rejected_publish_with_sparse_body() {
        // Upstream omits launchUrl and error codes on rejection
        let outcome: PublishOutcome = serde_json::from_str(
            r#"{"accepted": false, "compositionErrors": [{"message": "bad type"}]}"#,
        )
        .unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.composition_errors[0].message, "bad type");
        assert_eq!(outcome.composition_errors[0].code, None);
        assert_eq!(outcome.launch_url, None);
    }

    #[test]
    fn test_decode_validation_outcome() {
        let outcome: ValidationOutcome = serde_json::from_str(
            r#"{"valid": false, "errors": [{"message": "field removed"}]}"#,
        )
        .unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.errors[0].message, "field removed");
    }
}
