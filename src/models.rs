//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the registry entities and shared response envelopes.

pub mod deployment;
pub mod schema;
pub mod target;

// Re-export commonly used types
pub use deployment::*;
pub use schema::*;
pub use target::*;

use serde::Serialize;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}
