//! Shared data models for patch requests, responses, section paths and
//! dashboard widgets.

pub mod section;
pub mod widget;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
/// Inbound patch request. Required fields are optional here so that missing
/// ones can be reported together instead of failing deserialization.
pub struct PatchRequest {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub section_data: Option<Json>,
    #[serde(default)]
    pub is_athlete: bool,
    #[serde(default)]
    pub preserve_nested_keys: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Successful patch response.
pub struct PatchResponse {
    pub success: bool,
    pub message: String,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_count: Option<usize>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
/// Failed patch response.
pub struct ErrorResponse {
    pub success: bool,
    pub status: u16,
    pub error: String,
}

impl From<&crate::error::PatchError> for ErrorResponse {
    fn from(err: &crate::error::PatchError) -> Self {
        ErrorResponse {
            success: false,
            status: err.status(),
            error: err.to_string(),
        }
    }
}
