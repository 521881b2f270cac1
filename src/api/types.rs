//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to run a top-level command such as `/start`
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// Request carrying a button's action id
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

/// Request carrying free text typed by the user
#[derive(Debug, Deserialize)]
pub struct TextReplyRequest {
    pub text: String,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
