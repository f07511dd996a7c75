use crate::components::calendar::EventUpdate;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

/// Longest text accepted by the schedule check, in characters
pub const MAX_TEXT_CHARS: usize = 1000;

/// One problem found in a request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    pub fn new(path: &str, message: &str) -> Self {
        Self {
            path: if path.is_empty() {
                Vec::new()
            } else {
                vec![path.to_string()]
            },
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<Issue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> SuccessResponse<T> {
    pub fn with_data(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
        }
    }
}

impl SuccessResponse<()> {
    pub fn done(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub environment: String,
}

/// Failures returned to HTTP clients
#[derive(Debug)]
pub enum ApiError {
    /// Body is not a usable natural language request
    InvalidRequest(Vec<Issue>),
    /// Body is not a usable structured update
    InvalidUpdate(Vec<Issue>),
    /// An operation failed after the request was accepted
    Failed {
        error: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn failed(error: &'static str, err: impl std::fmt::Display) -> Self {
        ApiError::Failed {
            error,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(vec![Issue::new("", &rejection.body_text())])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidRequest(details) => {
                warn!("Rejected invalid request: {:?}", details);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Invalid input".to_string(),
                        code: Some("INVALID_REQUEST".to_string()),
                        details: Some(details),
                        message: None,
                    },
                )
            }
            ApiError::InvalidUpdate(details) => {
                warn!("Rejected invalid update: {:?}", details);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Invalid update data".to_string(),
                        code: Some("INVALID_UPDATE_DATA".to_string()),
                        details: Some(details),
                        message: None,
                    },
                )
            }
            ApiError::Failed { error, message } => {
                error!("{}: {}", error, message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: error.to_string(),
                        code: None,
                        details: None,
                        message: Some(message),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Pull the `text` field out of a natural language request body
pub fn text_from_body(body: &Value) -> Result<String, ApiError> {
    let issue = match body.get("text") {
        Some(Value::String(text)) if !text.is_empty() => return Ok(text.clone()),
        Some(Value::String(_)) => Issue::new("text", "Text must not be empty"),
        Some(_) => Issue::new("text", "Expected string"),
        None if body.is_object() => Issue::new("text", "Required"),
        None => Issue::new("", "Expected object"),
    };

    Err(ApiError::InvalidRequest(vec![issue]))
}

/// Whether the text is short enough to be turned into an event
pub fn is_schedulable(text: &str) -> bool {
    let chars = text.chars().count();
    (1..=MAX_TEXT_CHARS).contains(&chars)
}

/// Parse and check a structured update body
pub fn update_from_body(body: Value) -> Result<EventUpdate, ApiError> {
    let update: EventUpdate = serde_json::from_value(body)
        .map_err(|e| ApiError::InvalidUpdate(vec![Issue::new("", &e.to_string())]))?;

    let mut issues = Vec::new();
    for (field, value) in [("start", &update.start), ("end", &update.end)] {
        if let Some(value) = value {
            if DateTime::parse_from_rfc3339(value).is_err() {
                issues.push(Issue::new(field, "Invalid datetime"));
            }
        }
    }

    if issues.is_empty() {
        Ok(update)
    } else {
        Err(ApiError::InvalidUpdate(issues))
    }
}
