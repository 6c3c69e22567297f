use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message to show the user in a failure notification
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Unwrap a `{status, data: {message, ...}}` envelope.
///
/// A non-2xx HTTP status, or a non-2xx `status` inside the body, becomes
/// `ApiError::Status` carrying `data.message`. On success the `data` member
/// is returned, or the whole body when there is none.
pub fn unwrap_envelope(http_status: u16, body: Value) -> Result<Value, ApiError> {
    let status = body
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .filter(|_| is_success(http_status))
        .unwrap_or(http_status);

    if !is_success(status) {
        let message = body
            .pointer("/data/message")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", status));
        return Err(ApiError::Status { status, message });
    }

    match body {
        Value::Object(mut map) if map.contains_key("data") => Ok(map.remove("data").unwrap_or(Value::Null)),
        other => Ok(other),
    }
}

/// Message of a successful write response, if the API sent one
pub fn response_message(data: &Value) -> Option<String> {
    data.get("message").and_then(Value::as_str).map(str::to_string)
}
