//! The `{ok, result, error}` wrapper every backend response uses

use serde::Deserialize;
use serde_json::Value;

use super::RawResponse;
use crate::error::ApiError;

/// Uniform response wrapper
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// Yield `result` when the backend reported success
    pub fn into_result(self) -> Result<Value, ApiError> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(ApiError::Api {
                message: self.error.unwrap_or_else(|| "API error".to_string()),
            })
        }
    }
}

/// Check the transport status, then unwrap the envelope
pub fn unwrap_response(response: RawResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
        });
    }

    let envelope: Envelope = serde_json::from_str(&response.body).map_err(|e| {
        ApiError::InvalidResponse(format!("Failed to parse response envelope: {}", e))
    })?;

    envelope.into_result()
}
