use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{GenerateRequest, Operation, World};

/// Default base URL for the world-generation service.
pub const WORLDS_API_BASE: &str = "https://api.worldlabs.ai/marble/v1";

/// Environment variables consulted for the API credential, in order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["WORLDS_API_KEY", "WLT_API_KEY", "WORLDLABS_API_KEY"];

const API_KEY_HEADER: &str = "WLT-Api-Key";

/// Errors from talking to the world-generation service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing API key: set WORLDS_API_KEY (or WLT_API_KEY / WORLDLABS_API_KEY)")]
    MissingKey,
    /// Non-2xx response; `message` carries the remote-supplied text.
    #[error("world service error {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Seam over the remote service so the generation state machine can be
/// driven by a scripted implementation in tests.
pub trait WorldsApi {
    /// Submit a generation request; returns the created operation.
    fn generate_world(&self, request: &GenerateRequest) -> Result<Operation, ApiError>;

    /// Re-fetch an operation by id.
    fn get_operation(&self, operation_id: &str) -> Result<Operation, ApiError>;

    /// Fetch the canonical world record by id.
    fn get_world(&self, world_id: &str) -> Result<World, ApiError>;
}

/// Blocking HTTP implementation of [`WorldsApi`].
pub struct HttpWorldsApi {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl HttpWorldsApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client with the credential taken from the environment.
    pub fn from_env(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let key = API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .ok_or(ApiError::MissingKey)?;
        Ok(Self::new(base_url, key))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .agent
            .get(&url)
            .set(API_KEY_HEADER, &self.api_key)
            .call()
            .map_err(map_ureq_error)?;
        response
            .into_json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .agent
            .post(&url)
            .set(API_KEY_HEADER, &self.api_key)
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(map_ureq_error)?;
        response
            .into_json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl WorldsApi for HttpWorldsApi {
    fn generate_world(&self, request: &GenerateRequest) -> Result<Operation, ApiError> {
        self.post_json("worlds:generate", request.to_body())
    }

    fn get_operation(&self, operation_id: &str) -> Result<Operation, ApiError> {
        self.get_json(&format!("operations/{operation_id}"))
    }

    fn get_world(&self, world_id: &str) -> Result<World, ApiError> {
        self.get_json(&format!("worlds/{world_id}"))
    }
}

fn map_ureq_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_json::<serde_json::Value>().ok();
            ApiError::Status {
                status,
                message: remote_error_message(status, body),
            }
        }
        other => ApiError::Transport(other.to_string()),
    }
}

/// Extract the human-readable message from an error envelope.
///
/// The service returns `{"error": "..."}` or `{"detail": ...}`; both
/// are surfaced verbatim, falling back to the raw body.
fn remote_error_message(status: u16, body: Option<serde_json::Value>) -> String {
    let Some(body) = body else {
        return format!("request failed with status {status}");
    };
    if let Some(msg) = body.get("error").and_then(|v| v.as_str()) {
        return msg.to_string();
    }
    if let Some(detail) = body.get("detail") {
        return match detail.as_str() {
            Some(s) => s.to_string(),
            None => detail.to_string(),
        };
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_prefers_error_field() {
        let body = serde_json::json!({"error": "prompt too long"});
        assert_eq!(remote_error_message(400, Some(body)), "prompt too long");
    }

    #[test]
    fn error_envelope_falls_back_to_detail() {
        let body = serde_json::json!({"detail": {"reason": "quota"}});
        assert_eq!(
            remote_error_message(429, Some(body)),
            r#"{"reason":"quota"}"#
        );
        let body = serde_json::json!({"detail": "rate limited"});
        assert_eq!(remote_error_message(429, Some(body)), "rate limited");
    }

    #[test]
    fn missing_body_reports_status() {
        assert_eq!(
            remote_error_message(502, None),
            "request failed with status 502"
        );
    }
}
