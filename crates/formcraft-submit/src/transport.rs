//! The transport seam between the submission state machine and the network.
//!
//! [`Transport`] sends one [`SubmissionRequest`] and reports the response.
//! [`HttpTransport`] implements it with `reqwest`; tests substitute their own.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use formcraft_core::{FormcraftError, FormcraftResult, Settings};
use formcraft_forms::HttpMethod;

/// Message used when a failed response carries no message of its own.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Submission failed";

/// An outbound submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    /// Target URL.
    pub endpoint: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Extra headers. `Content-Type` is always `application/json`.
    pub headers: BTreeMap<String, String>,
    /// JSON body.
    pub body: serde_json::Value,
}

/// What the endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl TransportResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// The `message` field of a JSON body, or [`DEFAULT_FAILURE_MESSAGE`].
    pub fn failure_message(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())
    }
}

/// Sends submissions.
///
/// An `Err` means the request could not be completed at all (connection
/// refused, timeout); a completed request with a non-2xx status is an `Ok`
/// response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and waits for the response.
    async fn send(&self, request: &SubmissionRequest) -> FormcraftResult<TransportResponse>;
}

/// A [`Transport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Wraps an existing client.
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with the configured user agent and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FormcraftError::Configuration`] if the client cannot be built.
    pub fn from_settings(settings: &Settings) -> FormcraftResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(settings.user_agent.clone());
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| FormcraftError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self::new(client))
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &SubmissionRequest) -> FormcraftResult<TransportResponse> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.endpoint);
        for (name, value) in &request.headers {
            if !name.eq_ignore_ascii_case("content-type") {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }

        let response = builder
            .json(&request.body)
            .send()
            .await
            .map_err(|e| FormcraftError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FormcraftError::Transport(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(199, "").is_success());
        assert!(!TransportResponse::new(301, "").is_success());
        assert!(!TransportResponse::new(500, "").is_success());
    }

    #[test]
    fn test_failure_message_from_body() {
        let resp = TransportResponse::new(422, r#"{"message": "Email already registered"}"#);
        assert_eq!(resp.failure_message(), "Email already registered");
    }

    #[test]
    fn test_failure_message_fallback() {
        for body in ["", "not json", r#"{"error": "x"}"#, r#"{"message": 5}"#, r#"{"message": " "}"#] {
            assert_eq!(TransportResponse::new(500, body).failure_message(), "Submission failed");
        }
    }

    #[test]
    fn test_from_settings_builds_client() {
        let settings = Settings {
            request_timeout_secs: Some(5),
            ..Settings::default()
        };
        assert!(HttpTransport::from_settings(&settings).is_ok());
    }
}
