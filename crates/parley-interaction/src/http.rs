//! HTTP plumbing shared by the backend clients.

use parley_core::error::ParleyError;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;

/// Which service a request belongs to; selects the error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Generation,
    Summarization,
    Weather,
}

impl Service {
    fn label(self) -> &'static str {
        match self {
            Service::Generation => "generation backend",
            Service::Summarization => "summarization backend",
            Service::Weather => "weather service",
        }
    }

    pub(crate) fn error(self, message: impl Into<String>) -> ParleyError {
        match self {
            Service::Generation => ParleyError::generation(message),
            Service::Summarization => ParleyError::summarization(message),
            Service::Weather => ParleyError::weather(message),
        }
    }
}

/// Error envelopes used by OpenAI-compatible and inference servers.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorResponse {
    Nested { error: ErrorBody },
    Flat { error: String },
    Message { message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Builds the error for a non-success status, preferring the server's message.
pub(crate) fn map_http_error(service: Service, status: StatusCode, body: &str) -> ParleyError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse::Nested { error }) => error.message,
        Ok(ErrorResponse::Flat { error }) => error,
        Ok(ErrorResponse::Message { message }) => message,
        Err(_) => body.trim().to_string(),
    };

    service.error(format!(
        "{} returned {}: {}",
        service.label(),
        status.as_u16(),
        message
    ))
}

/// Sends a request and returns the response if its status is a success.
pub(crate) async fn send(service: Service, request: RequestBuilder) -> Result<Response, ParleyError> {
    let response = request.send().await.map_err(|err| {
        tracing::error!(service = service.label(), error = %err, "Request failed");
        service.error(format!("{} request failed: {err}", service.label()))
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    tracing::error!(service = service.label(), status = status.as_u16(), "Request rejected");
    Err(map_http_error(service, status, &body))
}

/// Decodes a JSON response body.
pub(crate) async fn json<T: serde::de::DeserializeOwned>(
    service: Service,
    response: Response,
) -> Result<T, ParleyError> {
    response
        .json()
        .await
        .map_err(|err| service.error(format!("Failed to parse {} response: {err}", service.label())))
}
