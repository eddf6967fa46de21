//! HTTP client for the LLM governor.
//!
//! The governor is a deployed function that fronts the hosted model. It owns
//! authentication, budget enforcement and the model allow-list; this client
//! posts one JSON [`InvokeRequest`] and maps the answer back.
//!
//! ## Error envelope
//!
//! Refusals arrive as `{"error": {"code", "message", "allowedModels"}}`,
//! either with a non-2xx status or wrapped in a 200 by a function URL
//! proxy. Both are mapped to [`GatewayError`]:
//!
//! | code | error |
//! |------|-------|
//! | `budget_exceeded` | [`GatewayError::BudgetExceeded`] |
//! | `model_not_allowed` | [`GatewayError::ModelNotAllowed`] |
//! | anything else | [`GatewayError::Api`] |

use super::{InvokeRequest, InvokeResponse, SummaryGateway};
use crate::error::{GatewayError, SummarizerError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub struct GovernorGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl GovernorGateway {
    /// Build a client for the governor at `endpoint` (an `http://` or `https://` URL).
    ///
    /// No request timeout is configured: the call either returns or the run waits.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SummarizerError> {
        let endpoint = endpoint.into();
        if !is_url(&endpoint) {
            return Err(SummarizerError::InvalidConfig(format!(
                "governor endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SummarizerError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SummaryGateway for GovernorGateway {
    fn name(&self) -> &str {
        "governor"
    }

    async fn invoke(&self, request: &InvokeRequest) -> Result<InvokeResponse, GatewayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| GatewayError::Transport {
            message: e.to_string(),
        })?;
        debug!("Governor answered HTTP {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body, &request.model));
        }

        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| GatewayError::InvalidResponse {
                message: e.to_string(),
            })?;

        if value.get("error").is_some_and(|e| e.is_object()) {
            return Err(classify_error(status.as_u16(), &body, &request.model));
        }

        serde_json::from_value(value).map_err(|e| GatewayError::InvalidResponse {
            message: e.to_string(),
        })
    }
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    allowed_models: Vec<String>,
}

/// Map a refusal body to a [`GatewayError`]. Bodies that are not an error
/// envelope keep the HTTP status as their code.
fn classify_error(status: u16, body: &[u8], model: &str) -> GatewayError {
    let Ok(ErrorEnvelope { error }) = serde_json::from_slice::<ErrorEnvelope>(body) else {
        return GatewayError::Api {
            code: format!("http_{status}"),
            message: String::from_utf8_lossy(body).trim().to_string(),
        };
    };

    if error.code.eq_ignore_ascii_case("budget_exceeded") {
        GatewayError::BudgetExceeded {
            message: error.message,
        }
    } else if error.code.eq_ignore_ascii_case("model_not_allowed") {
        GatewayError::ModelNotAllowed {
            model: model.to_string(),
            allowed: error.allowed_models,
        }
    } else {
        GatewayError::Api {
            code: error.code,
            message: error.message,
        }
    }
}
