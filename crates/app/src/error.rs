use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use urgent_relay_core::{ParseError, SignatureError};
use urgent_relay_pagerduty::PagerDutyError;
use urgent_relay_slack::SlackError;

/// Request-terminal failures of the relay, dispatched to HTTP statuses by
/// kind. Authentication failures map to 401; everything else is a 500. No
/// failure is retried.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("invalid webhook signature: {0}")]
    Signature(#[from] SignatureError),
    #[error("invalid webhook payload: {0}")]
    Payload(#[from] ParseError),
    #[error("on-call lookup failed: {0}")]
    OnCall(#[from] PagerDutyError),
    #[error("notification delivery failed: {0}")]
    Notify(#[from] SlackError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader(_) | Self::Signature(_) => StatusCode::UNAUTHORIZED,
            Self::Payload(_) | Self::OnCall(_) | Self::Notify(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::MissingHeader(_) => "missing_header",
            Self::Signature(_) => "signature",
            Self::Payload(_) => "payload",
            Self::OnCall(_) => "oncall",
            Self::Notify(_) => "notify",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(stage = "relay", kind = self.kind(), error = %self, "request failed");
        let body = Json(json!({
            "message": "error handling request",
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
