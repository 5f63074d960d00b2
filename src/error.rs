// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Error taxonomy for the conversion workflow.
//!
//! Two layers: [`WorkflowError`] is the typed error every service adapter
//! and controller operation returns, and [`ApiError`] is its HTTP-facing
//! projection. The taxonomy is deliberately small; what matters is that a
//! caller can always tell whether retrying the same action can succeed
//! (`transient`) or the inputs themselves must change (`permanent`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Typed failure produced by workflow operations and service adapters.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Malformed or missing local input. Never reaches a network call.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The signer's active chain differs from the chain the quote was
    /// priced on. User-actionable via a network switch.
    #[error("wallet is on chain {wallet_chain} but the quote requires chain {required_chain}")]
    WrongNetwork {
        wallet_chain: u64,
        required_chain: u64,
    },

    /// Upstream timeout/5xx. Retrying the same action may succeed.
    #[error("upstream service error: {0}")]
    TransientService(String),

    /// Unsupported token/chain/pair. Retrying without changing inputs
    /// cannot succeed.
    #[error("unsupported route: {0}")]
    PermanentRoute(String),

    /// The user declined the wallet signing prompt. A cancellation, not
    /// a failure worth alerting on.
    #[error("signing request was rejected")]
    SigningRejected,

    /// Catch-all. Must still surface a message, never fail silently.
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl WorkflowError {
    /// Whether re-invoking the same action with the same inputs can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkflowError::TransientService(_)
                | WorkflowError::SigningRejected
                | WorkflowError::WrongNetwork { .. }
        )
    }

    /// Stable machine-readable tag for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::WrongNetwork { .. } => "wrong_network",
            WorkflowError::TransientService(_) => "transient_service",
            WorkflowError::PermanentRoute(_) => "permanent_route",
            WorkflowError::SigningRejected => "signing_rejected",
            WorkflowError::Unknown(_) => "unknown",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
            WorkflowError::WrongNetwork { .. } => StatusCode::PRECONDITION_FAILED,
            WorkflowError::TransientService(_) => StatusCode::BAD_GATEWAY,
            WorkflowError::PermanentRoute(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::SigningRejected => StatusCode::CONFLICT,
            WorkflowError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub kind: &'static str,
    pub retryable: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    retryable: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            kind: "unknown",
            retryable: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: "not_found",
            ..Self::new(StatusCode::NOT_FOUND, message)
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            kind: "validation",
            ..Self::new(StatusCode::BAD_REQUEST, message)
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: "conflict",
            ..Self::new(StatusCode::CONFLICT, message)
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            kind: "permanent_route",
            ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError {
            status: err.status(),
            message: err.to_string(),
            kind: err.kind(),
            retryable: err.is_retryable(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            kind: self.kind,
            retryable: self.retryable,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn taxonomy_maps_to_distinct_statuses() {
        let cases: Vec<(WorkflowError, StatusCode)> = vec![
            (
                WorkflowError::Validation("empty amount".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                WorkflowError::WrongNetwork {
                    wallet_chain: 1,
                    required_chain: 137,
                },
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                WorkflowError::TransientService("timeout".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                WorkflowError::PermanentRoute("no route".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (WorkflowError::SigningRejected, StatusCode::CONFLICT),
            (
                WorkflowError::Unknown("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, expected);
        }
    }

    #[test]
    fn transient_errors_are_retryable_permanent_are_not() {
        assert!(WorkflowError::TransientService("5xx".into()).is_retryable());
        assert!(WorkflowError::SigningRejected.is_retryable());
        assert!(WorkflowError::WrongNetwork {
            wallet_chain: 1,
            required_chain: 137
        }
        .is_retryable());
        assert!(!WorkflowError::PermanentRoute("pair".into()).is_retryable());
        assert!(!WorkflowError::Validation("field".into()).is_retryable());
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let api: ApiError = WorkflowError::Validation("bad data".into()).into();
        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["retryable"], false);
        assert_eq!(body["error"], "invalid input: bad data");
    }
}
