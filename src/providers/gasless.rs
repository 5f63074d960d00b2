// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Gasless relay client.
//!
//! Submits signed EIP-712 orders for third-party broadcast and polls
//! `GET /gasless/status/{trade_hash}` for eventual confirmation. The
//! bounded polling schedule itself lives in [`crate::poller`]; this client
//! only performs single requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::WorkflowError;
use crate::providers::{GaslessRelay, RelayTradeStatus};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay request failed: {0}")]
    Request(String),

    #[error("relay returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("relay response was invalid: {0}")]
    InvalidResponse(String),
}

impl From<RelayError> for WorkflowError {
    fn from(err: RelayError) -> Self {
        WorkflowError::TransientService(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GaslessRelayClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "tradeHash")]
    trade_hash: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

impl GaslessRelayClient {
    pub fn new(base_url: String) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| RelayError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }
}

#[async_trait]
impl GaslessRelay for GaslessRelayClient {
    async fn submit(
        &self,
        typed_data: &serde_json::Value,
        signature: &str,
    ) -> Result<String, WorkflowError> {
        let payload = json!({
            "order": typed_data,
            "signature": signature,
        });

        let response = self
            .http
            .post(format!("{}/gasless/submit", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| RelayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;

        debug!(trade_hash = %parsed.trade_hash, "gasless order submitted");
        Ok(parsed.trade_hash)
    }

    async fn status(&self, trade_hash: &str) -> Result<RelayTradeStatus, WorkflowError> {
        let response = self
            .http
            .get(format!("{}/gasless/status/{trade_hash}", self.base_url))
            .send()
            .await
            .map_err(|e| RelayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;

        parse_trade_status(&parsed.status)
            .ok_or_else(|| {
                RelayError::InvalidResponse(format!("unknown trade status: {}", parsed.status))
                    .into()
            })
    }
}

fn parse_trade_status(raw: &str) -> Option<RelayTradeStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" | "submitted" => Some(RelayTradeStatus::Pending),
        "confirmed" | "succeeded" => Some(RelayTradeStatus::Confirmed),
        "failed" => Some(RelayTradeStatus::Failed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_status_parsing() {
        assert_eq!(parse_trade_status("pending"), Some(RelayTradeStatus::Pending));
        assert_eq!(
            parse_trade_status("Confirmed"),
            Some(RelayTradeStatus::Confirmed)
        );
        assert_eq!(parse_trade_status("succeeded"), Some(RelayTradeStatus::Confirmed));
        assert_eq!(parse_trade_status("failed"), Some(RelayTradeStatus::Failed));
        assert_eq!(parse_trade_status("exploded"), None);
    }

    #[test]
    fn relay_errors_are_transient() {
        let err: WorkflowError = RelayError::Upstream {
            status: 500,
            body: "oops".into(),
        }
        .into();
        assert!(err.is_retryable());
    }
}
