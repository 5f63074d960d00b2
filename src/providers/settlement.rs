// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Settlement/custody backend client.
//!
//! Two calls: `POST /custody/transfer` moves the swapped stablecoin into
//! custody, `POST /withdrawal/initiate` kicks off the INR payout and
//! returns the withdrawal identifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::WorkflowError;
use crate::providers::{CustodyTransferRequest, SettlementBackend, WithdrawalRequest};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("settlement request failed: {0}")]
    Request(String),

    #[error("settlement backend returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("settlement response was invalid: {0}")]
    InvalidResponse(String),
}

impl From<SettlementError> for WorkflowError {
    fn from(err: SettlementError) -> Self {
        WorkflowError::TransientService(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SettlementClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct WithdrawalResponse {
    #[serde(rename = "withdrawalId")]
    withdrawal_id: String,
}

impl SettlementClient {
    pub fn new(base_url: String) -> Result<Self, SettlementError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| SettlementError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    async fn post_json(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<reqwest::Response, SettlementError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SettlementError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SettlementError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SettlementBackend for SettlementClient {
    async fn custody_transfer(
        &self,
        request: CustodyTransferRequest<'_>,
    ) -> Result<(), WorkflowError> {
        self.post_json(
            "/custody/transfer",
            json!({
                "walletAddress": request.wallet_address.0,
                "swapTxHash": request.swap_reference,
                "amount": request.amount,
                "chainId": request.chain_id,
            }),
        )
        .await?;
        Ok(())
    }

    async fn initiate_withdrawal(
        &self,
        request: WithdrawalRequest<'_>,
    ) -> Result<String, WorkflowError> {
        let response = self
            .post_json(
                "/withdrawal/initiate",
                json!({
                    "walletAddress": request.wallet_address.0,
                    "swapReference": request.swap_reference,
                    "amount": request.amount,
                    "accountHolderName": request.account_holder_name,
                    "accountNumber": request.account_number,
                    "ifscCode": request.ifsc_code,
                    "bankName": request.bank_name,
                }),
            )
            .await?;

        let parsed: WithdrawalResponse = response
            .json()
            .await
            .map_err(|e| SettlementError::InvalidResponse(e.to_string()))?;

        info!(withdrawal_id = %parsed.withdrawal_id, "withdrawal initiated");
        Ok(parsed.withdrawal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawal_response_parses() {
        let parsed: WithdrawalResponse =
            serde_json::from_value(json!({ "withdrawalId": "WD-ABC123" })).unwrap();
        assert_eq!(parsed.withdrawal_id, "WD-ABC123");
    }

    #[test]
    fn settlement_errors_are_transient() {
        let err: WorkflowError = SettlementError::Upstream {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert!(err.is_retryable());
    }
}
