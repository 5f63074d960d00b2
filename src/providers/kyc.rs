// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! KYC provider client (Aadhaar OTP and PAN verification).
//!
//! Wraps a third-party identity API:
//! `POST /kyc/otp {identityNumber} -> {clientId}`,
//! `POST /kyc/verify {clientId, otp} -> {status, ...}`,
//! `POST /kyc/pan-verify {panNumber, name} -> {matchPercentage, status}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::WorkflowError;
use crate::providers::{KycProvider, PanVerification};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum KycError {
    #[error("KYC request failed: {0}")]
    Request(String),

    #[error("KYC provider returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("KYC response was invalid: {0}")]
    InvalidResponse(String),
}

impl From<KycError> for WorkflowError {
    fn from(err: KycError) -> Self {
        WorkflowError::TransientService(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct KycClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct OtpResponse {
    #[serde(rename = "clientId")]
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct PanResponse {
    #[serde(rename = "matchPercentage")]
    match_percentage: f64,
    status: String,
}

impl KycClient {
    pub fn new(base_url: String) -> Result<Self, KycError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| KycError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<T, KycError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| KycError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KycError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| KycError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl KycProvider for KycClient {
    async fn request_otp(&self, identity_number: &str) -> Result<String, WorkflowError> {
        let parsed: OtpResponse = self
            .post_json("/kyc/otp", json!({ "identityNumber": identity_number }))
            .await?;
        Ok(parsed.client_id)
    }

    async fn verify_otp(&self, client_id: &str, otp: &str) -> Result<bool, WorkflowError> {
        let parsed: VerifyResponse = self
            .post_json("/kyc/verify", json!({ "clientId": client_id, "otp": otp }))
            .await?;
        Ok(parsed.status.eq_ignore_ascii_case("verified"))
    }

    async fn verify_pan(
        &self,
        pan_number: &str,
        name: &str,
    ) -> Result<PanVerification, WorkflowError> {
        let parsed: PanResponse = self
            .post_json(
                "/kyc/pan-verify",
                json!({ "panNumber": pan_number, "name": name }),
            )
            .await?;
        // Providers report 0..=100; normalize to a fraction.
        let name_match = (parsed.match_percentage / 100.0).clamp(0.0, 1.0);
        Ok(PanVerification {
            name_match,
            status: parsed.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_response_status_comparison() {
        let verified: VerifyResponse =
            serde_json::from_value(json!({ "status": "VERIFIED" })).unwrap();
        assert!(verified.status.eq_ignore_ascii_case("verified"));

        let rejected: VerifyResponse =
            serde_json::from_value(json!({ "status": "rejected" })).unwrap();
        assert!(!rejected.status.eq_ignore_ascii_case("verified"));
    }

    #[test]
    fn pan_response_parses_match_percentage() {
        let parsed: PanResponse = serde_json::from_value(json!({
            "matchPercentage": 92.5,
            "status": "valid"
        }))
        .unwrap();
        assert!((parsed.match_percentage - 92.5).abs() < f64::EPSILON);
        assert_eq!(parsed.status, "valid");
    }

    #[test]
    fn kyc_errors_are_transient() {
        let err: WorkflowError = KycError::Request("timeout".into()).into();
        assert!(err.is_retryable());
    }
}
