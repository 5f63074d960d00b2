// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! KYC gate.
//!
//! Local validation and provider orchestration for identity verification.
//! The state transitions themselves (`none → pending → verified/rejected`,
//! resubmit after rejection) are applied to the session by the workflow
//! controller; this gate decides what the terminal outcome of a
//! verification attempt is.

use std::sync::Arc;

use tracing::info;

use crate::error::WorkflowError;
use crate::models::KycStatus;
use crate::providers::KycProvider;

#[derive(Clone)]
pub struct KycGate {
    provider: Arc<dyn KycProvider>,
    /// Minimum PAN name-match fraction to count as verified.
    pan_name_match_threshold: f64,
}

impl KycGate {
    pub fn new(provider: Arc<dyn KycProvider>, pan_name_match_threshold: f64) -> Self {
        Self {
            provider,
            pan_name_match_threshold,
        }
    }

    /// Dispatch an OTP for Aadhaar verification. Returns the provider
    /// client id the subsequent verify call needs.
    pub async fn initiate_otp(&self, identity_number: &str) -> Result<String, WorkflowError> {
        validate_aadhaar(identity_number)?;
        let client_id = self.provider.request_otp(identity_number).await?;
        info!(client_id = %client_id, "KYC OTP dispatched");
        Ok(client_id)
    }

    /// Resolve a pending OTP verification to a terminal status.
    pub async fn resolve_otp(
        &self,
        client_id: &str,
        otp: &str,
    ) -> Result<KycStatus, WorkflowError> {
        validate_otp(otp)?;
        let verified = self.provider.verify_otp(client_id, otp).await?;
        Ok(if verified {
            KycStatus::Verified
        } else {
            KycStatus::Rejected
        })
    }

    /// Resolve a pending PAN verification to a terminal status. A name
    /// match below the configured threshold counts as rejected.
    pub async fn resolve_pan(
        &self,
        pan_number: &str,
        name: &str,
    ) -> Result<KycStatus, WorkflowError> {
        validate_pan(pan_number)?;
        if name.trim().is_empty() {
            return Err(WorkflowError::Validation("name is required".into()));
        }

        let result = self.provider.verify_pan(pan_number, name).await?;
        let verified = result.status.eq_ignore_ascii_case("valid")
            && result.name_match >= self.pan_name_match_threshold;
        Ok(if verified {
            KycStatus::Verified
        } else {
            KycStatus::Rejected
        })
    }
}

fn validate_aadhaar(identity_number: &str) -> Result<(), WorkflowError> {
    let trimmed = identity_number.trim();
    if trimmed.len() != 12 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(WorkflowError::Validation(
            "Aadhaar number must be 12 digits".into(),
        ));
    }
    Ok(())
}

fn validate_otp(otp: &str) -> Result<(), WorkflowError> {
    let trimmed = otp.trim();
    if trimmed.len() != 6 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(WorkflowError::Validation("OTP must be 6 digits".into()));
    }
    Ok(())
}

/// PAN format: five letters, four digits, one letter.
fn validate_pan(pan: &str) -> Result<(), WorkflowError> {
    let trimmed = pan.trim();
    let bytes = trimmed.as_bytes();
    let valid = bytes.len() == 10
        && bytes[..5].iter().all(|b| b.is_ascii_uppercase())
        && bytes[5..9].iter().all(|b| b.is_ascii_digit())
        && bytes[9].is_ascii_uppercase();
    if !valid {
        return Err(WorkflowError::Validation(
            "PAN must match the AAAAA9999A format".into(),
        ));
    }
    Ok(())
}
