// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! KYC endpoints: Aadhaar OTP dispatch and verification, and synchronous
//! PAN verification. Terminal outcomes are applied to the session through
//! the workflow controller so the step transitions stay in one place.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{ApiError, WorkflowError},
    models::{KycStatus, WorkflowStep},
    session::ConversionSession,
    state::AppState,
    workflow,
};

use super::sessions::session_not_found;

/// Request body for dispatching an Aadhaar OTP.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OtpRequest {
    /// 12-digit Aadhaar number.
    pub aadhaar_number: String,
}

/// Request body for verifying a dispatched OTP.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OtpVerifyRequest {
    /// 6-digit OTP received by the Aadhaar-linked phone.
    pub otp: String,
}

/// Request body for PAN verification.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PanRequest {
    /// PAN in the AAAAA9999A format.
    pub pan_number: String,
    /// Name as printed on the PAN card.
    pub name: String,
}

/// Verify the session may start (or restart) verification right now,
/// before any provider call is made.
fn ensure_kyc_open(session: &ConversionSession) -> Result<(), WorkflowError> {
    if session.step != WorkflowStep::Kyc {
        return Err(WorkflowError::Validation(
            "KYC can only be initiated from the KYC step".into(),
        ));
    }
    if session.kyc_status == KycStatus::Verified {
        return Err(WorkflowError::Validation(
            "identity is already verified".into(),
        ));
    }
    Ok(())
}

/// Dispatch an Aadhaar OTP and mark the verification pending.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/kyc/otp",
    tag = "KYC",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = OtpRequest,
    responses(
        (status = 200, description = "OTP dispatched; verification pending", body = ConversionSession),
        (status = 400, description = "Invalid Aadhaar number or wrong step"),
        (status = 404, description = "Session not found"),
        (status = 502, description = "KYC provider unavailable")
    )
)]
pub async fn initiate_otp(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<OtpRequest>,
) -> Result<Json<ConversionSession>, ApiError> {
    {
        let store = state.sessions.read().await;
        let session = store.peek(&session_id).ok_or_else(session_not_found)?;
        ensure_kyc_open(session)?;
    }

    let client_id = state.kyc.initiate_otp(&request.aadhaar_number).await?;

    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::kyc_initiated(session, client_id)?;
    Ok(Json(session.clone()))
}

/// Verify a dispatched OTP, resolving the pending verification.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/kyc/verify",
    tag = "KYC",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = OtpVerifyRequest,
    responses(
        (status = 200, description = "Verification resolved; convert unlocked when verified", body = ConversionSession),
        (status = 400, description = "Invalid OTP or no pending verification"),
        (status = 404, description = "Session not found"),
        (status = 502, description = "KYC provider unavailable")
    )
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<OtpVerifyRequest>,
) -> Result<Json<ConversionSession>, ApiError> {
    let client_id = {
        let store = state.sessions.read().await;
        let session = store.peek(&session_id).ok_or_else(session_not_found)?;
        session.kyc_client_id.clone().ok_or_else(|| {
            WorkflowError::Validation("no pending OTP verification for this session".into())
        })?
    };

    let outcome = state.kyc.resolve_otp(&client_id, &request.otp).await?;
    info!(session_id = %session_id, ?outcome, "OTP verification resolved");

    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::kyc_resolved(session, outcome)?;
    Ok(Json(session.clone()))
}

/// Verify a PAN synchronously.
///
/// PAN verification has no OTP round trip, so a single call takes the
/// session through `pending` to a terminal status.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/kyc/pan",
    tag = "KYC",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = PanRequest,
    responses(
        (status = 200, description = "Verification resolved; convert unlocked when verified", body = ConversionSession),
        (status = 400, description = "Invalid PAN, missing name, or wrong step"),
        (status = 404, description = "Session not found"),
        (status = 502, description = "KYC provider unavailable")
    )
)]
pub async fn verify_pan(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<PanRequest>,
) -> Result<Json<ConversionSession>, ApiError> {
    {
        let store = state.sessions.read().await;
        let session = store.peek(&session_id).ok_or_else(session_not_found)?;
        ensure_kyc_open(session)?;
    }

    let outcome = state
        .kyc
        .resolve_pan(&request.pan_number, &request.name)
        .await?;
    info!(session_id = %session_id, ?outcome, "PAN verification resolved");

    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    if session.kyc_status != KycStatus::Pending {
        workflow::kyc_initiated(session, format!("pan:{session_id}"))?;
    }
    workflow::kyc_resolved(session, outcome)?;
    Ok(Json(session.clone()))
}
