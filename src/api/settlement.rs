// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Bank-detail capture and INR withdrawal initiation.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::BankDetails,
    session::ConversionSession,
    state::AppState,
    workflow,
};

use super::sessions::session_not_found;

/// Request body for capturing beneficiary bank details.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BankDetailsRequest {
    /// Account holder's name as registered with the bank.
    pub account_holder_name: String,
    /// Bank account number.
    pub account_number: String,
    /// IFSC routing code.
    pub ifsc_code: String,
    /// Bank name.
    pub bank_name: String,
}

/// Capture the beneficiary bank account for the INR payout.
#[utoipa::path(
    put,
    path = "/v1/sessions/{session_id}/bank-details",
    tag = "Settlement",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = BankDetailsRequest,
    responses(
        (status = 200, description = "Bank details stored", body = ConversionSession),
        (status = 400, description = "One or more fields blank"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn set_bank_details(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<BankDetailsRequest>,
) -> Result<Json<ConversionSession>, ApiError> {
    let details = BankDetails {
        account_holder_name: request.account_holder_name,
        account_number: request.account_number,
        ifsc_code: request.ifsc_code,
        bank_name: request.bank_name,
    };

    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::set_bank_details(session, details)?;
    Ok(Json(session.clone()))
}

/// Initiate the INR withdrawal for the session's confirmed swap.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/withdraw",
    tag = "Settlement",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Withdrawal initiated; workflow complete", body = ConversionSession),
        (status = 400, description = "No confirmed swap or bank details missing"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Withdrawal already initiated, or session changed mid-request"),
        (status = 502, description = "Settlement backend unavailable")
    )
)]
pub async fn initiate_withdrawal(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConversionSession>, ApiError> {
    // Reserving the session under the write lock makes an overlapping
    // withdrawal fail fast instead of reaching the backend twice.
    let (wallet, receipt, bank, epoch) = {
        let mut store = state.sessions.write().await;
        let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
        if session.settlement.is_some() || session.settlement_in_flight {
            return Err(ApiError::conflict(
                "a withdrawal has already been initiated for this session",
            ));
        }
        if !session.kyc_status.unlocks_convert() {
            return Err(ApiError::bad_request(
                "identity verification has not completed",
            ));
        }
        let receipt = session.swap.clone().ok_or_else(|| {
            ApiError::bad_request("no swap has been executed for this session")
        })?;
        let bank = session.bank_details.clone().ok_or_else(|| {
            ApiError::bad_request("bank details are required before withdrawal")
        })?;
        let epoch = workflow::begin_settlement(session)?;
        (session.wallet_address.clone(), receipt, bank, epoch)
    };

    match state.settlement.initiate(&wallet, &receipt, &bank).await {
        Ok(settlement) => {
            let mut store = state.sessions.write().await;
            let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
            if !workflow::record_settlement(session, epoch, settlement) {
                return Err(ApiError::conflict(
                    "session changed while the withdrawal was being initiated",
                ));
            }
            Ok(Json(session.clone()))
        }
        Err(err) => {
            let mut store = state.sessions.write().await;
            if let Some(session) = store.get_mut(&session_id) {
                workflow::abort_settlement(session);
            }
            Err(err.into())
        }
    }
}
