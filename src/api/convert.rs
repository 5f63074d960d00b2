// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Convert step: token and amount selection, quoting, and swap execution.
//!
//! Quote and swap handlers follow a snapshot/call/apply shape: inputs are
//! copied out under a read lock, the upstream call runs without any lock
//! held, and the result is applied under a write lock only if the session
//! epoch is unchanged. A stale result surfaces as `409 Conflict` so the
//! client simply re-requests against the session's new inputs.

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
    models::Token,
    session::ConversionSession,
    state::AppState,
    workflow,
};

use super::sessions::session_not_found;

/// Request body for setting the sell amount.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetAmountRequest {
    /// Sell amount in human units (decimal string, e.g. "1.5").
    pub amount: String,
}

/// Request body for reporting a wallet network switch.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangeChainRequest {
    /// The wallet's new active chain.
    pub chain_id: u64,
}

fn stale_session() -> ApiError {
    ApiError::conflict("session changed while the request was in flight; retry")
}

/// Select the token to sell.
#[utoipa::path(
    put,
    path = "/v1/sessions/{session_id}/token",
    tag = "Convert",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = Token,
    responses(
        (status = 200, description = "Token selected; any held quote for a different token is dropped", body = ConversionSession),
        (status = 400, description = "Token is on the wrong chain or session is not at the convert step"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn select_token(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(token): Json<Token>,
) -> Result<Json<ConversionSession>, ApiError> {
    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::select_token(session, token)?;
    Ok(Json(session.clone()))
}

/// Set the sell amount.
#[utoipa::path(
    put,
    path = "/v1/sessions/{session_id}/amount",
    tag = "Convert",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = SetAmountRequest,
    responses(
        (status = 200, description = "Amount set; any held quote for a different amount is dropped", body = ConversionSession),
        (status = 400, description = "Amount is not a positive number"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn set_amount(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SetAmountRequest>,
) -> Result<Json<ConversionSession>, ApiError> {
    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::set_amount(session, request.amount)?;
    Ok(Json(session.clone()))
}

/// Report that the wallet switched networks.
#[utoipa::path(
    put,
    path = "/v1/sessions/{session_id}/chain",
    tag = "Convert",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = ChangeChainRequest,
    responses(
        (status = 200, description = "Chain recorded; held quote dropped, foreign token deselected", body = ConversionSession),
        (status = 404, description = "Session not found")
    )
)]
pub async fn change_chain(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ChangeChainRequest>,
) -> Result<Json<ConversionSession>, ApiError> {
    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::change_chain(session, request.chain_id);
    Ok(Json(session.clone()))
}

/// Fetch a fresh quote for the session's current token, amount, and chain.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/quote",
    tag = "Convert",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Quote held on the session", body = ConversionSession),
        (status = 400, description = "Token or amount not set, or KYC incomplete"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session inputs changed while the quote was being fetched"),
        (status = 422, description = "No route for this token pair"),
        (status = 502, description = "Aggregator unavailable")
    )
)]
pub async fn request_quote(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConversionSession>, ApiError> {
    let inputs = {
        let store = state.sessions.read().await;
        let session = store.peek(&session_id).ok_or_else(session_not_found)?;
        workflow::quote_inputs(session)?
    };

    let quote = state
        .quotes
        .get_quote(&inputs.sell_token, &inputs.amount, inputs.chain_id, &inputs.taker)
        .await?;

    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    if !workflow::store_quote(session, inputs.epoch, quote) {
        return Err(stale_session());
    }
    Ok(Json(session.clone()))
}

/// Execute the held quote.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/swap",
    tag = "Convert",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Swap executed; quote consumed", body = ConversionSession),
        (status = 400, description = "No quote held, or quote expired"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Signing rejected, or session changed mid-execution"),
        (status = 412, description = "Wallet is on the wrong network; quote discarded"),
        (status = 502, description = "Relay or RPC unavailable")
    )
)]
pub async fn execute_swap(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConversionSession>, ApiError> {
    // Taking the quote under the write lock reserves execution: an
    // overlapping swap request finds no quote and fails before the
    // signer can be reached a second time.
    let (quote, epoch, wallet_chain) = {
        let mut store = state.sessions.write().await;
        let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
        let (quote, epoch) = workflow::take_quote_for_execution(session)?;
        (quote, epoch, session.chain_id)
    };

    match state
        .executor
        .execute(wallet_chain, &quote, state.signer.as_ref())
        .await
    {
        Ok(receipt) => {
            info!(
                session_id = %session_id,
                reference = %receipt.reference,
                "swap executed"
            );
            let mut store = state.sessions.write().await;
            let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
            if !workflow::record_swap(session, epoch, receipt) {
                return Err(stale_session());
            }
            Ok(Json(session.clone()))
        }
        Err(err @ WorkflowError::WrongNetwork { .. }) => {
            // The quote was priced for a chain the wallet is no longer
            // on; it stays consumed so the next attempt starts from a
            // fresh quote.
            Err(err.into())
        }
        Err(err) => {
            // Retryable failures hand the quote back for a
            // user-initiated retry.
            if err.is_retryable() {
                let mut store = state.sessions.write().await;
                if let Some(session) = store.get_mut(&session_id) {
                    workflow::restore_quote(session, epoch, quote);
                }
            }
            Err(err.into())
        }
    }
}
