// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Session lifecycle: create on wallet connect, inspect, disconnect,
//! reconnect, and back navigation out of the convert step.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::WalletAddress,
    session::ConversionSession,
    state::AppState,
    workflow,
};

/// Request body for creating a conversion session.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Connected wallet address (`0x` + 40 hex chars).
    pub wallet_address: String,
    /// Wallet's active chain.
    pub chain_id: u64,
}

/// Request body for reconnecting a disconnected session.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConnectRequest {
    /// Wallet's active chain at reconnect time.
    pub chain_id: u64,
}

pub(super) fn session_not_found() -> ApiError {
    ApiError::not_found("conversion session not found")
}

/// Create a conversion session for a connected wallet.
#[utoipa::path(
    post,
    path = "/v1/sessions",
    tag = "Sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = ConversionSession),
        (status = 400, description = "Implausible wallet address")
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ConversionSession>), ApiError> {
    let wallet_address = WalletAddress::from(request.wallet_address);
    if !wallet_address.is_plausible() {
        return Err(ApiError::bad_request(
            "wallet_address must be 0x followed by 40 hex characters",
        ));
    }

    let session = ConversionSession::new(wallet_address, request.chain_id);
    info!(session_id = %session.id, chain_id = request.chain_id, "conversion session created");

    let mut store = state.sessions.write().await;
    store.insert(session.clone());
    Ok((StatusCode::CREATED, Json(session)))
}

/// Fetch a session's full state.
#[utoipa::path(
    get,
    path = "/v1/sessions/{session_id}",
    tag = "Sessions",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session state", body = ConversionSession),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConversionSession>, ApiError> {
    let store = state.sessions.read().await;
    let session = store.peek(&session_id).ok_or_else(session_not_found)?;
    Ok(Json(session.clone()))
}

/// Reconnect after a disconnect, resuming on the same session.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/connect",
    tag = "Sessions",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Session reconnected", body = ConversionSession),
        (status = 400, description = "Session is not disconnected"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn connect_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<ConversionSession>, ApiError> {
    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::reconnect(session, request.chain_id)?;
    Ok(Json(session.clone()))
}

/// Record a wallet disconnect. Flow state is cleared; identity state
/// survives for the eventual reconnect.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/disconnect",
    tag = "Sessions",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session reset to the connect step", body = ConversionSession),
        (status = 404, description = "Session not found")
    )
)]
pub async fn disconnect_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConversionSession>, ApiError> {
    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::disconnect(session);
    Ok(Json(session.clone()))
}

/// Navigate back from the convert step to the KYC step.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/back",
    tag = "Sessions",
    params(("session_id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Returned to the KYC step", body = ConversionSession),
        (status = 400, description = "Back navigation not available"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn back_to_kyc(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConversionSession>, ApiError> {
    let mut store = state.sessions.write().await;
    let session = store.get_mut(&session_id).ok_or_else(session_not_found)?;
    workflow::back_to_kyc(session)?;
    Ok(Json(session.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KycStatus, WorkflowStep};
    use crate::testutil::TEST_WALLET;

    async fn created(state: &AppState) -> ConversionSession {
        let (status, session) = create_session(
            State(state.clone()),
            Json(CreateSessionRequest {
                wallet_address: TEST_WALLET.into(),
                chain_id: 1,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        session.0
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let state = AppState::for_tests();
        let session = created(&state).await;
        assert_eq!(session.step, WorkflowStep::Kyc);

        let fetched = get_session(State(state), Path(session.id)).await.unwrap();
        assert_eq!(fetched.0.id, session.id);
    }

    #[tokio::test]
    async fn implausible_address_rejected() {
        let state = AppState::for_tests();
        let err = create_session(
            State(state),
            Json(CreateSessionRequest {
                wallet_address: "0x1234".into(),
                chain_id: 1,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let state = AppState::for_tests();
        let err = get_session(State(state), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn disconnect_then_reconnect_skips_kyc_when_verified() {
        let state = AppState::for_tests();
        let session = created(&state).await;
        {
            let mut store = state.sessions.write().await;
            let s = store.get_mut(&session.id).unwrap();
            s.kyc_status = KycStatus::Verified;
            s.step = WorkflowStep::Convert;
        }

        let disconnected = disconnect_session(State(state.clone()), Path(session.id))
            .await
            .unwrap();
        assert_eq!(disconnected.0.step, WorkflowStep::Connect);

        let reconnected = connect_session(
            State(state),
            Path(session.id),
            Json(ConnectRequest { chain_id: 137 }),
        )
        .await
        .unwrap();
        assert_eq!(reconnected.0.step, WorkflowStep::Convert);
        assert_eq!(reconnected.0.chain_id, 137);
    }
}
