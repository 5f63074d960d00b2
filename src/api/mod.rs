// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        BankDetails, ExecutionPayload, KycStatus, Quote, Settlement, SettlementStatus, SwapMode,
        SwapReceipt, SwapStatus, Token, WalletAddress, WorkflowStep,
    },
    session::ConversionSession,
    state::AppState,
};

pub mod convert;
pub mod health;
pub mod kyc;
pub mod sessions;
pub mod settlement;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/{session_id}", get(sessions::get_session))
        .route(
            "/sessions/{session_id}/connect",
            post(sessions::connect_session),
        )
        .route(
            "/sessions/{session_id}/disconnect",
            post(sessions::disconnect_session),
        )
        .route("/sessions/{session_id}/back", post(sessions::back_to_kyc))
        .route("/sessions/{session_id}/kyc/otp", post(kyc::initiate_otp))
        .route("/sessions/{session_id}/kyc/verify", post(kyc::verify_otp))
        .route("/sessions/{session_id}/kyc/pan", post(kyc::verify_pan))
        .route("/sessions/{session_id}/token", put(convert::select_token))
        .route("/sessions/{session_id}/amount", put(convert::set_amount))
        .route("/sessions/{session_id}/chain", put(convert::change_chain))
        .route("/sessions/{session_id}/quote", post(convert::request_quote))
        .route("/sessions/{session_id}/swap", post(convert::execute_swap))
        .route(
            "/sessions/{session_id}/bank-details",
            put(settlement::set_bank_details),
        )
        .route(
            "/sessions/{session_id}/withdraw",
            post(settlement::initiate_withdrawal),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        sessions::create_session,
        sessions::get_session,
        sessions::connect_session,
        sessions::disconnect_session,
        sessions::back_to_kyc,
        kyc::initiate_otp,
        kyc::verify_otp,
        kyc::verify_pan,
        convert::select_token,
        convert::set_amount,
        convert::change_chain,
        convert::request_quote,
        convert::execute_swap,
        settlement::set_bank_details,
        settlement::initiate_withdrawal
    ),
    components(
        schemas(
            ConversionSession,
            WalletAddress,
            Token,
            Quote,
            ExecutionPayload,
            SwapReceipt,
            SwapMode,
            SwapStatus,
            KycStatus,
            BankDetails,
            Settlement,
            SettlementStatus,
            WorkflowStep,
            health::HealthResponse,
            sessions::CreateSessionRequest,
            sessions::ConnectRequest,
            convert::SetAmountRequest,
            convert::ChangeChainRequest,
            kyc::OtpRequest,
            kyc::OtpVerifyRequest,
            kyc::PanRequest,
            settlement::BankDetailsRequest
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Sessions", description = "Conversion session lifecycle"),
        (name = "KYC", description = "Identity verification gate"),
        (name = "Convert", description = "Token selection, quoting, and swap execution"),
        (name = "Settlement", description = "Bank details and INR withdrawal")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{eth_token, TEST_WALLET};
    use axum::extract::{Path, State};
    use axum::Json;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::for_tests());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    // Full happy path: connect, verify identity, quote, swap, bank
    // details, withdraw.
    #[tokio::test]
    async fn conversion_happy_path_end_to_end() {
        let state = AppState::for_tests();

        let (_, session) = sessions::create_session(
            State(state.clone()),
            Json(sessions::CreateSessionRequest {
                wallet_address: TEST_WALLET.into(),
                chain_id: 1,
            }),
        )
        .await
        .unwrap();
        let id = session.0.id;
        assert_eq!(session.0.step, WorkflowStep::Kyc);

        kyc::initiate_otp(
            State(state.clone()),
            Path(id),
            Json(kyc::OtpRequest {
                aadhaar_number: "123456789012".into(),
            }),
        )
        .await
        .unwrap();
        let verified = kyc::verify_otp(
            State(state.clone()),
            Path(id),
            Json(kyc::OtpVerifyRequest {
                otp: "123456".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(verified.0.step, WorkflowStep::Convert);

        convert::select_token(State(state.clone()), Path(id), Json(eth_token(1)))
            .await
            .unwrap();
        convert::set_amount(
            State(state.clone()),
            Path(id),
            Json(convert::SetAmountRequest {
                amount: "1.5".into(),
            }),
        )
        .await
        .unwrap();

        let quoted = convert::request_quote(State(state.clone()), Path(id))
            .await
            .unwrap();
        assert!(quoted.0.quote.is_some());

        let swapped = convert::execute_swap(State(state.clone()), Path(id))
            .await
            .unwrap();
        assert_eq!(
            swapped.0.swap.as_ref().unwrap().status,
            SwapStatus::Confirmed
        );
        assert!(swapped.0.quote.is_none());

        settlement::set_bank_details(
            State(state.clone()),
            Path(id),
            Json(settlement::BankDetailsRequest {
                account_holder_name: "Asha Rao".into(),
                account_number: "000123456789".into(),
                ifsc_code: "HDFC0001234".into(),
                bank_name: "HDFC Bank".into(),
            }),
        )
        .await
        .unwrap();

        let complete = settlement::initiate_withdrawal(State(state), Path(id))
            .await
            .unwrap();
        assert_eq!(complete.0.step, WorkflowStep::Complete);
        assert!(complete.0.settlement.is_some());
    }
}
