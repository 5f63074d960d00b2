// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! External service adapters.
//!
//! Each upstream (swap aggregator, gasless relay, KYC provider, settlement
//! backend) is reached through a trait so the workflow controller is
//! parameterized by whichever adapter is injected. The HTTP
//! implementations normalize provider-specific response shapes into the
//! crate's domain types at this boundary; provider fields never leak past
//! it.
//!
//! All adapters are stateless with respect to conversion sessions: they
//! take inputs and return outputs, and never touch session state.

pub mod aggregator;
pub mod gasless;
pub mod kyc;
pub mod settlement;

use async_trait::async_trait;

use crate::error::WorkflowError;
use crate::models::{Quote, Token, WalletAddress};

// =============================================================================
// Quote service
// =============================================================================

/// Prices a conversion of `amount` of `sell` into the chain's destination
/// stablecoin. Pure read against live market data; two identical calls may
/// legitimately return different prices.
#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn get_quote(
        &self,
        sell: &Token,
        amount: &str,
        chain_id: u64,
        taker: &WalletAddress,
    ) -> Result<Quote, WorkflowError>;
}

// =============================================================================
// Gasless relay
// =============================================================================

/// Relay-side status of a submitted gasless trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayTradeStatus {
    Pending,
    Confirmed,
    Failed,
}

/// Broadcasts signed gasless orders and reports their settlement status.
///
/// Submission returns a trade hash immediately; confirmation arrives
/// asynchronously and is resolved by polling [`GaslessRelay::status`] at a
/// bounded interval.
#[async_trait]
pub trait GaslessRelay: Send + Sync {
    async fn submit(
        &self,
        typed_data: &serde_json::Value,
        signature: &str,
    ) -> Result<String, WorkflowError>;

    async fn status(&self, trade_hash: &str) -> Result<RelayTradeStatus, WorkflowError>;
}

// =============================================================================
// KYC provider
// =============================================================================

/// Result of a PAN verification check.
#[derive(Debug, Clone)]
pub struct PanVerification {
    /// Name match percentage reported by the provider, 0.0..=1.0.
    pub name_match: f64,
    /// Provider status string (e.g. "valid").
    pub status: String,
}

/// Third-party identity verification (Aadhaar OTP and PAN checks).
#[async_trait]
pub trait KycProvider: Send + Sync {
    /// Dispatch an OTP to the Aadhaar-linked number. Returns the provider
    /// handle used to verify the OTP.
    async fn request_otp(&self, identity_number: &str) -> Result<String, WorkflowError>;

    /// Verify a previously dispatched OTP. `true` means the identity
    /// checked out.
    async fn verify_otp(&self, client_id: &str, otp: &str) -> Result<bool, WorkflowError>;

    /// Verify a PAN number against the holder's name.
    async fn verify_pan(
        &self,
        pan_number: &str,
        name: &str,
    ) -> Result<PanVerification, WorkflowError>;
}

// =============================================================================
// Settlement backend
// =============================================================================

/// Custody-transfer request: moves the swapped stablecoin into custody
/// ahead of the fiat payout.
#[derive(Debug, Clone)]
pub struct CustodyTransferRequest<'a> {
    pub wallet_address: &'a WalletAddress,
    pub swap_reference: &'a str,
    pub amount: &'a str,
    pub chain_id: u64,
}

/// Withdrawal initiation request.
#[derive(Debug, Clone)]
pub struct WithdrawalRequest<'a> {
    pub wallet_address: &'a WalletAddress,
    pub swap_reference: &'a str,
    pub amount: &'a str,
    pub account_holder_name: &'a str,
    pub account_number: &'a str,
    pub ifsc_code: &'a str,
    pub bank_name: &'a str,
}

/// Backend that converts a confirmed stablecoin balance into an INR bank
/// transfer. Returns an opaque withdrawal identifier; no further payout
/// lifecycle is tracked here.
#[async_trait]
pub trait SettlementBackend: Send + Sync {
    async fn custody_transfer(
        &self,
        request: CustodyTransferRequest<'_>,
    ) -> Result<(), WorkflowError>;

    async fn initiate_withdrawal(
        &self,
        request: WithdrawalRequest<'_>,
    ) -> Result<String, WorkflowError>;
}
