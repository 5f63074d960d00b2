// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Mock service adapters for unit tests. No network anywhere.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::WorkflowError;
use crate::models::{ExecutionPayload, Quote, Token, WalletAddress};
use crate::providers::{
    CustodyTransferRequest, GaslessRelay, KycProvider, PanVerification, QuoteService,
    RelayTradeStatus, SettlementBackend, WithdrawalRequest,
};
use crate::wallet::WalletSigner;

pub const TEST_WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

pub fn eth_token(chain_id: u64) -> Token {
    Token {
        symbol: "ETH".into(),
        address: None,
        decimals: 18,
        chain_id,
    }
}

pub fn direct_quote(chain_id: u64) -> Quote {
    Quote {
        sell_token: eth_token(chain_id),
        sell_amount: "1.5".into(),
        buy_amount: "2500.00".into(),
        price: "2500.00".into(),
        fee_estimate: "1.25".into(),
        chain_id,
        expires_at: None,
        payload: ExecutionPayload::Direct {
            to: WalletAddress::from("0x1111111111111111111111111111111111111111"),
            data: "0xdeadbeef".into(),
            value: "0".into(),
            gas: Some("210000".into()),
        },
    }
}

pub fn gasless_quote(chain_id: u64) -> Quote {
    Quote {
        payload: ExecutionPayload::Gasless {
            typed_data: serde_json::json!({"domain": {}, "message": {}}),
        },
        ..direct_quote(chain_id)
    }
}

// =============================================================================
// Mock signer
// =============================================================================

/// Records every signing interaction so tests can assert the network
/// mismatch guard never reaches the wallet.
#[derive(Default)]
pub struct MockSigner {
    pub send_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
    pub reject: bool,
}

impl MockSigner {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn total_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst) + self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for MockSigner {
    fn address(&self) -> WalletAddress {
        WalletAddress::from(TEST_WALLET)
    }

    async fn send_transaction(
        &self,
        _to: &WalletAddress,
        _data: &str,
        _value: &str,
    ) -> Result<String, WorkflowError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(WorkflowError::SigningRejected);
        }
        Ok("0xabc0000000000000000000000000000000000000000000000000000000000000".into())
    }

    async fn sign_typed_data(
        &self,
        _typed_data: &serde_json::Value,
    ) -> Result<String, WorkflowError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(WorkflowError::SigningRejected);
        }
        Ok(format!("0x{}", "11".repeat(65)))
    }
}

// =============================================================================
// Mock quote service
// =============================================================================

pub struct MockQuoteService {
    pub quote: Quote,
    pub fail_with: Mutex<Option<WorkflowError>>,
    pub calls: AtomicUsize,
}

impl MockQuoteService {
    pub fn returning(quote: Quote) -> Self {
        Self {
            quote,
            fail_with: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(quote: Quote, err: WorkflowError) -> Self {
        Self {
            quote,
            fail_with: Mutex::new(Some(err)),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuoteService for MockQuoteService {
    async fn get_quote(
        &self,
        _sell: &Token,
        _amount: &str,
        _chain_id: u64,
        _taker: &WalletAddress,
    ) -> Result<Quote, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.quote.clone())
    }
}

// =============================================================================
// Mock gasless relay
// =============================================================================

#[derive(Default)]
pub struct MockRelay {
    pub statuses: Mutex<Vec<RelayTradeStatus>>,
    pub status_calls: AtomicUsize,
}

impl MockRelay {
    /// Queue statuses returned by successive `status` calls; the last one
    /// repeats once the queue drains.
    pub fn with_statuses(statuses: Vec<RelayTradeStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses),
            status_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GaslessRelay for MockRelay {
    async fn submit(
        &self,
        _typed_data: &serde_json::Value,
        _signature: &str,
    ) -> Result<String, WorkflowError> {
        Ok("0xtrade000000000000000000000000000000000000000000000000000000000".into())
    }

    async fn status(&self, _trade_hash: &str) -> Result<RelayTradeStatus, WorkflowError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.statuses.lock().unwrap();
        if queue.len() > 1 {
            Ok(queue.remove(0))
        } else {
            Ok(queue.first().copied().unwrap_or(RelayTradeStatus::Pending))
        }
    }
}

// =============================================================================
// Mock KYC provider
// =============================================================================

pub struct MockKycProvider {
    pub otp_verifies: bool,
    pub pan_match: f64,
}

impl Default for MockKycProvider {
    fn default() -> Self {
        Self {
            otp_verifies: true,
            pan_match: 0.95,
        }
    }
}

#[async_trait]
impl KycProvider for MockKycProvider {
    async fn request_otp(&self, _identity_number: &str) -> Result<String, WorkflowError> {
        Ok("kyc-client-1".into())
    }

    async fn verify_otp(&self, _client_id: &str, _otp: &str) -> Result<bool, WorkflowError> {
        Ok(self.otp_verifies)
    }

    async fn verify_pan(
        &self,
        _pan_number: &str,
        _name: &str,
    ) -> Result<PanVerification, WorkflowError> {
        Ok(PanVerification {
            name_match: self.pan_match,
            status: "valid".into(),
        })
    }
}

// =============================================================================
// Mock settlement backend
// =============================================================================

#[derive(Default)]
pub struct MockSettlementBackend {
    pub custody_calls: AtomicUsize,
    pub withdrawal_calls: AtomicUsize,
    pub fail_custody: bool,
}

#[async_trait]
impl SettlementBackend for MockSettlementBackend {
    async fn custody_transfer(
        &self,
        _request: CustodyTransferRequest<'_>,
    ) -> Result<(), WorkflowError> {
        self.custody_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_custody {
            return Err(WorkflowError::TransientService("custody unavailable".into()));
        }
        Ok(())
    }

    async fn initiate_withdrawal(
        &self,
        _request: WithdrawalRequest<'_>,
    ) -> Result<String, WorkflowError> {
        self.withdrawal_calls.fetch_add(1, Ordering::SeqCst);
        Ok("WD-ABC123".into())
    }
}
