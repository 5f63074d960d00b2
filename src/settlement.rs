// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Settlement initiator.
//!
//! Validates that a session has earned its payout (confirmed swap,
//! complete bank details) before any backend call, then submits the
//! custody transfer and the withdrawal request. Returns the opaque
//! withdrawal identifier the user sees on the confirmation screen.

use std::sync::Arc;

use tracing::info;

use crate::error::WorkflowError;
use crate::models::{BankDetails, Settlement, SettlementStatus, SwapReceipt, SwapStatus, WalletAddress};
use crate::providers::{CustodyTransferRequest, SettlementBackend, WithdrawalRequest};

#[derive(Clone)]
pub struct SettlementInitiator {
    backend: Arc<dyn SettlementBackend>,
}

impl SettlementInitiator {
    pub fn new(backend: Arc<dyn SettlementBackend>) -> Self {
        Self { backend }
    }

    /// Initiate the INR payout for a confirmed swap.
    ///
    /// Preconditions are enforced here, before any network call: the swap
    /// receipt must be `Confirmed` (submitted, failed, and unknown all
    /// reject) and every bank-detail field must be non-empty.
    pub async fn initiate(
        &self,
        wallet: &WalletAddress,
        receipt: &SwapReceipt,
        bank: &BankDetails,
    ) -> Result<Settlement, WorkflowError> {
        if receipt.status != SwapStatus::Confirmed {
            return Err(WorkflowError::Validation(format!(
                "swap {} is not confirmed yet (status: {:?})",
                receipt.reference, receipt.status
            )));
        }
        if !bank.is_complete() {
            return Err(WorkflowError::Validation(
                "all bank detail fields are required before withdrawal".into(),
            ));
        }

        self.backend
            .custody_transfer(CustodyTransferRequest {
                wallet_address: wallet,
                swap_reference: &receipt.reference,
                amount: &receipt.buy_amount,
                chain_id: receipt.chain_id,
            })
            .await?;

        let withdrawal_id = self
            .backend
            .initiate_withdrawal(WithdrawalRequest {
                wallet_address: wallet,
                swap_reference: &receipt.reference,
                amount: &receipt.buy_amount,
                account_holder_name: &bank.account_holder_name,
                account_number: &bank.account_number,
                ifsc_code: &bank.ifsc_code,
                bank_name: &bank.bank_name,
            })
            .await?;

        info!(
            withdrawal_id = %withdrawal_id,
            swap_reference = %receipt.reference,
            "settlement initiated"
        );

        Ok(Settlement {
            withdrawal_id,
            status: SettlementStatus::Processing,
            swap_reference: receipt.reference.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SwapMode;
    use crate::testutil::{MockSettlementBackend, TEST_WALLET};
    use std::sync::atomic::Ordering;

    fn confirmed_receipt() -> SwapReceipt {
        SwapReceipt {
            mode: SwapMode::Direct,
            reference: "0xabc".into(),
            status: SwapStatus::Confirmed,
            chain_id: 1,
            buy_amount: "2500.00".into(),
            poll_attempts: 0,
        }
    }

    fn bank() -> BankDetails {
        BankDetails {
            account_holder_name: "Asha Rao".into(),
            account_number: "000123456789".into(),
            ifsc_code: "HDFC0001234".into(),
            bank_name: "HDFC Bank".into(),
        }
    }

    #[tokio::test]
    async fn happy_path_returns_withdrawal_id() {
        let backend = Arc::new(MockSettlementBackend::default());
        let initiator = SettlementInitiator::new(backend.clone());

        let settlement = initiator
            .initiate(&WalletAddress::from(TEST_WALLET), &confirmed_receipt(), &bank())
            .await
            .unwrap();

        assert_eq!(settlement.withdrawal_id, "WD-ABC123");
        assert_eq!(settlement.status, SettlementStatus::Processing);
        assert_eq!(settlement.swap_reference, "0xabc");
        assert_eq!(backend.custody_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.withdrawal_calls.load(Ordering::SeqCst), 1);
    }

    // Unconfirmed swaps must not reach settlement.
    #[tokio::test]
    async fn unconfirmed_swap_rejected_before_any_call() {
        let backend = Arc::new(MockSettlementBackend::default());
        let initiator = SettlementInitiator::new(backend.clone());

        for status in [SwapStatus::Submitted, SwapStatus::Failed, SwapStatus::Unknown] {
            let receipt = SwapReceipt {
                status,
                ..confirmed_receipt()
            };
            let err = initiator
                .initiate(&WalletAddress::from(TEST_WALLET), &receipt, &bank())
                .await
                .unwrap_err();
            assert!(matches!(err, WorkflowError::Validation(_)));
        }
        assert_eq!(backend.custody_calls.load(Ordering::SeqCst), 0);
    }

    // Empty bank fields must not reach settlement.
    #[tokio::test]
    async fn incomplete_bank_details_rejected_before_any_call() {
        let backend = Arc::new(MockSettlementBackend::default());
        let initiator = SettlementInitiator::new(backend.clone());

        let incomplete = BankDetails {
            ifsc_code: "".into(),
            ..bank()
        };
        let err = initiator
            .initiate(&WalletAddress::from(TEST_WALLET), &confirmed_receipt(), &incomplete)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(backend.custody_calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.withdrawal_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn custody_failure_propagates_and_skips_withdrawal() {
        let backend = Arc::new(MockSettlementBackend {
            fail_custody: true,
            ..MockSettlementBackend::default()
        });
        let initiator = SettlementInitiator::new(backend.clone());

        let err = initiator
            .initiate(&WalletAddress::from(TEST_WALLET), &confirmed_receipt(), &bank())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::TransientService(_)));
        assert_eq!(backend.withdrawal_calls.load(Ordering::SeqCst), 0);
    }
}
