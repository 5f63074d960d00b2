// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Swap executor.
//!
//! Takes an accepted quote and pushes it through the wallet signer, either
//! as a standard transaction (direct mode) or as a signed EIP-712 order
//! handed to the gasless relay. The executor itself is stateless; quote
//! consumption bookkeeping belongs to the workflow controller.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::WorkflowError;
use crate::models::{ExecutionPayload, Quote, SwapMode, SwapReceipt, SwapStatus};
use crate::providers::GaslessRelay;
use crate::wallet::WalletSigner;

#[derive(Clone)]
pub struct SwapExecutor {
    relay: Arc<dyn GaslessRelay>,
}

impl SwapExecutor {
    pub fn new(relay: Arc<dyn GaslessRelay>) -> Self {
        Self { relay }
    }

    /// Execute a quote.
    ///
    /// Fails fast with [`WorkflowError::WrongNetwork`] when the wallet's
    /// active chain differs from the chain the quote was priced on; the
    /// signer is never invoked in that case. Expired quotes are rejected
    /// before signing as well.
    ///
    /// Direct mode resolves once the transaction is mined, so the receipt
    /// comes back `Confirmed`. Gasless mode returns a `Submitted` receipt
    /// carrying the relay trade hash; the relay poller resolves it later.
    pub async fn execute(
        &self,
        wallet_chain_id: u64,
        quote: &Quote,
        signer: &dyn WalletSigner,
    ) -> Result<SwapReceipt, WorkflowError> {
        if wallet_chain_id != quote.chain_id {
            return Err(WorkflowError::WrongNetwork {
                wallet_chain: wallet_chain_id,
                required_chain: quote.chain_id,
            });
        }

        if quote.is_expired(Utc::now()) {
            return Err(WorkflowError::Validation(
                "quote has expired; fetch a fresh quote".into(),
            ));
        }

        match &quote.payload {
            ExecutionPayload::Direct { to, data, value, .. } => {
                let tx_hash = signer.send_transaction(to, data, value).await?;
                info!(tx_hash = %tx_hash, chain_id = quote.chain_id, "direct swap confirmed");
                Ok(SwapReceipt {
                    mode: SwapMode::Direct,
                    reference: tx_hash,
                    status: SwapStatus::Confirmed,
                    chain_id: quote.chain_id,
                    buy_amount: quote.buy_amount.clone(),
                    poll_attempts: 0,
                })
            }
            ExecutionPayload::Gasless { typed_data } => {
                let signature = signer.sign_typed_data(typed_data).await?;
                let trade_hash = self.relay.submit(typed_data, &signature).await?;
                debug!(trade_hash = %trade_hash, chain_id = quote.chain_id, "gasless swap submitted");
                Ok(SwapReceipt {
                    mode: SwapMode::Gasless,
                    reference: trade_hash,
                    status: SwapStatus::Submitted,
                    chain_id: quote.chain_id,
                    buy_amount: quote.buy_amount.clone(),
                    poll_attempts: 0,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{direct_quote, gasless_quote, MockRelay, MockSigner};

    fn executor() -> SwapExecutor {
        SwapExecutor::new(Arc::new(MockRelay::default()))
    }

    // Chain mismatch fails fast without touching the signer.
    #[tokio::test]
    async fn wrong_network_never_reaches_signer() {
        let signer = MockSigner::default();
        let quote = direct_quote(137);

        let err = executor().execute(1, &quote, &signer).await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::WrongNetwork {
                wallet_chain: 1,
                required_chain: 137
            }
        ));
        assert_eq!(signer.total_calls(), 0);
    }

    #[tokio::test]
    async fn direct_swap_confirms_with_tx_hash() {
        let signer = MockSigner::default();
        let quote = direct_quote(1);

        let receipt = executor().execute(1, &quote, &signer).await.unwrap();

        assert_eq!(receipt.mode, SwapMode::Direct);
        assert_eq!(receipt.status, SwapStatus::Confirmed);
        assert!(receipt.reference.starts_with("0xabc"));
        assert_eq!(signer.send_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gasless_swap_submits_signed_order() {
        let signer = MockSigner::default();
        let quote = gasless_quote(1);

        let receipt = executor().execute(1, &quote, &signer).await.unwrap();

        assert_eq!(receipt.mode, SwapMode::Gasless);
        assert_eq!(receipt.status, SwapStatus::Submitted);
        assert!(receipt.reference.starts_with("0xtrade"));
        assert_eq!(signer.sign_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_quote_rejected_before_signing() {
        let signer = MockSigner::default();
        let mut quote = direct_quote(1);
        quote.expires_at = Some(Utc::now() - chrono::Duration::seconds(30));

        let err = executor().execute(1, &quote, &signer).await.unwrap_err();

        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(signer.total_calls(), 0);
    }

    #[tokio::test]
    async fn declined_prompt_surfaces_as_signing_rejected() {
        let signer = MockSigner::rejecting();
        let quote = direct_quote(1);

        let err = executor().execute(1, &quote, &signer).await.unwrap_err();
        assert!(matches!(err, WorkflowError::SigningRejected));
    }
}
