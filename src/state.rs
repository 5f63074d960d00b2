// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::kyc::KycGate;
use crate::providers::QuoteService;
use crate::session::SessionStore;
use crate::settlement::SettlementInitiator;
use crate::swap::SwapExecutor;
use crate::wallet::WalletSigner;

/// Shared application state: the session store plus the injected service
/// adapters the workflow is parameterized by.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<SessionStore>>,
    pub quotes: Arc<dyn QuoteService>,
    pub executor: SwapExecutor,
    pub kyc: KycGate,
    pub settlement: SettlementInitiator,
    pub signer: Arc<dyn WalletSigner>,
}

impl AppState {
    pub fn new(
        sessions: SessionStore,
        quotes: Arc<dyn QuoteService>,
        executor: SwapExecutor,
        kyc: KycGate,
        settlement: SettlementInitiator,
        signer: Arc<dyn WalletSigner>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(sessions)),
            quotes,
            executor,
            kyc,
            settlement,
            signer,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State wired entirely to mock adapters, for handler tests.
    pub(crate) fn for_tests() -> Self {
        use crate::testutil::{
            direct_quote, MockKycProvider, MockQuoteService, MockRelay, MockSettlementBackend,
            MockSigner,
        };

        let relay = Arc::new(MockRelay::default());
        Self::new(
            SessionStore::new(64),
            Arc::new(MockQuoteService::returning(direct_quote(1))),
            SwapExecutor::new(relay),
            KycGate::new(Arc::new(MockKycProvider::default()), 0.8),
            SettlementInitiator::new(Arc::new(MockSettlementBackend::default())),
            Arc::new(MockSigner::default()),
        )
    }
}
