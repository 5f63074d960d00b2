// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! In-memory conversion session store.
//!
//! Sessions are deliberately not persisted: a session is created when a
//! wallet connects, mutated in place as the user advances, and dropped on
//! reset or cache eviction. Nothing here survives a process restart and
//! nothing should depend on it doing so.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    BankDetails, KycStatus, Quote, Settlement, SwapReceipt, Token, WalletAddress, WorkflowStep,
};

/// Aggregate root of one user's attempt to convert crypto to INR.
///
/// Owned exclusively by the workflow controller; service adapters receive
/// inputs and return outputs but never mutate a session directly.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ConversionSession {
    /// Session identifier.
    pub id: Uuid,
    /// Connected wallet address; immutable for the session's lifetime.
    pub wallet_address: WalletAddress,
    /// Wallet's currently active chain. May change mid-session; changing
    /// it invalidates any held quote.
    pub chain_id: u64,
    /// Selected source token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_token: Option<Token>,
    /// Sell amount in human units (decimal string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Held quote; valid only for the token/amount/chain it was priced on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    /// Identity verification status. Survives wallet disconnects.
    pub kyc_status: KycStatus,
    /// KYC provider handle for the in-flight OTP verification, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kyc_client_id: Option<String>,
    /// Beneficiary bank account for the INR payout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<BankDetails>,
    /// Most recent swap execution attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap: Option<SwapReceipt>,
    /// Initiated withdrawal, once settlement has been kicked off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<Settlement>,
    /// Set while a withdrawal initiation is in flight; an overlapping
    /// withdrawal request fails fast instead of reaching the backend.
    #[serde(skip)]
    pub settlement_in_flight: bool,
    /// Current workflow step. Maintained by the controller only.
    pub step: WorkflowStep,
    /// Generation counter. Bumped on reset and on any quote-invalidating
    /// change; async results carrying a stale epoch are discarded.
    pub epoch: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl ConversionSession {
    /// Create a fresh session for a newly connected wallet.
    pub fn new(wallet_address: WalletAddress, chain_id: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            wallet_address,
            chain_id,
            source_token: None,
            amount: None,
            quote: None,
            kyc_status: KycStatus::None,
            kyc_client_id: None,
            bank_details: None,
            swap: None,
            settlement: None,
            settlement_in_flight: false,
            step: WorkflowStep::Kyc,
            epoch: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Bounded LRU cache of live sessions.
///
/// Capacity pressure evicts the least recently used session, which is the
/// same outcome as the user abandoning it.
pub struct SessionStore {
    sessions: LruCache<Uuid, ConversionSession>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("max(1) is non-zero");
        Self {
            sessions: LruCache::new(capacity),
        }
    }

    pub fn insert(&mut self, session: ConversionSession) {
        self.sessions.put(session.id, session);
    }

    /// Look up a session without promoting it in the LRU order.
    pub fn peek(&self, id: &Uuid) -> Option<&ConversionSession> {
        self.sessions.peek(id)
    }

    /// Look up a session for mutation, promoting it to most recently used.
    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut ConversionSession> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<ConversionSession> {
        self.sessions.pop(id)
    }

    /// Snapshot of sessions with a swap still awaiting relay confirmation.
    /// Used by the relay poller sweep.
    pub fn pending_gasless(&self) -> Vec<(Uuid, u64, String, u32)> {
        self.sessions
            .iter()
            .filter_map(|(id, session)| {
                let receipt = session.swap.as_ref()?;
                if receipt.mode == crate::models::SwapMode::Gasless
                    && receipt.status == crate::models::SwapStatus::Submitted
                {
                    Some((
                        *id,
                        session.epoch,
                        receipt.reference.clone(),
                        receipt.poll_attempts,
                    ))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SwapMode, SwapStatus};

    fn session() -> ConversionSession {
        ConversionSession::new(
            WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12"),
            1,
        )
    }

    #[test]
    fn store_inserts_and_looks_up() {
        let mut store = SessionStore::new(8);
        let s = session();
        let id = s.id;
        store.insert(s);

        assert!(store.peek(&id).is_some());
        assert!(store.get_mut(&id).is_some());
        assert!(store.remove(&id).is_some());
        assert!(store.peek(&id).is_none());
    }

    #[test]
    fn store_evicts_least_recently_used() {
        let mut store = SessionStore::new(2);
        let a = session();
        let b = session();
        let c = session();
        let (ida, idb, idc) = (a.id, b.id, c.id);

        store.insert(a);
        store.insert(b);
        // Touch `a` so `b` is the eviction candidate.
        store.get_mut(&ida);
        store.insert(c);

        assert!(store.peek(&ida).is_some());
        assert!(store.peek(&idb).is_none());
        assert!(store.peek(&idc).is_some());
    }

    #[test]
    fn pending_gasless_filters_by_mode_and_status() {
        let mut store = SessionStore::new(8);

        let mut gasless = session();
        gasless.swap = Some(SwapReceipt {
            mode: SwapMode::Gasless,
            reference: "0xtrade".into(),
            status: SwapStatus::Submitted,
            chain_id: 1,
            buy_amount: "2500.00".into(),
            poll_attempts: 3,
        });
        let gasless_id = gasless.id;

        let mut direct = session();
        direct.swap = Some(SwapReceipt {
            mode: SwapMode::Direct,
            reference: "0xabc".into(),
            status: SwapStatus::Submitted,
            chain_id: 1,
            buy_amount: "100".into(),
            poll_attempts: 0,
        });

        let mut confirmed = session();
        confirmed.swap = Some(SwapReceipt {
            mode: SwapMode::Gasless,
            reference: "0xdone".into(),
            status: SwapStatus::Confirmed,
            chain_id: 1,
            buy_amount: "50".into(),
            poll_attempts: 10,
        });

        store.insert(gasless);
        store.insert(direct);
        store.insert(confirmed);

        let pending = store.pending_gasless();
        assert_eq!(pending.len(), 1);
        let (id, _epoch, reference, attempts) = &pending[0];
        assert_eq!(*id, gasless_id);
        assert_eq!(reference, "0xtrade");
        assert_eq!(*attempts, 3);
    }
}
