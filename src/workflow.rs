// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! # Conversion Workflow Controller
//!
//! The state machine that sequences a session through
//! `connect → kyc → convert → complete`. Every transition and every
//! quote-invalidation rule lives here; API handlers and service adapters
//! never mutate a session's step, quote, or epoch themselves.
//!
//! ## Invariants
//!
//! - A quote is valid only for the `(source_token, amount, chain_id)`
//!   triple it was priced on. Any change to those nulls it before a swap
//!   can be attempted.
//! - A quote is consumed exactly once: it is taken off the session the
//!   moment execution begins, so an overlapping or repeated submission
//!   finds no quote rather than being defended against downstream. Only
//!   a retryable failure puts it back.
//! - `convert` is reachable if and only if KYC is verified.
//! - Every mutation that invalidates in-flight work bumps the session
//!   epoch; async results carrying a stale epoch are discarded.

use tracing::debug;

use crate::error::WorkflowError;
use crate::models::{
    destination_stablecoin, BankDetails, KycStatus, Quote, Settlement, SwapReceipt, Token,
    WorkflowStep,
};
use crate::session::ConversionSession;

/// Maximum fractional digits accepted in a human-unit amount.
const MAX_AMOUNT_DECIMALS: usize = 18;

// =============================================================================
// Step transitions
// =============================================================================

/// Entry step after a wallet connects. Returning users with a verified
/// identity skip the KYC step entirely.
pub fn step_after_connect(kyc_status: KycStatus) -> WorkflowStep {
    if kyc_status.unlocks_convert() {
        WorkflowStep::Convert
    } else {
        WorkflowStep::Kyc
    }
}

/// Re-enter the workflow after a disconnect, on the same session.
///
/// The wallet address is fixed for the session's lifetime; a different
/// wallet means a different session.
pub fn reconnect(session: &mut ConversionSession, chain_id: u64) -> Result<(), WorkflowError> {
    if session.step != WorkflowStep::Connect {
        return Err(WorkflowError::Validation(
            "session is already connected".into(),
        ));
    }
    session.chain_id = chain_id;
    session.step = step_after_connect(session.kyc_status);
    session.touch();
    Ok(())
}

/// Wallet disconnected: force a restart.
///
/// Clears the quote, swap, and settlement; KYC status and previously
/// entered bank details are identity-scoped and survive.
pub fn disconnect(session: &mut ConversionSession) {
    session.step = WorkflowStep::Connect;
    session.quote = None;
    session.swap = None;
    session.settlement = None;
    session.epoch += 1;
    session.touch();
}

/// Back navigation from `convert` to `kyc`. Permitted only while the
/// identity is not yet verified; once verified there is nothing to go
/// back to.
pub fn back_to_kyc(session: &mut ConversionSession) -> Result<(), WorkflowError> {
    if session.step != WorkflowStep::Convert {
        return Err(WorkflowError::Validation(
            "back navigation is only available from the convert step".into(),
        ));
    }
    if session.kyc_status.unlocks_convert() {
        return Err(WorkflowError::Validation(
            "identity is already verified; there is no KYC step to return to".into(),
        ));
    }
    session.step = WorkflowStep::Kyc;
    session.touch();
    Ok(())
}

fn ensure_convert(session: &ConversionSession) -> Result<(), WorkflowError> {
    if session.step != WorkflowStep::Convert {
        return Err(WorkflowError::Validation(format!(
            "operation requires the convert step (session is at {:?})",
            session.step
        )));
    }
    if !session.kyc_status.unlocks_convert() {
        // The step should never be Convert without verification.
        return Err(WorkflowError::Validation(
            "identity verification has not completed".into(),
        ));
    }
    Ok(())
}

// =============================================================================
// KYC transitions
// =============================================================================

/// KYC verification was initiated; show `pending` immediately.
///
/// Allowed from `none` and as a resubmission after `rejected`.
pub fn kyc_initiated(
    session: &mut ConversionSession,
    client_id: String,
) -> Result<(), WorkflowError> {
    if session.step != WorkflowStep::Kyc {
        return Err(WorkflowError::Validation(
            "KYC can only be initiated from the KYC step".into(),
        ));
    }
    if session.kyc_status == KycStatus::Verified {
        return Err(WorkflowError::Validation(
            "identity is already verified".into(),
        ));
    }
    session.kyc_status = KycStatus::Pending;
    session.kyc_client_id = Some(client_id);
    session.touch();
    Ok(())
}

/// A pending verification resolved. `Verified` unlocks convert; `Rejected`
/// keeps the user on the KYC step with resubmission available.
pub fn kyc_resolved(
    session: &mut ConversionSession,
    outcome: KycStatus,
) -> Result<(), WorkflowError> {
    match outcome {
        KycStatus::Verified | KycStatus::Rejected => {}
        other => {
            return Err(WorkflowError::Unknown(format!(
                "KYC resolution must be terminal, got {other:?}"
            )))
        }
    }
    if session.kyc_status != KycStatus::Pending {
        return Err(WorkflowError::Validation(
            "no pending KYC verification to resolve".into(),
        ));
    }
    session.kyc_status = outcome;
    session.kyc_client_id = None;
    if outcome == KycStatus::Verified && session.step == WorkflowStep::Kyc {
        session.step = WorkflowStep::Convert;
    }
    session.touch();
    Ok(())
}

// =============================================================================
// Convert-step inputs (quote invalidation)
// =============================================================================

/// Select the source token. Invalidates any held quote if the selection
/// changed.
pub fn select_token(session: &mut ConversionSession, token: Token) -> Result<(), WorkflowError> {
    ensure_convert(session)?;
    if token.chain_id != session.chain_id {
        return Err(WorkflowError::Validation(format!(
            "token {} belongs to chain {}, wallet is on chain {}",
            token.symbol, token.chain_id, session.chain_id
        )));
    }
    if session.source_token.as_ref() != Some(&token) {
        invalidate_quote(session, "source token changed");
        session.source_token = Some(token);
    }
    session.touch();
    Ok(())
}

/// Set the sell amount. Invalidates any held quote if the amount changed.
pub fn set_amount(session: &mut ConversionSession, amount: String) -> Result<(), WorkflowError> {
    ensure_convert(session)?;
    validate_positive_amount(&amount)?;
    if session.amount.as_deref() != Some(amount.as_str()) {
        invalidate_quote(session, "amount changed");
        session.amount = Some(amount);
    }
    session.touch();
    Ok(())
}

/// The wallet switched networks. Always invalidates the quote, and drops
/// the selected token if it no longer matches the active chain.
pub fn change_chain(session: &mut ConversionSession, chain_id: u64) {
    if session.chain_id == chain_id {
        return;
    }
    session.chain_id = chain_id;
    invalidate_quote(session, "wallet switched networks");
    if session
        .source_token
        .as_ref()
        .is_some_and(|t| t.chain_id != chain_id)
    {
        session.source_token = None;
    }
    session.touch();
}

fn invalidate_quote(session: &mut ConversionSession, reason: &str) {
    if session.quote.take().is_some() {
        debug!(session_id = %session.id, reason, "quote invalidated");
    }
    session.epoch += 1;
}

// =============================================================================
// Quoting
// =============================================================================

/// Inputs a quote request needs, snapshotted so the session lock is not
/// held across the upstream call.
#[derive(Debug, Clone)]
pub struct QuoteInputs {
    pub sell_token: Token,
    pub amount: String,
    pub chain_id: u64,
    pub taker: crate::models::WalletAddress,
    pub epoch: u64,
}

/// Validate the session is ready to be quoted and snapshot the inputs.
pub fn quote_inputs(session: &ConversionSession) -> Result<QuoteInputs, WorkflowError> {
    ensure_convert(session)?;
    let sell_token = session
        .source_token
        .clone()
        .ok_or_else(|| WorkflowError::Validation("select a source token first".into()))?;
    let amount = session
        .amount
        .clone()
        .ok_or_else(|| WorkflowError::Validation("enter an amount first".into()))?;

    let destination = destination_stablecoin(session.chain_id).ok_or_else(|| {
        WorkflowError::PermanentRoute(format!(
            "chain {} has no supported destination stablecoin",
            session.chain_id
        ))
    })?;
    if sell_token.symbol == destination.symbol && sell_token.address == destination.address {
        return Err(WorkflowError::Validation(
            "source token is already the destination stablecoin".into(),
        ));
    }

    Ok(QuoteInputs {
        sell_token,
        amount,
        chain_id: session.chain_id,
        taker: session.wallet_address.clone(),
        epoch: session.epoch,
    })
}

/// Store a freshly fetched quote, unless the session moved on while the
/// request was in flight.
///
/// Returns `false` when the result was stale and discarded.
pub fn store_quote(session: &mut ConversionSession, observed_epoch: u64, quote: Quote) -> bool {
    if session.epoch != observed_epoch {
        debug!(
            session_id = %session.id,
            observed_epoch,
            current_epoch = session.epoch,
            "stale quote response discarded"
        );
        return false;
    }
    session.quote = Some(quote);
    session.touch();
    true
}

// =============================================================================
// Swap execution bookkeeping
// =============================================================================

/// Consume the held quote for execution.
///
/// Taking the quote is itself a quote-invalidating change, so the epoch
/// is bumped: an overlapping execute finds no quote and fails before it
/// can reach the signer. After a retryable failure the handler puts the
/// quote back via [`restore_quote`].
pub fn take_quote_for_execution(
    session: &mut ConversionSession,
) -> Result<(Quote, u64), WorkflowError> {
    ensure_convert(session)?;
    if session.swap.is_some() {
        return Err(WorkflowError::Validation(
            "a swap has already been executed for this session".into(),
        ));
    }
    let quote = session
        .quote
        .take()
        .ok_or_else(|| WorkflowError::Validation("no quote held; fetch a quote first".into()))?;
    session.epoch += 1;
    session.touch();
    Ok((quote, session.epoch))
}

/// Put a quote back after a retryable execution failure, unless the
/// session moved on while the attempt was in flight.
pub fn restore_quote(session: &mut ConversionSession, observed_epoch: u64, quote: Quote) -> bool {
    if session.epoch != observed_epoch {
        debug!(
            session_id = %session.id,
            observed_epoch,
            current_epoch = session.epoch,
            "stale quote restore discarded"
        );
        return false;
    }
    session.quote = Some(quote);
    session.touch();
    true
}

/// Record a successful execution. The quote was already consumed by
/// [`take_quote_for_execution`]; recording bumps the epoch again so any
/// result still in flight against the pre-swap session is discarded.
pub fn record_swap(
    session: &mut ConversionSession,
    observed_epoch: u64,
    receipt: SwapReceipt,
) -> bool {
    if session.epoch != observed_epoch {
        debug!(
            session_id = %session.id,
            observed_epoch,
            current_epoch = session.epoch,
            "stale swap result discarded"
        );
        return false;
    }
    session.swap = Some(receipt);
    session.epoch += 1;
    session.touch();
    true
}

// =============================================================================
// Bank details & settlement
// =============================================================================

/// Capture beneficiary bank details. Allowed any time after KYC; required
/// before settlement initiation.
pub fn set_bank_details(
    session: &mut ConversionSession,
    details: BankDetails,
) -> Result<(), WorkflowError> {
    if !details.is_complete() {
        return Err(WorkflowError::Validation(
            "all bank detail fields are required".into(),
        ));
    }
    session.bank_details = Some(details);
    session.touch();
    Ok(())
}

/// Reserve the session for withdrawal initiation.
///
/// The reservation makes an overlapping withdrawal fail fast instead of
/// reaching the custody backend twice. Released by [`record_settlement`]
/// or, after a failed attempt, by [`abort_settlement`].
pub fn begin_settlement(session: &mut ConversionSession) -> Result<u64, WorkflowError> {
    if session.settlement.is_some() || session.settlement_in_flight {
        return Err(WorkflowError::Validation(
            "a withdrawal has already been initiated for this session".into(),
        ));
    }
    if !session.kyc_status.unlocks_convert() {
        return Err(WorkflowError::Validation(
            "identity verification has not completed".into(),
        ));
    }
    session.settlement_in_flight = true;
    session.touch();
    Ok(session.epoch)
}

/// Release the withdrawal reservation after a failed initiation attempt.
pub fn abort_settlement(session: &mut ConversionSession) {
    session.settlement_in_flight = false;
    session.touch();
}

/// Settlement initiation succeeded: the workflow is complete.
pub fn record_settlement(
    session: &mut ConversionSession,
    observed_epoch: u64,
    settlement: Settlement,
) -> bool {
    session.settlement_in_flight = false;
    if session.epoch != observed_epoch {
        debug!(
            session_id = %session.id,
            observed_epoch,
            current_epoch = session.epoch,
            "stale settlement result discarded"
        );
        return false;
    }
    session.settlement = Some(settlement);
    session.step = WorkflowStep::Complete;
    session.epoch += 1;
    session.touch();
    true
}

// =============================================================================
// Amount validation
// =============================================================================

/// Validate a human-unit decimal amount string: digits with an optional
/// single fraction part, strictly greater than zero.
pub fn validate_positive_amount(amount: &str) -> Result<(), WorkflowError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::Validation(
            "amount must be a positive number".into(),
        ));
    }

    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.len() > 2 {
        return Err(WorkflowError::Validation(
            "amount must be a positive number".into(),
        ));
    }

    let whole = parts[0];
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(WorkflowError::Validation(
            "amount must be a positive number".into(),
        ));
    }

    let fraction = if parts.len() == 2 { parts[1] } else { "" };
    if !fraction.chars().all(|c| c.is_ascii_digit()) || fraction.len() > MAX_AMOUNT_DECIMALS {
        return Err(WorkflowError::Validation(
            "amount must be a positive number".into(),
        ));
    }

    let all_zero = whole.chars().all(|c| c == '0')
        && (fraction.is_empty() || fraction.chars().all(|c| c == '0'));
    if all_zero {
        return Err(WorkflowError::Validation(
            "amount must be greater than zero".into(),
        ));
    }

    Ok(())
}
