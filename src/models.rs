// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! # Conversion Domain Models
//!
//! Data structures shared by the workflow controller, the service
//! adapters, and the REST API. All API-visible types derive `Serialize`,
//! `Deserialize`, and `ToSchema` for automatic JSON handling and OpenAPI
//! documentation.
//!
//! ## Normalization boundary
//!
//! Provider-specific response shapes (aggregator, gasless relay, KYC,
//! settlement) are converted into these types inside the `providers`
//! adapters. The workflow controller only ever sees the types defined
//! here.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address wrapper.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Basic shape check; full checksum validation is left to the signer.
    pub fn is_plausible(&self) -> bool {
        let s = self.0.as_str();
        s.len() == 42
            && s.starts_with("0x")
            && s[2..].chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(value.to_string())
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// A fungible token on a specific chain.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Token {
    /// Token symbol (e.g., "ETH", "USDC").
    pub symbol: String,
    /// Contract address; `None` for the chain's native asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<WalletAddress>,
    /// Number of decimals.
    pub decimals: u8,
    /// Chain this token lives on.
    pub chain_id: u64,
}

/// Destination stablecoin metadata per supported chain.
#[derive(Debug, Clone)]
pub struct StablecoinConfig {
    pub symbol: &'static str,
    pub decimals: u8,
    pub chain_id: u64,
    pub address: &'static str,
}

/// USDC deployments the off-ramp settles through.
pub const SUPPORTED_STABLECOINS: [StablecoinConfig; 2] = [
    StablecoinConfig {
        symbol: "USDC",
        decimals: 6,
        chain_id: 1,
        address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
    },
    StablecoinConfig {
        symbol: "USDC",
        decimals: 6,
        chain_id: 137,
        address: "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359",
    },
];

/// Destination stablecoin for a chain, if the chain is supported.
pub fn destination_stablecoin(chain_id: u64) -> Option<Token> {
    SUPPORTED_STABLECOINS
        .iter()
        .find(|s| s.chain_id == chain_id)
        .map(|s| Token {
            symbol: s.symbol.to_string(),
            address: Some(WalletAddress::from(s.address)),
            decimals: s.decimals,
            chain_id: s.chain_id,
        })
}

// =============================================================================
// Quotes
// =============================================================================

/// How a quoted swap is to be executed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionPayload {
    /// Standard transaction the wallet signs and broadcasts itself.
    Direct {
        /// Target contract for the swap call.
        to: WalletAddress,
        /// ABI-encoded calldata (0x-prefixed hex).
        data: String,
        /// Native value to attach, in wei (decimal string).
        value: String,
        /// Gas estimate from the aggregator, if provided.
        #[serde(skip_serializing_if = "Option::is_none")]
        gas: Option<String>,
    },
    /// EIP-712 order the wallet signs and a relayer broadcasts.
    Gasless {
        /// Typed-data payload to sign, exactly as the aggregator returned it.
        typed_data: serde_json::Value,
    },
}

/// A priced offer to convert `sell_amount` of `sell_token` into the
/// destination stablecoin.
///
/// A quote is only valid for the `(sell_token, sell_amount, chain_id)`
/// triple it was generated from. The workflow controller discards it the
/// moment any of those change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Quote {
    /// Token being sold.
    pub sell_token: Token,
    /// Amount sold, human units (decimal string).
    pub sell_amount: String,
    /// Stablecoin amount received, human units.
    pub buy_amount: String,
    /// Unit price (stablecoin per sell token).
    pub price: String,
    /// Estimated fee in stablecoin units.
    pub fee_estimate: String,
    /// Chain the quote was priced on.
    pub chain_id: u64,
    /// Expiry, if the aggregator bounded the quote's lifetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Execution instructions.
    pub payload: ExecutionPayload,
}

impl Quote {
    /// Whether the quote has passed its expiry.
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }
}

// =============================================================================
// Swap Receipts
// =============================================================================

/// Execution mode of a submitted swap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwapMode {
    Direct,
    Gasless,
}

/// Confirmation status of a submitted swap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    /// Accepted by the chain or relay, not yet confirmed.
    Submitted,
    /// Confirmed on-chain (or relay reported settlement).
    Confirmed,
    /// Reverted on-chain or relay reported failure.
    Failed,
    /// Relay polling hit its attempt cap without a terminal answer.
    Unknown,
}

impl SwapStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapStatus::Submitted)
    }
}

/// Record of a swap execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SwapReceipt {
    /// How the swap was executed.
    pub mode: SwapMode,
    /// Transaction hash (direct) or relay trade hash (gasless).
    pub reference: String,
    /// Current confirmation status.
    pub status: SwapStatus,
    /// Chain the swap ran on.
    pub chain_id: u64,
    /// Stablecoin amount obtained, human units (from the executed quote).
    pub buy_amount: String,
    /// Relay status polls consumed so far (gasless only).
    #[serde(default)]
    pub poll_attempts: u32,
}

// =============================================================================
// KYC
// =============================================================================

/// Identity verification status. Tied to the user's identity, not the
/// wallet session; a disconnect does not reset it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    None,
    Pending,
    Verified,
    Rejected,
}

impl KycStatus {
    /// Only a verified identity unlocks the convert step.
    pub fn unlocks_convert(&self) -> bool {
        matches!(self, KycStatus::Verified)
    }
}

// =============================================================================
// Bank Details
// =============================================================================

/// Beneficiary bank account for the INR payout.
///
/// Validated for completeness client-side before settlement initiation;
/// not checked against a bank registry here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BankDetails {
    /// Account holder's name as registered with the bank.
    pub account_holder_name: String,
    /// Bank account number.
    pub account_number: String,
    /// IFSC routing code.
    pub ifsc_code: String,
    /// Bank name.
    pub bank_name: String,
}

impl BankDetails {
    /// All fields present and non-blank.
    pub fn is_complete(&self) -> bool {
        !self.account_holder_name.trim().is_empty()
            && !self.account_number.trim().is_empty()
            && !self.ifsc_code.trim().is_empty()
            && !self.bank_name.trim().is_empty()
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// Fiat payout status as reported by the settlement backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// An initiated INR withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Settlement {
    /// Opaque withdrawal identifier for confirmation and support lookups.
    pub withdrawal_id: String,
    /// Current payout status.
    pub status: SettlementStatus,
    /// The confirmed swap this settlement pays out.
    pub swap_reference: String,
}

// =============================================================================
// Workflow Steps
// =============================================================================

/// Top-level workflow position of a conversion session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Waiting for a wallet connection.
    Connect,
    /// Identity verification gate.
    Kyc,
    /// Token selection, quoting, and swap execution.
    Convert,
    /// Settlement initiated; withdrawal id available.
    Complete,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn wallet_address_plausibility() {
        let good = WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12");
        assert!(good.is_plausible());

        assert!(!WalletAddress::from("").is_plausible());
        assert!(!WalletAddress::from("0x1234").is_plausible());
        assert!(!WalletAddress::from("742d35Cc6634C0532925a3b844Bc9e7595f4aB1200").is_plausible());
    }

    #[test]
    fn destination_stablecoin_known_chains_only() {
        assert!(destination_stablecoin(1).is_some());
        assert!(destination_stablecoin(137).is_some());
        assert!(destination_stablecoin(43114).is_none());
    }

    #[test]
    fn bank_details_completeness_rejects_blank_fields() {
        let complete = BankDetails {
            account_holder_name: "Asha Rao".into(),
            account_number: "000123456789".into(),
            ifsc_code: "HDFC0001234".into(),
            bank_name: "HDFC Bank".into(),
        };
        assert!(complete.is_complete());

        let blank_ifsc = BankDetails {
            ifsc_code: "   ".into(),
            ..complete.clone()
        };
        assert!(!blank_ifsc.is_complete());

        let empty_name = BankDetails {
            account_holder_name: String::new(),
            ..complete
        };
        assert!(!empty_name.is_complete());
    }

    #[test]
    fn quote_expiry() {
        let now = Utc::now();
        let quote = Quote {
            sell_token: destination_stablecoin(1).unwrap(),
            sell_amount: "1".into(),
            buy_amount: "1".into(),
            price: "1".into(),
            fee_estimate: "0".into(),
            chain_id: 1,
            expires_at: Some(now - Duration::seconds(1)),
            payload: ExecutionPayload::Gasless {
                typed_data: serde_json::json!({}),
            },
        };
        assert!(quote.is_expired(now));

        let open_ended = Quote {
            expires_at: None,
            ..quote
        };
        assert!(!open_ended.is_expired(now));
    }

    #[test]
    fn kyc_only_verified_unlocks_convert() {
        assert!(KycStatus::Verified.unlocks_convert());
        assert!(!KycStatus::None.unlocks_convert());
        assert!(!KycStatus::Pending.unlocks_convert());
        assert!(!KycStatus::Rejected.unlocks_convert());
    }
}
