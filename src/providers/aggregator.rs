// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Swap aggregator client (0x-style quote API).
//!
//! Posts `{sellToken, buyToken, sellAmount, takerAddress, chainId}` to the
//! aggregator's `/quote` endpoint and normalizes the response into the
//! crate's [`Quote`] shape. The upstream returns either a standard
//! transaction to broadcast or an EIP-712 order for the gasless relay; both
//! are mapped onto [`ExecutionPayload`] here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::WorkflowError;
use crate::models::{destination_stablecoin, ExecutionPayload, Quote, Token, WalletAddress};
use crate::providers::QuoteService;

/// Sentinel address aggregators use for a chain's native asset.
const NATIVE_TOKEN_SENTINEL: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("aggregator request failed: {0}")]
    Request(String),

    #[error("aggregator returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("no route for the requested pair: {0}")]
    NoRoute(String),

    #[error("aggregator response was invalid: {0}")]
    InvalidResponse(String),
}

impl From<AggregatorError> for WorkflowError {
    fn from(err: AggregatorError) -> Self {
        match err {
            AggregatorError::NoRoute(msg) => WorkflowError::PermanentRoute(msg),
            AggregatorError::Request(_)
            | AggregatorError::Upstream { .. }
            | AggregatorError::InvalidResponse(_) => {
                WorkflowError::TransientService(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

/// Raw quote response. Exactly one of `transaction` or `eip712` is
/// expected; which one decides the execution mode.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "buyAmount")]
    buy_amount: String,
    price: String,
    #[serde(rename = "estimatedFee", default)]
    estimated_fee: Option<String>,
    #[serde(rename = "expiresAt", default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    transaction: Option<TransactionFields>,
    #[serde(rename = "eip712", default)]
    eip712: Option<serde_json::Value>,
    #[serde(rename = "liquidityAvailable", default = "default_true")]
    liquidity_available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TransactionFields {
    to: String,
    data: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    gas: Option<String>,
}

impl AggregatorClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self, AggregatorError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AggregatorError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url,
            api_key,
            http,
        })
    }

    fn token_param(token: &Token) -> String {
        token
            .address
            .as_ref()
            .map(|a| a.0.clone())
            .unwrap_or_else(|| NATIVE_TOKEN_SENTINEL.to_string())
    }
}

#[async_trait]
impl QuoteService for AggregatorClient {
    async fn get_quote(
        &self,
        sell: &Token,
        amount: &str,
        chain_id: u64,
        taker: &WalletAddress,
    ) -> Result<Quote, WorkflowError> {
        let buy = destination_stablecoin(chain_id).ok_or_else(|| {
            WorkflowError::PermanentRoute(format!("chain {chain_id} is not supported"))
        })?;

        let sell_amount_base = amount_to_base_units(amount, sell.decimals)
            .map_err(WorkflowError::Validation)?;

        let payload = json!({
            "sellToken": Self::token_param(sell),
            "buyToken": Self::token_param(&buy),
            "sellAmount": sell_amount_base,
            "takerAddress": taker.0,
            "chainId": chain_id,
        });

        let mut request = self
            .http
            .post(format!("{}/quote", self.base_url))
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header("0x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AggregatorError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = if is_no_route_body(&body) {
                AggregatorError::NoRoute(format!(
                    "{} cannot be swapped to {} on chain {chain_id}",
                    sell.symbol, buy.symbol
                ))
            } else {
                AggregatorError::Upstream {
                    status: status.as_u16(),
                    body: truncate(&body, 256),
                }
            };
            return Err(err.into());
        }

        let parsed: QuoteResponse = response
            .json()
            .await
            .map_err(|e| AggregatorError::InvalidResponse(e.to_string()))?;

        if !parsed.liquidity_available {
            return Err(AggregatorError::NoRoute(format!(
                "no liquidity for {} on chain {chain_id}",
                sell.symbol
            ))
            .into());
        }

        let payload = match (parsed.transaction, parsed.eip712) {
            (_, Some(typed_data)) => ExecutionPayload::Gasless { typed_data },
            (Some(tx), None) => ExecutionPayload::Direct {
                to: WalletAddress(tx.to),
                data: tx.data,
                value: tx.value.unwrap_or_else(|| "0".to_string()),
                gas: tx.gas,
            },
            (None, None) => {
                return Err(AggregatorError::InvalidResponse(
                    "quote carries neither a transaction nor an EIP-712 order".into(),
                )
                .into())
            }
        };

        let buy_amount = base_units_to_amount(&parsed.buy_amount, buy.decimals)
            .map_err(AggregatorError::InvalidResponse)
            .map_err(WorkflowError::from)?;

        debug!(
            sell = %sell.symbol,
            amount,
            chain_id,
            buy_amount = %buy_amount,
            "quote fetched"
        );

        Ok(Quote {
            sell_token: sell.clone(),
            sell_amount: amount.to_string(),
            buy_amount,
            price: parsed.price,
            fee_estimate: parsed.estimated_fee.unwrap_or_else(|| "0".to_string()),
            chain_id,
            expires_at: parsed.expires_at,
            payload,
        })
    }
}

fn is_no_route_body(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("no route")
        || lower.contains("insufficient_asset_liquidity")
        || lower.contains("unsupported")
        || lower.contains("token_not_supported")
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // `max` may land inside a multi-byte character; back off to a boundary.
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

// =============================================================================
// Unit conversion
// =============================================================================

/// Convert a human-unit decimal string into base units (e.g. `"1.5"` with
/// 18 decimals into `"1500000000000000000"`).
pub fn amount_to_base_units(amount: &str, decimals: u8) -> Result<String, String> {
    let trimmed = amount.trim();
    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(format!("invalid amount: {amount}"));
    }

    let whole = parts[0];
    let fraction = if parts.len() == 2 { parts[1] } else { "" };
    if whole.is_empty()
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(format!("invalid amount: {amount}"));
    }
    if fraction.len() > decimals as usize {
        return Err(format!(
            "amount {amount} has more than {decimals} decimal places"
        ));
    }

    let mut digits = format!(
        "{whole}{fraction}{}",
        "0".repeat(decimals as usize - fraction.len())
    );
    // Normalize leading zeros but keep at least one digit.
    let stripped = digits.trim_start_matches('0');
    digits = if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    };
    Ok(digits)
}

/// Convert a base-unit integer string back into a human-unit decimal
/// string, trimming trailing fraction zeros.
pub fn base_units_to_amount(raw: &str, decimals: u8) -> Result<String, String> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid base-unit amount: {raw}"));
    }

    let decimals = decimals as usize;
    let padded = if raw.len() <= decimals {
        format!("{}{raw}", "0".repeat(decimals - raw.len() + 1))
    } else {
        raw.to_string()
    };

    let split = padded.len() - decimals;
    let whole = padded[..split].trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = padded[split..].trim_end_matches('0');

    if fraction.is_empty() {
        Ok(whole.to_string())
    } else {
        Ok(format!("{whole}.{fraction}"))
    }
}
