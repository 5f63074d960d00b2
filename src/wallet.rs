// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! Wallet signer capability.
//!
//! The workflow treats the wallet as an opaque signing capability: it can
//! report its address, sign-and-broadcast a standard transaction, and sign
//! an EIP-712 payload. Any wallet meeting this shape is acceptable; the
//! bundled [`LocalSigner`] wraps a raw private key plus an RPC endpoint
//! for development and integration use.

use std::str::FromStr;

use alloy::{
    dyn_abi::TypedData,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::{local::PrivateKeySigner, Signer},
};
use async_trait::async_trait;

use crate::error::WorkflowError;
use crate::models::WalletAddress;

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("invalid transaction field: {0}")]
    InvalidField(String),

    #[error("typed-data payload was invalid: {0}")]
    InvalidTypedData(String),
}

impl From<WalletError> for WorkflowError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Rpc(_) => WorkflowError::TransientService(err.to_string()),
            WalletError::Reverted(_) => WorkflowError::Unknown(err.to_string()),
            WalletError::InvalidKey(_)
            | WalletError::InvalidRpcUrl(_)
            | WalletError::InvalidField(_)
            | WalletError::InvalidTypedData(_) => WorkflowError::Validation(err.to_string()),
        }
    }
}

/// Opaque signing capability exposed by a connected wallet.
///
/// `send_transaction` waits for inclusion: the hash it returns references
/// a mined, successful transaction. Interactive wallets map a declined
/// prompt to [`WorkflowError::SigningRejected`].
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// The wallet's account address.
    fn address(&self) -> WalletAddress;

    /// Sign and broadcast a standard transaction; resolve once mined.
    async fn send_transaction(
        &self,
        to: &WalletAddress,
        data: &str,
        value: &str,
    ) -> Result<String, WorkflowError>;

    /// Sign an EIP-712 typed-data payload, returning the 65-byte
    /// signature as 0x-prefixed hex.
    async fn sign_typed_data(
        &self,
        typed_data: &serde_json::Value,
    ) -> Result<String, WorkflowError>;
}

/// Private-key signer with an RPC provider for broadcasting.
pub struct LocalSigner {
    signer: PrivateKeySigner,
    provider: DynProvider,
}

impl LocalSigner {
    /// Build a signer from a hex private key and an RPC endpoint. No
    /// network I/O happens until a transaction is sent.
    pub fn connect(rpc_url: &str, private_key_hex: &str) -> Result<Self, WalletError> {
        let signer = PrivateKeySigner::from_str(private_key_hex.trim_start_matches("0x"))
            .map_err(|e| WalletError::InvalidKey(e.to_string()))?;

        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| WalletError::InvalidRpcUrl(e.to_string()))?;

        let wallet = EthereumWallet::from(signer.clone());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(url)
            .erased();

        Ok(Self { signer, provider })
    }
}

#[async_trait]
impl WalletSigner for LocalSigner {
    fn address(&self) -> WalletAddress {
        WalletAddress(format!("{:#x}", self.signer.address()))
    }

    async fn send_transaction(
        &self,
        to: &WalletAddress,
        data: &str,
        value: &str,
    ) -> Result<String, WorkflowError> {
        let to_addr = Address::from_str(&to.0)
            .map_err(|e| WalletError::InvalidField(format!("to address: {e}")))?;
        let calldata = decode_calldata(data)?;
        let value = U256::from_str(value)
            .map_err(|e| WalletError::InvalidField(format!("value: {e}")))?;

        let tx = TransactionRequest::default()
            .with_to(to_addr)
            .with_input(calldata)
            .with_value(value);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| WalletError::Rpc(e.to_string()))?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| WalletError::Rpc(e.to_string()))?;

        if !receipt.status() {
            return Err(
                WalletError::Reverted(format!("{:#x}", receipt.transaction_hash)).into(),
            );
        }

        Ok(format!("{:#x}", receipt.transaction_hash))
    }

    async fn sign_typed_data(
        &self,
        typed_data: &serde_json::Value,
    ) -> Result<String, WorkflowError> {
        let typed: TypedData = serde_json::from_value(typed_data.clone())
            .map_err(|e| WalletError::InvalidTypedData(e.to_string()))?;

        let hash = typed
            .eip712_signing_hash()
            .map_err(|e| WalletError::InvalidTypedData(e.to_string()))?;

        let signature = self
            .signer
            .sign_hash(&hash)
            .await
            .map_err(|e| WorkflowError::Unknown(format!("signing failed: {e}")))?;

        Ok(format!("0x{}", alloy::hex::encode(signature.as_bytes())))
    }
}

fn decode_calldata(data: &str) -> Result<Bytes, WalletError> {
    let stripped = data.trim_start_matches("0x");
    let bytes = alloy::hex::decode(stripped)
        .map_err(|e| WalletError::InvalidField(format!("calldata: {e}")))?;
    Ok(Bytes::from(bytes))
}
