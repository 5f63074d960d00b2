// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `AGGREGATOR_BASE_URL` | Swap aggregator API base URL | `https://api.0x.org` |
//! | `AGGREGATOR_API_KEY` | Aggregator API key header value | unset |
//! | `GASLESS_RELAY_BASE_URL` | Gasless relay API base URL | `https://api.0x.org` |
//! | `KYC_BASE_URL` | KYC provider API base URL | `https://kyc-api.surepass.io` |
//! | `SETTLEMENT_BASE_URL` | Settlement backend base URL | Required |
//! | `RELAY_POLL_INTERVAL_SECS` | Gasless status poll interval | `5` |
//! | `RELAY_MAX_POLL_ATTEMPTS` | Poll attempts before "status unknown" | `60` |
//! | `SESSION_CACHE_CAPACITY` | Max live conversion sessions | `1024` |
//! | `PAN_NAME_MATCH_THRESHOLD` | Minimum PAN name match (0..=1) | `0.8` |
//! | `RPC_URL` | EVM RPC endpoint for the dev signer | `http://localhost:8545` |
//! | `DEV_SIGNER_KEY` | Hex private key for the dev signer | Required |

use std::env;
use std::time::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const AGGREGATOR_BASE_URL_ENV: &str = "AGGREGATOR_BASE_URL";
pub const AGGREGATOR_API_KEY_ENV: &str = "AGGREGATOR_API_KEY";
pub const GASLESS_RELAY_BASE_URL_ENV: &str = "GASLESS_RELAY_BASE_URL";
pub const KYC_BASE_URL_ENV: &str = "KYC_BASE_URL";
pub const SETTLEMENT_BASE_URL_ENV: &str = "SETTLEMENT_BASE_URL";
pub const RELAY_POLL_INTERVAL_ENV: &str = "RELAY_POLL_INTERVAL_SECS";
pub const RELAY_MAX_POLL_ATTEMPTS_ENV: &str = "RELAY_MAX_POLL_ATTEMPTS";
pub const SESSION_CACHE_CAPACITY_ENV: &str = "SESSION_CACHE_CAPACITY";
pub const PAN_NAME_MATCH_THRESHOLD_ENV: &str = "PAN_NAME_MATCH_THRESHOLD";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const DEV_SIGNER_KEY_ENV: &str = "DEV_SIGNER_KEY";

const DEFAULT_AGGREGATOR_BASE_URL: &str = "https://api.0x.org";
const DEFAULT_KYC_BASE_URL: &str = "https://kyc-api.surepass.io";
const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Gasless relay poll cadence when not overridden.
pub const DEFAULT_RELAY_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Poll attempts before the trade status is reported unknown (~5 minutes
/// at the default interval).
pub const DEFAULT_RELAY_MAX_POLL_ATTEMPTS: u32 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub aggregator_base_url: String,
    pub aggregator_api_key: Option<String>,
    pub gasless_relay_base_url: String,
    pub kyc_base_url: String,
    pub settlement_base_url: String,
    pub relay_poll_interval: Duration,
    pub relay_max_poll_attempts: u32,
    pub session_cache_capacity: usize,
    pub pan_name_match_threshold: f64,
    pub rpc_url: String,
    pub dev_signer_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default(HOST_ENV, "0.0.0.0");
        let port = parse_env(PORT_ENV, 8080u16)?;

        let aggregator_base_url =
            env_or_default(AGGREGATOR_BASE_URL_ENV, DEFAULT_AGGREGATOR_BASE_URL);
        let aggregator_api_key = env::var(AGGREGATOR_API_KEY_ENV).ok().filter(|v| !v.is_empty());
        let gasless_relay_base_url = env::var(GASLESS_RELAY_BASE_URL_ENV)
            .unwrap_or_else(|_| aggregator_base_url.clone());
        let kyc_base_url = env_or_default(KYC_BASE_URL_ENV, DEFAULT_KYC_BASE_URL);
        let settlement_base_url = env_required(SETTLEMENT_BASE_URL_ENV)?;

        let relay_poll_interval = Duration::from_secs(parse_env(
            RELAY_POLL_INTERVAL_ENV,
            DEFAULT_RELAY_POLL_INTERVAL.as_secs(),
        )?);
        let relay_max_poll_attempts =
            parse_env(RELAY_MAX_POLL_ATTEMPTS_ENV, DEFAULT_RELAY_MAX_POLL_ATTEMPTS)?;
        let session_cache_capacity = parse_env(SESSION_CACHE_CAPACITY_ENV, 1024usize)?;
        let pan_name_match_threshold = parse_env(PAN_NAME_MATCH_THRESHOLD_ENV, 0.8f64)?;
        if !(0.0..=1.0).contains(&pan_name_match_threshold) {
            return Err(ConfigError::Invalid {
                var: PAN_NAME_MATCH_THRESHOLD_ENV,
                reason: "must be between 0 and 1".into(),
            });
        }

        let rpc_url = env_or_default(RPC_URL_ENV, DEFAULT_RPC_URL);
        let dev_signer_key = env_required(DEV_SIGNER_KEY_ENV)?;

        Ok(Self {
            host,
            port,
            aggregator_base_url,
            aggregator_api_key,
            gasless_relay_base_url,
            kyc_base_url,
            settlement_base_url,
            relay_poll_interval,
            relay_max_poll_attempts,
            session_cache_capacity,
            pan_name_match_threshold,
            rpc_url,
            dev_signer_key,
        })
    }
}

fn env_or_default(var: &'static str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn env_required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parse_env<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
