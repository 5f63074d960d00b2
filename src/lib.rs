// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Rupee Ramp

//! # Rupee Ramp Server
//!
//! Crypto-to-INR off-ramp conversion service. Drives a wallet session
//! through `connect → kyc → convert → complete`: identity verification,
//! quote acquisition, swap execution into USDC (direct or gasless), and
//! INR settlement initiation against the custody backend.
//!
//! ## Architecture
//!
//! - `workflow` owns every state transition and invalidation rule; it is
//!   pure and synchronous.
//! - `providers` hold the typed HTTP clients for the swap aggregator,
//!   gasless relay, KYC provider, and settlement backend, each behind a
//!   trait so the workflow is testable without a network.
//! - `swap`, `kyc`, and `settlement` orchestrate provider calls for one
//!   operation each.
//! - `poller` resolves submitted gasless trades in the background.
//! - `api` exposes the whole thing over REST with OpenAPI docs at `/docs`.

pub mod api;
pub mod config;
pub mod error;
pub mod kyc;
pub mod models;
pub mod poller;
pub mod providers;
pub mod session;
pub mod settlement;
pub mod state;
pub mod swap;
pub mod wallet;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testutil;
