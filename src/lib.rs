// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! BaseBadge - Wallet Trust Score Service
//!
//! This crate computes a trust score for a wallet on Base from behavioral
//! and risk signals, and signs EIP-712 attestations of that score which the
//! ScoreChecker contract accepts on-chain.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Wallet sign-in challenges and HS256 session tokens
//! - `signals` - Signal collectors and the concurrent aggregator
//! - `scoring` - Score composition, caching and badges
//! - `attestation` - EIP-712 typed data and the attestation signer
//! - `blockchain` - ScoreChecker contract reads over Base JSON-RPC
//! - `providers` - Explorer, portfolio and name-resolution clients

pub mod address;
pub mod api;
pub mod attestation;
pub mod auth;
pub mod blockchain;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod providers;
pub mod ratelimit;
pub mod retry;
pub mod scoring;
pub mod signals;
pub mod state;
