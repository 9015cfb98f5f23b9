// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Base chain integration.
//!
//! This module provides functionality for:
//! - Reading replay nonces and the authorized signer from ScoreChecker
//! - Reading back previously attested scores and score cards
//! - Reading the latest block timestamp for attestation `issuedAt`

pub mod client;
pub mod types;

pub use client::ScoreCheckerClient;
pub use types::*;
