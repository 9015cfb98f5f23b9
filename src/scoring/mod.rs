// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Score composition, caching and badge derivation.

pub mod badges;
pub mod composer;
pub mod service;

pub use badges::{derive_badges, Badge};
pub use composer::{compose, BaseBreakdown, ScoreCard, SecurityBreakdown};
pub use service::{OnchainScoreView, ScoreError, ScoreService};

/// Round half away from zero to 2 decimals; non-finite values become 0.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}
