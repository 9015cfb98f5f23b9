// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet address parsing.
//!
//! Addresses are accepted in any letter case and always rendered in EIP-55
//! checksummed form. Comparisons go through [`Address`] equality, which is
//! byte-wise and therefore case-insensitive with respect to the input text.

use std::str::FromStr;

use alloy::primitives::Address;

/// Malformed input rejected before any side effect happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("{field} must be between 0 and {max}")]
    OutOfRange { field: &'static str, max: u64 },

    #[error("{0} must be a finite, non-negative number")]
    NotANumber(&'static str),

    #[error("{0} must be a non-negative integer")]
    Negative(&'static str),
}

/// Parse a `0x`-prefixed, 40 hex digit address.
pub fn parse_address(raw: &str) -> Result<Address, ValidationError> {
    let trimmed = raw.trim();
    if !is_hex_address(trimmed) {
        return Err(ValidationError::InvalidAddress(raw.to_string()));
    }
    Address::from_str(trimmed).map_err(|_| ValidationError::InvalidAddress(raw.to_string()))
}

/// Structural check used for token subjects: `0x` followed by exactly 40 hex digits.
pub fn is_hex_address(raw: &str) -> bool {
    raw.len() == 42
        && raw.starts_with("0x")
        && raw[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Lowercase key used by in-memory maps and caches.
pub fn address_key(address: &Address) -> String {
    format!("{address:#x}")
}
