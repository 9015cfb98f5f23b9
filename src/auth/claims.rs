// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the authenticated wallet.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const TOKEN_ISSUER: &str = "basebadge-auth";
pub const TOKEN_AUDIENCE: &str = "basebadge-app";
pub const TOKEN_TTL_SECS: i64 = 86_400;

/// Claims carried by a BaseBadge session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Checksummed wallet address
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Claims for a freshly verified wallet, valid for [`TOKEN_TTL_SECS`].
    pub fn for_address(address: &Address, now_secs: i64) -> Self {
        Self {
            sub: address.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat: now_secs,
            exp: now_secs + TOKEN_TTL_SECS,
        }
    }
}

/// Wallet proven by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    #[schema(value_type = String)]
    pub address: Address,
    /// Token expiry (Unix seconds)
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Whether this wallet may act on `address`.
    pub fn owns(&self, address: &Address) -> bool {
        self.address == *address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_expire_after_a_day() {
        let address = Address::repeat_byte(0xab);
        let claims = SessionClaims::for_address(&address, 1_700_000_000);
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert_eq!(claims.iss, "basebadge-auth");
        assert_eq!(claims.aud, "basebadge-app");
        assert_eq!(claims.sub, address.to_string());
    }

    #[test]
    fn ownership_is_address_equality() {
        let user = AuthenticatedUser {
            address: Address::repeat_byte(0xab),
            expires_at: 0,
        };
        assert!(user.owns(&Address::repeat_byte(0xab)));
        assert!(!user.owns(&Address::repeat_byte(0xac)));
    }
}
