// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 session tokens.

use alloy::primitives::Address;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::claims::{AuthenticatedUser, SessionClaims, TOKEN_AUDIENCE, TOKEN_ISSUER};
use super::AuthError;
use crate::address::is_hex_address;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Issues and validates session tokens with a shared secret.
pub struct TokenIssuer {
    secret: Option<Vec<u8>>,
}

impl TokenIssuer {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret.map(|s| s.as_bytes().to_vec()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        self.secret
            .as_deref()
            .ok_or(AuthError::NotConfigured("JWT secret"))
    }

    pub fn issue(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        let key = EncodingKey::from_secret(self.secret()?);
        encode(&Header::new(Algorithm::HS256), claims, &key)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Validate signature, expiry, issuer, audience and subject shape.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let key = DecodingKey::from_secret(self.secret()?);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_required_spec_claims(&["sub", "iss", "exp", "iat"]);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        let claims = decode::<SessionClaims>(token, &key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                _ => AuthError::MalformedToken,
            })?
            .claims;

        if !is_hex_address(&claims.sub) {
            return Err(AuthError::InvalidSubject);
        }
        let address: Address = claims.sub.parse().map_err(|_| AuthError::InvalidSubject)?;
        Ok(AuthenticatedUser {
            address,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) const SECRET: &str = "test-secret-please-ignore";

    pub(crate) fn token_for(address: &Address) -> String {
        let claims = SessionClaims::for_address(address, Utc::now().timestamp());
        TokenIssuer::new(Some(SECRET)).issue(&claims).unwrap()
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(Some(SECRET))
    }

    #[test]
    fn roundtrip_yields_address() {
        let address = Address::repeat_byte(0x5a);
        let user = issuer().verify(&token_for(&address)).unwrap();
        assert_eq!(user.address, address);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = token_for(&Address::repeat_byte(0x5a));
        let other = TokenIssuer::new(Some("another-secret"));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn rejects_wrong_issuer_and_audience() {
        let now = Utc::now().timestamp();
        let mut claims = SessionClaims::for_address(&Address::repeat_byte(1), now);
        claims.iss = "someone-else".into();
        let token = issuer().issue(&claims).unwrap();
        assert!(matches!(issuer().verify(&token), Err(AuthError::InvalidIssuer)));

        let mut claims = SessionClaims::for_address(&Address::repeat_byte(1), now);
        claims.aud = "other-app".into();
        let token = issuer().issue(&claims).unwrap();
        assert!(matches!(issuer().verify(&token), Err(AuthError::InvalidAudience)));
    }

    #[test]
    fn rejects_expired_and_bad_subject() {
        let long_ago = Utc::now().timestamp() - 2 * 86_400;
        let claims = SessionClaims::for_address(&Address::repeat_byte(1), long_ago);
        let token = issuer().issue(&claims).unwrap();
        assert!(matches!(issuer().verify(&token), Err(AuthError::TokenExpired)));

        let mut claims =
            SessionClaims::for_address(&Address::repeat_byte(1), Utc::now().timestamp());
        claims.sub = "alice".into();
        let token = issuer().issue(&claims).unwrap();
        assert!(matches!(issuer().verify(&token), Err(AuthError::InvalidSubject)));
    }

    #[test]
    fn unconfigured_secret_is_an_error() {
        let issuer = TokenIssuer::new(None);
        assert!(!issuer.is_configured());
        assert!(matches!(
            issuer.verify("a.b.c"),
            Err(AuthError::NotConfigured("JWT secret"))
        ));
    }
}
