// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Wallet sign-in and session tokens for the BaseBadge API.
//!
//! ## Auth Flow
//!
//! 1. Client requests a challenge: `GET /v1/auth/nonce?address=0x...`
//! 2. Wallet signs the challenge message (EIP-191 `personal_sign`)
//! 3. Client posts `{address, signature}` to `/v1/auth/verify`
//! 4. Server recovers the signer, consumes the challenge and returns an
//!    HS256 session token
//! 5. Client sends `Authorization: Bearer <token>` on protected routes
//!
//! ## Security
//!
//! - Challenges are single use and expire after 10 minutes
//! - Five failed verifications lock an address out for an hour
//! - Tokens carry fixed issuer and audience and expire after 24 hours
//! - Clock skew tolerance is 60 seconds

pub mod challenge;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod store;
pub mod token;

pub use challenge::{Challenge, ChallengeService};
pub use claims::{AuthenticatedUser, SessionClaims};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use token::TokenIssuer;
