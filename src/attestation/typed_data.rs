// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-712 documents accepted by the ScoreChecker contract.
//!
//! Field names and order are part of the type hash; they mirror the
//! contract's structs exactly, including the legacy `suspiciousOilCompanies`
//! slot that carries the suspicious NFT count.

use std::borrow::Cow;

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};

pub const DOMAIN_NAME: &str = "BaseBadgeScore";
pub const DOMAIN_VERSION: &str = "1";

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Score {
        address user;
        uint256 score;
        uint256 issuedAt;
        uint256 nonce;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ScoreCard {
        address user;
        uint256 totalScore;
        uint256 baseScore;
        uint256 securityScore;
        uint256 numberOfTransactions;
        uint256 currentStreak;
        uint256 maxStreak;
        uint256 currentBalance;
        uint256 avgBalanceLastMonth;
        uint256 gasPaid;
        uint256 suspiciousTokens;
        uint256 suspiciousContracts;
        uint256 dangerousInteractions;
        uint256 suspiciousOilCompanies;
        uint256 issuedAt;
        uint256 nonce;
    }
}

/// Signing domain bound to one chain and ScoreChecker deployment.
pub fn domain(chain_id: u64, verifying_contract: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(DOMAIN_NAME)),
        Some(Cow::Borrowed(DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(verifying_contract),
        None,
    )
}

/// `keccak256("\x19\x01" || domainSeparator || hashStruct(document))`.
pub fn signing_hash<T: SolStruct>(document: &T, domain: &Eip712Domain) -> B256 {
    document.eip712_signing_hash(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_strings_match_contract() {
        assert_eq!(
            Score::eip712_encode_type(),
            "Score(address user,uint256 score,uint256 issuedAt,uint256 nonce)"
        );
        let card = ScoreCard::eip712_encode_type();
        assert!(card.starts_with("ScoreCard(address user,uint256 totalScore,uint256 baseScore,"));
        assert!(card.contains("uint256 dangerousInteractions,uint256 suspiciousOilCompanies,"));
        assert!(card.ends_with("uint256 issuedAt,uint256 nonce)"));
    }

    #[test]
    fn domain_binds_chain_and_contract() {
        let contract = Address::repeat_byte(0x11);
        let doc = Score {
            user: Address::repeat_byte(0x22),
            score: U256::from(80),
            issuedAt: U256::from(1_700_000_000u64),
            nonce: U256::ZERO,
        };
        let base = signing_hash(&doc, &domain(8453, contract));
        assert_ne!(base, signing_hash(&doc, &domain(84532, contract)));
        assert_ne!(base, signing_hash(&doc, &domain(8453, Address::repeat_byte(0x12))));
        assert_eq!(base, signing_hash(&doc, &domain(8453, contract)));
    }
}
