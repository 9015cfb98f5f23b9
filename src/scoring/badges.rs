// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Achievement badges derived from a score card.

use serde::Serialize;
use utoipa::ToSchema;

use super::ScoreCard;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

struct Rule {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
    earned: fn(&ScoreCard) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        id: "first_score",
        name: "First Score",
        icon: "🎯",
        description: "Computed your first BaseBadge score",
        earned: |_| true,
    },
    Rule {
        id: "tx_10",
        name: "Onboarded",
        icon: "🚀",
        description: "At least 10 transactions on Base",
        earned: |c| c.base.tx_count >= 10,
    },
    Rule {
        id: "tx_100",
        name: "Active User",
        icon: "⚡",
        description: "At least 100 transactions on Base",
        earned: |c| c.base.tx_count >= 100,
    },
    Rule {
        id: "security_guard",
        name: "Security Guard",
        icon: "🛡️",
        description: "Security score of 22 or higher",
        earned: |c| c.security_score >= 22.0,
    },
    Rule {
        id: "total_bronze",
        name: "Bronze Wallet",
        icon: "🥉",
        description: "Total score of 60 or higher",
        earned: |c| c.total_score >= 60.0,
    },
    Rule {
        id: "total_silver",
        name: "Silver Wallet",
        icon: "🥈",
        description: "Total score of 75 or higher",
        earned: |c| c.total_score >= 75.0,
    },
    Rule {
        id: "total_gold",
        name: "Gold Wallet",
        icon: "🥇",
        description: "Total score of 85 or higher",
        earned: |c| c.total_score >= 85.0,
    },
    Rule {
        id: "security_master",
        name: "Security Master",
        icon: "🧠",
        description: "Security score of 24 or higher",
        earned: |c| c.security_score >= 24.0,
    },
    Rule {
        id: "veteran",
        name: "Base Veteran",
        icon: "🏆",
        description: "Wallet active on Base for 90 days or more",
        earned: |c| c.base.age_days >= 90,
    },
];

/// Evaluate every badge rule against `card`, in display order.
pub fn derive_badges(card: &ScoreCard) -> Vec<Badge> {
    RULES
        .iter()
        .map(|rule| Badge {
            id: rule.id,
            name: rule.name,
            icon: rule.icon,
            description: rule.description,
            earned: (rule.earned)(card),
        })
        .collect()
}
