//! Rarity tiers shared by the gacha and the encounter engine.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{BATCH_FLOOR_TIER, PITY_CLEARING_TIER};

/// Ordered rarity classification. Declaration order defines "higher tier".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    #[default]
    Base,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl RarityTier {
    /// Every tier, lowest first.
    pub const ALL: [Self; 5] = [
        Self::Base,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
    ];

    pub const LOWEST: Self = Self::Base;
    pub const TOP: Self = Self::Legendary;

    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Base => 0,
            Self::Uncommon => 1,
            Self::Rare => 2,
            Self::Epic => 3,
            Self::Legendary => 4,
        }
    }

    /// Canonical scan order for cumulative rolls: highest rarity first.
    pub fn descending() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().rev()
    }

    #[must_use]
    pub const fn is_top(self) -> bool {
        matches!(self, Self::Legendary)
    }

    /// One of the two highest rarities.
    #[must_use]
    pub const fn is_elite(self) -> bool {
        matches!(self, Self::Epic | Self::Legendary)
    }

    #[must_use]
    pub const fn clears_pity(self) -> bool {
        self.rank() >= PITY_CLEARING_TIER.rank()
    }

    #[must_use]
    pub const fn meets_batch_floor(self) -> bool {
        self.rank() >= BATCH_FLOOR_TIER.rank()
    }

    #[must_use]
    pub const fn asset_key(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.asset_key())
    }
}
