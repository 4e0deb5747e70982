//! Rarity rate tables and the cumulative tier roll.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::RATE_SUM_TOLERANCE;
use crate::tier::RarityTier;

pub(crate) const DEFAULT_RATES_DATA: &str = include_str!("../assets/data/rates.json");

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateTableError {
    #[error("rate table is empty")]
    Empty,
    #[error("rate for {tier} must be a finite, non-negative probability (got {value})")]
    InvalidRate { tier: RarityTier, value: f64 },
    #[error("rates sum to {total:.4}, expected 1.0 within {tolerance}")]
    BadTotal { total: f64, tolerance: f64 },
}

/// Probability of each rarity tier for a single natural draw.
///
/// Missing tiers count as zero. Tables that do not sum to one are still usable;
/// any leftover probability mass falls through to the lowest tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: BTreeMap<RarityTier, f64>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::from_json(DEFAULT_RATES_DATA).unwrap_or_else(|_| Self::standard())
    }
}

impl RateTable {
    /// Load a rate table from JSON keyed by tier name.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (RarityTier, f64)>) -> Self {
        Self {
            rates: pairs.into_iter().collect(),
        }
    }

    /// Compiled-in rates used when the bundled asset is unavailable.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_pairs([
            (RarityTier::Legendary, 0.001),
            (RarityTier::Epic, 0.0058),
            (RarityTier::Rare, 0.05),
            (RarityTier::Uncommon, 0.15),
            (RarityTier::Base, 0.7932),
        ])
    }

    /// Configured probability, or 0 for missing and unusable entries.
    #[must_use]
    pub fn rate(&self, tier: RarityTier) -> f64 {
        self.rates
            .get(&tier)
            .copied()
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        RarityTier::ALL.iter().map(|tier| self.rate(*tier)).sum()
    }

    /// Check that every entry is a probability and the table sums to one.
    ///
    /// Rolling never requires a valid table; this is for callers that accept
    /// user-edited rates.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in the table.
    pub fn validate(&self) -> Result<(), RateTableError> {
        if self.rates.is_empty() {
            return Err(RateTableError::Empty);
        }
        for (tier, value) in &self.rates {
            if !value.is_finite() || *value < 0.0 {
                return Err(RateTableError::InvalidRate {
                    tier: *tier,
                    value: *value,
                });
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > RATE_SUM_TOLERANCE {
            return Err(RateTableError::BadTotal {
                total,
                tolerance: RATE_SUM_TOLERANCE,
            });
        }
        Ok(())
    }

    /// Map a unit draw onto a tier.
    ///
    /// Tiers are scanned highest first, so rounding error and any missing mass
    /// land on the lowest tier.
    #[must_use]
    pub fn roll_tier(&self, unit: f64) -> RarityTier {
        let mut cumulative = 0.0;
        for tier in RarityTier::descending() {
            cumulative += self.rate(tier);
            if unit < cumulative {
                return tier;
            }
        }
        log::trace!(
            "rate scan exhausted at {cumulative:.4} for roll {unit:.4}; using {}",
            RarityTier::LOWEST
        );
        RarityTier::LOWEST
    }
}
