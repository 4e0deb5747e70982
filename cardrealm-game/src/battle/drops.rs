//! Post-victory loot tables.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::events::{DecisionTrace, WeightedCandidate};
use crate::items::ItemKind;
use crate::rng::RandomSource;
use crate::tier::RarityTier;

pub(crate) const DEFAULT_DROPS_DATA: &str = include_str!("../../assets/data/drops.json");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropTableError {
    #[error("no drop table for {0}")]
    Missing(RarityTier),
    #[error("drop table for {0} has no entries")]
    Empty(RarityTier),
    #[error("drop table for {tier} gives {reward} a zero weight")]
    ZeroWeight { tier: RarityTier, reward: ItemKind },
    #[error("drop table for {0} allows zero drops")]
    ZeroMaxDrops(RarityTier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEntry {
    pub reward_id: ItemKind,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTable {
    pub max_drops: u32,
    pub entries: Vec<DropEntry>,
}

impl DropTable {
    fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |acc, entry| acc.saturating_add(entry.weight))
    }

    /// Cumulative-weight scan over the entries.
    fn sample(&self, unit: f64) -> Option<ItemKind> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let roll = unit * f64::from(total);
        let mut cumulative = 0.0;
        for entry in &self.entries {
            cumulative += f64::from(entry.weight);
            if roll < cumulative {
                return Some(entry.reward_id);
            }
        }
        self.entries.last().map(|entry| entry.reward_id)
    }
}

/// Drop tables keyed by encounter difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropTables {
    tables: BTreeMap<RarityTier, DropTable>,
}

impl Default for DropTables {
    fn default() -> Self {
        Self::from_json(DEFAULT_DROPS_DATA).unwrap_or_else(|err| {
            log::warn!("bundled drop tables failed to parse: {err}");
            Self::builtin()
        })
    }
}

impl DropTables {
    /// Load drop tables from JSON keyed by difficulty.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn from_tables(tables: impl IntoIterator<Item = (RarityTier, DropTable)>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    /// Compiled-in tables matching the bundled asset.
    #[must_use]
    pub fn builtin() -> Self {
        use ItemKind::{
            MasterCapsule, MaxPotion, MediumCapsule, Potion, StrongCapsule, SuperPotion,
            WeakCapsule,
        };
        let table = |max_drops, entries: &[(ItemKind, u32)]| DropTable {
            max_drops,
            entries: entries
                .iter()
                .map(|(reward_id, weight)| DropEntry {
                    reward_id: *reward_id,
                    weight: *weight,
                })
                .collect(),
        };
        Self::from_tables([
            (
                RarityTier::Base,
                table(2, &[(WeakCapsule, 50), (Potion, 40), (MediumCapsule, 10)]),
            ),
            (
                RarityTier::Uncommon,
                table(
                    3,
                    &[(WeakCapsule, 30), (Potion, 30), (MediumCapsule, 30), (SuperPotion, 10)],
                ),
            ),
            (
                RarityTier::Rare,
                table(
                    3,
                    &[(MediumCapsule, 40), (StrongCapsule, 20), (SuperPotion, 35), (MaxPotion, 5)],
                ),
            ),
            (
                RarityTier::Epic,
                table(
                    4,
                    &[(StrongCapsule, 40), (MaxPotion, 30), (MasterCapsule, 5), (SuperPotion, 25)],
                ),
            ),
            (
                RarityTier::Legendary,
                table(
                    5,
                    &[(StrongCapsule, 30), (MaxPotion, 30), (MasterCapsule, 20), (SuperPotion, 20)],
                ),
            ),
        ])
    }

    /// Table for `difficulty`, falling back to the lowest difficulty's table.
    #[must_use]
    pub fn table_for(&self, difficulty: RarityTier) -> Option<&DropTable> {
        self.tables
            .get(&difficulty)
            .or_else(|| self.tables.get(&RarityTier::LOWEST))
    }

    #[must_use]
    pub fn max_drops(&self, difficulty: RarityTier) -> u32 {
        self.table_for(difficulty).map_or(0, |table| table.max_drops)
    }

    /// Validate every difficulty's table.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed table.
    pub fn validate(&self) -> Result<(), DropTableError> {
        for tier in RarityTier::ALL {
            let table = self.tables.get(&tier).ok_or(DropTableError::Missing(tier))?;
            if table.entries.is_empty() {
                return Err(DropTableError::Empty(tier));
            }
            if table.max_drops == 0 {
                return Err(DropTableError::ZeroMaxDrops(tier));
            }
            if let Some(entry) = table.entries.iter().find(|entry| entry.weight == 0) {
                return Err(DropTableError::ZeroWeight {
                    tier,
                    reward: entry.reward_id,
                });
            }
        }
        Ok(())
    }

    /// Roll between one and the difficulty's maximum rewards. Duplicates stack.
    pub fn roll_drops(&self, difficulty: RarityTier, rng: &mut dyn RandomSource) -> Vec<ItemKind> {
        self.roll_drops_with_trace(difficulty, rng).0
    }

    /// [`Self::roll_drops`] plus one decision trace per sampled reward.
    pub fn roll_drops_with_trace(
        &self,
        difficulty: RarityTier,
        rng: &mut dyn RandomSource,
    ) -> (Vec<ItemKind>, Vec<DecisionTrace>) {
        let Some(table) = self.table_for(difficulty) else {
            log::debug!("no drop table for {difficulty}; granting nothing");
            return (Vec::new(), Vec::new());
        };
        if table.max_drops == 0 || table.total_weight() == 0 {
            log::debug!("drop table for {difficulty} is unusable; granting nothing");
            return (Vec::new(), Vec::new());
        }

        let count = rng.range_inclusive(1, table.max_drops);
        let candidates: Vec<WeightedCandidate> = table
            .entries
            .iter()
            .map(|entry| WeightedCandidate {
                id: entry.reward_id.to_string(),
                weight: f64::from(entry.weight),
            })
            .collect();

        let mut rewards = Vec::new();
        let mut traces = Vec::new();
        for _ in 0..count {
            let unit = rng.next_unit();
            let Some(reward) = table.sample(unit) else {
                continue;
            };
            traces.push(DecisionTrace {
                pool_id: format!("drops.{difficulty}"),
                roll: unit * f64::from(table.total_weight()),
                candidates: candidates.clone(),
                chosen_id: reward.to_string(),
            });
            rewards.push(reward);
        }
        (rewards, traces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    #[test]
    fn bundled_tables_match_builtin_and_validate() {
        let tables = DropTables::default();
        assert_eq!(tables, DropTables::builtin());
        assert!(tables.validate().is_ok());
        assert_eq!(tables.max_drops(RarityTier::Base), 2);
        assert_eq!(tables.max_drops(RarityTier::Legendary), 5);
    }

    #[test]
    fn count_and_samples_follow_draws() {
        let tables = DropTables::builtin();
        // Count draw picks 2 of [1, 2]; then weak capsule (0..50) and medium (90..100).
        let mut rng = ScriptedSource::new([0.9, 0.1, 0.95]);
        let (drops, traces) = tables.roll_drops_with_trace(RarityTier::Base, &mut rng);
        assert_eq!(drops, vec![ItemKind::WeakCapsule, ItemKind::MediumCapsule]);
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[1].pool_id, "drops.base");
        assert_eq!(traces[1].chosen_id, "medium_capsule");
    }

    #[test]
    fn missing_difficulty_uses_lowest_table() {
        let base_only = DropTables::from_tables([(
            RarityTier::Base,
            DropTable {
                max_drops: 1,
                entries: vec![DropEntry {
                    reward_id: ItemKind::Potion,
                    weight: 1,
                }],
            },
        )]);
        let drops = base_only.roll_drops(RarityTier::Epic, &mut ScriptedSource::constant(0.5));
        assert_eq!(drops, vec![ItemKind::Potion]);
        assert!(matches!(
            base_only.validate(),
            Err(DropTableError::Missing(RarityTier::Uncommon))
        ));
    }

    #[test]
    fn unusable_table_grants_nothing() {
        let empty = DropTables::from_tables([(
            RarityTier::Base,
            DropTable {
                max_drops: 3,
                entries: Vec::new(),
            },
        )]);
        let mut rng = ScriptedSource::constant(0.5);
        assert!(empty.roll_drops(RarityTier::Base, &mut rng).is_empty());
        assert_eq!(rng.consumed(), 0);
    }
}
