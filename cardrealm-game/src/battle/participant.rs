//! Per-encounter combatants and their skills.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::battle::config::{BaseStats, DamageProfile, SkillSpec};
use crate::catalog::CardDefinition;
use crate::numbers::ratio;
use crate::tier::RarityTier;

pub type SkillSet = SmallVec<[Skill; 4]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub damage: DamageProfile,
    pub uses_remaining: u32,
    pub uses_max: u32,
    /// Overrides the attacker's crit chance when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit_chance: Option<f64>,
}

impl Skill {
    #[must_use]
    pub fn from_spec(id: &str, spec: &SkillSpec) -> Self {
        Self {
            id: id.to_string(),
            name: spec.name.clone(),
            damage: spec.damage,
            uses_remaining: spec.max_uses,
            uses_max: spec.max_uses,
            crit_chance: spec.crit_chance,
        }
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.uses_remaining == 0
    }

    /// Spend one use; false when none remain.
    pub const fn consume(&mut self) -> bool {
        if self.uses_remaining == 0 {
            return false;
        }
        self.uses_remaining -= 1;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleParticipant {
    pub instance_id: String,
    pub card: CardDefinition,
    pub is_hostile: bool,
    pub max_health: u32,
    pub current_health: u32,
    pub crit_chance: f64,
    pub dodge_chance: f64,
    pub skills: SkillSet,
    pub turns_survived: u32,
    pub has_attempted_flee: bool,
}

impl BattleParticipant {
    #[must_use]
    pub fn new(
        instance_id: impl Into<String>,
        card: CardDefinition,
        is_hostile: bool,
        stats: BaseStats,
        skills: SkillSet,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            card,
            is_hostile,
            max_health: stats.max_health,
            current_health: stats.max_health,
            crit_chance: stats.crit_chance,
            dodge_chance: stats.dodge_chance,
            skills,
            turns_survived: 0,
            has_attempted_flee: false,
        }
    }

    #[must_use]
    pub fn with_health(mut self, current_health: u32) -> Self {
        self.current_health = current_health.min(self.max_health);
        self
    }

    #[must_use]
    pub const fn tier(&self) -> RarityTier {
        self.card.tier
    }

    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.current_health == 0
    }

    #[must_use]
    pub fn health_fraction(&self) -> f64 {
        ratio(self.current_health, self.max_health)
    }

    /// Subtract `amount` without going below zero; returns damage taken.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.current_health);
        self.current_health -= taken;
        taken
    }

    /// Restore up to `amount` health; returns the amount restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let missing = self.max_health.saturating_sub(self.current_health);
        let healed = amount.min(missing);
        self.current_health += healed;
        healed
    }

    pub fn heal_full(&mut self) -> u32 {
        self.heal(self.max_health)
    }

    /// Indices of skills that still have uses left.
    #[must_use]
    pub fn usable_skills(&self) -> SmallVec<[usize; 4]> {
        self.skills
            .iter()
            .enumerate()
            .filter(|(_, skill)| !skill.is_exhausted())
            .map(|(idx, _)| idx)
            .collect()
    }
}
