//! Single skill-use resolution: dodge, base damage, critical hit.
use serde::{Deserialize, Serialize};

use crate::battle::config::DamageProfile;
use crate::battle::participant::{BattleParticipant, Skill};
use crate::constants::{CRIT_MULTIPLIER_DEN, CRIT_MULTIPLIER_NUM};
use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DamageOutcome {
    pub damage: u32,
    pub is_critical: bool,
    pub is_dodged: bool,
}

impl DamageOutcome {
    #[must_use]
    pub const fn dodged() -> Self {
        Self {
            damage: 0,
            is_critical: false,
            is_dodged: true,
        }
    }
}

/// Resolves one skill use. The encounter is generic over this so tests can
/// substitute fixed outcomes.
pub trait DamageResolver {
    fn resolve(
        &self,
        attacker: &BattleParticipant,
        defender: &BattleParticipant,
        skill: &Skill,
        rng: &mut dyn RandomSource,
    ) -> DamageOutcome;
}

/// Dodge check, then base damage, then the critical check.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDamage;

impl DamageResolver for StandardDamage {
    fn resolve(
        &self,
        attacker: &BattleParticipant,
        defender: &BattleParticipant,
        skill: &Skill,
        rng: &mut dyn RandomSource,
    ) -> DamageOutcome {
        if rng.chance(defender.dodge_chance) {
            return DamageOutcome::dodged();
        }
        let base = match skill.damage {
            DamageProfile::Fixed(amount) => amount,
            DamageProfile::Range { min, max } => rng.range_inclusive(min, max),
        };
        let crit_chance = skill.crit_chance.unwrap_or(attacker.crit_chance);
        let is_critical = rng.chance(crit_chance);
        DamageOutcome {
            damage: if is_critical { critical_damage(base) } else { base },
            is_critical,
            is_dodged: false,
        }
    }
}

/// `floor(base * 1.5)` in integer arithmetic.
#[must_use]
pub const fn critical_damage(base: u32) -> u32 {
    base.saturating_mul(CRIT_MULTIPLIER_NUM) / CRIT_MULTIPLIER_DEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::config::{BaseStats, SkillSpec};
    use crate::catalog::CardDefinition;
    use crate::rng::ScriptedSource;
    use crate::tier::RarityTier;
    use smallvec::SmallVec;

    fn entity(crit: f64, dodge: f64) -> BattleParticipant {
        BattleParticipant::new(
            "e",
            CardDefinition::new("c", "Brine Crab", RarityTier::Base),
            false,
            BaseStats::new(100, crit, dodge),
            SmallVec::new(),
        )
    }

    fn skill(damage: DamageProfile, crit: Option<f64>) -> Skill {
        let spec = SkillSpec {
            name: String::from("Test"),
            damage,
            max_uses: 5,
            crit_chance: crit,
        };
        Skill::from_spec("test", &spec)
    }

    #[test]
    fn dodge_short_circuits() {
        let mut rng = ScriptedSource::new([0.01]);
        let outcome = StandardDamage.resolve(
            &entity(1.0, 0.0),
            &entity(0.0, 0.5),
            &skill(DamageProfile::Fixed(20), None),
            &mut rng,
        );
        assert_eq!(outcome, DamageOutcome::dodged());
        assert_eq!(rng.consumed(), 1);
    }

    #[test]
    fn critical_uses_skill_override() {
        // No dodge, then a crit roll that beats the skill override only.
        let mut rng = ScriptedSource::new([0.9, 0.25]);
        let outcome = StandardDamage.resolve(
            &entity(0.0, 0.0),
            &entity(0.0, 0.1),
            &skill(DamageProfile::Fixed(25), Some(0.3)),
            &mut rng,
        );
        assert!(outcome.is_critical);
        assert_eq!(outcome.damage, 37);
    }

    #[test]
    fn range_damage_without_crit() {
        let mut rng = ScriptedSource::new([0.9, 0.999, 0.9]);
        let outcome = StandardDamage.resolve(
            &entity(0.1, 0.0),
            &entity(0.0, 0.1),
            &skill(DamageProfile::Range { min: 30, max: 50 }, None),
            &mut rng,
        );
        assert_eq!(outcome.damage, 50);
        assert!(!outcome.is_critical);
        assert!(!outcome.is_dodged);
    }

    #[test]
    fn critical_damage_floors() {
        assert_eq!(critical_damage(20), 30);
        assert_eq!(critical_damage(21), 31);
        assert_eq!(critical_damage(0), 0);
    }
}
