//! Hostile flee checks.
use crate::battle::config::FleeConfig;
use crate::battle::participant::BattleParticipant;
use crate::numbers::clamp_unit;
use crate::rng::RandomSource;

/// Flee probability for `entity` once it is eligible to roll.
#[must_use]
pub fn flee_chance(entity: &BattleParticipant, config: &FleeConfig) -> f64 {
    let mut chance = config.tier_chance(entity.tier());
    if entity.turns_survived > config.veteran_turns {
        chance += config.veteran_bonus;
    }
    clamp_unit(chance)
}

/// Decide whether a weakened hostile flees this turn.
///
/// Only hostiles below the health threshold roll, and each entity rolls at
/// most once per encounter regardless of the outcome.
pub fn should_flee(
    entity: &mut BattleParticipant,
    config: &FleeConfig,
    rng: &mut dyn RandomSource,
) -> bool {
    if !entity.is_hostile || entity.has_attempted_flee || entity.is_defeated() {
        return false;
    }
    if entity.health_fraction() >= config.health_threshold {
        return false;
    }
    entity.has_attempted_flee = true;
    let chance = flee_chance(entity, config);
    let fled = rng.chance(chance);
    log::debug!(
        "{} flee check at {:.0}% health: chance {chance:.2}, fled {fled}",
        entity.instance_id,
        entity.health_fraction() * 100.0
    );
    fled
}
