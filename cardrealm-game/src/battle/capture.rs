//! Capture probability and per-throw resolution.
use serde::{Deserialize, Serialize};

use crate::battle::config::CaptureConfig;
use crate::battle::participant::BattleParticipant;
use crate::constants::CAPTURE_MAX_SHAKES;
use crate::numbers::clamp_unit;
use crate::rng::RandomSource;
use crate::tier::RarityTier;

/// Ordinal strength of a capture tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStrength {
    Weak,
    Medium,
    Strong,
    Guaranteed,
}

/// Outcome of one throw. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureAttempt {
    pub tool: ToolStrength,
    pub target_health_fraction: f64,
    pub probability: f64,
    pub success: bool,
    pub shake_count: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRoll {
    pub success: bool,
    pub shake_count: u8,
}

/// True when the target is weak enough for a capture to be allowed.
#[must_use]
pub fn is_weakened(target: &BattleParticipant, config: &CaptureConfig) -> bool {
    target.health_fraction() <= config.weakened_threshold
}

#[must_use]
pub fn catch_probability(
    target: &BattleParticipant,
    tool: ToolStrength,
    config: &CaptureConfig,
) -> f64 {
    catch_probability_for(target.tier(), target.health_fraction(), tool, config)
}

/// Probability from tier and health fraction directly.
#[must_use]
pub fn catch_probability_for(
    tier: RarityTier,
    health_fraction: f64,
    tool: ToolStrength,
    config: &CaptureConfig,
) -> f64 {
    let mut base = match tool {
        ToolStrength::Guaranteed => return 1.0,
        ToolStrength::Weak => config.weak_base,
        ToolStrength::Medium => config.medium_base,
        ToolStrength::Strong => config.strong_base,
    };
    if tier.is_elite() {
        base *= config.elite_factor;
    }
    let health_multiplier = 1.0 + (1.0 - clamp_unit(health_fraction));
    clamp_unit(base * health_multiplier)
}

/// Roll success, then the shake count coupled to it: a full set of shakes on
/// success, strictly fewer on failure.
pub fn resolve_attempt(probability: f64, rng: &mut dyn RandomSource) -> CaptureRoll {
    let success = rng.chance(probability);
    let shake_count = if success {
        CAPTURE_MAX_SHAKES
    } else {
        let shakes = rng.range_inclusive(0, u32::from(CAPTURE_MAX_SHAKES - 1));
        u8::try_from(shakes).unwrap_or(0)
    };
    CaptureRoll {
        success,
        shake_count,
    }
}

/// Compute the probability for `target` and resolve one throw.
pub fn attempt(
    target: &BattleParticipant,
    tool: ToolStrength,
    config: &CaptureConfig,
    rng: &mut dyn RandomSource,
) -> CaptureAttempt {
    let probability = catch_probability(target, tool, config);
    let roll = resolve_attempt(probability, rng);
    CaptureAttempt {
        tool,
        target_health_fraction: target.health_fraction(),
        probability,
        success: roll.success,
        shake_count: roll.shake_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    #[test]
    fn weak_tool_on_zero_health_doubles_base() {
        let config = CaptureConfig::default();
        let p = catch_probability_for(RarityTier::Base, 0.0, ToolStrength::Weak, &config);
        assert!((p - 0.4).abs() < 1e-9);
        let full = catch_probability_for(RarityTier::Base, 1.0, ToolStrength::Weak, &config);
        assert!((full - 0.2).abs() < 1e-9);
    }

    #[test]
    fn elite_targets_halve_base_chance() {
        let config = CaptureConfig::default();
        let p = catch_probability_for(RarityTier::Epic, 0.5, ToolStrength::Strong, &config);
        assert!((p - 0.45).abs() < 1e-9);
    }

    #[test]
    fn guaranteed_tool_is_certain() {
        let config = CaptureConfig::default();
        for fraction in [0.0, 0.5, 1.0] {
            let p = catch_probability_for(
                RarityTier::Legendary,
                fraction,
                ToolStrength::Guaranteed,
                &config,
            );
            assert!((p - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn shakes_are_coupled_to_success() {
        let hit = resolve_attempt(0.4, &mut ScriptedSource::new([0.1]));
        assert!(hit.success);
        assert_eq!(hit.shake_count, 3);

        let miss = resolve_attempt(0.4, &mut ScriptedSource::new([0.9, 0.999]));
        assert!(!miss.success);
        assert_eq!(miss.shake_count, 2);
    }
}
