//! Combat tuning: base stats, the skill database, loadouts, item effects and
//! flee/capture parameters.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::{
    CAPTURE_MEDIUM_BASE, CAPTURE_STRONG_BASE, CAPTURE_TOP_TIER_FACTOR,
    CAPTURE_WEAK_BASE, CAPTURE_WEAKENED_THRESHOLD, DEFAULT_HOSTILE_HP_MULTIPLIER,
    FLEE_CHANCE_LOW, FLEE_CHANCE_MID, FLEE_CHANCE_TOP, FLEE_HEALTH_THRESHOLD,
    FLEE_VETERAN_BONUS, FLEE_VETERAN_TURNS, POTION_HEAL, SUPER_POTION_HEAL,
};
use crate::tier::RarityTier;

pub(crate) const DEFAULT_BATTLE_DATA: &str = include_str!("../../assets/data/battle.json");

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BattleConfigError {
    #[error("no base stats configured for {0}")]
    MissingBaseStats(RarityTier),
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("skill {skill} has minimum damage {min} above maximum {max}")]
    DamageBounds { skill: String, min: u32, max: u32 },
    #[error("skill {skill} must allow at least one use")]
    NoUses { skill: String },
    #[error("{tier} loadout references unknown skill {skill}")]
    UnknownSkill { tier: RarityTier, skill: String },
    #[error("{tier} loadout picks {count} skills from a pool of {pool}")]
    PickExceedsPool {
        tier: RarityTier,
        count: usize,
        pool: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub max_health: u32,
    pub crit_chance: f64,
    pub dodge_chance: f64,
}

impl BaseStats {
    #[must_use]
    pub const fn new(max_health: u32, crit_chance: f64, dodge_chance: f64) -> Self {
        Self {
            max_health,
            crit_chance,
            dodge_chance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageProfile {
    Fixed(u32),
    Range { min: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSpec {
    pub name: String,
    pub damage: DamageProfile,
    pub max_uses: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit_chance: Option<f64>,
}

impl SkillSpec {
    fn new(name: &str, damage: DamageProfile, max_uses: u32, crit_chance: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            damage,
            max_uses,
            crit_chance,
        }
    }
}

/// One entry of a skill loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadoutSlot {
    /// Always grants the named skill.
    Fixed(String),
    /// Grants `count` distinct skills drawn from `pool`.
    Pick { pool: Vec<String>, count: usize },
}

impl LoadoutSlot {
    fn fixed(skill: &str) -> Self {
        Self::Fixed(skill.to_string())
    }

    fn pick(pool: &[&str], count: usize) -> Self {
        Self::Pick {
            pool: pool.iter().map(|s| (*s).to_string()).collect(),
            count,
        }
    }

    fn skill_ids(&self) -> Vec<&str> {
        match self {
            Self::Fixed(skill) => vec![skill.as_str()],
            Self::Pick { pool, .. } => pool.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEffects {
    pub potion_heal: u32,
    pub super_potion_heal: u32,
}

impl Default for ItemEffects {
    fn default() -> Self {
        Self {
            potion_heal: POTION_HEAL,
            super_potion_heal: SUPER_POTION_HEAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleeConfig {
    /// Hostiles only consider fleeing below this health fraction.
    pub health_threshold: f64,
    pub tier_chances: BTreeMap<RarityTier, f64>,
    pub veteran_turns: u32,
    pub veteran_bonus: f64,
}

impl FleeConfig {
    #[must_use]
    pub fn tier_chance(&self, tier: RarityTier) -> f64 {
        self.tier_chances
            .get(&tier)
            .copied()
            .unwrap_or(FLEE_CHANCE_LOW)
    }
}

impl Default for FleeConfig {
    fn default() -> Self {
        Self {
            health_threshold: FLEE_HEALTH_THRESHOLD,
            tier_chances: BTreeMap::from([
                (RarityTier::Base, FLEE_CHANCE_LOW),
                (RarityTier::Uncommon, FLEE_CHANCE_LOW),
                (RarityTier::Rare, FLEE_CHANCE_LOW),
                (RarityTier::Epic, FLEE_CHANCE_MID),
                (RarityTier::Legendary, FLEE_CHANCE_TOP),
            ]),
            veteran_turns: FLEE_VETERAN_TURNS,
            veteran_bonus: FLEE_VETERAN_BONUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub weak_base: f64,
    pub medium_base: f64,
    pub strong_base: f64,
    /// Multiplier applied to the base chance for the two highest tiers.
    pub elite_factor: f64,
    /// Captures are only allowed at or below this health fraction.
    pub weakened_threshold: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            weak_base: CAPTURE_WEAK_BASE,
            medium_base: CAPTURE_MEDIUM_BASE,
            strong_base: CAPTURE_STRONG_BASE,
            elite_factor: CAPTURE_TOP_TIER_FACTOR,
            weakened_threshold: CAPTURE_WEAKENED_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    pub base_stats: BTreeMap<RarityTier, BaseStats>,
    pub hostile_hp_multiplier: f64,
    pub skills: BTreeMap<String, SkillSpec>,
    pub hostile_loadouts: BTreeMap<RarityTier, Vec<LoadoutSlot>>,
    pub player_loadouts: BTreeMap<RarityTier, Vec<LoadoutSlot>>,
    #[serde(default)]
    pub items: ItemEffects,
    #[serde(default)]
    pub flee: FleeConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::from_json(DEFAULT_BATTLE_DATA).unwrap_or_else(|err| {
            log::warn!("bundled battle config failed to parse: {err}");
            Self::builtin()
        })
    }
}

impl BattleConfig {
    /// Load battle tuning from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Compiled-in tuning matching the bundled asset.
    #[must_use]
    pub fn builtin() -> Self {
        const INTERMEDIATE: [&str; 2] = ["tackle", "leap_strike"];
        const ADVANCED: [&str; 3] = ["flame_burst", "tremor", "frost_lance"];
        let range = |min, max| DamageProfile::Range { min, max };

        let base_stats = BTreeMap::from([
            (RarityTier::Base, BaseStats::new(100, 0.05, 0.05)),
            (RarityTier::Uncommon, BaseStats::new(150, 0.10, 0.08)),
            (RarityTier::Rare, BaseStats::new(200, 0.15, 0.10)),
            (RarityTier::Epic, BaseStats::new(250, 0.20, 0.12)),
            (RarityTier::Legendary, BaseStats::new(300, 0.30, 0.15)),
        ]);

        let skills = [
            ("scratch", "Scratch", DamageProfile::Fixed(20), 20, None),
            ("tackle", "Tackle", range(30, 50), 5, None),
            ("leap_strike", "Leap Strike", range(40, 60), 5, None),
            ("flame_burst", "Flame Burst", range(70, 100), 5, Some(0.2)),
            ("tremor", "Tremor", range(80, 120), 5, Some(0.15)),
            ("frost_lance", "Frost Lance", range(50, 80), 5, Some(0.3)),
            ("cataclysm_ray", "Cataclysm Ray", range(150, 200), 1, Some(0.3)),
            ("cosmic_impact", "Cosmic Impact", range(100, 120), 5, None),
            ("calamity_gale", "Calamity Gale", range(90, 110), 5, None),
        ]
        .into_iter()
        .map(|(id, name, damage, uses, crit)| {
            (id.to_string(), SkillSpec::new(name, damage, uses, crit))
        })
        .collect();

        let fixed = |ids: &[&str]| -> Vec<LoadoutSlot> {
            ids.iter().map(|id| LoadoutSlot::fixed(id)).collect()
        };
        let hostile_loadouts = BTreeMap::from([
            (RarityTier::Base, fixed(&["scratch", "tackle"])),
            (RarityTier::Uncommon, fixed(&["tackle", "leap_strike", "scratch"])),
            (RarityTier::Rare, fixed(&["flame_burst", "tremor", "scratch"])),
            (RarityTier::Epic, fixed(&["flame_burst", "tremor", "frost_lance"])),
            (
                RarityTier::Legendary,
                fixed(&["cataclysm_ray", "cosmic_impact", "calamity_gale"]),
            ),
        ]);
        let player_loadouts = BTreeMap::from([
            (RarityTier::Base, fixed(&["scratch"])),
            (RarityTier::Uncommon, fixed(&["scratch", "tackle", "leap_strike"])),
            (
                RarityTier::Rare,
                vec![
                    LoadoutSlot::fixed("scratch"),
                    LoadoutSlot::pick(&INTERMEDIATE, 1),
                    LoadoutSlot::pick(&ADVANCED, 1),
                ],
            ),
            (
                RarityTier::Epic,
                vec![
                    LoadoutSlot::fixed("scratch"),
                    LoadoutSlot::pick(&INTERMEDIATE, 2),
                    LoadoutSlot::pick(&ADVANCED, 1),
                ],
            ),
            (
                RarityTier::Legendary,
                vec![
                    LoadoutSlot::pick(&INTERMEDIATE, 1),
                    LoadoutSlot::pick(&ADVANCED, 2),
                    LoadoutSlot::fixed("cataclysm_ray"),
                ],
            ),
        ]);

        Self {
            base_stats,
            hostile_hp_multiplier: DEFAULT_HOSTILE_HP_MULTIPLIER,
            skills,
            hostile_loadouts,
            player_loadouts,
            items: ItemEffects::default(),
            flee: FleeConfig::default(),
            capture: CaptureConfig::default(),
        }
    }

    /// Base stats for `tier`, falling back to the lowest configured tier.
    #[must_use]
    pub fn stats_for(&self, tier: RarityTier) -> BaseStats {
        self.base_stats
            .get(&tier)
            .or_else(|| self.base_stats.values().next())
            .copied()
            .unwrap_or(BaseStats::new(100, 0.05, 0.05))
    }

    #[must_use]
    pub fn skill(&self, id: &str) -> Option<&SkillSpec> {
        self.skills.get(id)
    }

    #[must_use]
    pub fn loadout(&self, tier: RarityTier, hostile: bool) -> &[LoadoutSlot] {
        let table = if hostile {
            &self.hostile_loadouts
        } else {
            &self.player_loadouts
        };
        table.get(&tier).map_or(&[], Vec::as_slice)
    }

    /// Validate the tuning values.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), BattleConfigError> {
        for tier in RarityTier::ALL {
            let stats = self
                .base_stats
                .get(&tier)
                .ok_or(BattleConfigError::MissingBaseStats(tier))?;
            check_range(
                format!("base_stats.{tier}.max_health"),
                f64::from(stats.max_health),
                1.0,
                f64::from(u32::MAX),
            )?;
            check_probability(format!("base_stats.{tier}.crit_chance"), stats.crit_chance)?;
            check_probability(format!("base_stats.{tier}.dodge_chance"), stats.dodge_chance)?;
        }
        check_range(
            String::from("hostile_hp_multiplier"),
            self.hostile_hp_multiplier,
            0.1,
            10.0,
        )?;
        self.validate_skills()?;
        self.validate_loadouts()?;
        check_probability(String::from("flee.health_threshold"), self.flee.health_threshold)?;
        check_probability(String::from("flee.veteran_bonus"), self.flee.veteran_bonus)?;
        for (tier, chance) in &self.flee.tier_chances {
            check_probability(format!("flee.tier_chances.{tier}"), *chance)?;
        }
        let capture = &self.capture;
        for (field, value) in [
            ("capture.weak_base", capture.weak_base),
            ("capture.medium_base", capture.medium_base),
            ("capture.strong_base", capture.strong_base),
            ("capture.elite_factor", capture.elite_factor),
            ("capture.weakened_threshold", capture.weakened_threshold),
        ] {
            check_probability(field.to_string(), value)?;
        }
        Ok(())
    }

    fn validate_skills(&self) -> Result<(), BattleConfigError> {
        for (id, spec) in &self.skills {
            if spec.max_uses == 0 {
                return Err(BattleConfigError::NoUses { skill: id.clone() });
            }
            if let DamageProfile::Range { min, max } = spec.damage
                && min > max
            {
                return Err(BattleConfigError::DamageBounds {
                    skill: id.clone(),
                    min,
                    max,
                });
            }
            if let Some(crit) = spec.crit_chance {
                check_probability(format!("skills.{id}.crit_chance"), crit)?;
            }
        }
        Ok(())
    }

    fn validate_loadouts(&self) -> Result<(), BattleConfigError> {
        let tables = self.hostile_loadouts.iter().chain(&self.player_loadouts);
        for (tier, slots) in tables {
            for slot in slots {
                if let Some(unknown) = slot
                    .skill_ids()
                    .into_iter()
                    .find(|id| !self.skills.contains_key(*id))
                {
                    return Err(BattleConfigError::UnknownSkill {
                        tier: *tier,
                        skill: unknown.to_string(),
                    });
                }
                if let LoadoutSlot::Pick { pool, count } = slot
                    && *count > pool.len()
                {
                    return Err(BattleConfigError::PickExceedsPool {
                        tier: *tier,
                        count: *count,
                        pool: pool.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_probability(field: String, value: f64) -> Result<(), BattleConfigError> {
    check_range(field, value, 0.0, 1.0)
}

fn check_range(field: String, value: f64, min: f64, max: f64) -> Result<(), BattleConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(BattleConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}
