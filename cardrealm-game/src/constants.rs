//! Centralized balance and tuning constants for the Cardrealm engine.
//!
//! Rate tables, drop tables and combat tuning ship as JSON assets, but the
//! rules that define the guarantee semantics live here so they can only be
//! changed through reviewed code.

use crate::tier::RarityTier;

// Presentation keys ---------------------------------------------------------
pub(crate) const LOG_ENCOUNTER_STARTED: &str = "log.battle.start";
pub(crate) const LOG_HOSTILE_APPEARED: &str = "log.battle.hostile-appeared";
pub(crate) const LOG_SKILL_USED: &str = "log.battle.skill-used";
pub(crate) const LOG_DODGED: &str = "log.battle.dodged";
pub(crate) const LOG_CRITICAL_HIT: &str = "log.battle.critical";
pub(crate) const LOG_DAMAGE_DEALT: &str = "log.battle.damage";
pub(crate) const LOG_ENTITY_DEFEATED: &str = "log.battle.defeated";
pub(crate) const LOG_HOSTILE_FLED: &str = "log.battle.hostile-fled";
pub(crate) const LOG_HOSTILE_HESITATED: &str = "log.battle.hostile-hesitated";
pub(crate) const LOG_SWITCHED: &str = "log.battle.switched";
pub(crate) const LOG_ITEM_USED: &str = "log.battle.item-used";
pub(crate) const LOG_CAPTURE_THROWN: &str = "log.capture.thrown";
pub(crate) const LOG_CAPTURE_SHAKE: &str = "log.capture.shake";
pub(crate) const LOG_CAPTURE_SUCCEEDED: &str = "log.capture.succeeded";
pub(crate) const LOG_CAPTURE_FAILED: &str = "log.capture.failed";
pub(crate) const LOG_CAPTURE_DECLINED: &str = "log.capture.declined";
pub(crate) const LOG_ENCOUNTER_VICTORY: &str = "log.battle.victory";
pub(crate) const LOG_ENCOUNTER_DEFEAT: &str = "log.battle.defeat";
pub(crate) const LOG_ENCOUNTER_FLED: &str = "log.battle.fled";

// Gacha rules ---------------------------------------------------------------
pub const PITY_THRESHOLD: u32 = 80;
/// Tier granted when the pity counter forces an upgrade.
pub const PITY_FORCED_TIER: RarityTier = RarityTier::Epic;
/// Lowest tier whose draw resets the pity counter.
pub const PITY_CLEARING_TIER: RarityTier = RarityTier::Epic;
/// Batch size that triggers the floor guarantee.
pub const BATCH_FLOOR_SIZE: usize = 10;
/// Minimum tier guaranteed somewhere in a floor-sized batch.
pub const BATCH_FLOOR_TIER: RarityTier = RarityTier::Rare;
pub const RATE_SUM_TOLERANCE: f64 = 0.01;
pub const PULL_COST_PER_DRAW: u64 = 160;

// Combat tuning -------------------------------------------------------------
pub const CRIT_MULTIPLIER_NUM: u32 = 3;
pub const CRIT_MULTIPLIER_DEN: u32 = 2;
pub const MAX_SQUAD_SIZE: usize = 3;
pub const HOSTILE_SQUAD_SIZE: usize = 3;
pub const DEFAULT_HOSTILE_HP_MULTIPLIER: f64 = 1.2;

// Flee tuning ---------------------------------------------------------------
pub const FLEE_HEALTH_THRESHOLD: f64 = 0.3;
pub const FLEE_CHANCE_LOW: f64 = 0.1;
pub const FLEE_CHANCE_MID: f64 = 0.3;
pub const FLEE_CHANCE_TOP: f64 = 0.5;
pub const FLEE_VETERAN_TURNS: u32 = 5;
pub const FLEE_VETERAN_BONUS: f64 = 0.2;

// Capture tuning ------------------------------------------------------------
pub const CAPTURE_WEAK_BASE: f64 = 0.2;
pub const CAPTURE_MEDIUM_BASE: f64 = 0.4;
pub const CAPTURE_STRONG_BASE: f64 = 0.6;
pub const CAPTURE_TOP_TIER_FACTOR: f64 = 0.5;
pub const CAPTURE_WEAKENED_THRESHOLD: f64 = 0.5;
pub const CAPTURE_MAX_SHAKES: u8 = 3;

// Item tuning ---------------------------------------------------------------
pub const POTION_HEAL: u32 = 50;
pub const SUPER_POTION_HEAL: u32 = 120;
