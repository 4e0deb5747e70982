//! Adventure-mode battles: combatants, resolvers and the encounter state machine.

pub mod capture;
pub mod config;
pub mod damage;
pub mod drops;
pub mod encounter;
pub mod flee;
pub mod participant;
pub mod roster;

pub use capture::{CaptureAttempt, CaptureRoll, ToolStrength, catch_probability, resolve_attempt};
pub use config::{
    BaseStats, BattleConfig, BattleConfigError, CaptureConfig, DamageProfile, FleeConfig,
    ItemEffects, LoadoutSlot, SkillSpec,
};
pub use damage::{DamageOutcome, DamageResolver, StandardDamage};
pub use drops::{DropEntry, DropTable, DropTableError, DropTables};
pub use encounter::{
    ActionRejected, BattleAction, BattleEncounter, BattlePhase, EncounterResult,
    EncounterSetup, EncounterSetupError, EncounterSummary, HostileFate, HostileOutcome,
    RosterHealth, StepReport,
};
pub use flee::{flee_chance, should_flee};
pub use participant::{BattleParticipant, Skill, SkillSet};
pub use roster::{build_hostile, build_player, generate_hostile_squad, realm_pool};
