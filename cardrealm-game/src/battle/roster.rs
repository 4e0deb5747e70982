//! Combatant construction and hostile squad generation.
use crate::battle::config::{BattleConfig, LoadoutSlot};
use crate::battle::participant::{BattleParticipant, Skill, SkillSet};
use crate::catalog::{CardCatalog, CardDefinition};
use crate::constants::HOSTILE_SQUAD_SIZE;
use crate::numbers::floor_f64_to_u32;
use crate::rng::RandomSource;
use crate::tier::RarityTier;

/// Creature tiers that may appear in a realm of the given difficulty.
#[must_use]
pub const fn realm_pool(realm: RarityTier) -> &'static [RarityTier] {
    match realm {
        RarityTier::Base => &[RarityTier::Base],
        RarityTier::Uncommon => &RarityTier::ALL,
        RarityTier::Rare => &[RarityTier::Uncommon, RarityTier::Rare],
        RarityTier::Epic => &[RarityTier::Rare, RarityTier::Epic],
        RarityTier::Legendary => &[RarityTier::Epic, RarityTier::Legendary],
    }
}

/// Expand a loadout into concrete skills. Picks are drawn without replacement;
/// unknown skill ids are skipped.
pub fn build_skills(
    loadout: &[LoadoutSlot],
    config: &BattleConfig,
    rng: &mut dyn RandomSource,
) -> SkillSet {
    let mut skills = SkillSet::new();
    let grant = |id: &str, skills: &mut SkillSet| match config.skill(id) {
        Some(spec) => skills.push(Skill::from_spec(id, spec)),
        None => log::warn!("loadout references unknown skill {id}"),
    };
    for slot in loadout {
        match slot {
            LoadoutSlot::Fixed(id) => grant(id.as_str(), &mut skills),
            LoadoutSlot::Pick { pool, count } => {
                let mut remaining: Vec<&String> = pool.iter().collect();
                for _ in 0..*count {
                    let Some(idx) = rng.index(remaining.len()) else {
                        break;
                    };
                    let id = remaining.swap_remove(idx);
                    grant(id.as_str(), &mut skills);
                }
            }
        }
    }
    skills
}

/// Player entity from a roster card, optionally carrying over saved health.
pub fn build_player(
    instance_id: impl Into<String>,
    card: CardDefinition,
    carried_health: Option<u32>,
    config: &BattleConfig,
    rng: &mut dyn RandomSource,
) -> BattleParticipant {
    let stats = config.stats_for(card.tier);
    let skills = build_skills(config.loadout(card.tier, false), config, rng);
    let participant = BattleParticipant::new(instance_id, card, false, stats, skills);
    match carried_health {
        Some(health) => participant.with_health(health),
        None => participant,
    }
}

/// Hostile entity with the configured health multiplier applied.
pub fn build_hostile(
    instance_id: impl Into<String>,
    card: CardDefinition,
    config: &BattleConfig,
    rng: &mut dyn RandomSource,
) -> BattleParticipant {
    let mut stats = config.stats_for(card.tier);
    stats.max_health =
        floor_f64_to_u32(f64::from(stats.max_health) * config.hostile_hp_multiplier).max(1);
    let skills = build_skills(config.loadout(card.tier, true), config, rng);
    BattleParticipant::new(instance_id, card, true, stats, skills)
}

/// Draw a full hostile squad for `realm`. Item cards never appear; an empty
/// realm pool widens to every creature in the catalog.
pub fn generate_hostile_squad(
    realm: RarityTier,
    catalog: &CardCatalog,
    config: &BattleConfig,
    rng: &mut dyn RandomSource,
) -> Vec<BattleParticipant> {
    let mut pool = catalog.creatures_in(realm_pool(realm));
    if pool.is_empty() {
        log::debug!("realm {realm} has no creatures; widening to the whole catalog");
        pool = catalog.creatures_in(&RarityTier::ALL);
    }
    let mut squad = Vec::with_capacity(HOSTILE_SQUAD_SIZE);
    for slot in 0..HOSTILE_SQUAD_SIZE {
        let Some(card) = rng.index(pool.len()).and_then(|idx| pool.get(idx)) else {
            break;
        };
        squad.push(build_hostile(
            format!("hostile-{slot}"),
            (*card).clone(),
            config,
            rng,
        ));
    }
    squad
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngSource, ScriptedSource};

    #[test]
    fn hostile_health_is_scaled_and_floored() {
        let config = BattleConfig::default();
        let card = CardDefinition::new("h", "Thorn Boar", RarityTier::Uncommon);
        let hostile = build_hostile("hostile-0", card, &config, &mut ScriptedSource::constant(0.0));
        assert_eq!(hostile.max_health, 180);
        assert!(hostile.is_hostile);
        let ids: Vec<_> = hostile.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["tackle", "leap_strike", "scratch"]);
    }

    #[test]
    fn player_loadout_picks_are_distinct() {
        let config = BattleConfig::default();
        let mut rng = RngSource::seeded(11);
        for _ in 0..50 {
            let card = CardDefinition::new("p", "Aurora Drake", RarityTier::Epic);
            let player = build_player("p-0", card, None, &config, &mut rng);
            let mut ids: Vec<_> = player.skills.iter().map(|s| s.id.clone()).collect();
            assert_eq!(ids.len(), 4);
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), 4);
        }
    }

    #[test]
    fn legendary_player_gets_mythic_skill() {
        let config = BattleConfig::default();
        let card = CardDefinition::new("p", "Void Seraph", RarityTier::Legendary);
        let player = build_player("p-0", card, Some(40), &config, &mut ScriptedSource::constant(0.3));
        assert_eq!(player.current_health, 40);
        assert_eq!(player.skills.len(), 4);
        assert!(player.skills.iter().any(|s| s.id == "cataclysm_ray"));
    }

    #[test]
    fn squads_draw_from_realm_pool() {
        let config = BattleConfig::default();
        let catalog = CardCatalog::load_from_static();
        let mut rng = RngSource::seeded(3);
        for realm in RarityTier::ALL {
            let squad = generate_hostile_squad(realm, &catalog, &config, &mut rng);
            assert_eq!(squad.len(), HOSTILE_SQUAD_SIZE);
            for hostile in &squad {
                assert!(hostile.card.is_creature());
                assert!(realm_pool(realm).contains(&hostile.tier()));
            }
        }
        assert!(generate_hostile_squad(
            RarityTier::Base,
            &CardCatalog::empty(),
            &config,
            &mut rng
        )
        .is_empty());
    }
}
