use cardrealm_game::battle::capture::{self, catch_probability_for, resolve_attempt};
use cardrealm_game::battle::damage::critical_damage;
use cardrealm_game::battle::{BaseStats, CaptureConfig, DamageProfile, Skill, SkillSet};
use cardrealm_game::constants::CAPTURE_MAX_SHAKES;
use cardrealm_game::{
    BattleAction, BattleConfig, BattleEncounter, BattleParticipant, BattlePhase, CardDefinition,
    DamageOutcome, DamageResolver, DropTables, EncounterSetup, ItemBag, ItemKind, RandomSource,
    RarityTier, RngSource, ScriptedSource, StandardDamage, ToolStrength,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use smallvec::smallvec;

/// Every hit lands for a fixed amount.
struct FixedDamage(u32);

impl DamageResolver for FixedDamage {
    fn resolve(
        &self,
        _attacker: &BattleParticipant,
        _defender: &BattleParticipant,
        _skill: &Skill,
        _rng: &mut dyn RandomSource,
    ) -> DamageOutcome {
        DamageOutcome {
            damage: self.0,
            is_critical: false,
            is_dodged: false,
        }
    }
}

fn chacha(seed: u64) -> RngSource<ChaCha8Rng> {
    RngSource::new(ChaCha8Rng::seed_from_u64(seed))
}

fn skills(config: &BattleConfig, ids: &[&str]) -> SkillSet {
    ids.iter()
        .map(|id| Skill::from_spec(id, config.skill(id).expect("known skill")))
        .collect()
}

fn participant(
    id: &str,
    tier: RarityTier,
    hostile: bool,
    stats: BaseStats,
    skills: SkillSet,
) -> BattleParticipant {
    BattleParticipant::new(
        id,
        CardDefinition::new(format!("{id}-card"), id, tier),
        hostile,
        stats,
        skills,
    )
}

#[test]
fn damage_stays_within_skill_bounds() {
    let config = BattleConfig::default();
    let mut rng = chacha(0xDA3A);
    let attacker = participant(
        "a",
        RarityTier::Rare,
        false,
        BaseStats::new(200, 0.3, 0.0),
        skills(&config, &["tremor"]),
    );
    let defender = participant(
        "d",
        RarityTier::Rare,
        true,
        BaseStats::new(200, 0.0, 0.2),
        SkillSet::new(),
    );
    let skill = &attacker.skills[0];
    let DamageProfile::Range { min, max } = skill.damage else {
        panic!("tremor should roll a range");
    };
    let (mut dodges, mut crits) = (0, 0);
    for _ in 0..5_000 {
        let outcome = StandardDamage.resolve(&attacker, &defender, skill, &mut rng);
        if outcome.is_dodged {
            dodges += 1;
            assert_eq!(outcome.damage, 0);
            assert!(!outcome.is_critical);
        } else if outcome.is_critical {
            crits += 1;
            assert!(outcome.damage >= critical_damage(min));
            assert!(outcome.damage <= critical_damage(max));
        } else {
            assert!((min..=max).contains(&outcome.damage));
        }
    }
    assert!(dodges > 0 && crits > 0);
}

#[test]
fn fixed_skill_scales_only_on_critical_hits() {
    let config = BattleConfig::default();
    let mut rng = chacha(0x5C2A);
    let attacker = participant(
        "a",
        RarityTier::Epic,
        false,
        BaseStats::new(250, 0.4, 0.0),
        skills(&config, &["scratch"]),
    );
    let defender = participant(
        "d",
        RarityTier::Base,
        true,
        BaseStats::new(100, 0.0, 0.1),
        SkillSet::new(),
    );
    let skill = &attacker.skills[0];
    assert_eq!(skill.damage, DamageProfile::Fixed(20));
    let (mut hits, mut crits) = (0, 0);
    for _ in 0..5_000 {
        let outcome = StandardDamage.resolve(&attacker, &defender, skill, &mut rng);
        if outcome.is_dodged {
            assert_eq!(outcome.damage, 0);
            continue;
        }
        hits += 1;
        if outcome.is_critical {
            crits += 1;
        }
        let expected = if outcome.is_critical { 30 } else { 20 };
        assert_eq!(outcome.damage, expected);
    }
    assert!(crits > 0 && crits < hits);
}

#[test]
fn capture_probability_is_monotone() {
    let config = CaptureConfig::default();
    let tools = [ToolStrength::Weak, ToolStrength::Medium, ToolStrength::Strong];
    for tier in RarityTier::ALL {
        for pair in tools.windows(2) {
            for step in 0..=10 {
                let fraction = f64::from(step) / 10.0;
                assert!(
                    catch_probability_for(tier, fraction, pair[0], &config)
                        <= catch_probability_for(tier, fraction, pair[1], &config)
                );
            }
        }
        for tool in tools {
            for step in 0..10 {
                let healthier = f64::from(step + 1) / 10.0;
                let weaker = f64::from(step) / 10.0;
                assert!(
                    catch_probability_for(tier, weaker, tool, &config)
                        >= catch_probability_for(tier, healthier, tool, &config)
                );
            }
        }
        for step in 0..=10 {
            let fraction = f64::from(step) / 10.0;
            let p = catch_probability_for(tier, fraction, ToolStrength::Guaranteed, &config);
            assert!((p - 1.0).abs() < f64::EPSILON);
        }
    }
}

#[test]
fn elite_tiers_are_harder_to_capture() {
    let config = CaptureConfig::default();
    let base = catch_probability_for(RarityTier::Rare, 0.2, ToolStrength::Medium, &config);
    let elite = catch_probability_for(RarityTier::Epic, 0.2, ToolStrength::Medium, &config);
    assert!((elite - base * 0.5).abs() < 1e-12);
}

#[test]
fn shake_count_tracks_success() {
    let mut rng = chacha(0x5A4E);
    let mut seen_failure_shakes = [false; 3];
    for attempt in 0..1_000 {
        let probability = f64::from(attempt % 11) / 10.0;
        let roll = resolve_attempt(probability, &mut rng);
        if roll.success {
            assert_eq!(roll.shake_count, CAPTURE_MAX_SHAKES);
        } else {
            assert!(roll.shake_count < CAPTURE_MAX_SHAKES);
            seen_failure_shakes[usize::from(roll.shake_count)] = true;
        }
    }
    assert!(seen_failure_shakes.iter().all(|seen| *seen));
}

#[test]
fn two_hits_weaken_target_into_capture_choice() {
    let config = BattleConfig::default();
    let player = participant(
        "player-0",
        RarityTier::Base,
        false,
        BaseStats::new(100, 0.0, 0.0),
        skills(&config, &["scratch"]),
    );
    let hostile = participant(
        "hostile-0",
        RarityTier::Base,
        true,
        BaseStats::new(100, 0.0, 0.0),
        skills(&config, &["scratch"]),
    );
    let mut encounter = BattleEncounter::with_resolver(
        EncounterSetup {
            difficulty: RarityTier::Base,
            squad: vec![player],
            hostiles: vec![hostile],
            items: ItemBag::new().with(ItemKind::WeakCapsule, 1),
        },
        config,
        DropTables::default(),
        FixedDamage(50),
    )
    .unwrap();
    let mut rng = ScriptedSource::constant(0.5);

    let first = encounter
        .act(BattleAction::UseSkill { skill: 0 }, &mut rng)
        .unwrap();
    assert_eq!(first.phase, BattlePhase::EnemyTurn);
    assert_eq!(encounter.hostiles()[0].current_health, 50);

    let enemy = encounter.resolve_enemy_turn(&mut rng).unwrap();
    assert_eq!(enemy.phase, BattlePhase::PlayerTurn);
    assert_eq!(encounter.squad()[0].current_health, 50);

    let second = encounter
        .act(BattleAction::UseSkill { skill: 0 }, &mut rng)
        .unwrap();
    assert_eq!(second.phase, BattlePhase::CaptureChoice);
    assert!(encounter.hostiles()[0].is_defeated());
}

#[test]
fn weak_tool_on_downed_base_target_succeeds_with_full_shakes() {
    let config = CaptureConfig::default();
    let target = participant(
        "hostile-0",
        RarityTier::Base,
        true,
        BaseStats::new(100, 0.0, 0.0),
        SkillSet::new(),
    )
    .with_health(0);
    let probability = capture::catch_probability(&target, ToolStrength::Weak, &config);
    assert!((probability - 0.40).abs() < 1e-12);

    let mut rng = ScriptedSource::new([0.1]);
    let attempt = capture::attempt(&target, ToolStrength::Weak, &config, &mut rng);
    assert!(attempt.success);
    assert_eq!(attempt.shake_count, 3);
    assert!((attempt.target_health_fraction).abs() < f64::EPSILON);
}

#[test]
fn hostile_without_skills_hesitates() {
    let config = BattleConfig::default();
    let mut encounter = BattleEncounter::with_resolver(
        EncounterSetup {
            difficulty: RarityTier::Base,
            squad: vec![participant(
                "player-0",
                RarityTier::Base,
                false,
                BaseStats::new(100, 0.0, 0.0),
                smallvec![Skill::from_spec("scratch", config.skill("scratch").unwrap())],
            )],
            hostiles: vec![participant(
                "hostile-0",
                RarityTier::Base,
                true,
                BaseStats::new(100, 0.0, 0.0),
                SkillSet::new(),
            )],
            items: ItemBag::new(),
        },
        config,
        DropTables::default(),
        FixedDamage(10),
    )
    .unwrap();
    let mut rng = ScriptedSource::constant(0.9);
    encounter
        .act(BattleAction::UseSkill { skill: 0 }, &mut rng)
        .unwrap();
    let report = encounter.resolve_enemy_turn(&mut rng).unwrap();
    assert_eq!(report.phase, BattlePhase::PlayerTurn);
    assert_eq!(encounter.squad()[0].current_health, 100);
}
