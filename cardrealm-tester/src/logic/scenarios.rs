use anyhow::{Context, Result, ensure};
use std::collections::BTreeSet;

use cardrealm_game::battle::capture::{catch_probability_for, resolve_attempt};
use cardrealm_game::constants::{CAPTURE_MAX_SHAKES, PITY_THRESHOLD};
use cardrealm_game::numbers::usize_to_f64;
use cardrealm_game::{
    BatchRequest, DrawSource, PityState, RandomSource, RarityTier, RateTable, RngBundle,
    ToolStrength, perform_batch, select_card,
};

use crate::logic::policy::BattleStrategy;
use crate::logic::simulation::{Engine, check_summary, random_roster, run_battle};

const RATE_SAMPLES: usize = 50_000;
const RATE_TOLERANCE: f64 = 0.01;
const PITY_DRAWS: usize = 400;
const FLOOR_BATCHES: usize = 50;
const CAPTURE_THROWS: usize = 500;

pub struct ScenarioCtx<'a> {
    pub engine: &'a Engine,
    pub seed: u64,
    pub verbose: bool,
}

impl<'a> ScenarioCtx<'a> {
    #[must_use]
    pub const fn new(engine: &'a Engine, seed: u64, verbose: bool) -> Self {
        Self {
            engine,
            seed,
            verbose,
        }
    }

    fn bundle(&self) -> RngBundle {
        RngBundle::from_user_seed(self.seed)
    }
}

type ScenarioFn = fn(&ScenarioCtx<'_>) -> Result<String>;

/// One named check run per iteration seed. `run` returns a one-line detail
/// on success.
#[derive(Clone, Copy)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

impl std::fmt::Debug for TestScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScenario")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

const SCENARIOS: [TestScenario; 6] = [
    TestScenario {
        key: "rate-convergence",
        name: "Rate Convergence",
        description: "Tier roll frequencies match the configured rate table",
        run: rate_convergence,
    },
    TestScenario {
        key: "pity-guarantee",
        name: "Pity Guarantee",
        description: "An Epic-or-better card appears within every pity window",
        run: pity_guarantee,
    },
    TestScenario {
        key: "batch-floor",
        name: "Batch Floor",
        description: "Every ten-pull holds at least one Rare-or-better card",
        run: batch_floor,
    },
    TestScenario {
        key: "top-tier-dedup",
        name: "Top Tier Dedup",
        description: "Legendary picks exhaust unowned cards before repeating",
        run: top_tier_dedup,
    },
    TestScenario {
        key: "capture-shakes",
        name: "Capture Shakes",
        description: "Capture probabilities stay in range and shakes track success",
        run: capture_shakes,
    },
    TestScenario {
        key: "auto-battle",
        name: "Auto Battle",
        description: "Every battle strategy plays a random encounter to a valid end",
        run: auto_battle,
    },
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

#[must_use]
pub fn scenario_keys() -> Vec<&'static str> {
    SCENARIOS.iter().map(|scenario| scenario.key).collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let key = key.trim().to_ascii_lowercase();
    SCENARIOS.iter().copied().find(|scenario| scenario.key == key)
}

fn rate_convergence(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let rates = ctx.engine.rates();
    let bundle = ctx.bundle();
    let mut rng = bundle.gacha();
    let mut counts = [0_usize; 5];
    for _ in 0..RATE_SAMPLES {
        let tier = rates.roll_tier(rng.next_unit());
        counts[usize::from(tier.rank())] += 1;
    }

    let mut worst = 0.0_f64;
    for tier in RarityTier::ALL {
        let observed =
            usize_to_f64(counts[usize::from(tier.rank())]) / usize_to_f64(RATE_SAMPLES);
        let expected = rates.rate(tier) / rates.total();
        let drift = (observed - expected).abs();
        ensure!(
            drift <= RATE_TOLERANCE,
            "{tier} observed {observed:.4} expected {expected:.4}"
        );
        worst = worst.max(drift);
    }
    Ok(format!("max drift {worst:.4} over {RATE_SAMPLES} rolls"))
}

fn pity_guarantee(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let bundle = ctx.bundle();
    let mut rng = bundle.gacha();
    let owned = BTreeSet::new();
    let mut pity = PityState::default();
    let mut since_elite = 0_u32;
    let mut longest = 0_u32;
    let mut forced = 0_usize;

    for draw in 0..PITY_DRAWS {
        let result = ctx.engine.pull(1, pity, &owned, &mut *rng);
        pity = result.new_pity;
        let card = result.cards.first().context("single pull returned no card")?;
        if result
            .draws
            .iter()
            .any(|trace| trace.source == DrawSource::PityForced)
        {
            forced += 1;
        }
        if card.tier.clears_pity() {
            since_elite = 0;
        } else {
            since_elite += 1;
            longest = longest.max(since_elite);
            ensure!(
                since_elite < PITY_THRESHOLD,
                "draw {draw}: {since_elite} draws without an Epic-or-better card"
            );
        }
    }
    Ok(format!("longest dry streak {longest}, {forced} forced upgrades"))
}

fn batch_floor(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let base_only = RateTable::from_pairs([(RarityTier::Base, 1.0)]);
    let bundle = ctx.bundle();
    let mut rng = bundle.gacha();
    let owned = BTreeSet::new();
    let mut floored = 0_usize;

    for (label, rates) in [("configured", ctx.engine.rates()), ("base-only", &base_only)] {
        let mut pity = PityState::default();
        for batch in 0..FLOOR_BATCHES {
            let result = perform_batch(
                &BatchRequest {
                    batch_size: 10,
                    rates,
                    pity,
                    owned_top: &owned,
                    catalog: ctx.engine.catalog(),
                },
                &mut *rng,
            );
            pity = result.new_pity;
            ensure!(
                result.cards.len() == 10,
                "{label} batch {batch} returned {} cards",
                result.cards.len()
            );
            ensure!(
                result.highest_tier.is_some_and(RarityTier::meets_batch_floor),
                "{label} batch {batch} topped out at {:?}",
                result.highest_tier
            );
            floored += result
                .draws
                .iter()
                .filter(|trace| trace.source == DrawSource::BatchFloor)
                .count();
        }
    }
    Ok(format!(
        "{} batches checked, floor applied {floored} times",
        FLOOR_BATCHES * 2
    ))
}

fn top_tier_dedup(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let catalog = ctx.engine.catalog();
    let pool = catalog.by_tier(RarityTier::Legendary).len();
    ensure!(pool > 0, "catalog has no Legendary cards");

    let bundle = ctx.bundle();
    let mut rng = bundle.gacha();
    let mut owned = BTreeSet::new();
    for pick in 0..pool {
        let card = select_card(RarityTier::Legendary, catalog, &owned, &mut *rng);
        ensure!(
            owned.insert(card.id.clone()),
            "pick {pick} repeated {} with unowned cards left",
            card.id
        );
    }
    let repeat = select_card(RarityTier::Legendary, catalog, &owned, &mut *rng);
    ensure!(
        owned.contains(&repeat.id),
        "full collection produced unknown card {}",
        repeat.id
    );
    Ok(format!("{pool} unique picks before the first repeat"))
}

fn capture_shakes(ctx: &ScenarioCtx<'_>) -> Result<String> {
    const TOOLS: [ToolStrength; 4] = [
        ToolStrength::Weak,
        ToolStrength::Medium,
        ToolStrength::Strong,
        ToolStrength::Guaranteed,
    ];
    let config = &ctx.engine.battle_config().capture;
    let bundle = ctx.bundle();
    let mut rng = bundle.battle();
    let mut successes = 0_usize;

    for throw in 0..CAPTURE_THROWS {
        let tier = RarityTier::ALL[throw % RarityTier::ALL.len()];
        let tool = TOOLS[throw % TOOLS.len()];
        let fraction = rng.next_unit() * config.weakened_threshold;
        let probability = catch_probability_for(tier, fraction, tool, config);
        ensure!(
            (0.0..=1.0).contains(&probability),
            "probability {probability} out of range for {tier} {tool:?}"
        );
        let healthier = catch_probability_for(tier, fraction + 0.1, tool, config);
        ensure!(
            healthier <= probability,
            "{tier} {tool:?} became easier at higher health"
        );

        let roll = resolve_attempt(probability, &mut *rng);
        if roll.success {
            successes += 1;
            ensure!(
                roll.shake_count == CAPTURE_MAX_SHAKES,
                "successful throw shook {} times",
                roll.shake_count
            );
        } else {
            ensure!(
                tool != ToolStrength::Guaranteed,
                "guaranteed tool failed on {tier}"
            );
            ensure!(
                roll.shake_count < CAPTURE_MAX_SHAKES,
                "failed throw shook {} times",
                roll.shake_count
            );
        }
    }
    Ok(format!("{successes}/{CAPTURE_THROWS} throws caught"))
}

fn auto_battle(ctx: &ScenarioCtx<'_>) -> Result<String> {
    let realm_index = usize::try_from(ctx.seed % 5).unwrap_or(0);
    let realm = RarityTier::ALL[realm_index];
    let mut outcomes = Vec::new();

    for strategy in BattleStrategy::ALL {
        let bundle = ctx.bundle();
        let roster = random_roster(ctx.engine, &bundle);
        let mut policy = strategy.create_policy(ctx.seed);
        let run = run_battle(ctx.engine, policy.as_mut(), &bundle, realm, &roster)
            .with_context(|| format!("{strategy} battle in {realm} realm"))?;
        check_summary(&run).with_context(|| format!("{strategy} summary"))?;
        if ctx.verbose {
            for decision in run.decisions.iter().rev().take(3).rev() {
                log::info!(
                    "{} step {}: {} ({})",
                    decision.policy_name,
                    decision.step,
                    decision.action,
                    decision.rationale.as_deref().unwrap_or("-")
                );
            }
        }
        let result = run
            .summary
            .result
            .map_or_else(|| "unfinished".to_string(), |result| format!("{result:?}"));
        outcomes.push(format!(
            "{strategy}: {result} in {} steps, {} captured",
            run.steps,
            run.summary.captured.len()
        ));
    }
    Ok(format!("{realm} realm | {}", outcomes.join(", ")))
}
