use anyhow::{Context, Result, bail};
use cardrealm_game::{
    BattlePhase, EncounterSummary, GameEngine, ItemBag, ItemKind, RandomSource, RarityTier,
    RngBundle, RosterEntry, StaticDataLoader,
};

use crate::logic::policy::PlayerPolicy;

/// Upper bound on engine steps before a battle is considered stuck.
const MAX_STEPS: usize = 2_000;

pub type Engine = GameEngine<StaticDataLoader>;

/// One policy decision as applied to the encounter.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub step: usize,
    pub policy_name: &'static str,
    pub action: String,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BattleRun {
    pub starting_items: ItemBag,
    pub summary: EncounterSummary,
    pub steps: usize,
    pub decisions: Vec<DecisionRecord>,
}

/// Starting inventory used for automated battles.
#[must_use]
pub fn starter_items() -> ItemBag {
    ItemBag::new()
        .with(ItemKind::WeakCapsule, 5)
        .with(ItemKind::MediumCapsule, 3)
        .with(ItemKind::StrongCapsule, 1)
        .with(ItemKind::Potion, 3)
        .with(ItemKind::SuperPotion, 1)
}

/// Draw a three-card roster of creatures from the catalog using the roster stream.
pub fn random_roster(engine: &Engine, bundle: &RngBundle) -> Vec<RosterEntry> {
    let creatures = engine.catalog().creatures_in(&RarityTier::ALL);
    let mut rng = bundle.roster();
    (0..3)
        .filter_map(|_| {
            rng.index(creatures.len())
                .and_then(|idx| creatures.get(idx))
                .map(|card| RosterEntry::new(card.id.clone(), None))
        })
        .collect()
}

/// Play one encounter to completion, letting `policy` drive the player side.
///
/// # Errors
///
/// Fails when the encounter cannot start, the policy issues an action the
/// engine rejects, or the battle does not finish within the step budget.
pub fn run_battle(
    engine: &Engine,
    policy: &mut dyn PlayerPolicy,
    bundle: &RngBundle,
    realm: RarityTier,
    roster: &[RosterEntry],
) -> Result<BattleRun> {
    let starting_items = starter_items();
    let mut encounter = engine
        .start_encounter(realm, roster, starting_items.clone(), &mut *bundle.roster())
        .context("encounter failed to start")?;
    let mut rng = bundle.battle();
    let mut decisions = Vec::new();

    for step in 0..MAX_STEPS {
        match encounter.phase() {
            BattlePhase::Finished(result) => {
                log::debug!("{} finished {result:?} after {step} steps", policy.name());
                return Ok(BattleRun {
                    starting_items,
                    summary: encounter.summary(),
                    steps: step,
                    decisions,
                });
            }
            BattlePhase::EnemyTurn => {
                encounter
                    .resolve_enemy_turn(&mut *rng)
                    .with_context(|| format!("enemy turn rejected at step {step}"))?;
            }
            BattlePhase::PlayerTurn | BattlePhase::CaptureChoice => {
                let decision = policy.choose(&encounter);
                let action = decision.action;
                decisions.push(DecisionRecord {
                    step,
                    policy_name: policy.name(),
                    action: format!("{action:?}"),
                    rationale: decision.rationale,
                });
                encounter.act(action, &mut *rng).with_context(|| {
                    format!(
                        "{} issued rejected action {action:?} during {}",
                        policy.name(),
                        encounter.phase()
                    )
                })?;
            }
        }
    }
    bail!(
        "battle did not finish within {MAX_STEPS} steps ({})",
        encounter.phase()
    )
}

/// Invariants every finished battle must satisfy.
///
/// # Errors
///
/// Returns a description of the first violated invariant.
pub fn check_summary(run: &BattleRun) -> Result<()> {
    use cardrealm_game::{EncounterResult, HostileFate};

    let summary = &run.summary;
    let Some(result) = summary.result else {
        bail!("summary has no result");
    };
    for member in &summary.roster_health {
        if member.current_health > member.max_health {
            bail!(
                "{} health {} exceeds max {}",
                member.instance_id,
                member.current_health,
                member.max_health
            );
        }
    }
    let captured_fates = summary
        .hostiles
        .iter()
        .filter(|hostile| hostile.fate == HostileFate::Captured)
        .count();
    if captured_fates != summary.captured.len() {
        bail!(
            "{} captured fates but {} captured cards",
            captured_fates,
            summary.captured.len()
        );
    }
    for (item, used) in summary.consumed_items.iter() {
        let held = run.starting_items.count(item);
        if used > held {
            bail!("consumed {used} {item} but only {held} were held");
        }
    }
    match result {
        EncounterResult::Victory => {
            if summary
                .hostiles
                .iter()
                .any(|hostile| hostile.fate == HostileFate::Unresolved)
            {
                bail!("victory with unresolved hostiles");
            }
            if summary.drops.is_empty() {
                bail!("victory without drops");
            }
        }
        EncounterResult::Defeat => {
            if summary
                .roster_health
                .iter()
                .any(|member| member.current_health > 0)
            {
                bail!("defeat with a standing squad member");
            }
            if !summary.drops.is_empty() {
                bail!("defeat granted drops");
            }
        }
        EncounterResult::Fled => {
            if !summary.drops.is_empty() {
                bail!("fled encounter granted drops");
            }
        }
    }
    Ok(())
}
