use std::collections::BTreeSet;
use std::hash::Hasher;

use cardrealm_game::{
    BattleAction, BattlePhase, GameEngine, ItemBag, ItemKind, PityState, RarityTier, RngBundle,
    RosterEntry, StaticDataLoader,
};
use serde_json::Value;
use twox_hash::XxHash64;

/// Pull, then fight a full encounter with a fixed policy, returning every
/// observable output as JSON.
fn play_session(seed: u64) -> Value {
    let engine = GameEngine::new(StaticDataLoader).expect("bundled assets load");
    let bundle = RngBundle::from_user_seed(seed);

    let mut owned = BTreeSet::new();
    let mut pity = PityState::default();
    let mut pulls = Vec::new();
    for _ in 0..3 {
        let result = engine.pull(10, pity, &owned, &mut *bundle.gacha());
        pity = result.new_pity;
        owned.extend(
            result
                .cards
                .iter()
                .filter(|card| card.tier.is_top())
                .map(|card| card.id.clone()),
        );
        pulls.push(serde_json::to_value(&result).expect("gacha result serializes"));
    }

    let roster: Vec<RosterEntry> = engine
        .catalog()
        .creatures_in(&[RarityTier::Rare])
        .into_iter()
        .take(3)
        .map(|card| RosterEntry::new(card.id.clone(), None))
        .collect();
    let mut encounter = engine
        .start_encounter(
            RarityTier::Uncommon,
            &roster,
            ItemBag::new()
                .with(ItemKind::WeakCapsule, 3)
                .with(ItemKind::Potion, 2),
            &mut *bundle.roster(),
        )
        .expect("encounter starts");

    let mut rng = bundle.battle();
    for _ in 0..1_000 {
        let report = match encounter.phase() {
            BattlePhase::Finished(_) => break,
            BattlePhase::EnemyTurn => encounter.resolve_enemy_turn(&mut *rng),
            BattlePhase::CaptureChoice => {
                let action = if encounter.items().count(ItemKind::WeakCapsule) > 0 {
                    BattleAction::UseItem(ItemKind::WeakCapsule)
                } else {
                    BattleAction::DeclineCapture
                };
                encounter.act(action, &mut *rng)
            }
            BattlePhase::PlayerTurn => {
                let active = encounter.active_player();
                let action = if active.is_defeated() {
                    let slot = encounter
                        .squad()
                        .iter()
                        .position(|member| !member.is_defeated())
                        .expect("a member survives while the battle runs");
                    BattleAction::Switch { slot }
                } else if let Some(skill) = active.usable_skills().first() {
                    BattleAction::UseSkill { skill: *skill }
                } else {
                    BattleAction::Flee
                };
                encounter.act(action, &mut *rng)
            }
        };
        report.expect("policy only issues legal actions");
    }

    serde_json::json!({
        "pulls": pulls,
        "summary": encounter.summary(),
        "events": encounter.events(),
        "draws": rng.inner().draws(),
    })
}

fn snapshot_hash(value: &Value) -> u64 {
    let canonical = serde_json::to_string(value).expect("snapshot serializes");
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(canonical.as_bytes());
    hasher.finish()
}

#[test]
fn same_seed_reproduces_the_session() {
    let first = play_session(0x00C0_FFEE);
    let second = play_session(0x00C0_FFEE);
    assert_eq!(snapshot_hash(&first), snapshot_hash(&second));
    assert_eq!(first, second);
}

#[test]
fn different_seeds_diverge() {
    assert_ne!(
        snapshot_hash(&play_session(1)),
        snapshot_hash(&play_session(2))
    );
}

#[test]
fn session_finishes_within_turn_budget() {
    let session = play_session(0xBEEF);
    assert!(session["summary"]["result"].is_string());
}
