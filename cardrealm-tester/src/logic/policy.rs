use std::fmt;

use cardrealm_game::battle::capture::is_weakened;
use cardrealm_game::battle::{DamageProfile, Skill};
use cardrealm_game::{BattleAction, BattleEncounter, BattlePhase, ItemKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Capsules from strongest to weakest.
const CAPSULES: [ItemKind; 4] = [
    ItemKind::MasterCapsule,
    ItemKind::StrongCapsule,
    ItemKind::MediumCapsule,
    ItemKind::WeakCapsule,
];

/// Potions in the order a careful player spends them.
const POTIONS: [ItemKind; 3] = [ItemKind::Potion, ItemKind::SuperPotion, ItemKind::MaxPotion];

const LOW_HEALTH: f64 = 0.3;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub action: BattleAction,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(action: BattleAction, rationale: impl Into<String>) -> Self {
        Self {
            action,
            rationale: Some(rationale.into()),
        }
    }
}

/// Policy interface for automated battles.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick an action for the player's turn or a capture choice.
    fn choose(&mut self, encounter: &BattleEncounter) -> PolicyDecision;
}

/// Built-in battle strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BattleStrategy {
    Aggressive,
    Collector,
    Random,
}

impl BattleStrategy {
    pub const ALL: [Self; 3] = [Self::Aggressive, Self::Collector, Self::Random];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aggressive => "Aggressive",
            Self::Collector => "Collector",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Aggressive => Box::new(AggressivePolicy),
            Self::Collector => Box::new(CollectorPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for BattleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct AggressivePolicy;
struct CollectorPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "Aggressive"
    }

    fn choose(&mut self, encounter: &BattleEncounter) -> PolicyDecision {
        if encounter.phase() == BattlePhase::CaptureChoice {
            return PolicyDecision::new(BattleAction::DeclineCapture, "no captures");
        }
        if let Some(decision) = forced_switch(encounter) {
            return decision;
        }
        ranked_skill(encounter, true).map_or_else(
            || PolicyDecision::new(BattleAction::Flee, "out of skills"),
            |(skill, power)| {
                PolicyDecision::new(BattleAction::UseSkill { skill }, format!("power {power}"))
            },
        )
    }
}

impl PlayerPolicy for CollectorPolicy {
    fn name(&self) -> &'static str {
        "Collector"
    }

    fn choose(&mut self, encounter: &BattleEncounter) -> PolicyDecision {
        let capsule = best_held(encounter, &CAPSULES);
        if encounter.phase() == BattlePhase::CaptureChoice {
            return capsule.map_or_else(
                || PolicyDecision::new(BattleAction::DeclineCapture, "no capsules left"),
                |item| PolicyDecision::new(BattleAction::UseItem(item), "downed target"),
            );
        }
        if let Some(decision) = forced_switch(encounter) {
            return decision;
        }
        if encounter.active_player().health_fraction() < LOW_HEALTH
            && let Some(potion) = best_held(encounter, &POTIONS)
        {
            return PolicyDecision::new(BattleAction::UseItem(potion), "low health");
        }
        if let Some(item) = capsule
            && encounter
                .active_hostile()
                .is_some_and(|hostile| is_weakened(hostile, &encounter.config().capture))
        {
            return PolicyDecision::new(BattleAction::UseItem(item), "weakened target");
        }
        // Weakest hits keep the target alive long enough to throw.
        ranked_skill(encounter, false).map_or_else(
            || PolicyDecision::new(BattleAction::Flee, "out of skills"),
            |(skill, power)| {
                PolicyDecision::new(BattleAction::UseSkill { skill }, format!("power {power}"))
            },
        )
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn choose(&mut self, encounter: &BattleEncounter) -> PolicyDecision {
        let candidates = legal_actions(encounter);
        if candidates.is_empty() {
            return PolicyDecision::new(BattleAction::Flee, "no legal actions");
        }
        let idx = self.rng.gen_range(0..candidates.len());
        PolicyDecision::new(candidates[idx], format!("pick {idx}/{}", candidates.len()))
    }
}

fn forced_switch(encounter: &BattleEncounter) -> Option<PolicyDecision> {
    if !encounter.active_player().is_defeated() {
        return None;
    }
    let slot = encounter
        .squad()
        .iter()
        .position(|member| !member.is_defeated())?;
    Some(PolicyDecision::new(
        BattleAction::Switch { slot },
        "active member defeated",
    ))
}

fn best_held(encounter: &BattleEncounter, order: &[ItemKind]) -> Option<ItemKind> {
    order
        .iter()
        .copied()
        .find(|item| encounter.items().count(*item) > 0)
}

fn skill_power(skill: &Skill) -> u32 {
    match skill.damage {
        DamageProfile::Fixed(amount) => amount,
        DamageProfile::Range { min, max } => min / 2 + max / 2,
    }
}

/// Strongest (or weakest) usable skill of the active member.
fn ranked_skill(encounter: &BattleEncounter, strongest: bool) -> Option<(usize, u32)> {
    let active = encounter.active_player();
    let usable = active
        .usable_skills()
        .into_iter()
        .map(|idx| (idx, skill_power(&active.skills[idx])));
    if strongest {
        usable.max_by_key(|(_, power)| *power)
    } else {
        usable.min_by_key(|(_, power)| *power)
    }
}

/// Every action the encounter would accept right now.
pub fn legal_actions(encounter: &BattleEncounter) -> Vec<BattleAction> {
    let held_capsules = CAPSULES
        .iter()
        .copied()
        .filter(|item| encounter.items().count(*item) > 0);
    match encounter.phase() {
        BattlePhase::CaptureChoice => held_capsules
            .map(BattleAction::UseItem)
            .chain(std::iter::once(BattleAction::DeclineCapture))
            .collect(),
        BattlePhase::PlayerTurn => {
            let active = encounter.active_player();
            let mut actions: Vec<BattleAction> = encounter
                .squad()
                .iter()
                .enumerate()
                .filter(|(slot, member)| *slot != encounter.active_slot() && !member.is_defeated())
                .map(|(slot, _)| BattleAction::Switch { slot })
                .collect();
            if active.is_defeated() {
                return actions;
            }
            actions.extend(
                active
                    .usable_skills()
                    .into_iter()
                    .map(|skill| BattleAction::UseSkill { skill }),
            );
            actions.extend(
                POTIONS
                    .iter()
                    .copied()
                    .filter(|item| encounter.items().count(*item) > 0)
                    .map(BattleAction::UseItem),
            );
            let weakened = encounter
                .active_hostile()
                .is_some_and(|hostile| is_weakened(hostile, &encounter.config().capture));
            if weakened {
                actions.extend(held_capsules.map(BattleAction::UseItem));
            }
            actions
        }
        BattlePhase::EnemyTurn | BattlePhase::Finished(_) => Vec::new(),
    }
}
