//! Turn-based encounter state machine.
//!
//! Each accepted call advances exactly one step and returns the new phase with
//! the events produced by that step. Rejected actions leave the encounter
//! untouched.
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::battle::capture::{self, ToolStrength};
use crate::battle::config::BattleConfig;
use crate::battle::damage::{DamageOutcome, DamageResolver, StandardDamage};
use crate::battle::drops::DropTables;
use crate::battle::flee;
use crate::battle::participant::{BattleParticipant, Skill};
use crate::catalog::CardId;
use crate::constants::{
    LOG_CAPTURE_DECLINED, LOG_CAPTURE_FAILED, LOG_CAPTURE_SHAKE, LOG_CAPTURE_SUCCEEDED,
    LOG_CAPTURE_THROWN, LOG_CRITICAL_HIT, LOG_DAMAGE_DEALT, LOG_DODGED, LOG_ENCOUNTER_DEFEAT,
    LOG_ENCOUNTER_FLED, LOG_ENCOUNTER_STARTED, LOG_ENCOUNTER_VICTORY, LOG_ENTITY_DEFEATED,
    LOG_HOSTILE_APPEARED, LOG_HOSTILE_FLED, LOG_HOSTILE_HESITATED, LOG_ITEM_USED,
    LOG_SKILL_USED, LOG_SWITCHED, MAX_SQUAD_SIZE,
};
use crate::events::{DecisionTrace, EngineEvent, EventId, EventKind};
use crate::items::{ItemBag, ItemKind};
use crate::rng::RandomSource;
use crate::tier::RarityTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterResult {
    Victory,
    Defeat,
    Fled,
}

impl EncounterResult {
    const fn ui_key(self) -> &'static str {
        match self {
            Self::Victory => LOG_ENCOUNTER_VICTORY,
            Self::Defeat => LOG_ENCOUNTER_DEFEAT,
            Self::Fled => LOG_ENCOUNTER_FLED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    PlayerTurn,
    EnemyTurn,
    CaptureChoice,
    Finished(EncounterResult),
}

impl BattlePhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished(_))
    }

    #[must_use]
    pub const fn result(self) -> Option<EncounterResult> {
        match self {
            Self::Finished(result) => Some(result),
            _ => None,
        }
    }
}

impl fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerTurn => f.write_str("player turn"),
            Self::EnemyTurn => f.write_str("enemy turn"),
            Self::CaptureChoice => f.write_str("capture choice"),
            Self::Finished(result) => write!(f, "finished ({result:?})"),
        }
    }
}

/// One player decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleAction {
    UseSkill { skill: usize },
    Switch { slot: usize },
    UseItem(ItemKind),
    DeclineCapture,
    Flee,
}

/// Why an action was refused. The encounter state is unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionRejected {
    #[error("the encounter has already finished")]
    Finished,
    #[error("action not allowed during {phase}")]
    WrongPhase { phase: BattlePhase },
    #[error("the active entity is defeated and must switch out")]
    ActiveDefeated,
    #[error("no skill at index {0}")]
    UnknownSkill(usize),
    #[error("{skill} has no uses remaining")]
    SkillExhausted { skill: String },
    #[error("no squad member in slot {0}")]
    UnknownSlot(usize),
    #[error("slot {0} is already active")]
    AlreadyActive(usize),
    #[error("slot {0} is defeated")]
    SlotDefeated(usize),
    #[error("no {0} remaining")]
    ItemUnavailable(ItemKind),
    #[error("target not weakened ({fraction:.2} health remaining)")]
    TargetNotWeakened { fraction: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncounterSetupError {
    #[error("player squad is empty")]
    EmptySquad,
    #[error("player squad has {size} members; at most {max} allowed")]
    SquadTooLarge { size: usize, max: usize },
    #[error("every squad member is already defeated")]
    SquadDefeated,
    #[error("encounter has no hostiles")]
    NoHostiles,
    #[error("card {0} is not in the catalog")]
    UnknownCard(CardId),
    #[error("card {0} is an item and cannot battle")]
    NotACreature(CardId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostileFate {
    Unresolved,
    Defeated,
    Captured,
    Fled,
}

/// Participants and inventory snapshot an encounter starts from.
#[derive(Debug, Clone)]
pub struct EncounterSetup {
    pub difficulty: RarityTier,
    pub squad: Vec<BattleParticipant>,
    pub hostiles: Vec<BattleParticipant>,
    pub items: ItemBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub phase: BattlePhase,
    pub events: Vec<EngineEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterHealth {
    pub instance_id: String,
    pub card_id: CardId,
    pub current_health: u32,
    pub max_health: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostileOutcome {
    pub instance_id: String,
    pub card_id: CardId,
    pub fate: HostileFate,
}

/// Delta handed back to the caller for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSummary {
    /// `None` while the encounter is still running.
    pub result: Option<EncounterResult>,
    pub difficulty: RarityTier,
    pub roster_health: Vec<RosterHealth>,
    pub hostiles: Vec<HostileOutcome>,
    pub captured: Vec<CardId>,
    pub drops: Vec<ItemKind>,
    pub consumed_items: ItemBag,
    pub turns: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Player,
    Hostile,
}

impl Side {
    const fn tag(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Hostile => "hostile",
        }
    }
}

struct StepEvents {
    step: u32,
    events: Vec<EngineEvent>,
}

impl StepEvents {
    const fn new(step: u32) -> Self {
        Self {
            step,
            events: Vec::new(),
        }
    }

    fn emit(&mut self, kind: EventKind, ui_key: &str, tag: &str, payload: serde_json::Value) {
        let seq = u16::try_from(self.events.len()).unwrap_or(u16::MAX);
        self.events.push(
            EngineEvent::new(EventId::new(self.step, seq), kind, ui_key)
                .with_tag(tag)
                .with_payload(payload),
        );
    }
}

#[derive(Debug, Clone)]
pub struct BattleEncounter<D = StandardDamage> {
    config: BattleConfig,
    drop_tables: DropTables,
    resolver: D,
    difficulty: RarityTier,
    squad: Vec<BattleParticipant>,
    active: usize,
    hostiles: Vec<BattleParticipant>,
    fates: Vec<HostileFate>,
    target: usize,
    items: ItemBag,
    consumed: ItemBag,
    captured: Vec<CardId>,
    drops: Vec<ItemKind>,
    drop_traces: Vec<DecisionTrace>,
    phase: BattlePhase,
    step: u32,
    turns: u32,
    log: Vec<EngineEvent>,
}

impl BattleEncounter<StandardDamage> {
    /// Start an encounter with standard damage resolution.
    ///
    /// # Errors
    ///
    /// Returns an error when the squad or hostile list cannot start a battle.
    pub fn new(
        setup: EncounterSetup,
        config: BattleConfig,
        drop_tables: DropTables,
    ) -> Result<Self, EncounterSetupError> {
        Self::with_resolver(setup, config, drop_tables, StandardDamage)
    }
}

impl<D: DamageResolver> BattleEncounter<D> {
    /// Start an encounter with a custom damage resolver.
    ///
    /// # Errors
    ///
    /// Returns an error when the squad is empty, larger than
    /// [`MAX_SQUAD_SIZE`], fully defeated, or there are no hostiles.
    pub fn with_resolver(
        setup: EncounterSetup,
        config: BattleConfig,
        drop_tables: DropTables,
        resolver: D,
    ) -> Result<Self, EncounterSetupError> {
        let EncounterSetup {
            difficulty,
            squad,
            hostiles,
            items,
        } = setup;
        let squad: Vec<BattleParticipant> = squad.into_iter().map(clamp_health).collect();
        let hostiles: Vec<BattleParticipant> = hostiles.into_iter().map(clamp_health).collect();
        if squad.is_empty() {
            return Err(EncounterSetupError::EmptySquad);
        }
        if squad.len() > MAX_SQUAD_SIZE {
            return Err(EncounterSetupError::SquadTooLarge {
                size: squad.len(),
                max: MAX_SQUAD_SIZE,
            });
        }
        if hostiles.is_empty() {
            return Err(EncounterSetupError::NoHostiles);
        }
        let active = squad
            .iter()
            .position(|member| !member.is_defeated())
            .ok_or(EncounterSetupError::SquadDefeated)?;

        let mut encounter = Self {
            config,
            drop_tables,
            resolver,
            difficulty,
            fates: vec![HostileFate::Unresolved; hostiles.len()],
            squad,
            active,
            hostiles,
            target: 0,
            items,
            consumed: ItemBag::new(),
            captured: Vec::new(),
            drops: Vec::new(),
            drop_traces: Vec::new(),
            phase: BattlePhase::PlayerTurn,
            step: 0,
            turns: 0,
            log: Vec::new(),
        };

        let mut events = StepEvents::new(0);
        events.emit(
            EventKind::EncounterStarted,
            LOG_ENCOUNTER_STARTED,
            "encounter",
            json!({
                "difficulty": difficulty,
                "squad": encounter.squad.len(),
                "hostiles": encounter.hostiles.len(),
            }),
        );
        encounter.announce_target(&mut events);
        encounter.log.extend(events.events);
        log::debug!(
            "encounter started at {difficulty} with {} hostiles",
            encounter.hostiles.len()
        );
        Ok(encounter)
    }

    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    #[must_use]
    pub const fn difficulty(&self) -> RarityTier {
        self.difficulty
    }

    #[must_use]
    pub fn squad(&self) -> &[BattleParticipant] {
        &self.squad
    }

    #[must_use]
    pub fn hostiles(&self) -> &[BattleParticipant] {
        &self.hostiles
    }

    #[must_use]
    pub const fn active_slot(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn active_player(&self) -> &BattleParticipant {
        &self.squad[self.active]
    }

    /// Hostile currently being fought, or `None` once every hostile is resolved.
    #[must_use]
    pub fn active_hostile(&self) -> Option<&BattleParticipant> {
        (self.fates[self.target] == HostileFate::Unresolved).then(|| &self.hostiles[self.target])
    }

    #[must_use]
    pub const fn items(&self) -> &ItemBag {
        &self.items
    }

    #[must_use]
    pub fn fates(&self) -> &[HostileFate] {
        &self.fates
    }

    /// Every event emitted so far, including the opening announcement.
    #[must_use]
    pub fn events(&self) -> &[EngineEvent] {
        &self.log
    }

    #[must_use]
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Apply one player action.
    ///
    /// # Errors
    ///
    /// Returns [`ActionRejected`] when the action is not legal in the current
    /// phase or state; nothing is consumed in that case.
    pub fn act(
        &mut self,
        action: BattleAction,
        rng: &mut dyn RandomSource,
    ) -> Result<StepReport, ActionRejected> {
        let mut events = StepEvents::new(self.step + 1);
        match self.phase {
            BattlePhase::Finished(_) => return Err(ActionRejected::Finished),
            BattlePhase::EnemyTurn => {
                return Err(ActionRejected::WrongPhase { phase: self.phase });
            }
            BattlePhase::PlayerTurn => self.player_turn(action, rng, &mut events)?,
            BattlePhase::CaptureChoice => self.capture_choice(action, rng, &mut events)?,
        }
        log::trace!("action {action:?} accepted; phase now {}", self.phase);
        Ok(self.commit(events))
    }

    /// Run the active hostile's turn: flee check, then a uniformly chosen skill.
    ///
    /// # Errors
    ///
    /// Returns [`ActionRejected`] outside of the enemy turn.
    pub fn resolve_enemy_turn(
        &mut self,
        rng: &mut dyn RandomSource,
    ) -> Result<StepReport, ActionRejected> {
        match self.phase {
            BattlePhase::EnemyTurn => {}
            BattlePhase::Finished(_) => return Err(ActionRejected::Finished),
            phase => return Err(ActionRejected::WrongPhase { phase }),
        }
        let mut events = StepEvents::new(self.step + 1);
        self.turns = self.turns.saturating_add(1);

        let hostile = &mut self.hostiles[self.target];
        hostile.turns_survived = hostile.turns_survived.saturating_add(1);
        if flee::should_flee(hostile, &self.config.flee, rng) {
            self.fates[self.target] = HostileFate::Fled;
            events.emit(
                EventKind::HostileFled,
                LOG_HOSTILE_FLED,
                Side::Hostile.tag(),
                json!({
                    "hostile": self.hostiles[self.target].instance_id,
                    "card": self.hostiles[self.target].card.id,
                }),
            );
            self.advance_target(rng, &mut events);
            return Ok(self.commit(events));
        }

        let usable = self.hostiles[self.target].usable_skills();
        let Some(skill_idx) = rng.index(usable.len()).and_then(|i| usable.get(i).copied()) else {
            events.emit(
                EventKind::HostileHesitated,
                LOG_HOSTILE_HESITATED,
                Side::Hostile.tag(),
                json!({ "hostile": self.hostiles[self.target].instance_id }),
            );
            self.phase = BattlePhase::PlayerTurn;
            return Ok(self.commit(events));
        };

        let skill = {
            let attacker = &mut self.hostiles[self.target];
            attacker.skills[skill_idx].consume();
            attacker.skills[skill_idx].clone()
        };
        let outcome = self.resolver.resolve(
            &self.hostiles[self.target],
            &self.squad[self.active],
            &skill,
            rng,
        );
        self.apply_hit(Side::Hostile, &skill, outcome, &mut events);

        if self.squad.iter().all(BattleParticipant::is_defeated) {
            self.finish(EncounterResult::Defeat, &mut events);
        } else {
            self.phase = BattlePhase::PlayerTurn;
        }
        Ok(self.commit(events))
    }

    /// Snapshot of everything the caller needs to persist.
    #[must_use]
    pub fn summary(&self) -> EncounterSummary {
        EncounterSummary {
            result: self.phase.result(),
            difficulty: self.difficulty,
            roster_health: self
                .squad
                .iter()
                .map(|member| RosterHealth {
                    instance_id: member.instance_id.clone(),
                    card_id: member.card.id.clone(),
                    current_health: member.current_health,
                    max_health: member.max_health,
                })
                .collect(),
            hostiles: self
                .hostiles
                .iter()
                .zip(&self.fates)
                .map(|(hostile, fate)| HostileOutcome {
                    instance_id: hostile.instance_id.clone(),
                    card_id: hostile.card.id.clone(),
                    fate: *fate,
                })
                .collect(),
            captured: self.captured.clone(),
            drops: self.drops.clone(),
            consumed_items: self.consumed.clone(),
            turns: self.turns,
        }
    }

    fn commit(&mut self, events: StepEvents) -> StepReport {
        self.step = events.step;
        self.log.extend(events.events.iter().cloned());
        StepReport {
            phase: self.phase,
            events: events.events,
        }
    }

    fn player_turn(
        &mut self,
        action: BattleAction,
        rng: &mut dyn RandomSource,
        events: &mut StepEvents,
    ) -> Result<(), ActionRejected> {
        match action {
            BattleAction::UseSkill { skill } => self.use_skill(skill, rng, events),
            BattleAction::Switch { slot } => self.switch(slot, events),
            BattleAction::UseItem(item) => self.use_item(item, rng, events),
            BattleAction::DeclineCapture => Err(ActionRejected::WrongPhase { phase: self.phase }),
            BattleAction::Flee => {
                self.finish(EncounterResult::Fled, events);
                Ok(())
            }
        }
    }

    fn capture_choice(
        &mut self,
        action: BattleAction,
        rng: &mut dyn RandomSource,
        events: &mut StepEvents,
    ) -> Result<(), ActionRejected> {
        match action {
            BattleAction::UseItem(item) => {
                let Some(tool) = item.capture_strength() else {
                    return Err(ActionRejected::WrongPhase { phase: self.phase });
                };
                self.ensure_item(item)?;
                self.throw_capture(item, tool, rng, events);
                Ok(())
            }
            BattleAction::DeclineCapture => {
                self.fates[self.target] = HostileFate::Defeated;
                events.emit(
                    EventKind::CaptureDeclined,
                    LOG_CAPTURE_DECLINED,
                    Side::Player.tag(),
                    json!({ "hostile": self.hostiles[self.target].instance_id }),
                );
                self.advance_target(rng, events);
                Ok(())
            }
            _ => Err(ActionRejected::WrongPhase { phase: self.phase }),
        }
    }

    fn use_skill(
        &mut self,
        index: usize,
        rng: &mut dyn RandomSource,
        events: &mut StepEvents,
    ) -> Result<(), ActionRejected> {
        let attacker = &self.squad[self.active];
        if attacker.is_defeated() {
            return Err(ActionRejected::ActiveDefeated);
        }
        let chosen = attacker
            .skills
            .get(index)
            .ok_or(ActionRejected::UnknownSkill(index))?;
        if chosen.is_exhausted() {
            return Err(ActionRejected::SkillExhausted {
                skill: chosen.name.clone(),
            });
        }

        let skill = {
            let attacker = &mut self.squad[self.active];
            attacker.skills[index].consume();
            attacker.skills[index].clone()
        };
        let outcome = self.resolver.resolve(
            &self.squad[self.active],
            &self.hostiles[self.target],
            &skill,
            rng,
        );
        self.apply_hit(Side::Player, &skill, outcome, events);

        self.phase = if self.hostiles[self.target].is_defeated() {
            BattlePhase::CaptureChoice
        } else {
            BattlePhase::EnemyTurn
        };
        Ok(())
    }

    fn switch(&mut self, slot: usize, events: &mut StepEvents) -> Result<(), ActionRejected> {
        let incoming = self
            .squad
            .get(slot)
            .ok_or(ActionRejected::UnknownSlot(slot))?;
        if slot == self.active {
            return Err(ActionRejected::AlreadyActive(slot));
        }
        if incoming.is_defeated() {
            return Err(ActionRejected::SlotDefeated(slot));
        }
        let from = self.active;
        self.active = slot;
        events.emit(
            EventKind::Switched,
            LOG_SWITCHED,
            Side::Player.tag(),
            json!({
                "from": self.squad[from].instance_id,
                "to": self.squad[slot].instance_id,
            }),
        );
        self.phase = BattlePhase::EnemyTurn;
        Ok(())
    }

    fn use_item(
        &mut self,
        item: ItemKind,
        rng: &mut dyn RandomSource,
        events: &mut StepEvents,
    ) -> Result<(), ActionRejected> {
        self.ensure_item(item)?;
        if self.squad[self.active].is_defeated() {
            return Err(ActionRejected::ActiveDefeated);
        }
        if let Some(tool) = item.capture_strength() {
            let target = &self.hostiles[self.target];
            if !capture::is_weakened(target, &self.config.capture) {
                return Err(ActionRejected::TargetNotWeakened {
                    fraction: target.health_fraction(),
                });
            }
            self.throw_capture(item, tool, rng, events);
            return Ok(());
        }

        self.spend_item(item);
        let effects = self.config.items;
        let member = &mut self.squad[self.active];
        let healed = match item {
            ItemKind::Potion => member.heal(effects.potion_heal),
            ItemKind::SuperPotion => member.heal(effects.super_potion_heal),
            _ => member.heal_full(),
        };
        events.emit(
            EventKind::ItemUsed,
            LOG_ITEM_USED,
            Side::Player.tag(),
            json!({
                "item": item,
                "target": member.instance_id,
                "healed": healed,
                "health": member.current_health,
            }),
        );
        self.phase = BattlePhase::EnemyTurn;
        Ok(())
    }

    fn ensure_item(&self, item: ItemKind) -> Result<(), ActionRejected> {
        if self.items.count(item) == 0 {
            return Err(ActionRejected::ItemUnavailable(item));
        }
        Ok(())
    }

    fn spend_item(&mut self, item: ItemKind) {
        if self.items.take(item) {
            self.consumed.add(item, 1);
        }
    }

    fn throw_capture(
        &mut self,
        item: ItemKind,
        tool: ToolStrength,
        rng: &mut dyn RandomSource,
        events: &mut StepEvents,
    ) {
        self.spend_item(item);
        let target = &self.hostiles[self.target];
        let attempt = capture::attempt(target, tool, &self.config.capture, rng);
        let hostile_id = target.instance_id.clone();
        let card_id = target.card.id.clone();

        events.emit(
            EventKind::CaptureThrown,
            LOG_CAPTURE_THROWN,
            Side::Player.tag(),
            json!({
                "item": item,
                "tool": tool,
                "hostile": hostile_id,
                "probability": attempt.probability,
            }),
        );
        for shake in 1..=attempt.shake_count {
            events.emit(
                EventKind::CaptureShake,
                LOG_CAPTURE_SHAKE,
                Side::Player.tag(),
                json!({ "shake": shake }),
            );
        }

        if attempt.success {
            log::debug!("captured {card_id} with {tool:?}");
            self.fates[self.target] = HostileFate::Captured;
            self.captured.push(card_id.clone());
            events.emit(
                EventKind::CaptureSucceeded,
                LOG_CAPTURE_SUCCEEDED,
                Side::Player.tag(),
                json!({ "hostile": hostile_id, "card": card_id }),
            );
            self.advance_target(rng, events);
        } else {
            events.emit(
                EventKind::CaptureFailed,
                LOG_CAPTURE_FAILED,
                Side::Player.tag(),
                json!({ "hostile": hostile_id, "shakes": attempt.shake_count }),
            );
            // A downed target stays down, so the choice is offered again.
            if self.phase == BattlePhase::PlayerTurn {
                self.phase = BattlePhase::EnemyTurn;
            }
        }
    }

    fn apply_hit(
        &mut self,
        attacker_side: Side,
        skill: &Skill,
        outcome: DamageOutcome,
        events: &mut StepEvents,
    ) {
        let (attacker, defender) = match attacker_side {
            Side::Player => (&self.squad[self.active], &mut self.hostiles[self.target]),
            Side::Hostile => (&self.hostiles[self.target], &mut self.squad[self.active]),
        };
        let tag = attacker_side.tag();
        events.emit(
            EventKind::SkillUsed,
            LOG_SKILL_USED,
            tag,
            json!({
                "attacker": attacker.instance_id,
                "skill": skill.id,
                "target": defender.instance_id,
                "uses_remaining": skill.uses_remaining,
            }),
        );
        if outcome.is_dodged {
            events.emit(
                EventKind::Dodged,
                LOG_DODGED,
                tag,
                json!({ "target": defender.instance_id }),
            );
            return;
        }
        if outcome.is_critical {
            events.emit(
                EventKind::CriticalHit,
                LOG_CRITICAL_HIT,
                tag,
                json!({ "attacker": attacker.instance_id }),
            );
        }
        let taken = defender.apply_damage(outcome.damage);
        events.emit(
            EventKind::DamageDealt,
            LOG_DAMAGE_DEALT,
            tag,
            json!({
                "target": defender.instance_id,
                "damage": taken,
                "health": defender.current_health,
                "max_health": defender.max_health,
            }),
        );
        if defender.is_defeated() {
            events.emit(
                EventKind::EntityDefeated,
                LOG_ENTITY_DEFEATED,
                tag,
                json!({ "target": defender.instance_id, "card": defender.card.id }),
            );
        }
    }

    fn announce_target(&self, events: &mut StepEvents) {
        let hostile = &self.hostiles[self.target];
        events.emit(
            EventKind::HostileAppeared,
            LOG_HOSTILE_APPEARED,
            Side::Hostile.tag(),
            json!({
                "hostile": hostile.instance_id,
                "card": hostile.card.id,
                "tier": hostile.tier(),
                "health": hostile.current_health,
            }),
        );
    }

    /// Move to the next unresolved hostile, or finish with a victory.
    fn advance_target(&mut self, rng: &mut dyn RandomSource, events: &mut StepEvents) {
        if let Some(next) = self
            .fates
            .iter()
            .position(|fate| *fate == HostileFate::Unresolved)
        {
            self.target = next;
            self.phase = BattlePhase::PlayerTurn;
            self.announce_target(events);
            return;
        }
        let (rewards, traces) = self
            .drop_tables
            .roll_drops_with_trace(self.difficulty, rng);
        self.drops.extend(rewards);
        self.drop_traces = traces;
        self.finish(EncounterResult::Victory, events);
    }

    fn finish(&mut self, result: EncounterResult, events: &mut StepEvents) {
        self.phase = BattlePhase::Finished(result);
        log::debug!(
            "encounter finished: {result:?} after {} turns, {} captured",
            self.turns,
            self.captured.len()
        );
        events.emit(
            EventKind::EncounterFinished,
            result.ui_key(),
            "encounter",
            json!({
                "result": result,
                "captured": self.captured,
                "drops": self.drops,
                "drop_traces": self.drop_traces,
            }),
        );
    }
}

fn clamp_health(mut participant: BattleParticipant) -> BattleParticipant {
    participant.current_health = participant.current_health.min(participant.max_health);
    participant
}
