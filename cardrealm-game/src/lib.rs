//! Cardrealm Draw & Encounter Engine
//!
//! Pure computation for the collectible-card game: weighted rarity rolls with
//! pity and batch guarantees, and the turn-based battle/capture simulator.
//! Rendering, timing, audio and persistence belong to the host application;
//! every call here returns a fully resolved result from explicit inputs and an
//! injected random source.

pub mod battle;
pub mod catalog;
pub mod constants;
pub mod data;
pub mod events;
pub mod gacha;
pub mod items;
pub mod numbers;
pub mod pity;
pub mod rates;
pub mod rng;
pub mod selector;
pub mod tier;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// Re-export commonly used types
pub use battle::{
    ActionRejected, BattleAction, BattleConfig, BattleEncounter, BattleParticipant, BattlePhase,
    DamageOutcome, DamageResolver, DropTables, EncounterResult, EncounterSetup,
    EncounterSetupError, EncounterSummary, HostileFate, StandardDamage, StepReport,
    ToolStrength,
};
pub use catalog::{CardCatalog, CardDefinition, CardId, CardKind};
pub use data::{AssetError, StaticDataLoader};
pub use events::{DecisionTrace, EngineEvent, EventId, EventKind};
pub use gacha::{BatchRequest, DrawSource, DrawTrace, GachaResult, perform_batch, pull_cost};
pub use items::{ItemBag, ItemKind};
pub use pity::PityState;
pub use rates::{RateTable, RateTableError};
pub use rng::{RandomSource, RngBundle, RngSource, ScriptedSource};
pub use selector::select_card;
pub use tier::RarityTier;

/// Trait for abstracting data loading operations.
/// Hosts provide catalog and tuning data from wherever they keep it.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the card catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<CardCatalog, Self::Error>;

    /// Load a named configuration asset (`rates`, `drops`, `battle`).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned;
}

/// One owned card brought into battle, with its saved health if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub card_id: CardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_health: Option<u32>,
}

impl RosterEntry {
    #[must_use]
    pub fn new(card_id: impl Into<CardId>, current_health: Option<u32>) -> Self {
        Self {
            card_id: card_id.into(),
            current_health,
        }
    }
}

/// Main engine facade wiring loaded content into the gacha and battle systems.
#[derive(Debug, Clone)]
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
    catalog: CardCatalog,
    rates: RateTable,
    drop_tables: DropTables,
    battle: BattleConfig,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Load all content through `data_loader`.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if any asset cannot be loaded.
    pub fn new(data_loader: L) -> Result<Self, L::Error> {
        let catalog = data_loader.load_catalog()?;
        let rates = data_loader.load_config(data::CONFIG_RATES)?;
        let drop_tables = data_loader.load_config(data::CONFIG_DROPS)?;
        let battle = data_loader.load_config(data::CONFIG_BATTLE)?;
        Ok(Self {
            data_loader,
            catalog,
            rates,
            drop_tables,
            battle,
        })
    }

    #[must_use]
    pub const fn data_loader(&self) -> &L {
        &self.data_loader
    }

    #[must_use]
    pub const fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rates(&self) -> &RateTable {
        &self.rates
    }

    #[must_use]
    pub const fn battle_config(&self) -> &BattleConfig {
        &self.battle
    }

    #[must_use]
    pub const fn drop_tables(&self) -> &DropTables {
        &self.drop_tables
    }

    /// Replace the rate table, e.g. with user-edited values.
    pub fn set_rates(&mut self, rates: RateTable) {
        if let Err(err) = rates.validate() {
            log::warn!("using rate table that fails validation: {err}");
        }
        self.rates = rates;
    }

    /// Draw a batch against the loaded catalog and rate table.
    pub fn pull<R: RandomSource + ?Sized>(
        &self,
        batch_size: usize,
        pity: PityState,
        owned_top: &BTreeSet<CardId>,
        rng: &mut R,
    ) -> GachaResult {
        perform_batch(
            &BatchRequest {
                batch_size,
                rates: &self.rates,
                pity,
                owned_top,
                catalog: &self.catalog,
            },
            rng,
        )
    }

    /// Build the player squad from roster entries, generate hostiles for
    /// `realm`, and start the encounter.
    ///
    /// # Errors
    ///
    /// Returns an error if a roster card is unknown or not a creature, or the
    /// resulting squad cannot start a battle.
    pub fn start_encounter(
        &self,
        realm: RarityTier,
        roster: &[RosterEntry],
        items: ItemBag,
        rng: &mut dyn RandomSource,
    ) -> Result<BattleEncounter, EncounterSetupError> {
        let mut squad = Vec::with_capacity(roster.len());
        for (slot, entry) in roster.iter().enumerate() {
            let card = self
                .catalog
                .get(&entry.card_id)
                .ok_or_else(|| EncounterSetupError::UnknownCard(entry.card_id.clone()))?;
            if !card.is_creature() {
                return Err(EncounterSetupError::NotACreature(card.id.clone()));
            }
            squad.push(battle::build_player(
                format!("player-{slot}"),
                card.clone(),
                entry.current_health,
                &self.battle,
                rng,
            ));
        }
        let hostiles = battle::generate_hostile_squad(realm, &self.catalog, &self.battle, rng);
        BattleEncounter::new(
            EncounterSetup {
                difficulty: realm,
                squad,
                hostiles,
                items,
            },
            self.battle.clone(),
            self.drop_tables.clone(),
        )
    }
}
