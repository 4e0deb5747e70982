//! Static card catalog.
use serde::{Deserialize, Serialize};

use crate::items::ItemKind;
use crate::tier::RarityTier;

pub(crate) const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/data/catalog.json");

pub type CardId = String;

/// Whether a card fights in encounters or grants a consumable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    #[default]
    Creature,
    Item(ItemKind),
}

/// Immutable card identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,
    pub display_name: String,
    pub tier: RarityTier,
    #[serde(default)]
    pub image_ref: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: CardKind,
}

impl CardDefinition {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, tier: RarityTier) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            tier,
            image_ref: String::new(),
            description: String::new(),
            kind: CardKind::Creature,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: CardKind) -> Self {
        self.kind = kind;
        self
    }

    /// Fixed stand-in shown when a catalog cannot supply a card.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            id: String::from("placeholder"),
            display_name: String::from("Unknown Card"),
            tier: RarityTier::LOWEST,
            image_ref: String::new(),
            description: String::from("Shown when the catalog has no card for a tier."),
            kind: CardKind::Creature,
        }
    }

    #[must_use]
    pub const fn is_creature(&self) -> bool {
        matches!(self.kind, CardKind::Creature)
    }

    #[must_use]
    pub const fn item(&self) -> Option<ItemKind> {
        match self.kind {
            CardKind::Item(item) => Some(item),
            CardKind::Creature => None,
        }
    }
}

/// Container for the full, read-only card catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardCatalog {
    pub cards: Vec<CardDefinition>,
}

impl CardCatalog {
    #[must_use]
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }

    /// Load a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn from_cards(cards: Vec<CardDefinition>) -> Self {
        Self { cards }
    }

    /// Load the catalog bundled with the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CATALOG_DATA).unwrap_or_else(|err| {
            log::warn!("bundled catalog failed to parse: {err}");
            Self::empty()
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CardDefinition> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Every card of `tier`, in catalog order.
    #[must_use]
    pub fn by_tier(&self, tier: RarityTier) -> Vec<&CardDefinition> {
        self.cards.iter().filter(|card| card.tier == tier).collect()
    }

    /// Creature cards whose tier is in `tiers`.
    #[must_use]
    pub fn creatures_in(&self, tiers: &[RarityTier]) -> Vec<&CardDefinition> {
        self.cards
            .iter()
            .filter(|card| card.is_creature() && tiers.contains(&card.tier))
            .collect()
    }

    /// Card substituted when a tier pool is empty: the first catalog entry,
    /// or the placeholder for an empty catalog.
    #[must_use]
    pub fn fallback_card(&self) -> CardDefinition {
        self.cards
            .first()
            .cloned()
            .unwrap_or_else(CardDefinition::placeholder)
    }

    /// Catalog id of the card granting `item`, if any.
    #[must_use]
    pub fn item_card(&self, item: ItemKind) -> Option<&CardDefinition> {
        self.cards.iter().find(|card| card.item() == Some(item))
    }
}
