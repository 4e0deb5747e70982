//! Concrete card selection for a rolled tier.
use std::collections::BTreeSet;

use crate::catalog::{CardCatalog, CardDefinition, CardId};
use crate::rng::RandomSource;
use crate::tier::RarityTier;

/// Pick one card of `tier` from the catalog.
///
/// Top-tier picks prefer cards missing from `owned_top`, falling back to the
/// whole tier pool once every card is owned. An empty pool yields the
/// catalog's fallback card.
pub fn select_card<R: RandomSource + ?Sized>(
    tier: RarityTier,
    catalog: &CardCatalog,
    owned_top: &BTreeSet<CardId>,
    rng: &mut R,
) -> CardDefinition {
    let pool = catalog.by_tier(tier);
    if pool.is_empty() {
        log::debug!("no catalog cards for tier {tier}; substituting fallback card");
        return catalog.fallback_card();
    }

    let candidates = if tier.is_top() {
        let unowned: Vec<&CardDefinition> = pool
            .iter()
            .copied()
            .filter(|card| !owned_top.contains(&card.id))
            .collect();
        if unowned.is_empty() {
            log::trace!("every {tier} card already owned; allowing duplicates");
            pool
        } else {
            unowned
        }
    } else {
        pool
    };

    rng.index(candidates.len())
        .and_then(|idx| candidates.get(idx))
        .map_or_else(|| catalog.fallback_card(), |card| (*card).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    fn catalog() -> CardCatalog {
        CardCatalog::from_cards(vec![
            CardDefinition::new("b1", "Moss Mite", RarityTier::Base),
            CardDefinition::new("b2", "Pebble Newt", RarityTier::Base),
            CardDefinition::new("l1", "Solar Wyrm", RarityTier::Legendary),
            CardDefinition::new("l2", "Tide Sovereign", RarityTier::Legendary),
        ])
    }

    #[test]
    fn picks_uniformly_within_tier() {
        let catalog = catalog();
        let owned = BTreeSet::new();
        let mut low = ScriptedSource::constant(0.1);
        let mut high = ScriptedSource::constant(0.9);
        assert_eq!(select_card(RarityTier::Base, &catalog, &owned, &mut low).id, "b1");
        assert_eq!(select_card(RarityTier::Base, &catalog, &owned, &mut high).id, "b2");
    }

    #[test]
    fn top_tier_prefers_unowned_cards() {
        let catalog = catalog();
        let owned: BTreeSet<CardId> = [String::from("l1")].into_iter().collect();
        let mut rng = ScriptedSource::constant(0.0);
        let card = select_card(RarityTier::Legendary, &catalog, &owned, &mut rng);
        assert_eq!(card.id, "l2");
    }

    #[test]
    fn fully_owned_top_tier_allows_duplicates() {
        let catalog = catalog();
        let owned: BTreeSet<CardId> = ["l1", "l2"].into_iter().map(String::from).collect();
        let card = select_card(
            RarityTier::Legendary,
            &catalog,
            &owned,
            &mut ScriptedSource::constant(0.0),
        );
        assert_eq!(card.tier, RarityTier::Legendary);
    }

    #[test]
    fn empty_pool_returns_fallback_card() {
        let catalog = catalog();
        let card = select_card(
            RarityTier::Epic,
            &catalog,
            &BTreeSet::new(),
            &mut ScriptedSource::constant(0.5),
        );
        assert_eq!(card.id, "b1");
        let empty = select_card(
            RarityTier::Epic,
            &CardCatalog::empty(),
            &BTreeSet::new(),
            &mut ScriptedSource::constant(0.5),
        );
        assert_eq!(empty, CardDefinition::placeholder());
    }
}
