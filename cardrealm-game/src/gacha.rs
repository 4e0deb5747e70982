//! Batch draw orchestration: rarity roll, pity and the batch floor.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::{CardCatalog, CardDefinition, CardId};
use crate::constants::{BATCH_FLOOR_SIZE, BATCH_FLOOR_TIER, PITY_FORCED_TIER, PULL_COST_PER_DRAW};
use crate::pity::PityState;
use crate::rates::RateTable;
use crate::rng::RandomSource;
use crate::selector::select_card;
use crate::tier::RarityTier;

/// Inputs for one pull batch. Everything is borrowed read-only; the pity state
/// is copied in and the updated value is returned in [`GachaResult`].
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    pub batch_size: usize,
    pub rates: &'a RateTable,
    pub pity: PityState,
    pub owned_top: &'a BTreeSet<CardId>,
    pub catalog: &'a CardCatalog,
}

/// What decided the tier of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawSource {
    Natural,
    PityForced,
    BatchFloor,
}

/// Per-draw explainability record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawTrace {
    /// Zero-based position within the batch.
    pub index: usize,
    /// Unit draw fed to the rarity roll; absent for pity-forced draws.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    /// Tier produced by the roll or the pity rule, before the batch floor.
    pub rolled_tier: RarityTier,
    pub source: DrawSource,
    pub card_id: CardId,
    pub pity_after: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GachaResult {
    /// Drawn cards in draw order.
    pub cards: Vec<CardDefinition>,
    /// Highest tier in `cards`, used to pick the reveal sequence.
    pub highest_tier: Option<RarityTier>,
    pub new_pity: PityState,
    pub draws: Vec<DrawTrace>,
}

/// Price of a batch in premium currency. Charging is left to the caller.
#[must_use]
pub fn pull_cost(batch_size: usize) -> u64 {
    u64::try_from(batch_size)
        .unwrap_or(u64::MAX)
        .saturating_mul(PULL_COST_PER_DRAW)
}

/// Run `request.batch_size` sequential draws.
///
/// Pity and the batch-local owned set thread through the loop, so later draws
/// see the effects of earlier ones. A batch of [`BATCH_FLOOR_SIZE`] with no
/// card at or above [`BATCH_FLOOR_TIER`] after nine draws has its last draw
/// raised to that tier.
pub fn perform_batch<R: RandomSource + ?Sized>(
    request: &BatchRequest<'_>,
    rng: &mut R,
) -> GachaResult {
    let mut pity = request.pity;
    let mut owned = request.owned_top.clone();
    let mut cards = Vec::with_capacity(request.batch_size);
    let mut draws = Vec::with_capacity(request.batch_size);

    for index in 0..request.batch_size {
        pity = pity.advance();
        let forced = pity.should_force_upgrade();
        let (roll, rolled_tier, mut source) = if forced {
            log::debug!(
                "pity counter reached {}; forcing {PITY_FORCED_TIER}",
                pity.counter
            );
            (None, PITY_FORCED_TIER, DrawSource::PityForced)
        } else {
            let unit = rng.next_unit();
            (Some(unit), request.rates.roll_tier(unit), DrawSource::Natural)
        };

        let mut tier = rolled_tier;
        if floor_applies(request.batch_size, index, &cards) && !tier.meets_batch_floor() {
            log::debug!("batch floor raised draw {index} from {tier} to {BATCH_FLOOR_TIER}");
            tier = BATCH_FLOOR_TIER;
            source = DrawSource::BatchFloor;
        }

        let card = select_card(tier, request.catalog, &owned, rng);
        if forced || card.tier.clears_pity() {
            pity = pity.reset();
        }
        if card.tier.is_top() {
            owned.insert(card.id.clone());
        }

        draws.push(DrawTrace {
            index,
            roll,
            rolled_tier,
            source,
            card_id: card.id.clone(),
            pity_after: pity.counter,
        });
        cards.push(card);
    }

    GachaResult {
        highest_tier: cards.iter().map(|card| card.tier).max(),
        cards,
        new_pity: pity,
        draws,
    }
}

/// A tenth draw already at Rare or above is kept as rolled.
fn floor_applies(batch_size: usize, index: usize, drawn: &[CardDefinition]) -> bool {
    batch_size == BATCH_FLOOR_SIZE
        && index + 1 == BATCH_FLOOR_SIZE
        && !drawn.iter().any(|card| card.tier.meets_batch_floor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    fn catalog() -> CardCatalog {
        CardCatalog::from_cards(
            RarityTier::ALL
                .iter()
                .flat_map(|tier| {
                    (0..2).map(move |n| {
                        CardDefinition::new(format!("{tier}-{n}"), format!("{tier} {n}"), *tier)
                    })
                })
                .collect(),
        )
    }

    fn request<'a>(
        batch_size: usize,
        rates: &'a RateTable,
        pity: PityState,
        owned: &'a BTreeSet<CardId>,
        catalog: &'a CardCatalog,
    ) -> BatchRequest<'a> {
        BatchRequest {
            batch_size,
            rates,
            pity,
            owned_top: owned,
            catalog,
        }
    }

    #[test]
    fn pity_forces_epic_and_resets() {
        let catalog = catalog();
        let rates = RateTable::standard();
        let owned = BTreeSet::new();
        let req = request(1, &rates, PityState::new(79), &owned, &catalog);
        let result = perform_batch(&req, &mut ScriptedSource::constant(0.99));
        assert_eq!(result.cards[0].tier, RarityTier::Epic);
        assert_eq!(result.draws[0].source, DrawSource::PityForced);
        assert_eq!(result.draws[0].roll, None);
        assert_eq!(result.new_pity.counter, 0);
    }

    #[test]
    fn natural_elite_draw_resets_pity() {
        let catalog = catalog();
        let rates = RateTable::standard();
        let owned = BTreeSet::new();
        let req = request(2, &rates, PityState::new(10), &owned, &catalog);
        // Legendary roll, card pick, then a base roll and pick.
        let mut rng = ScriptedSource::new([0.0, 0.0, 0.9, 0.0]);
        let result = perform_batch(&req, &mut rng);
        assert_eq!(result.cards[0].tier, RarityTier::Legendary);
        assert_eq!(result.draws[0].pity_after, 0);
        assert_eq!(result.new_pity.counter, 1);
        assert_eq!(result.highest_tier, Some(RarityTier::Legendary));
    }

    #[test]
    fn floor_raises_tenth_draw_only_when_needed() {
        let catalog = catalog();
        let rates = RateTable::standard();
        let owned = BTreeSet::new();
        let req = request(10, &rates, PityState::default(), &owned, &catalog);
        let result = perform_batch(&req, &mut ScriptedSource::constant(0.9));
        assert_eq!(result.cards.len(), 10);
        assert!(result.cards[..9].iter().all(|c| c.tier == RarityTier::Base));
        assert_eq!(result.cards[9].tier, RarityTier::Rare);
        assert_eq!(result.draws[9].source, DrawSource::BatchFloor);
        assert_eq!(result.draws[9].rolled_tier, RarityTier::Base);

        let single = request(9, &rates, PityState::default(), &owned, &catalog);
        let result = perform_batch(&single, &mut ScriptedSource::constant(0.9));
        assert!(result.cards.iter().all(|c| c.tier == RarityTier::Base));
    }

    #[test]
    fn top_tier_draws_avoid_batch_duplicates() {
        let catalog = catalog();
        let rates = RateTable::from_pairs([(RarityTier::Legendary, 1.0)]);
        let owned = BTreeSet::new();
        let req = request(2, &rates, PityState::default(), &owned, &catalog);
        let result = perform_batch(&req, &mut ScriptedSource::constant(0.0));
        assert_ne!(result.cards[0].id, result.cards[1].id);
    }

    #[test]
    fn empty_batch_returns_input_pity() {
        let catalog = catalog();
        let rates = RateTable::standard();
        let owned = BTreeSet::new();
        let req = request(0, &rates, PityState::new(5), &owned, &catalog);
        let result = perform_batch(&req, &mut ScriptedSource::constant(0.5));
        assert!(result.cards.is_empty());
        assert_eq!(result.highest_tier, None);
        assert_eq!(result.new_pity.counter, 5);
    }

    #[test]
    fn cost_scales_per_draw() {
        assert_eq!(pull_cost(1), 160);
        assert_eq!(pull_cost(10), 1_600);
    }
}
