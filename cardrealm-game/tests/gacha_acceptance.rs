use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;

use cardrealm_game::constants::PITY_THRESHOLD;
use cardrealm_game::{
    BatchRequest, CardCatalog, DrawSource, PityState, RandomSource, RarityTier, RateTable,
    RngSource, ScriptedSource, perform_batch, select_card,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SAMPLE_SIZE: usize = 100_000;
const TOLERANCE: f64 = 0.005;

fn chacha(seed: u64) -> RngSource<ChaCha8Rng> {
    RngSource::new(ChaCha8Rng::seed_from_u64(seed))
}

fn frequency(count: usize, total: usize) -> f64 {
    let count = f64::from(u32::try_from(count).expect("count fits"));
    let total = f64::from(u32::try_from(total).expect("total fits"));
    count / total
}

#[test]
fn tier_rolls_converge_to_configured_rates() {
    let table = RateTable::standard();
    let mut rng = chacha(0x5EED);
    let mut counts: BTreeMap<RarityTier, usize> = BTreeMap::new();
    for _ in 0..SAMPLE_SIZE {
        *counts.entry(table.roll_tier(rng.next_unit())).or_default() += 1;
    }
    for tier in RarityTier::ALL {
        let observed = frequency(counts.get(&tier).copied().unwrap_or(0), SAMPLE_SIZE);
        let expected = table.rate(tier);
        assert!(
            (observed - expected).abs() <= TOLERANCE,
            "{tier} drifted: observed {observed:.4}, expected {expected:.4}"
        );
    }
}

#[test]
fn pity_guarantees_elite_within_threshold() {
    let catalog = CardCatalog::load_from_static();
    let owned = BTreeSet::new();
    for rates in [
        RateTable::standard(),
        RateTable::from_pairs([(RarityTier::Base, 1.0)]),
    ] {
        let mut rng = chacha(0x0D0D);
        let mut pity = PityState::default();
        let mut since_elite = 0_u32;
        for _ in 0..5_000 {
            let result = perform_batch(
                &BatchRequest {
                    batch_size: 1,
                    rates: &rates,
                    pity,
                    owned_top: &owned,
                    catalog: &catalog,
                },
                &mut rng,
            );
            pity = result.new_pity;
            since_elite += 1;
            if result.cards[0].tier.is_elite() {
                since_elite = 0;
            }
            assert!(since_elite < PITY_THRESHOLD, "pity failed to trigger");
            assert!(pity.counter < PITY_THRESHOLD);
        }
    }
}

#[test]
fn base_only_table_forces_exactly_at_threshold() {
    let catalog = CardCatalog::load_from_static();
    let rates = RateTable::from_pairs([(RarityTier::Base, 1.0)]);
    let result = perform_batch(
        &BatchRequest {
            batch_size: 80,
            rates: &rates,
            pity: PityState::default(),
            owned_top: &BTreeSet::new(),
            catalog: &catalog,
        },
        &mut chacha(3),
    );
    let forced: Vec<usize> = result
        .draws
        .iter()
        .filter(|draw| draw.source == DrawSource::PityForced)
        .map(|draw| draw.index)
        .collect();
    assert_eq!(forced, vec![79]);
    assert_eq!(result.cards[79].tier, RarityTier::Epic);
    assert_eq!(result.new_pity.counter, 0);
}

#[test]
fn ten_batches_always_contain_rare_or_better() {
    let catalog = CardCatalog::load_from_static();
    let tables = [
        RateTable::standard(),
        RateTable::from_pairs([(RarityTier::Base, 1.0)]),
        RateTable::from_pairs([(RarityTier::Base, 0.5), (RarityTier::Uncommon, 0.5)]),
    ];
    for (seed, rates) in (0_u64..).zip(&tables) {
        let mut rng = chacha(seed);
        let mut pity = PityState::default();
        let mut owned = BTreeSet::new();
        for _ in 0..200 {
            let result = perform_batch(
                &BatchRequest {
                    batch_size: 10,
                    rates,
                    pity,
                    owned_top: &owned,
                    catalog: &catalog,
                },
                &mut rng,
            );
            assert_eq!(result.cards.len(), 10);
            assert!(
                result
                    .highest_tier
                    .is_some_and(|tier| tier >= RarityTier::Rare),
                "batch without rare: {:?}",
                result.draws
            );
            pity = result.new_pity;
            owned.extend(
                result
                    .cards
                    .iter()
                    .filter(|card| card.tier.is_top())
                    .map(|card| card.id.clone()),
            );
        }
    }
}

#[test]
fn top_tier_selection_exhausts_unowned_before_repeating() {
    let catalog = CardCatalog::load_from_static();
    let top_count = catalog.by_tier(RarityTier::Legendary).len();
    let mut rng = chacha(0xD00D);
    let mut owned = BTreeSet::new();
    for pick in 0..1_000 {
        let card = select_card(RarityTier::Legendary, &catalog, &owned, &mut rng);
        assert_eq!(card.tier, RarityTier::Legendary);
        if pick < top_count {
            assert!(!owned.contains(&card.id), "repeat before collection complete");
        }
        owned.insert(card.id);
    }
    assert_eq!(owned.len(), top_count);
}

#[test]
fn last_unowned_top_card_is_always_chosen() {
    let catalog = CardCatalog::load_from_static();
    let pool = catalog.by_tier(RarityTier::Legendary);
    let (remaining, rest) = pool.split_last().expect("legendary pool is not empty");
    let mut owned: BTreeSet<_> = rest.iter().map(|card| card.id.clone()).collect();
    let mut rng = chacha(0x1A57);

    for _ in 0..1_000 {
        let card = select_card(RarityTier::Legendary, &catalog, &owned, &mut rng);
        assert_eq!(card.id, remaining.id);
    }

    owned.insert(remaining.id.clone());
    for _ in 0..100 {
        let card = select_card(RarityTier::Legendary, &catalog, &owned, &mut rng);
        assert_eq!(card.tier, RarityTier::Legendary);
        assert!(owned.contains(&card.id));
    }
}

#[test]
fn lower_tiers_allow_duplicates() {
    let catalog = CardCatalog::load_from_static();
    let mut rng = ScriptedSource::constant(0.0);
    let owned = BTreeSet::new();
    let first = select_card(RarityTier::Base, &catalog, &owned, &mut rng);
    let second = select_card(RarityTier::Base, &catalog, &owned, &mut rng);
    assert_eq!(first, second);
}

#[test]
fn pity_at_threshold_minus_one_forces_elite_and_resets() {
    let catalog = CardCatalog::load_from_static();
    let result = perform_batch(
        &BatchRequest {
            batch_size: 1,
            rates: &RateTable::standard(),
            pity: PityState::new(79),
            owned_top: &BTreeSet::new(),
            catalog: &catalog,
        },
        &mut chacha(79),
    );
    assert!(result.cards[0].tier >= RarityTier::Epic);
    assert_eq!(result.draws[0].source, DrawSource::PityForced);
    assert_eq!(result.new_pity.counter, 0);
}
