//! Injectable randomness for every resolver in the engine.
//!
//! All probabilistic decisions reduce to uniform unit draws so that tests can
//! script exact outcomes with [`ScriptedSource`], while live play adapts any
//! `rand` generator through [`RngSource`].
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;
use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;

use crate::numbers::{floor_f64_to_u32, unit_to_index};

/// Source of uniform draws consumed by the resolvers.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Bernoulli trial: true when the next draw falls below `probability`.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    /// Uniform integer in `[min, max]`; returns `min` when the range is empty.
    fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = f64::from(max - min) + 1.0;
        let offset = floor_f64_to_u32(self.next_unit() * span).min(max - min);
        min + offset
    }

    /// Uniform index into a collection of `len` items.
    fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(unit_to_index(self.next_unit(), len))
    }
}

/// Adapter exposing any `rand` generator as a [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: RngCore> RngSource<R> {
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.rng
    }
}

impl RngSource<SmallRng> {
    /// Convenience constructor for a seeded `SmallRng` stream.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Replays a fixed list of unit draws, then repeats `fallback`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    draws: VecDeque<f64>,
    fallback: f64,
    consumed: usize,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback: 0.0,
            consumed: 0,
        }
    }

    /// A source that always returns `value`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(std::iter::empty()).with_fallback(value)
    }

    #[must_use]
    pub const fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of draws handed out so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        self.consumed = self.consumed.saturating_add(1);
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Stream type handed out by [`RngBundle`].
pub type StreamSource = RngSource<CountingRng<SmallRng>>;

/// Independent, domain-separated RNG streams derived from one user seed.
///
/// Separating the streams keeps gacha pulls from shifting battle outcomes
/// when both are replayed from the same seed.
#[derive(Debug)]
pub struct RngBundle {
    gacha: RefCell<StreamSource>,
    battle: RefCell<StreamSource>,
    roster: RefCell<StreamSource>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        let stream =
            |tag: &[u8]| RngSource::new(CountingRng::new(derive_stream_seed(seed, tag)));
        Self {
            gacha: RefCell::new(stream(b"gacha".as_slice())),
            battle: RefCell::new(stream(b"battle".as_slice())),
            roster: RefCell::new(stream(b"roster".as_slice())),
        }
    }

    /// Stream used for rarity rolls and card selection.
    #[must_use]
    pub fn gacha(&self) -> RefMut<'_, StreamSource> {
        self.gacha.borrow_mut()
    }

    /// Stream used for damage, flee, capture and loot resolution.
    #[must_use]
    pub fn battle(&self) -> RefMut<'_, StreamSource> {
        self.battle.borrow_mut()
    }

    /// Stream used for hostile squad generation and skill loadouts.
    #[must_use]
    pub fn roster(&self) -> RefMut<'_, StreamSource> {
        self.roster.borrow_mut()
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length, so construction cannot fail here.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
