//! Per-player pity counter.
use serde::{Deserialize, Serialize};

use crate::constants::PITY_THRESHOLD;

/// Draws since the last qualifying result. Owned and persisted by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PityState {
    pub counter: u32,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

const fn default_threshold() -> u32 {
    PITY_THRESHOLD
}

impl Default for PityState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PityState {
    #[must_use]
    pub const fn new(counter: u32) -> Self {
        Self {
            counter,
            threshold: PITY_THRESHOLD,
        }
    }

    #[must_use]
    pub const fn advance(self) -> Self {
        Self {
            counter: self.counter.saturating_add(1),
            ..self
        }
    }

    #[must_use]
    pub const fn should_force_upgrade(&self) -> bool {
        self.counter >= self.threshold
    }

    #[must_use]
    pub const fn reset(self) -> Self {
        Self { counter: 0, ..self }
    }

    /// Draws left before the next forced upgrade.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.threshold.saturating_sub(self.counter)
    }
}
