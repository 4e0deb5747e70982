//! Consumable items usable during an encounter.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::battle::capture::ToolStrength;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    WeakCapsule,
    MediumCapsule,
    StrongCapsule,
    MasterCapsule,
    Potion,
    SuperPotion,
    MaxPotion,
}

impl ItemKind {
    pub const ALL: [Self; 7] = [
        Self::WeakCapsule,
        Self::MediumCapsule,
        Self::StrongCapsule,
        Self::MasterCapsule,
        Self::Potion,
        Self::SuperPotion,
        Self::MaxPotion,
    ];

    /// Capture tool strength, or `None` for non-capture items.
    #[must_use]
    pub const fn capture_strength(self) -> Option<ToolStrength> {
        match self {
            Self::WeakCapsule => Some(ToolStrength::Weak),
            Self::MediumCapsule => Some(ToolStrength::Medium),
            Self::StrongCapsule => Some(ToolStrength::Strong),
            Self::MasterCapsule => Some(ToolStrength::Guaranteed),
            Self::Potion | Self::SuperPotion | Self::MaxPotion => None,
        }
    }

    #[must_use]
    pub const fn is_capture_tool(self) -> bool {
        self.capture_strength().is_some()
    }

    #[must_use]
    pub const fn for_strength(strength: ToolStrength) -> Self {
        match strength {
            ToolStrength::Weak => Self::WeakCapsule,
            ToolStrength::Medium => Self::MediumCapsule,
            ToolStrength::Strong => Self::StrongCapsule,
            ToolStrength::Guaranteed => Self::MasterCapsule,
        }
    }

    #[must_use]
    pub const fn asset_key(self) -> &'static str {
        match self {
            Self::WeakCapsule => "weak_capsule",
            Self::MediumCapsule => "medium_capsule",
            Self::StrongCapsule => "strong_capsule",
            Self::MasterCapsule => "master_capsule",
            Self::Potion => "potion",
            Self::SuperPotion => "super_potion",
            Self::MaxPotion => "max_potion",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.asset_key())
    }
}

/// Read-only snapshot of the caller's item counts, decremented locally as the
/// encounter consumes items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemBag(BTreeMap<ItemKind, u32>);

impl ItemBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, item: ItemKind, count: u32) -> Self {
        self.set(item, count);
        self
    }

    pub fn set(&mut self, item: ItemKind, count: u32) {
        if count == 0 {
            self.0.remove(&item);
        } else {
            self.0.insert(item, count);
        }
    }

    #[must_use]
    pub fn count(&self, item: ItemKind) -> u32 {
        self.0.get(&item).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item: ItemKind, count: u32) {
        self.set(item, self.count(item).saturating_add(count));
    }

    /// Remove one unit; returns false when none remain.
    pub fn take(&mut self, item: ItemKind) -> bool {
        let current = self.count(item);
        if current == 0 {
            return false;
        }
        self.set(item, current - 1);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u32)> + '_ {
        self.0.iter().map(|(item, count)| (*item, *count))
    }
}

impl FromIterator<(ItemKind, u32)> for ItemBag {
    fn from_iter<T: IntoIterator<Item = (ItemKind, u32)>>(iter: T) -> Self {
        let mut bag = Self::new();
        for (item, count) in iter {
            bag.add(item, count);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_decrements_until_empty() {
        let mut bag = ItemBag::new().with(ItemKind::Potion, 2);
        assert!(bag.take(ItemKind::Potion));
        assert!(bag.take(ItemKind::Potion));
        assert!(!bag.take(ItemKind::Potion));
        assert_eq!(bag.count(ItemKind::Potion), 0);
        assert_eq!(bag.iter().count(), 0);
    }

    #[test]
    fn capsules_map_to_strengths() {
        for item in ItemKind::ALL {
            if let Some(strength) = item.capture_strength() {
                assert_eq!(ItemKind::for_strength(strength), item);
            }
        }
        assert!(!ItemKind::MaxPotion.is_capture_tool());
    }

    #[test]
    fn bag_serializes_as_string_keyed_map() {
        let bag: ItemBag = [(ItemKind::WeakCapsule, 3), (ItemKind::WeakCapsule, 1)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(json, r#"{"weak_capsule":4}"#);
    }
}
