//! Structured events emitted by the encounter engine.
//!
//! Events describe what happened mechanically; the `ui_key` and `payload` are
//! hints for the presentation layer, which owns all animation and audio.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type EventTagSet = SmallVec<[String; 2]>;

/// Stable, deterministic identifier for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// One-based count of accepted actions when the event occurred.
    pub step: u32,
    /// Sequence number within that step.
    pub seq: u16,
}

impl EventId {
    #[must_use]
    pub const fn new(step: u32, seq: u16) -> Self {
        Self { step, seq }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    EncounterStarted,
    HostileAppeared,
    SkillUsed,
    Dodged,
    CriticalHit,
    DamageDealt,
    EntityDefeated,
    HostileFled,
    HostileHesitated,
    Switched,
    ItemUsed,
    CaptureThrown,
    CaptureShake,
    CaptureSucceeded,
    CaptureFailed,
    CaptureDeclined,
    EncounterFinished,
}

impl EventKind {
    #[must_use]
    pub const fn severity(self) -> EventSeverity {
        match self {
            Self::CriticalHit | Self::EntityDefeated | Self::HostileFled => EventSeverity::Warning,
            Self::EncounterFinished | Self::CaptureSucceeded => EventSeverity::Critical,
            _ => EventSeverity::Info,
        }
    }

    #[must_use]
    pub const fn surface_hint(self) -> UiSurfaceHint {
        match self {
            Self::EncounterFinished => UiSurfaceHint::Modal,
            Self::CaptureSucceeded | Self::CaptureFailed | Self::HostileFled => {
                UiSurfaceHint::Toast
            }
            _ => UiSurfaceHint::Log,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// Hint for how the UI should surface an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSurfaceHint {
    Log,
    Toast,
    Modal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub severity: EventSeverity,
    /// Stable tags describing the event (e.g., `hostile`, `player`).
    #[serde(default)]
    pub tags: EventTagSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_surface_hint: Option<UiSurfaceHint>,
    /// i18n key for presentation-layer rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_key: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl EngineEvent {
    #[must_use]
    pub fn new(id: EventId, kind: EventKind, ui_key: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            severity: kind.severity(),
            tags: EventTagSet::new(),
            ui_surface_hint: Some(kind.surface_hint()),
            ui_key: Some(ui_key.into()),
            payload: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Explainability telemetry for weighted selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Identifier for the selection pool (e.g., `drops.rare`).
    pub pool_id: String,
    /// Unit draw scaled by the pool's total weight.
    pub roll: f64,
    pub candidates: Vec<WeightedCandidate>,
    pub chosen_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub id: String,
    pub weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_carries_kind_defaults_and_payload() {
        let event = EngineEvent::new(EventId::new(3, 1), EventKind::CaptureSucceeded, "log.x")
            .with_tag("hostile")
            .with_payload(json!({ "card": "c1" }));
        assert_eq!(event.severity, EventSeverity::Critical);
        assert_eq!(event.ui_surface_hint, Some(UiSurfaceHint::Toast));
        assert_eq!(event.tags.as_slice(), ["hostile".to_string()]);

        let json = serde_json::to_string(&event).unwrap();
        let back: EngineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn null_payload_is_omitted() {
        let event = EngineEvent::new(EventId::new(1, 0), EventKind::SkillUsed, "log.y");
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("payload").is_none());
        assert_eq!(value["kind"], "skill_used");
    }
}
