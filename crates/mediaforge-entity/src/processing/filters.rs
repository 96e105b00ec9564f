//! Composable audio effect toggles.

use serde::{Deserialize, Serialize};

/// Independently toggleable audio effects. Composition order is fixed by the
/// planner so identical configurations always produce identical commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFilterSet {
    /// Slow playback to 80% tempo.
    #[serde(default)]
    pub slowed: bool,
    /// Echo/reverb effect.
    #[serde(default)]
    pub reverb: bool,
    /// Rotating spatial ("8D") effect.
    #[serde(default)]
    pub eight_d: bool,
    /// Volume gain multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    /// Bass gain in dB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass: Option<i32>,
    /// Treble gain in dB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treble: Option<i32>,
}

impl AudioFilterSet {
    /// Whether any effect is enabled.
    pub fn any_enabled(&self) -> bool {
        self.slowed
            || self.reverb
            || self.eight_d
            || self.volume.is_some()
            || self.bass.is_some()
            || self.treble.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inert() {
        assert!(!AudioFilterSet::default().any_enabled());
    }

    #[test]
    fn test_partial_deserialization() {
        let set: AudioFilterSet =
            serde_json::from_value(serde_json::json!({"reverb": true})).expect("deserialize");
        assert!(set.reverb);
        assert!(!set.slowed);
        assert!(set.any_enabled());
    }
}
