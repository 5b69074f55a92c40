use serde::{Deserialize, Serialize};

/// Hit-test thresholds, as fractions of a sibling's height from its top edge.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct ReorderTuning {
    /// The dragged item's bottom edge must pass this line to move below a sibling.
    pub enter_threshold: f64,
    /// The dragged item's top edge must be above this line to move above a sibling.
    pub leave_threshold: f64,
}

impl Default for ReorderTuning {
    fn default() -> Self {
        Self {
            enter_threshold: 0.6,
            leave_threshold: 0.4,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct AnimationTiming {
    /// Note entrance/exit and input margin.
    pub item_ms: u32,
    /// Sibling and decoy slide after a swap, and the drop into place.
    pub swap_ms: u32,
    /// Decoy appearance on grab.
    pub lift_ms: u32,
    /// Delay before a blurred note leaves edit mode.
    pub blur_exit_ms: u32,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            item_ms: 200,
            swap_ms: 200,
            lift_ms: 300,
            blur_exit_ms: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SaveTiming {
    pub debounce_ms: u32,
    pub throttle_ms: u32,
}

impl Default for SaveTiming {
    fn default() -> Self {
        Self {
            debounce_ms: 10,
            throttle_ms: 1000,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    pub reorder: ReorderTuning,
    pub animation: AnimationTiming,
    pub saves: SaveTiming,
    pub log_level: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            reorder: ReorderTuning::default(),
            animation: AnimationTiming::default(),
            saves: SaveTiming::default(),
            log_level: "info".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Read `window.NOTES_CONFIG`, falling back to defaults.
    ///
    /// Any subset of fields may be given; unknown fields are ignored.
    pub fn from_window() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let Some(raw) = window.get("NOTES_CONFIG") else {
            return Self::default();
        };
        if raw.is_undefined() || !raw.is_object() {
            return Self::default();
        }

        let json = match js_sys::JSON::stringify(&raw) {
            Ok(s) => String::from(s),
            Err(_) => {
                log::warn!("event=config_load module=config status=fallback reason=stringify");
                return Self::default();
            }
        };

        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("event=config_load module=config status=fallback error={e}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuned_constants() {
        let c = WidgetConfig::default();
        assert_eq!(c.reorder.enter_threshold, 0.6);
        assert_eq!(c.reorder.leave_threshold, 0.4);
        assert_eq!(c.animation.item_ms, 200);
        assert_eq!(c.animation.lift_ms, 300);
        assert_eq!(c.saves.debounce_ms, 10);
        assert_eq!(c.saves.throttle_ms, 1000);
        assert_eq!(c.log_level, "info");
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let c = WidgetConfig::from_json(r#"{"saves": {"throttle_ms": 500}, "log_level": "debug"}"#);
        assert_eq!(c.saves.throttle_ms, 500);
        assert_eq!(c.saves.debounce_ms, 10);
        assert_eq!(c.reorder, ReorderTuning::default());
        assert_eq!(c.log_level, "debug");
    }

    #[test]
    fn test_invalid_json_falls_back_to_defaults() {
        assert_eq!(WidgetConfig::from_json("[1, 2"), WidgetConfig::default());
        assert_eq!(
            WidgetConfig::from_json(r#"{"reorder": "fast"}"#),
            WidgetConfig::default()
        );
    }
}
