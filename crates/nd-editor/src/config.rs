//! Tunables of the interaction layer.

use kurbo::Vec2;
use nd_core::geometry::{CURVE_HIT_SAMPLES, CURVE_HIT_THRESHOLD, PORT_HIT_RADIUS};
use nd_render::HitTolerance;
use serde::{Deserialize, Serialize};

/// Every knob the editor exposes. Missing keys take their default, so a
/// host can ship a partial settings object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    /// Pick radius around a port, world units.
    pub port_radius: f64,
    /// Pick distance around a connection curve, world units.
    pub curve_threshold: f64,
    pub curve_samples: usize,
    /// Node width can't be dragged below this.
    pub min_node_width: f64,
    /// Group width and height can't be dragged below this.
    pub min_group_size: f64,
    /// Shift applied to pasted entities.
    pub paste_offset: (f64, f64),
    /// Maximum undo depth.
    pub history_depth: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            port_radius: PORT_HIT_RADIUS,
            curve_threshold: CURVE_HIT_THRESHOLD,
            curve_samples: CURVE_HIT_SAMPLES,
            min_node_width: 100.0,
            min_group_size: 100.0,
            paste_offset: (20.0, 20.0),
            history_depth: 100,
        }
    }
}

impl InteractionConfig {
    pub fn hit_tolerance(&self) -> HitTolerance {
        HitTolerance {
            port_radius: self.port_radius,
            curve_threshold: self.curve_threshold,
            curve_samples: self.curve_samples,
        }
    }

    pub fn paste_offset(&self) -> Vec2 {
        Vec2::new(self.paste_offset.0, self.paste_offset.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let cfg: InteractionConfig =
            serde_json::from_str(r#"{"portRadius": 12, "historyDepth": 5}"#).unwrap();
        assert_eq!(cfg.port_radius, 12.0);
        assert_eq!(cfg.history_depth, 5);
        assert_eq!(cfg.min_node_width, 100.0);
        assert_eq!(cfg.paste_offset(), Vec2::new(20.0, 20.0));
        assert_eq!(cfg.hit_tolerance().curve_samples, 50);
    }
}
