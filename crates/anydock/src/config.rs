//! Dock behaviour tuning.

use serde::{Deserialize, Serialize};

use crate::node::DividerRatio;

/// Default fraction of a target's extent treated as an edge drop band.
pub const DEFAULT_EDGE_BAND: f64 = 0.25;

const MIN_EDGE_BAND: f64 = 0.05;
const MAX_EDGE_BAND: f64 = 0.45;
const MAX_DIVIDER_THICKNESS: u16 = 4;

/// Behaviour knobs for one dock tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockConfig {
    /// Fraction of the target bounds, measured from each edge, that maps to an
    /// edge drop region instead of `Center`.
    pub edge_band: f64,
    /// Divider ratio given to freshly created splits.
    pub default_divider_ratio: f64,
    /// Whether a `Center` drop selects the inserted item.
    ///
    /// When false the previously selected item keeps the selection.
    pub focus_dropped_item: bool,
    /// Cells reserved for the divider when solving a layout.
    pub divider_thickness: u16,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            edge_band: DEFAULT_EDGE_BAND,
            default_divider_ratio: DividerRatio::EVEN.get(),
            focus_dropped_item: true,
            divider_thickness: 1,
        }
    }
}

impl DockConfig {
    #[must_use]
    pub fn with_edge_band(mut self, edge_band: f64) -> Self {
        self.edge_band = edge_band;
        self.validated()
    }

    #[must_use]
    pub fn with_divider_ratio(mut self, ratio: f64) -> Self {
        self.default_divider_ratio = ratio;
        self.validated()
    }

    #[must_use]
    pub fn focus_dropped_item(mut self, focus: bool) -> Self {
        self.focus_dropped_item = focus;
        self
    }

    #[must_use]
    pub fn with_divider_thickness(mut self, thickness: u16) -> Self {
        self.divider_thickness = thickness;
        self.validated()
    }

    /// Load config from environment variables.
    ///
    /// Reads:
    /// - `ANYDOCK_EDGE_BAND`: edge band fraction
    /// - `ANYDOCK_DIVIDER_RATIO`: divider ratio for new splits
    /// - `ANYDOCK_FOCUS_DROPPED`: "1"/"true" or "0"/"false"
    /// - `ANYDOCK_DIVIDER_THICKNESS`: divider cells
    ///
    /// Unparsable values are ignored; values are clamped to valid ranges.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DockConfig::from_env`] with an injectable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("ANYDOCK_EDGE_BAND")
            && let Ok(band) = val.trim().parse::<f64>()
        {
            config.edge_band = band;
        }

        if let Some(val) = lookup("ANYDOCK_DIVIDER_RATIO")
            && let Ok(ratio) = val.trim().parse::<f64>()
        {
            config.default_divider_ratio = ratio;
        }

        if let Some(val) = lookup("ANYDOCK_FOCUS_DROPPED") {
            let val = val.trim();
            if val == "1" || val.eq_ignore_ascii_case("true") {
                config.focus_dropped_item = true;
            } else if val == "0" || val.eq_ignore_ascii_case("false") {
                config.focus_dropped_item = false;
            }
        }

        if let Some(val) = lookup("ANYDOCK_DIVIDER_THICKNESS")
            && let Ok(thickness) = val.trim().parse::<u16>()
        {
            config.divider_thickness = thickness;
        }

        config.validated()
    }

    /// Parse a JSON config document; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    /// Clamp every field into its valid range.
    ///
    /// - `edge_band` to `[0.05, 0.45]` (NaN resets to the default)
    /// - `default_divider_ratio` via [`DividerRatio::new`]
    /// - `divider_thickness` to at most 4 cells
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.edge_band = if self.edge_band.is_nan() {
            DEFAULT_EDGE_BAND
        } else {
            self.edge_band.clamp(MIN_EDGE_BAND, MAX_EDGE_BAND)
        };
        self.default_divider_ratio = DividerRatio::new(self.default_divider_ratio).get();
        self.divider_thickness = self.divider_thickness.min(MAX_DIVIDER_THICKNESS);
        self
    }

    #[must_use]
    pub fn divider_ratio(&self) -> DividerRatio {
        DividerRatio::new(self.default_divider_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn defaults_when_env_is_empty() {
        assert_eq!(DockConfig::from_lookup(env(&[])), DockConfig::default());
    }

    #[test]
    fn env_values_are_parsed_and_clamped() {
        let config = DockConfig::from_lookup(env(&[
            ("ANYDOCK_EDGE_BAND", "0.9"),
            ("ANYDOCK_DIVIDER_RATIO", " 0.3 "),
            ("ANYDOCK_FOCUS_DROPPED", "FALSE"),
            ("ANYDOCK_DIVIDER_THICKNESS", "12"),
        ]));
        assert_eq!(config.edge_band, MAX_EDGE_BAND);
        assert_eq!(config.default_divider_ratio, 0.3);
        assert!(!config.focus_dropped_item);
        assert_eq!(config.divider_thickness, MAX_DIVIDER_THICKNESS);
    }

    #[test]
    fn garbage_env_values_are_ignored() {
        let config = DockConfig::from_lookup(env(&[
            ("ANYDOCK_EDGE_BAND", "wide"),
            ("ANYDOCK_FOCUS_DROPPED", "maybe"),
            ("ANYDOCK_DIVIDER_THICKNESS", "-1"),
        ]));
        assert_eq!(config, DockConfig::default());
    }

    #[test]
    fn json_fills_missing_fields() {
        let config = DockConfig::from_json(r#"{"edge_band": 0.01}"#).expect("valid json");
        assert_eq!(config.edge_band, MIN_EDGE_BAND);
        assert!(config.focus_dropped_item);
        assert_eq!(config.divider_thickness, 1);
        assert!(DockConfig::from_json("{not json").is_err());
    }
}
