//! Per-direction uncertainty statistics.
//!
//! The table is the immutable product of the offline preprocessing pass: one
//! entry per sampled direction of the full sphere, keyed by the canonical
//! angle pair, carrying the primary scalar (mean uncertainty) and the
//! secondary extremes (standard deviation and maximum). Bounds are computed
//! once over the whole grid and shared by every view of the same channel.

use crate::angles::AngleKey;
use crate::error::HeatmapError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which secondary statistic the inner sub-sectors encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatChannel {
    StandardDeviation,
    Maximum,
}

impl StatChannel {
    pub fn label(&self) -> &'static str {
        match self {
            StatChannel::StandardDeviation => "standard deviation",
            StatChannel::Maximum => "maximum",
        }
    }
}

/// Statistics stored for one sampled direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellStats {
    /// Mean uncertainty over the direction's rendered pixels.
    pub mean: f64,
    /// Standard deviation of the same pixels.
    pub std_dev: f64,
    /// Maximum observed value.
    pub maximum: f64,
}

impl CellStats {
    pub fn extreme(&self, channel: StatChannel) -> f64 {
        match channel {
            StatChannel::StandardDeviation => self.std_dev,
            StatChannel::Maximum => self.maximum,
        }
    }
}

/// Inclusive value range of one statistic across the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelBounds {
    pub min: f64,
    pub max: f64,
}

/// Immutable lookup table of per-direction statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UncertaintyTable {
    cells: HashMap<AngleKey, CellStats>,
    value_max: f64,
    std_bounds: ChannelBounds,
    max_bounds: ChannelBounds,
}

impl UncertaintyTable {
    /// Builds a table by evaluating `stats` at every (theta, phi) pair of
    /// the given ranges. Keys are canonicalized and pole-clamped, matching
    /// the lookup path, and the per-channel bounds are derived from the
    /// produced cells.
    pub fn from_fn<F>(theta_range: &[i32], phi_range: &[i32], mut stats: F) -> Self
    where
        F: FnMut(i32, i32) -> CellStats,
    {
        let mut cells = HashMap::new();
        let mut value_max = f64::NEG_INFINITY;
        let mut std_bounds = (f64::INFINITY, f64::NEG_INFINITY);
        let mut max_bounds = (f64::INFINITY, f64::NEG_INFINITY);

        for &theta in theta_range {
            for &phi in phi_range {
                let cell = stats(theta, phi);
                value_max = value_max.max(cell.mean);
                std_bounds = (std_bounds.0.min(cell.std_dev), std_bounds.1.max(cell.std_dev));
                max_bounds = (max_bounds.0.min(cell.maximum), max_bounds.1.max(cell.maximum));
                cells.insert(AngleKey::new(f64::from(theta), f64::from(phi)), cell);
            }
        }

        Self {
            cells,
            value_max: if value_max.is_finite() { value_max } else { 0.0 },
            std_bounds: ChannelBounds {
                min: std_bounds.0.min(std_bounds.1),
                max: std_bounds.1.max(std_bounds.0),
            },
            max_bounds: ChannelBounds {
                min: max_bounds.0.min(max_bounds.1),
                max: max_bounds.1.max(max_bounds.0),
            },
        }
    }

    /// Looks up the statistics for a canonical angle pair.
    ///
    /// A missing entry is an error, never substituted with a neighbor.
    pub fn lookup(&self, key: AngleKey) -> Result<&CellStats, HeatmapError> {
        self.cells
            .get(&key)
            .ok_or(HeatmapError::AngleLookup { key })
    }

    /// Upper end of the primary-value range used by the colormap; the lower
    /// end is always zero.
    pub fn value_max(&self) -> f64 {
        self.value_max
    }

    pub fn extreme_bounds(&self, channel: StatChannel) -> ChannelBounds {
        match channel {
            StatChannel::StandardDeviation => self.std_bounds,
            StatChannel::Maximum => self.max_bounds,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::sample_range;

    fn full_sphere() -> Vec<i32> {
        (-180..=180).step_by(15).collect()
    }

    fn test_table() -> UncertaintyTable {
        let range = full_sphere();
        UncertaintyTable::from_fn(&range, &range, |theta, phi| CellStats {
            mean: f64::from(theta.abs() + phi.abs()) / 360.0,
            std_dev: f64::from(phi.abs()) / 180.0,
            maximum: 1.0 + f64::from(phi.abs()) / 180.0,
        })
    }

    #[test]
    fn lookup_hits_every_hemisphere_sample() {
        let table = test_table();
        for theta in sample_range(15) {
            for phi in sample_range(15) {
                let key = AngleKey::new(f64::from(theta), f64::from(phi));
                assert!(table.lookup(key).is_ok(), "missing {key}");
            }
        }
    }

    #[test]
    fn pole_clamped_keys_resolve() {
        let table = test_table();
        // ±90 is stored and queried as ±85, so both sides agree.
        let key = AngleKey::new(90.0, -90.0);
        assert_eq!(key, AngleKey { theta: 85, phi: -85 });
        assert!(table.lookup(key).is_ok());
    }

    #[test]
    fn missing_entry_is_an_error() {
        let table = test_table();
        let key = AngleKey::new(7.0, 7.0);
        assert!(matches!(
            table.lookup(key),
            Err(HeatmapError::AngleLookup { key: k }) if k == key
        ));
    }

    #[test]
    fn bounds_cover_the_grid() {
        let table = test_table();
        assert_eq!(table.value_max(), 1.0);
        let std = table.extreme_bounds(StatChannel::StandardDeviation);
        assert_eq!((std.min, std.max), (0.0, 1.0));
        let max = table.extreme_bounds(StatChannel::Maximum);
        assert_eq!((max.min, max.max), (1.0, 2.0));
    }
}
