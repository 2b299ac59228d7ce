//! Error taxonomy for heatmap construction.

use crate::angles::AngleKey;
use thiserror::Error;

/// Errors raised while building or rebuilding a heatmap.
///
/// Construction errors abort the running rebuild and leave the previous
/// sector set in place; they are reported to the caller rather than patched
/// over with neighboring data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HeatmapError {
    /// A sampled angle pair has no entry in the uncertainty table.
    #[error("no uncertainty entry for angle pair {key}")]
    AngleLookup { key: AngleKey },

    /// The angular step does not evenly divide the hemisphere.
    #[error("angular step {step}\u{b0} must be positive and divide 90\u{b0}")]
    InvalidStep { step: i32 },

    /// A statistic channel reports an empty or inverted value range, which
    /// makes span/diameter interpolation undefined.
    #[error("degenerate bounds for {channel}: min {min} is not below max {max}")]
    DegenerateBounds {
        channel: &'static str,
        min: f64,
        max: f64,
    },
}
