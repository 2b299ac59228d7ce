//! Hemisphere sample grid and angle arithmetic.
//!
//! The viewing directions of one hemisphere are sampled on a fixed angular
//! step: `theta` is the elevation away from the pole in `[-90, 90]`, `phi`
//! the azimuth around it. Angles at exactly ±90° are clamped to ±85° before
//! any lookup or camera computation, because the ±90° direction is parallel
//! to the view plane and its azimuth is undefined.

use crate::error::HeatmapError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default angular step between samples, in degrees.
pub const DEFAULT_STEP_DEG: i32 = 15;

/// Angle substituted for ±90° by [`clamp_near_pole`].
pub const POLE_CLAMP_DEG: f64 = 85.0;

/// Which half of the viewing sphere a heatmap covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    /// Upper half; rendered vertically mirrored so that stacked top/bottom
    /// views meet edge-to-edge.
    Top,
    /// Lower half; its azimuth range is the top range shifted by 180°.
    Bottom,
}

/// Folds a naive `0..360` angle into the signed `(-180, 180]` range.
///
/// Idempotent: already-canonical angles pass through unchanged.
pub fn canonicalize(angle: f64) -> f64 {
    if angle > 180.0 {
        angle - 360.0
    } else {
        angle
    }
}

/// Clamps an angle sitting exactly on ±90° (within integer rounding) to
/// ±85°, keeping it off the degenerate parallel-to-view-plane direction.
///
/// Must run before any table lookup or azimuth/elevation computation.
pub fn clamp_near_pole(angle: f64) -> f64 {
    if angle.abs().round() == 90.0 {
        POLE_CLAMP_DEG * angle.signum()
    } else {
        angle
    }
}

/// The inclusive `-90..=90` sample sequence for a given step.
pub fn sample_range(step_deg: i32) -> Vec<i32> {
    (-90..=90).step_by(step_deg as usize).collect()
}

/// Canonical lookup key for one sampled direction.
///
/// Construction applies [`canonicalize`] and [`clamp_near_pole`] to both
/// components, so a key always names exactly one table cell. The canonical
/// string form is `"theta-phi"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AngleKey {
    pub theta: i32,
    pub phi: i32,
}

impl AngleKey {
    pub fn new(theta: f64, phi: f64) -> Self {
        Self {
            theta: clamp_near_pole(canonicalize(theta)).round() as i32,
            phi: clamp_near_pole(canonicalize(phi)).round() as i32,
        }
    }
}

impl fmt::Display for AngleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.theta, self.phi)
    }
}

/// Discrete sampling of one hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleGrid {
    step: i32,
    hemisphere: Hemisphere,
}

impl AngleGrid {
    /// Creates a grid with the given step. The step must be positive and
    /// divide 90° so that rings land on whole samples.
    pub fn new(step_deg: i32, hemisphere: Hemisphere) -> Result<Self, HeatmapError> {
        if step_deg <= 0 || 90 % step_deg != 0 {
            return Err(HeatmapError::InvalidStep { step: step_deg });
        }
        Ok(Self {
            step: step_deg,
            hemisphere,
        })
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    /// Elevation samples, identical for both hemispheres.
    pub fn theta_range(&self) -> Vec<i32> {
        sample_range(self.step)
    }

    /// Azimuth samples. The bottom hemisphere reuses the top range shifted
    /// by 180° and folded back into the signed range.
    pub fn phi_range(&self) -> Vec<i32> {
        match self.hemisphere {
            Hemisphere::Top => sample_range(self.step),
            Hemisphere::Bottom => sample_range(self.step)
                .into_iter()
                .map(|phi| canonicalize(f64::from(phi + 180)) as i32)
                .collect(),
        }
    }

    /// Number of concentric rings, counting the central pole circle.
    pub fn num_rings(&self) -> usize {
        (90 / self.step + 1) as usize
    }

    /// Angular slots per non-pole ring.
    pub fn sectors_per_ring(&self) -> usize {
        (self.num_rings() - 1) * 4
    }

    /// Angular span of one slot, in degrees.
    pub fn sector_span_deg(&self) -> f64 {
        360.0 / self.sectors_per_ring() as f64
    }

    /// The sample rendered as the central full circle.
    pub fn pole_sample(&self) -> (i32, i32) {
        match self.hemisphere {
            Hemisphere::Top => (0, 0),
            Hemisphere::Bottom => (0, 180),
        }
    }

    /// Whether an arbitrary (already canonicalized) direction falls inside
    /// this hemisphere's theta/phi window.
    pub fn contains(&self, theta: f64, phi: f64) -> bool {
        if !(-90.0..=90.0).contains(&theta) {
            return false;
        }
        match self.hemisphere {
            Hemisphere::Top => (-90.0..=90.0).contains(&phi),
            Hemisphere::Bottom => (-90.0..=90.0).contains(&wrap_deg(phi - 180.0)),
        }
    }

    /// Camera-facing `(azimuth, elevation)` pair for a sampled direction.
    ///
    /// Both inputs are canonicalized and pole-clamped before the
    /// trigonometry runs. Bottom-hemisphere elevations carry a +180° offset
    /// so the two hemispheres never alias to the same camera orientation.
    /// At `theta == 0` the azimuth collapses to zero and the elevation is
    /// the clamped azimuth sample itself.
    pub fn direction_angles(&self, theta: f64, phi: f64) -> (f64, f64) {
        let tc = clamp_near_pole(canonicalize(theta));
        let pc = clamp_near_pole(canonicalize(phi));
        if tc == 0.0 {
            return (0.0, pc);
        }

        let (tr, pr) = (tc.to_radians(), pc.to_radians());
        let azimuth = (pr.cos() * tr.tan()).atan().to_degrees();
        let mut elevation = (pr.sin() * tr.sin()).asin().to_degrees();
        if self.hemisphere == Hemisphere::Bottom {
            elevation += 180.0;
        }
        (azimuth, elevation)
    }
}

/// Folds any angle into `[-180, 180)`.
fn wrap_deg(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}
