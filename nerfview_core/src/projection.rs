//! Disk projections for hemisphere samples.
//!
//! A sample's on-screen position is polar: the azimuth `phi` gives the angle
//! around the disk center and the elevation `theta` gives the radial
//! distance. Two radial laws are supported. Equidistant keeps the radius
//! linear in `|theta|`, so angular distances read directly off the disk.
//! Equal-area spreads the rings so every annulus covers the same screen
//! area, which keeps the statistical density of the samples comparable
//! across rings.
//!
//! Both laws map the pole sample to the exact center and share ring indices,
//! so sector ordering is identical under a projection switch.

use crate::angles::{AngleGrid, Hemisphere};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Exponent of the equal-area radial law.
pub const AREA_FRACTION: f64 = 0.5;

/// The radial law mapping elevation to disk radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Projection {
    /// Radius grows linearly with `|theta|`; outermost sample at radius 1.
    Equidistant,
    /// Radius grows with `(|theta| / 90)^(1/2)`, compressing outer rings.
    EqualArea,
}

/// One sample's projected position.
///
/// `position` is the Cartesian embedding in the scene frame: origin at the
/// disk center, x to the right, y upward, normalized so the disk rim sits at
/// distance 1. The polar pair re-derives `angle` from the embedded point via
/// `atan2`; `radius` keeps the sign of the source `theta`, which folds
/// negative elevations through the origin. `ring` carries the ring index
/// explicitly so no consumer has to reverse-engineer it from the sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub position: Point2<f64>,
    pub radius: f64,
    pub angle: f64,
    pub ring: usize,
}

impl Projection {
    /// Normalized radius for an absolute elevation in `[0, 90]`.
    pub fn radial(&self, theta_abs: f64) -> f64 {
        let t = (theta_abs / 90.0).clamp(0.0, 1.0);
        match self {
            Projection::Equidistant => t,
            Projection::EqualArea => t.powf(AREA_FRACTION),
        }
    }

    /// Projects one direction onto the disk of the given grid's hemisphere.
    ///
    /// The top hemisphere is mirrored vertically so stacked top/bottom views
    /// meet edge-to-edge.
    pub fn project(&self, theta: f64, phi: f64, grid: &AngleGrid) -> ProjectedPoint {
        let r = self.radial(theta.abs());
        let signed = if theta < 0.0 { -r } else { r };

        let alpha = phi.to_radians();
        let x = signed * alpha.cos();
        let mut y = signed * alpha.sin();
        if grid.hemisphere() == Hemisphere::Top {
            y = -y;
        }

        let position = Point2::new(x, y);
        let magnitude = x.hypot(y);
        ProjectedPoint {
            position,
            radius: if theta < 0.0 { -magnitude } else { magnitude },
            angle: y.atan2(x),
            ring: (theta.abs() / f64::from(grid.step())).round() as usize,
        }
    }

    /// Outer radius of every ring, innermost (pole circle) first.
    ///
    /// The boundary of ring `k` sits half a step beyond its sample
    /// elevation, i.e. at `(k + 1/2) * step`, so sample centers land inside
    /// their annulus under both laws. The outermost boundary is exactly 1.
    pub fn ring_boundaries(&self, num_rings: usize) -> Vec<f64> {
        let denom = num_rings as f64 - 0.5;
        (0..num_rings)
            .map(|k| {
                let u = (k as f64 + 0.5) / denom;
                match self {
                    Projection::Equidistant => u,
                    Projection::EqualArea => u.powf(AREA_FRACTION),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::AngleGrid;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn top_grid() -> AngleGrid {
        AngleGrid::new(15, Hemisphere::Top).unwrap()
    }

    #[test]
    fn pole_maps_to_origin_in_both_modes() {
        let grid = top_grid();
        for projection in [Projection::Equidistant, Projection::EqualArea] {
            for phi in grid.phi_range() {
                let p = projection.project(0.0, f64::from(phi), &grid);
                assert_relative_eq!(p.position.x, 0.0);
                assert_relative_eq!(p.position.y, 0.0);
                assert_relative_eq!(p.radius, 0.0);
                assert_eq!(p.ring, 0);
            }
        }
    }

    #[test]
    fn outermost_sample_reaches_the_rim() {
        let grid = top_grid();
        let p = Projection::Equidistant.project(90.0, 30.0, &grid);
        assert_relative_eq!(p.radius, 1.0, epsilon = 1e-12);
        assert_eq!(p.ring, 6);
    }

    #[test]
    fn negative_theta_folds_through_the_origin() {
        let grid = top_grid();
        let pos = Projection::Equidistant.project(45.0, 30.0, &grid);
        let neg = Projection::Equidistant.project(-45.0, 30.0, &grid);
        assert_relative_eq!(neg.position.x, -pos.position.x, epsilon = 1e-12);
        assert_relative_eq!(neg.position.y, -pos.position.y, epsilon = 1e-12);
        assert!(neg.radius < 0.0);
        assert_eq!(neg.ring, pos.ring);
    }

    #[test]
    fn top_view_is_mirrored_vertically() {
        let top = top_grid();
        let bottom = AngleGrid::new(15, Hemisphere::Bottom).unwrap();
        let t = Projection::Equidistant.project(45.0, 30.0, &top);
        let b = Projection::Equidistant.project(45.0, 30.0, &bottom);
        assert_relative_eq!(t.position.y, -b.position.y, epsilon = 1e-12);
        assert_relative_eq!(t.position.x, b.position.x, epsilon = 1e-12);
    }

    #[test]
    fn boundaries_are_increasing_and_end_at_one() {
        for projection in [Projection::Equidistant, Projection::EqualArea] {
            let bounds = projection.ring_boundaries(7);
            assert_eq!(bounds.len(), 7);
            for pair in bounds.windows(2) {
                assert!(pair[0] < pair[1]);
            }
            assert_relative_eq!(bounds[6], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn samples_land_inside_their_ring() {
        let grid = top_grid();
        for projection in [Projection::Equidistant, Projection::EqualArea] {
            let bounds = projection.ring_boundaries(grid.num_rings());
            for theta in grid.theta_range() {
                let p = projection.project(f64::from(theta), 0.0, &grid);
                let r = p.radius.abs();
                assert!(r <= bounds[p.ring] + 1e-12);
                if p.ring > 0 {
                    assert!(r > bounds[p.ring - 1]);
                }
            }
        }
    }

    #[test]
    fn equal_area_expands_the_pole_circle() {
        let eq = Projection::Equidistant.ring_boundaries(7);
        let ea = Projection::EqualArea.ring_boundaries(7);
        assert!(ea[0] > eq[0]);
        // Every full annulus of the equal-area layout covers the same area;
        // the pole circle is the half-step stub and covers half of it.
        let mut prev = 0.0;
        let mut areas = Vec::new();
        for b in &ea {
            areas.push(b * b - prev);
            prev = b * b;
        }
        for area in &areas[1..] {
            assert_relative_eq!(*area, areas[1], epsilon = 1e-9);
        }
        assert_relative_eq!(areas[0], areas[1] / 2.0, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn radius_is_monotonic_in_elevation(
            a in 0.0f64..=90.0,
            b in 0.0f64..=90.0,
            phi in -180.0f64..=180.0,
        ) {
            let grid = top_grid();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for projection in [Projection::Equidistant, Projection::EqualArea] {
                let r_lo = projection.project(lo, phi, &grid).radius.abs();
                let r_hi = projection.project(hi, phi, &grid).radius.abs();
                prop_assert!(r_lo <= r_hi + 1e-12);
            }
        }
    }
}
