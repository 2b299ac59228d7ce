//! Training-viewpoint markers.
//!
//! Each recorded training angle becomes a small circular glyph at its
//! projected disk position, associated (weakly, by arena index) with the
//! parent sector underneath it. Markers never mutate sector state; the
//! association exists only so highlighting can connect the two.

use crate::angles::{canonicalize, AngleGrid};
use crate::projection::Projection;
use crate::sector::{SectorId, SectorLayout};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Glyph fill used by hosts that do not restyle markers.
pub const MARKER_FILL: [u8; 3] = [125, 125, 125];

/// Glyph diameter in normalized disk units.
pub const MARKER_DIAMETER: f64 = 0.05;

/// One placed training-viewpoint glyph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Position in the centered scene frame.
    pub position: Point2<f64>,
    /// Folded, canonicalized source angles.
    pub theta: f64,
    pub phi: f64,
    /// Parent sector underneath the glyph; a marker outside every sector is
    /// valid and simply never highlighted.
    pub sector: Option<SectorId>,
}

/// Near-pole correction for raw training angles: a viewpoint closer to the
/// pole than one step with a nonzero azimuth is re-expressed with the
/// azimuth taking the elevation's role, pointing just inside the rim of the
/// pole circle.
pub fn fold_pole_angle(theta: f64, phi: f64, step_deg: i32) -> (f64, f64) {
    if theta.abs() < f64::from(step_deg) && phi.abs() as i32 > 0 {
        let sign = if theta < 0.0 { -1.0 } else { 1.0 };
        (phi, sign * (90.0 - theta.abs()))
    } else {
        (theta, phi)
    }
}

/// Projects training angles onto an already-built sector layout.
pub struct MarkerPlacer<'a> {
    grid: &'a AngleGrid,
    projection: Projection,
}

impl<'a> MarkerPlacer<'a> {
    pub fn new(grid: &'a AngleGrid, projection: Projection) -> Self {
        Self { grid, projection }
    }

    /// Folds, filters, and projects every training angle. Angles outside
    /// this hemisphere's window are discarded; everything kept is hit-tested
    /// against the layout to find its parent sector.
    pub fn place(&self, training_angles: &[(f64, f64)], layout: &SectorLayout) -> Vec<Marker> {
        let mut markers = Vec::new();
        for &(raw_theta, raw_phi) in training_angles {
            let (theta, phi) = fold_pole_angle(raw_theta, raw_phi, self.grid.step());
            let theta = canonicalize(theta);
            let phi = canonicalize(phi);
            if !self.grid.contains(theta, phi) {
                continue;
            }

            let projected = self.projection.project(theta, phi, self.grid);
            markers.push(Marker {
                position: projected.position,
                theta,
                phi,
                sector: layout.hit(projected.position),
            });
        }
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::Hemisphere;
    use crate::color::ColorMap;
    use crate::sector::{NullDiagnostics, SectorBuilder};
    use crate::table::{CellStats, StatChannel, UncertaintyTable};
    use approx::assert_relative_eq;

    fn table() -> UncertaintyTable {
        let range: Vec<i32> = (-180..=180).step_by(15).collect();
        UncertaintyTable::from_fn(&range, &range, |_, phi| CellStats {
            mean: 0.5,
            std_dev: f64::from(phi.abs()) / 180.0,
            maximum: 0.5,
        })
    }

    fn layout(grid: &AngleGrid) -> SectorLayout {
        let table = table();
        let colors = ColorMap::for_channel_title("density");
        SectorBuilder::new(
            grid,
            &table,
            Projection::Equidistant,
            StatChannel::StandardDeviation,
            &colors,
        )
        .build(&mut NullDiagnostics)
        .unwrap()
    }

    #[test]
    fn near_pole_angles_fold() {
        assert_eq!(fold_pole_angle(5.0, 30.0, 15), (30.0, 85.0));
        assert_eq!(fold_pole_angle(-5.0, 20.0, 15), (20.0, -85.0));
        // Zero azimuth means the viewpoint really is the pole.
        assert_eq!(fold_pole_angle(5.0, 0.0, 15), (5.0, 0.0));
        assert_eq!(fold_pole_angle(40.0, 30.0, 15), (40.0, 30.0));
    }

    #[test]
    fn pole_viewpoint_lands_on_the_pole_sector() {
        let grid = AngleGrid::new(15, Hemisphere::Top).unwrap();
        let layout = layout(&grid);
        let placer = MarkerPlacer::new(&grid, Projection::Equidistant);
        let markers = placer.place(&[(0.0, 0.0)], &layout);
        assert_eq!(markers.len(), 1);
        assert_relative_eq!(markers[0].position.x, 0.0);
        assert_eq!(markers[0].sector, Some(layout.pole()));
    }

    #[test]
    fn out_of_hemisphere_angles_are_dropped() {
        let grid = AngleGrid::new(15, Hemisphere::Top).unwrap();
        let layout = layout(&grid);
        let placer = MarkerPlacer::new(&grid, Projection::Equidistant);
        let markers = placer.place(&[(30.0, 150.0), (30.0, 30.0)], &layout);
        assert_eq!(markers.len(), 1);
        assert_relative_eq!(markers[0].theta, 30.0);
    }

    #[test]
    fn bottom_hemisphere_keeps_wrapped_azimuths() {
        let grid = AngleGrid::new(15, Hemisphere::Bottom).unwrap();
        let layout = layout(&grid);
        let placer = MarkerPlacer::new(&grid, Projection::Equidistant);
        let markers = placer.place(&[(30.0, 150.0), (30.0, 210.0), (30.0, 30.0)], &layout);
        // 210 canonicalizes to -150, which sits inside the bottom window.
        assert_eq!(markers.len(), 2);
    }

    #[test]
    fn markers_associate_with_the_sector_beneath() {
        let grid = AngleGrid::new(15, Hemisphere::Top).unwrap();
        let layout = layout(&grid);
        let placer = MarkerPlacer::new(&grid, Projection::Equidistant);
        let markers = placer.place(&[(45.0, 30.0)], &layout);
        let sector = layout.arena().get(markers[0].sector.unwrap());
        let angles = sector.angles.unwrap();
        assert_eq!((angles.theta, angles.phi), (45, 30));
    }
}
