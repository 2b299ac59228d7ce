//! Pie-sector geometry for one hemisphere's heatmap.
//!
//! Every non-pole sample becomes a wedge in a concentric ring; the sample at
//! the pole becomes the central full circle. A wedge is drawn as a stack of
//! four primitives sharing one arena:
//!
//! * the parent wedge, white, spanning from the disk center to its ring's
//!   outer edge (inner rings paint over it, leaving one annulus visible),
//! * the extreme-statistic wedge carrying the mapped data color, whose span
//!   and radial band shrink as the statistic approaches its channel maximum,
//! * a covering wedge that re-paints the area below the extreme wedge in the
//!   parent's fill, so only the statistic band shows color,
//! * a border overlay with no fill, whose stroke width carries the
//!   hover/selection highlight.
//!
//! Ownership is by arena index: parents hold child indices, children hold a
//! back-index used for traversal only. Arena order is paint order: outer
//! rings first, pole last.

use crate::angles::{AngleGrid, AngleKey, Hemisphere};
use crate::color::ColorMap;
use crate::error::HeatmapError;
use crate::projection::Projection;
use crate::table::{ChannelBounds, StatChannel, UncertaintyTable};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fill behind the extreme-statistic wedges.
pub const BACKGROUND_FILL: [u8; 3] = [255, 255, 255];

/// At the statistic maximum the extreme wedge keeps `1/EXTREME_SPAN_DIVISOR`
/// of its parent's span (and of the ring's radial band). A visual tuning
/// constant, fixed here once for every hemisphere.
pub const EXTREME_SPAN_DIVISOR: f64 = 4.0;

/// Border overlay width when neither hovered nor selected.
pub const DEFAULT_BORDER_WIDTH: f64 = 1.0;

/// Index of a sector inside its view's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectorId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorKind {
    /// Addressable top-level wedge (or the pole circle).
    Parent,
    /// Inner wedge encoding the secondary statistic.
    Extreme,
    /// Cosmetic mask below the extreme wedge.
    Covering,
    /// Fill-less outline used for hover/selection highlighting.
    Border,
}

/// Angle bookkeeping attached to a parent sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorAngles {
    pub theta: i32,
    pub phi: i32,
    /// Camera-facing pair used for cross-view matching.
    pub azimuth: f64,
    pub elevation: f64,
}

/// One renderable wedge or circle.
///
/// Geometry is normalized: the disk rim sits at radius 1, angles are degrees
/// counterclockwise from +x in the scene frame. `angles` is present on
/// parents only; covering and border sectors are purely cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub kind: SectorKind,
    pub start_angle_deg: f64,
    pub span_deg: f64,
    pub outer_radius: f64,
    /// Fill color; `None` on the border overlay.
    pub fill: Option<[u8; 3]>,
    /// Mapped primary-value color (parents only; rendered by the extreme child).
    pub color: Option<[u8; 3]>,
    /// Primary scalar the sector represents (parents only).
    pub value: Option<f64>,
    /// Border stroke width (border overlays only).
    pub border_width: f64,
    /// The pole sector renders as a full circle instead of a wedge.
    pub is_circle: bool,
    pub angles: Option<SectorAngles>,
    pub parent: Option<SectorId>,
    pub children: Vec<SectorId>,
    pub border: Option<SectorId>,
}

impl Sector {
    fn blank(kind: SectorKind, start: f64, span: f64, outer_radius: f64) -> Self {
        Self {
            kind,
            start_angle_deg: start,
            span_deg: span,
            outer_radius,
            fill: None,
            color: None,
            value: None,
            border_width: DEFAULT_BORDER_WIDTH,
            is_circle: false,
            angles: None,
            parent: None,
            children: Vec::new(),
            border: None,
        }
    }
}

/// Arena owning every sector of one view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorArena {
    sectors: Vec<Sector>,
}

impl SectorArena {
    pub fn push(&mut self, sector: Sector) -> SectorId {
        self.sectors.push(sector);
        SectorId(self.sectors.len() - 1)
    }

    pub fn get(&self, id: SectorId) -> &Sector {
        &self.sectors[id.0]
    }

    pub fn get_mut(&mut self, id: SectorId) -> &mut Sector {
        &mut self.sectors[id.0]
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectorId, &Sector)> {
        self.sectors.iter().enumerate().map(|(i, s)| (SectorId(i), s))
    }

    /// Follows the back-index of a child sector up to its parent. Only
    /// parents are addressable interaction targets.
    pub fn resolve_parent(&self, id: SectorId) -> SectorId {
        match self.get(id).parent {
            Some(parent) => parent,
            None => id,
        }
    }
}

/// Built sector set of one hemisphere plus the indexes needed to query it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorLayout {
    arena: SectorArena,
    pole: SectorId,
    slots: HashMap<(usize, usize), SectorId>,
    boundaries: Vec<f64>,
    sectors_per_ring: usize,
    span_deg: f64,
}

impl SectorLayout {
    pub fn arena(&self) -> &SectorArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut SectorArena {
        &mut self.arena
    }

    pub fn pole(&self) -> SectorId {
        self.pole
    }

    /// Outer radius of each ring, pole circle first.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn parent_at(&self, ring: usize, slot: usize) -> Option<SectorId> {
        self.slots.get(&(ring, slot)).copied()
    }

    pub fn parents(&self) -> impl Iterator<Item = (SectorId, &Sector)> {
        self.arena
            .iter()
            .filter(|(_, s)| s.kind == SectorKind::Parent)
    }

    /// Resolves a point in the centered scene frame to the parent sector
    /// underneath it. Points beyond the disk rim hit nothing.
    pub fn hit(&self, point: Point2<f64>) -> Option<SectorId> {
        let r = point.x.hypot(point.y);
        let ring = self.boundaries.iter().position(|b| r <= b + 1e-12)?;
        if ring == 0 {
            return Some(self.arena.resolve_parent(self.pole));
        }
        let angle = point.y.atan2(point.x).to_degrees();
        let slot = slot_index(angle, self.span_deg, self.sectors_per_ring);
        self.parent_at(ring, slot)
            .map(|id| self.arena.resolve_parent(id))
    }

    /// Reset every border overlay to the default width.
    pub fn reset_border_widths(&mut self) {
        for sector in &mut self.arena.sectors {
            if sector.kind == SectorKind::Border {
                sector.border_width = DEFAULT_BORDER_WIDTH;
            }
        }
    }

    /// Border width of a parent's overlay.
    pub fn border_width(&self, parent: SectorId) -> f64 {
        match self.arena.get(parent).border {
            Some(border) => self.arena.get(border).border_width,
            None => DEFAULT_BORDER_WIDTH,
        }
    }

    /// Sets the border width of a parent's overlay.
    pub fn set_border_width(&mut self, parent: SectorId, width: f64) {
        if let Some(border) = self.arena.get(parent).border {
            self.arena.get_mut(border).border_width = width;
        }
    }

    /// Finds the parent whose camera-facing pair matches the given one.
    pub fn find_by_direction(&self, azimuth: f64, elevation: f64) -> Option<SectorId> {
        self.parents()
            .find(|(_, s)| {
                s.angles.is_some_and(|a| {
                    (a.azimuth - azimuth).abs() < 1e-6 && (a.elevation - elevation).abs() < 1e-6
                })
            })
            .map(|(id, _)| id)
    }
}

/// Record handed to the diagnostics sink for every placed parent sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorRecord {
    pub theta: i32,
    pub phi: i32,
    pub azimuth: f64,
    pub elevation: f64,
    pub ring: usize,
    pub slot: usize,
}

/// Observer of sector placement, injected by the host. No hidden output:
/// the default sink discards everything.
pub trait DiagnosticsSink {
    fn sector_placed(&mut self, record: SectorRecord);
}

/// Discards all records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    fn sector_placed(&mut self, _record: SectorRecord) {}
}

/// Collects records in memory, for export or inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectingDiagnostics {
    pub records: Vec<SectorRecord>,
}

impl DiagnosticsSink for CollectingDiagnostics {
    fn sector_placed(&mut self, record: SectorRecord) {
        self.records.push(record);
    }
}

/// Builds the full sector tree for one hemisphere.
pub struct SectorBuilder<'a> {
    grid: &'a AngleGrid,
    table: &'a UncertaintyTable,
    projection: Projection,
    channel: StatChannel,
    colors: &'a ColorMap,
}

impl<'a> SectorBuilder<'a> {
    pub fn new(
        grid: &'a AngleGrid,
        table: &'a UncertaintyTable,
        projection: Projection,
        channel: StatChannel,
        colors: &'a ColorMap,
    ) -> Self {
        Self {
            grid,
            table,
            projection,
            channel,
            colors,
        }
    }

    /// Builds every ring from the outside in, then the pole circle.
    ///
    /// Within a ring, samples are walked in ascending polar-angle order; the
    /// two samples folding onto the same slot at the ±90° azimuth seam
    /// resolve first-wins. A sample whose angles are missing from the table
    /// aborts the build; stale data from a neighboring cell must never leak
    /// into a sector.
    pub fn build(
        &self,
        diagnostics: &mut dyn DiagnosticsSink,
    ) -> Result<SectorLayout, HeatmapError> {
        let bounds = self.table.extreme_bounds(self.channel);
        if bounds.min > bounds.max {
            return Err(HeatmapError::DegenerateBounds {
                channel: self.channel.label(),
                min: bounds.min,
                max: bounds.max,
            });
        }

        let num_rings = self.grid.num_rings();
        let sectors_per_ring = self.grid.sectors_per_ring();
        let span = self.grid.sector_span_deg();
        let boundaries = self.projection.ring_boundaries(num_rings);

        let mut layout = SectorLayout {
            arena: SectorArena::default(),
            pole: SectorId(0),
            slots: HashMap::new(),
            boundaries: boundaries.clone(),
            sectors_per_ring,
            span_deg: span,
        };

        let phi_range = self.grid.phi_range();
        for ring in (1..num_rings).rev() {
            let theta_abs = ring as i32 * self.grid.step();
            let mut ring_samples: Vec<(i32, i32, f64)> = Vec::new();
            for theta in [-theta_abs, theta_abs] {
                for &phi in &phi_range {
                    let projected =
                        self.projection
                            .project(f64::from(theta), f64::from(phi), self.grid);
                    ring_samples.push((theta, phi, projected.angle.to_degrees()));
                }
            }
            ring_samples.sort_by(|a, b| {
                a.2.partial_cmp(&b.2)
                    .expect("scene angles are finite")
                    .then(a.0.cmp(&b.0))
            });

            for (theta, phi, scene_angle) in ring_samples {
                let slot = slot_index(scene_angle, span, sectors_per_ring);
                if layout.slots.contains_key(&(ring, slot)) {
                    continue;
                }
                self.build_wedge(
                    &mut layout,
                    &boundaries,
                    bounds,
                    ring,
                    slot,
                    theta,
                    phi,
                    diagnostics,
                )?;
            }
        }

        self.build_pole(&mut layout, &boundaries, bounds, diagnostics)?;
        Ok(layout)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_wedge(
        &self,
        layout: &mut SectorLayout,
        boundaries: &[f64],
        bounds: ChannelBounds,
        ring: usize,
        slot: usize,
        theta: i32,
        phi: i32,
        diagnostics: &mut dyn DiagnosticsSink,
    ) -> Result<(), HeatmapError> {
        let span = layout.span_deg;
        let cell = *self.table.lookup(self.lookup_key(theta, phi))?;
        let (azimuth, elevation) = self
            .grid
            .direction_angles(f64::from(theta), f64::from(phi));

        let outer = boundaries[ring];
        let inner = boundaries[ring - 1];
        let thickness = outer - inner;
        let start = slot as f64 * span - span / 2.0;

        let color = self.colors.map(cell.mean, self.table.value_max());
        let mut parent = Sector::blank(SectorKind::Parent, start, span, outer);
        parent.fill = Some(BACKGROUND_FILL);
        parent.color = Some(color);
        parent.value = Some(cell.mean);
        parent.angles = Some(SectorAngles {
            theta,
            phi,
            azimuth,
            elevation,
        });
        let parent_id = layout.arena.push(parent);

        let norm = stat_norm(cell.extreme(self.channel), bounds);
        let min_inset = thickness / (2.0 * EXTREME_SPAN_DIVISOR);
        let max_inset = thickness / 2.0 - min_inset;
        let inset = min_inset + (max_inset - min_inset) * norm;

        let max_span = span - span / EXTREME_SPAN_DIVISOR;
        let min_span = span / EXTREME_SPAN_DIVISOR;
        let child_span = max_span + (min_span - max_span) * norm;

        let mut extreme = Sector::blank(
            SectorKind::Extreme,
            start + (span - child_span) / 2.0,
            child_span,
            outer - inset,
        );
        extreme.fill = Some(color);
        extreme.parent = Some(parent_id);
        let extreme_id = layout.arena.push(extreme);

        let mut covering = Sector::blank(SectorKind::Covering, start, span, inner + inset);
        covering.fill = Some(BACKGROUND_FILL);
        covering.parent = Some(parent_id);
        let covering_id = layout.arena.push(covering);

        let mut border = Sector::blank(SectorKind::Border, start, span, outer);
        border.parent = Some(parent_id);
        let border_id = layout.arena.push(border);

        let parent = layout.arena.get_mut(parent_id);
        parent.children = vec![extreme_id, covering_id];
        parent.border = Some(border_id);

        layout.slots.insert((ring, slot), parent_id);
        diagnostics.sector_placed(SectorRecord {
            theta,
            phi,
            azimuth,
            elevation,
            ring,
            slot,
        });
        Ok(())
    }

    fn build_pole(
        &self,
        layout: &mut SectorLayout,
        boundaries: &[f64],
        bounds: ChannelBounds,
        diagnostics: &mut dyn DiagnosticsSink,
    ) -> Result<(), HeatmapError> {
        let (theta, phi) = self.grid.pole_sample();
        let cell = *self
            .table
            .lookup(AngleKey::new(f64::from(theta), f64::from(phi)))?;
        let (azimuth, elevation) = self
            .grid
            .direction_angles(f64::from(theta), f64::from(phi));

        let radius = boundaries[0];
        let color = self.colors.map(cell.mean, self.table.value_max());

        let mut parent = Sector::blank(SectorKind::Parent, -180.0, 360.0, radius);
        parent.fill = Some(BACKGROUND_FILL);
        parent.color = Some(color);
        parent.value = Some(cell.mean);
        parent.is_circle = true;
        parent.angles = Some(SectorAngles {
            theta,
            phi,
            azimuth,
            elevation,
        });
        let parent_id = layout.arena.push(parent);

        // The sub-circle keeps the full span; only its diameter encodes the
        // statistic, interpolated over the same divisor as the wedges.
        let norm = stat_norm(cell.extreme(self.channel), bounds);
        let max_r = radius - radius / EXTREME_SPAN_DIVISOR;
        let min_r = radius / EXTREME_SPAN_DIVISOR;
        let mut extreme = Sector::blank(
            SectorKind::Extreme,
            -180.0,
            360.0,
            max_r + (min_r - max_r) * norm,
        );
        extreme.fill = Some(color);
        extreme.is_circle = true;
        extreme.parent = Some(parent_id);
        let extreme_id = layout.arena.push(extreme);

        let mut border = Sector::blank(SectorKind::Border, -180.0, 360.0, radius);
        border.is_circle = true;
        border.parent = Some(parent_id);
        let border_id = layout.arena.push(border);

        let parent = layout.arena.get_mut(parent_id);
        parent.children = vec![extreme_id];
        parent.border = Some(border_id);

        layout.pole = parent_id;
        layout.slots.insert((0, 0), parent_id);
        diagnostics.sector_placed(SectorRecord {
            theta,
            phi,
            azimuth,
            elevation,
            ring: 0,
            slot: 0,
        });
        Ok(())
    }

    /// Table key for a sample. On the top hemisphere the ±90° azimuth seam
    /// is relabeled to the equivalent near-pole direction before lookup; the
    /// sector itself keeps its raw angles.
    fn lookup_key(&self, theta: i32, phi: i32) -> AngleKey {
        if self.grid.hemisphere() == Hemisphere::Top && phi.abs() == 90 {
            AngleKey::new(0.0, f64::from(theta * phi.signum()))
        } else {
            AngleKey::new(f64::from(theta), f64::from(phi))
        }
    }
}

fn stat_norm(value: f64, bounds: ChannelBounds) -> f64 {
    if bounds.max > bounds.min {
        ((value - bounds.min) / (bounds.max - bounds.min)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn slot_index(angle_deg: f64, span_deg: f64, sectors_per_ring: usize) -> usize {
    ((angle_deg / span_deg).round() as i64).rem_euclid(sectors_per_ring as i64) as usize
}
