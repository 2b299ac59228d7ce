//! Heatmap views and cross-view synchronization.
//!
//! A [`HeatmapView`] owns one hemisphere's sector and marker sets and turns
//! pointer coordinates into sector hits. Views never reference each other;
//! a [`HeatmapGroup`] owns the federation, fans highlight updates out to
//! every member by matching camera-facing angle pairs, and guards the shared
//! camera sink against redundant pushes.
//!
//! Everything here is single-threaded: geometry teardown and interaction
//! handling run synchronously on the host's event-dispatch thread. A port
//! to a multi-threaded host must wrap the group in its own synchronization.

use crate::angles::AngleGrid;
use crate::color::ColorMap;
use crate::error::HeatmapError;
use crate::marker::{Marker, MarkerPlacer};
use crate::projection::Projection;
use crate::sector::{
    DiagnosticsSink, NullDiagnostics, SectorAngles, SectorBuilder, SectorId, SectorLayout,
    DEFAULT_BORDER_WIDTH,
};
use crate::table::{StatChannel, UncertaintyTable};
use nalgebra::Point2;
use std::sync::Arc;
use tracing::{debug, warn};

/// Border width while the pointer rests on a sector.
pub const HOVER_BORDER_WIDTH: f64 = 2.0;

/// Border width of the selected sector.
pub const SELECTED_BORDER_WIDTH: f64 = 4.0;

/// Receiver of camera orientation changes.
///
/// The group deduplicates pushes, so an implementation only sees pairs that
/// differ from the previously delivered one.
pub trait CameraSink {
    fn update_angles(&mut self, azimuth: f64, elevation: f64);
}

/// Camera sink that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCamera;

impl CameraSink for NullCamera {
    fn update_angles(&mut self, _azimuth: f64, _elevation: f64) {}
}

/// One hemisphere's live heatmap.
#[derive(Debug)]
pub struct HeatmapView {
    title: String,
    grid: AngleGrid,
    projection: Projection,
    channel: StatChannel,
    colors: ColorMap,
    table: Arc<UncertaintyTable>,
    training_angles: Vec<(f64, f64)>,
    /// On-screen disk diameter in host pixels; pointer coordinates arrive in
    /// this scale with the origin at the widget's top-left corner.
    diameter: f64,
    layout: SectorLayout,
    markers: Vec<Marker>,
    hovered: Option<SectorId>,
    locked: bool,
}

impl HeatmapView {
    pub fn new(
        title: impl Into<String>,
        grid: AngleGrid,
        diameter: f64,
        table: Arc<UncertaintyTable>,
        training_angles: Vec<(f64, f64)>,
        projection: Projection,
        channel: StatChannel,
    ) -> Result<Self, HeatmapError> {
        let title = title.into();
        let colors = ColorMap::for_channel_title(&title);
        let layout = SectorBuilder::new(&grid, &table, projection, channel, &colors)
            .build(&mut NullDiagnostics)?;
        let markers = MarkerPlacer::new(&grid, projection).place(&training_angles, &layout);
        Ok(Self {
            title,
            grid,
            projection,
            channel,
            colors,
            table,
            training_angles,
            diameter,
            layout,
            markers,
            hovered: None,
            locked: false,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn grid(&self) -> &AngleGrid {
        &self.grid
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn channel(&self) -> StatChannel {
        self.channel
    }

    /// Render output: the sector arena in paint order.
    pub fn layout(&self) -> &SectorLayout {
        &self.layout
    }

    /// Render output: placed training-viewpoint glyphs.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn hovered(&self) -> Option<SectorId> {
        self.hovered
    }

    /// Swaps the backing statistics table. Takes effect on the next rebuild.
    pub fn replace_table(&mut self, table: Arc<UncertaintyTable>) {
        self.table = table;
    }

    /// Discards and regenerates the sector and marker sets.
    ///
    /// Fail-safe: on error the previous sets stay visually in place, the
    /// failure is logged, and the error is returned. Hover and lock state
    /// reset only on success.
    pub fn rebuild(
        &mut self,
        projection: Projection,
        channel: StatChannel,
    ) -> Result<(), HeatmapError> {
        self.rebuild_with(projection, channel, &mut NullDiagnostics)
    }

    /// [`rebuild`](Self::rebuild) with an explicit diagnostics sink.
    pub fn rebuild_with(
        &mut self,
        projection: Projection,
        channel: StatChannel,
        diagnostics: &mut dyn DiagnosticsSink,
    ) -> Result<(), HeatmapError> {
        let built = SectorBuilder::new(&self.grid, &self.table, projection, channel, &self.colors)
            .build(diagnostics);
        match built {
            Ok(layout) => {
                self.markers =
                    MarkerPlacer::new(&self.grid, projection).place(&self.training_angles, &layout);
                self.layout = layout;
                self.projection = projection;
                self.channel = channel;
                self.hovered = None;
                self.locked = false;
                debug!(title = %self.title, ?projection, "heatmap rebuilt");
                Ok(())
            }
            Err(err) => {
                warn!(title = %self.title, %err, "rebuild aborted, keeping previous sectors");
                Err(err)
            }
        }
    }

    /// Translates a pointer position (widget pixels, origin top-left) into
    /// the centered scene frame and resolves the parent sector under it.
    pub fn hit_test(&self, pointer: Point2<f64>) -> Option<SectorId> {
        let half = self.diameter / 2.0;
        let scene = Point2::new((pointer.x - half) / half, (half - pointer.y) / half);
        self.layout.hit(scene)
    }

    fn direction_of(&self, id: SectorId) -> Option<SectorAngles> {
        self.layout.arena().get(id).angles
    }
}

/// Federation of synchronized views sharing one camera sink.
#[derive(Debug)]
pub struct HeatmapGroup<C: CameraSink> {
    views: Vec<HeatmapView>,
    camera: C,
    last_pushed: Option<(f64, f64)>,
}

impl<C: CameraSink> HeatmapGroup<C> {
    pub fn new(camera: C) -> Self {
        Self {
            views: Vec::new(),
            camera,
            last_pushed: None,
        }
    }

    /// Registers a view and returns its address within the group.
    pub fn add_view(&mut self, view: HeatmapView) -> usize {
        self.views.push(view);
        self.views.len() - 1
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn view(&self, index: usize) -> &HeatmapView {
        &self.views[index]
    }

    pub fn view_mut(&mut self, index: usize) -> &mut HeatmapView {
        &mut self.views[index]
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Continuous pointer motion over a view, no button held.
    ///
    /// Hover is suppressed while a selection holds the lock. Re-hovering the
    /// already-hovered sector is a no-op, so neither borders nor the camera
    /// see redundant updates. An out-of-range view index is a wiring bug and
    /// panics.
    pub fn pointer_moved(&mut self, index: usize, pointer: Point2<f64>) {
        let Some(hit) = self.views[index].hit_test(pointer) else {
            return;
        };
        if self.views[index].locked || self.views[index].hovered == Some(hit) {
            return;
        }
        let Some(angles) = self.views[index].direction_of(hit) else {
            return;
        };

        self.push_camera(angles.azimuth, angles.elevation);

        for i in 0..self.views.len() {
            let view = &mut self.views[i];
            view.layout.reset_border_widths();
            let target = if i == index {
                Some(hit)
            } else {
                view.layout.find_by_direction(angles.azimuth, angles.elevation)
            };
            if let Some(target) = target {
                view.layout.set_border_width(target, HOVER_BORDER_WIDTH);
            }
            view.hovered = target;
        }
    }

    /// Pointer press over a view.
    ///
    /// Pressing the selected sector deselects it everywhere and releases the
    /// locks; pressing any other sector moves the single federation-wide
    /// selection there; pressing empty space only releases the locks.
    pub fn pointer_pressed(&mut self, index: usize, pointer: Point2<f64>) {
        let Some(hit) = self.views[index].hit_test(pointer) else {
            for view in &mut self.views {
                view.locked = false;
            }
            return;
        };
        let Some(angles) = self.views[index].direction_of(hit) else {
            return;
        };

        if self.views[index].layout.border_width(hit) == SELECTED_BORDER_WIDTH {
            debug!(title = %self.views[index].title, "deselect");
            for i in 0..self.views.len() {
                let view = &mut self.views[i];
                view.locked = false;
                let target = if i == index {
                    Some(hit)
                } else {
                    view.layout.find_by_direction(angles.azimuth, angles.elevation)
                };
                if let Some(target) = target {
                    view.layout.set_border_width(target, DEFAULT_BORDER_WIDTH);
                }
            }
        } else {
            debug!(
                title = %self.views[index].title,
                azimuth = angles.azimuth,
                elevation = angles.elevation,
                "select"
            );
            self.push_camera(angles.azimuth, angles.elevation);
            for i in 0..self.views.len() {
                let view = &mut self.views[i];
                view.layout.reset_border_widths();
                view.locked = true;
                view.hovered = None;
                let target = if i == index {
                    Some(hit)
                } else {
                    view.layout.find_by_direction(angles.azimuth, angles.elevation)
                };
                if let Some(target) = target {
                    view.layout.set_border_width(target, SELECTED_BORDER_WIDTH);
                }
            }
        }
    }

    /// The selected sector, if any: the first view carrying the selected
    /// border width. Sibling views mirror the same direction, never a
    /// different one, so one hit is enough to identify the selection.
    pub fn selected(&self) -> Option<(usize, SectorId)> {
        for (i, view) in self.views.iter().enumerate() {
            for (id, _) in view.layout.parents() {
                if view.layout.border_width(id) == SELECTED_BORDER_WIDTH {
                    return Some((i, id));
                }
            }
        }
        None
    }

    fn push_camera(&mut self, azimuth: f64, elevation: f64) {
        if self.last_pushed == Some((azimuth, elevation)) {
            return;
        }
        self.camera.update_angles(azimuth, elevation);
        self.last_pushed = Some((azimuth, elevation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::Hemisphere;
    use crate::sector::SectorKind;
    use crate::table::CellStats;

    const DIAMETER: f64 = 400.0;

    /// Counts the pushes that actually reach the sink.
    #[derive(Debug, Default)]
    struct RecordingCamera {
        updates: Vec<(f64, f64)>,
    }

    impl CameraSink for RecordingCamera {
        fn update_angles(&mut self, azimuth: f64, elevation: f64) {
            self.updates.push((azimuth, elevation));
        }
    }

    fn table() -> Arc<UncertaintyTable> {
        let range: Vec<i32> = (-180..=180).step_by(15).collect();
        Arc::new(UncertaintyTable::from_fn(&range, &range, |theta, phi| {
            CellStats {
                mean: f64::from(theta.abs() + phi.abs()) / 360.0,
                std_dev: f64::from(phi.abs()) / 180.0,
                maximum: f64::from(theta.abs()) / 90.0,
            }
        }))
    }

    fn view(title: &str, hemisphere: Hemisphere) -> HeatmapView {
        HeatmapView::new(
            title,
            AngleGrid::new(15, hemisphere).unwrap(),
            DIAMETER,
            table(),
            vec![(0.0, 0.0), (45.0, 30.0)],
            Projection::Equidistant,
            StatChannel::StandardDeviation,
        )
        .unwrap()
    }

    fn four_view_group() -> HeatmapGroup<RecordingCamera> {
        let mut group = HeatmapGroup::new(RecordingCamera::default());
        group.add_view(view("Density Uncertainty - Upper Sphere", Hemisphere::Top));
        group.add_view(view("Density Uncertainty - Lower Sphere", Hemisphere::Bottom));
        group.add_view(view("Color Uncertainty - Upper Sphere", Hemisphere::Top));
        group.add_view(view("Color Uncertainty - Lower Sphere", Hemisphere::Bottom));
        group
    }

    /// Widget-pixel position of a scene-frame point.
    fn pointer_at(scene_x: f64, scene_y: f64) -> Point2<f64> {
        let half = DIAMETER / 2.0;
        Point2::new(scene_x * half + half, half - scene_y * half)
    }

    #[test]
    fn center_press_hits_the_pole_in_both_projections() {
        for projection in [Projection::Equidistant, Projection::EqualArea] {
            let mut v = view("Density Uncertainty - Upper Sphere", Hemisphere::Top);
            v.rebuild(projection, StatChannel::StandardDeviation).unwrap();
            let hit = v.hit_test(Point2::new(DIAMETER / 2.0, DIAMETER / 2.0)).unwrap();
            assert_eq!(hit, v.layout().pole());
            assert!(v.layout().arena().get(hit).is_circle);
        }
    }

    #[test]
    fn rebuild_replaces_sectors_and_preserves_counts() {
        let mut v = view("Density Uncertainty - Upper Sphere", Hemisphere::Top);
        let before_total = v.layout().arena().len();
        let before_parents = v.layout().parents().count();
        let before_spans: Vec<f64> = v
            .layout()
            .arena()
            .iter()
            .filter(|(_, s)| s.kind == SectorKind::Extreme)
            .map(|(_, s)| s.span_deg)
            .collect();

        v.rebuild(Projection::Equidistant, StatChannel::Maximum).unwrap();

        assert_eq!(v.layout().arena().len(), before_total);
        assert_eq!(v.layout().parents().count(), before_parents);
        // The statistic channel changed, so the regenerated inner wedges
        // must differ from the old set somewhere.
        let after_spans: Vec<f64> = v
            .layout()
            .arena()
            .iter()
            .filter(|(_, s)| s.kind == SectorKind::Extreme)
            .map(|(_, s)| s.span_deg)
            .collect();
        assert_ne!(before_spans, after_spans);
    }

    #[test]
    fn failed_rebuild_keeps_the_previous_layout() {
        let mut v = view("Density Uncertainty - Upper Sphere", Hemisphere::Top);
        let before = v.layout().clone();

        let thetas: Vec<i32> = (-180..=180).step_by(15).collect();
        let phis: Vec<i32> = (0..=90).step_by(15).collect();
        v.replace_table(Arc::new(UncertaintyTable::from_fn(
            &thetas,
            &phis,
            |_, _| CellStats {
                mean: 0.5,
                std_dev: 0.1,
                maximum: 0.9,
            },
        )));

        let result = v.rebuild(Projection::EqualArea, StatChannel::Maximum);
        assert!(matches!(result, Err(HeatmapError::AngleLookup { .. })));
        assert_eq!(*v.layout(), before);
        assert_eq!(v.projection(), Projection::Equidistant);
    }

    #[test]
    fn hover_highlights_matching_sectors_across_views() {
        let mut group = four_view_group();
        // Scene point inside ring 3, slot 22: sample (45, 30) on top views.
        let pointer = pointer_at(0.45, -0.26);
        group.pointer_moved(0, pointer);

        let hit = group.view(0).hovered().expect("hover target");
        let angles = group.view(0).layout().arena().get(hit).angles.unwrap();
        assert_eq!((angles.theta, angles.phi), (45, 30));
        assert_eq!(
            group.view(0).layout().border_width(hit),
            HOVER_BORDER_WIDTH
        );

        // The other top view lines up on the same direction; the bottom
        // views sit 180° away in elevation and stay untouched.
        let twin = group.view(2).hovered().expect("sibling hover");
        let twin_angles = group.view(2).layout().arena().get(twin).angles.unwrap();
        assert_eq!((twin_angles.theta, twin_angles.phi), (45, 30));
        assert!(group.view(1).hovered().is_none());
        assert!(group.view(3).hovered().is_none());
    }

    #[test]
    fn repeated_hover_pushes_the_camera_once() {
        let mut group = four_view_group();
        let pointer = pointer_at(0.45, -0.26);
        group.pointer_moved(0, pointer);
        assert_eq!(group.camera().updates.len(), 1);
        group.pointer_moved(0, pointer);
        assert_eq!(group.camera().updates.len(), 1);

        // A different sector produces exactly one more push.
        group.pointer_moved(0, pointer_at(-0.45, 0.26));
        assert_eq!(group.camera().updates.len(), 2);
    }

    #[test]
    fn selection_is_mutually_exclusive_across_the_federation() {
        let mut group = four_view_group();
        group.pointer_pressed(0, pointer_at(0.45, -0.26));
        let first = group.selected().expect("first selection");
        assert_eq!(first.0, 0);
        assert!(group.view(0).locked() && group.view(3).locked());

        // Selecting a different direction in another view moves the single
        // selection; nothing stays selected in the first view.
        group.pointer_pressed(1, pointer_at(0.2, 0.1));
        let second = group.selected().expect("second selection");
        assert_eq!(second.0, 1);
        for (id, _) in group.view(0).layout().parents() {
            assert_ne!(
                group.view(0).layout().border_width(id),
                SELECTED_BORDER_WIDTH
            );
        }
    }

    #[test]
    fn selecting_twice_deselects_everywhere() {
        let mut group = four_view_group();
        let pointer = pointer_at(0.45, -0.26);
        group.pointer_pressed(0, pointer);
        assert!(group.selected().is_some());

        group.pointer_pressed(0, pointer);
        assert!(group.selected().is_none());
        for i in 0..group.len() {
            assert!(!group.view(i).locked());
        }
    }

    #[test]
    fn hover_is_suppressed_while_locked() {
        let mut group = four_view_group();
        group.pointer_pressed(0, pointer_at(0.45, -0.26));
        let selected = group.selected().unwrap();

        group.pointer_moved(0, pointer_at(-0.45, 0.26));
        // Selection borders survive; no hover highlight appeared.
        assert_eq!(group.selected(), Some(selected));
        assert_eq!(group.camera().updates.len(), 1);
    }

    #[test]
    fn empty_press_clears_locks_but_not_borders() {
        let mut group = four_view_group();
        group.pointer_pressed(0, pointer_at(0.45, -0.26));
        let selected = group.selected().unwrap();

        // Press the widget corner, outside the disk.
        group.pointer_pressed(2, Point2::new(1.0, 1.0));
        for i in 0..group.len() {
            assert!(!group.view(i).locked());
        }
        assert_eq!(group.selected(), Some(selected));
    }

    #[test]
    fn markers_follow_the_projection_on_rebuild() {
        let mut v = view("Density Uncertainty - Upper Sphere", Hemisphere::Top);
        let before = v.markers()[1].position;
        v.rebuild(Projection::EqualArea, StatChannel::StandardDeviation)
            .unwrap();
        let after = v.markers()[1].position;
        // Equal-area pushes mid-elevation samples outward.
        assert!(after.x.hypot(after.y) > before.x.hypot(before.y));
        assert!(v.markers()[1].sector.is_some());
    }
}
