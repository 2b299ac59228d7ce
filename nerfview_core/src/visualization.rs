//! Visualization module for heatmap render output using Rerun.io
//!
//! Forwards a view's render output to a Rerun recording stream for ad-hoc
//! inspection outside the GUI host:
//! - parent sector outlines as 2-D line strips, tinted with their mapped color
//! - training-viewpoint markers as 2-D points
//!
//! Enable with the `visualization` feature flag.

use crate::marker::MARKER_DIAMETER;
use crate::sector::SectorKind;
use crate::view::HeatmapView;
use rerun::{RecordingStream, RecordingStreamBuilder};

/// Points per degree of arc when flattening wedge outlines.
const ARC_RESOLUTION_DEG: f64 = 5.0;

/// Rerun-based logger for heatmap render output
pub struct HeatmapVisualizer {
    rec: RecordingStream,
}

impl HeatmapVisualizer {
    /// Create a new visualizer that spawns the Rerun viewer
    pub fn new(app_id: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let rec = RecordingStreamBuilder::new(app_id).spawn()?;
        Ok(Self { rec })
    }

    /// Create a visualizer that saves to a file (for sharing)
    pub fn new_to_file(app_id: &str, path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let rec = RecordingStreamBuilder::new(app_id).save(path)?;
        Ok(Self { rec })
    }

    /// Log one view's sector outlines and markers under the given entity path
    pub fn log_view(&self, path: &str, view: &HeatmapView) -> Result<(), Box<dyn std::error::Error>> {
        let mut strips: Vec<Vec<[f32; 2]>> = Vec::new();
        let mut colors: Vec<[u8; 4]> = Vec::new();

        for (_, sector) in view.layout().arena().iter() {
            if sector.kind != SectorKind::Parent {
                continue;
            }
            strips.push(wedge_outline(
                sector.start_angle_deg,
                sector.span_deg,
                sector.outer_radius,
                sector.is_circle,
            ));
            let [r, g, b] = sector.color.unwrap_or([255, 255, 255]);
            colors.push([r, g, b, 255]);
        }

        self.rec.log(
            format!("{path}/sectors"),
            &rerun::LineStrips2D::new(strips).with_colors(colors),
        )?;

        let positions: Vec<[f32; 2]> = view
            .markers()
            .iter()
            .map(|m| [m.position.x as f32, m.position.y as f32])
            .collect();
        if !positions.is_empty() {
            self.rec.log(
                format!("{path}/markers"),
                &rerun::Points2D::new(positions)
                    .with_colors([[125, 125, 125, 255]])
                    .with_radii([(MARKER_DIAMETER / 2.0) as f32]),
            )?;
        }

        Ok(())
    }
}

/// Closed outline of a wedge (or the full pole circle).
fn wedge_outline(start_deg: f64, span_deg: f64, radius: f64, is_circle: bool) -> Vec<[f32; 2]> {
    let steps = (span_deg / ARC_RESOLUTION_DEG).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 3);
    if !is_circle {
        points.push([0.0, 0.0]);
    }
    for i in 0..=steps {
        let angle = (start_deg + span_deg * i as f64 / steps as f64).to_radians();
        points.push([(radius * angle.cos()) as f32, (radius * angle.sin()) as f32]);
    }
    if !is_circle {
        points.push([0.0, 0.0]);
    }
    points
}
