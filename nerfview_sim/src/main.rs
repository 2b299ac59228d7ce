//! Headless interaction harness for the circular heatmap engine.
//!
//! Builds the four-view federation (density/color uncertainty, upper/lower
//! hemisphere) from synthetic data, scripts hover and selection traffic
//! through the synchronization protocol, exercises projection and channel
//! rebuilds, and reports what the camera sink observed. With `--export`,
//! the per-sector placement records are written out as JSON.

mod data;

use clap::Parser;
use nalgebra::Point2;
use nerfview_core::{
    AngleGrid, CameraSink, CollectingDiagnostics, HeatmapGroup, HeatmapView, Hemisphere,
    Projection, StatChannel,
};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Camera sink that records every orientation change it receives.
#[derive(Debug, Default)]
struct LoggingCamera {
    updates: u64,
    last: Option<(f64, f64)>,
}

impl CameraSink for LoggingCamera {
    fn update_angles(&mut self, azimuth: f64, elevation: f64) {
        self.updates += 1;
        self.last = Some((azimuth, elevation));
        debug!(azimuth, elevation, "camera reoriented");
    }
}

/// Placement records of one view, as exported with `--export`.
#[derive(Debug, Serialize)]
struct ViewDump {
    title: String,
    projection: String,
    records: Vec<nerfview_core::SectorRecord>,
}

/// Circular heatmap interaction harness
#[derive(Parser, Debug)]
#[command(name = "nerfview-sim")]
#[command(about = "Drive the heatmap federation with scripted interaction", long_about = None)]
struct Args {
    /// Seed for the synthetic uncertainty tables
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Angular step between samples in degrees (must divide 90)
    #[arg(long, default_value = "15")]
    step: i32,

    /// On-screen disk diameter in pixels
    #[arg(long, default_value = "400")]
    diameter: f64,

    /// Number of synthetic training viewpoints
    #[arg(long, default_value = "24")]
    training: usize,

    /// Number of hover samples swept across each view
    #[arg(long, default_value = "48")]
    hover_samples: usize,

    /// Export per-sector placement records to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("nerfview interaction harness (seed={})", args.seed);

    let density = Arc::new(data::synthetic_table(args.seed, args.step, 0.0));
    let color = Arc::new(data::synthetic_table(args.seed + 1, args.step, 1.2));
    let training = data::synthetic_training_angles(args.seed, args.training);

    let mut group = HeatmapGroup::new(LoggingCamera::default());
    let specs = [
        ("Density Uncertainty - Upper Sphere", Hemisphere::Top, &density),
        ("Density Uncertainty - Lower Sphere", Hemisphere::Bottom, &density),
        ("Color Uncertainty - Upper Sphere", Hemisphere::Top, &color),
        ("Color Uncertainty - Lower Sphere", Hemisphere::Bottom, &color),
    ];
    for (title, hemisphere, table) in specs {
        let grid = AngleGrid::new(args.step, hemisphere).expect("valid angular step");
        let view = HeatmapView::new(
            title,
            grid,
            args.diameter,
            Arc::clone(table),
            training.clone(),
            Projection::Equidistant,
            StatChannel::StandardDeviation,
        )
        .expect("initial build");
        info!(
            "{}: {} sectors, {} markers",
            title,
            view.layout().arena().len(),
            view.markers().len()
        );
        group.add_view(view);
    }

    sweep_hover(&mut group, args.diameter, args.hover_samples);
    exercise_selection(&mut group, args.diameter);
    exercise_rebuilds(&mut group);

    if let Some(path) = &args.export {
        export_records(&mut group, path);
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "done: {} camera updates, last orientation {:?}",
        group.camera().updates,
        group.camera().last
    );
}

/// Sweeps the pointer along a spiral over every view, mimicking idle mouse
/// motion. Repeated positions over the same sector must not re-push the
/// camera, so the update count stays well below the sample count.
fn sweep_hover(group: &mut HeatmapGroup<LoggingCamera>, diameter: f64, samples: usize) {
    for view_index in 0..group.len() {
        for i in 0..samples {
            let t = i as f64 / samples as f64;
            let angle = t * std::f64::consts::TAU * 2.0;
            let radius = t * diameter / 2.0;
            let pointer = Point2::new(
                diameter / 2.0 + radius * angle.cos(),
                diameter / 2.0 + radius * angle.sin(),
            );
            group.pointer_moved(view_index, pointer);
        }
    }
    info!(
        "hover sweep: {} samples/view, {} camera updates",
        samples,
        group.camera().updates
    );
}

fn exercise_selection(group: &mut HeatmapGroup<LoggingCamera>, diameter: f64) {
    let center = Point2::new(diameter / 2.0, diameter / 2.0);
    let off_center = Point2::new(diameter * 0.85, diameter * 0.4);
    let outside = Point2::new(1.0, 1.0);

    group.pointer_pressed(0, center);
    assert!(group.selected().is_some(), "pole selection must stick");
    assert!(group.view(0).locked() && group.view(3).locked());

    group.pointer_pressed(1, off_center);
    let selected = group.selected().expect("selection moved to lower sphere");
    info!("selection moved to view {} sector {:?}", selected.0, selected.1);

    group.pointer_pressed(1, off_center);
    assert!(group.selected().is_none(), "second press deselects");

    group.pointer_pressed(2, outside);
    assert!(
        !group.view(0).locked(),
        "empty-space press releases every lock"
    );
}

fn exercise_rebuilds(group: &mut HeatmapGroup<LoggingCamera>) {
    for view_index in 0..group.len() {
        let view = group.view_mut(view_index);
        let sectors_before = view.layout().arena().len();
        view.rebuild(Projection::EqualArea, StatChannel::Maximum)
            .expect("rebuild with switched projection and channel");
        assert_eq!(
            view.layout().arena().len(),
            sectors_before,
            "sector count survives a rebuild"
        );
    }
    info!("rebuilt all views under equal-area projection / maximum channel");
}

fn export_records(group: &mut HeatmapGroup<LoggingCamera>, path: &str) {
    let mut dumps = Vec::new();
    for view_index in 0..group.len() {
        let view = group.view_mut(view_index);
        let mut sink = CollectingDiagnostics::default();
        let projection = view.projection();
        let channel = view.channel();
        view.rebuild_with(projection, channel, &mut sink)
            .expect("diagnostics rebuild");
        dumps.push(ViewDump {
            title: view.title().to_string(),
            projection: format!("{projection:?}"),
            records: sink.records,
        });
    }

    match File::create(path) {
        Ok(mut file) => {
            let json = serde_json::to_string_pretty(&dumps).expect("serialize records");
            if let Err(e) = file.write_all(json.as_bytes()) {
                tracing::error!("Failed to write export: {e}");
            } else {
                info!("Exported {} views to {}", dumps.len(), path);
            }
        }
        Err(e) => tracing::error!("Failed to create {path}: {e}"),
    }
}
