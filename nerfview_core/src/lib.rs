//! NerfView Core - circular heatmap engine for per-view NeRF uncertainty
//!
//! Maps a hemisphere of sampled viewing directions onto a 2-D disk and
//! builds an interactive nested pie-sector layout from per-direction
//! uncertainty statistics:
//! 1. **Projection**: equidistant or equal-area radial laws, switchable at
//!    runtime, sharing one sector-ordering contract
//! 2. **Sector geometry**: nested annulus wedges whose inner sub-sector
//!    encodes a secondary extreme statistic, plus training-view markers
//! 3. **Synchronization**: hover/selection highlighting federated across
//!    sibling views by camera-facing angle pair, driving a shared camera

pub mod angles;
pub mod color;
pub mod error;
pub mod marker;
pub mod projection;
pub mod sector;
pub mod table;
pub mod view;

#[cfg(feature = "visualization")]
pub mod visualization;

// Re-export key types for convenience
pub use angles::{AngleGrid, AngleKey, Hemisphere};
pub use error::HeatmapError;
pub use marker::{Marker, MarkerPlacer};
pub use projection::{ProjectedPoint, Projection};
pub use sector::{
    CollectingDiagnostics, DiagnosticsSink, NullDiagnostics, Sector, SectorBuilder, SectorId,
    SectorLayout, SectorRecord,
};
pub use table::{CellStats, StatChannel, UncertaintyTable};
pub use view::{CameraSink, HeatmapGroup, HeatmapView, NullCamera};
