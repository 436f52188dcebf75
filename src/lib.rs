//! Blast geometry and timing engine
//!
//! A standalone library computing the derived geometry of open-pit blast
//! patterns: row structure, burden and spacing, detonator firing times,
//! surface triangulation with contours, and per-hole Voronoi influence
//! metrics. Pure computation over an immutable hole snapshot, suitable for
//! embedding in any drill-and-blast design host.
//!
//! # Quick Start
//!
//! ```rust
//! use blast_geometry::*;
//! use glam::DVec3;
//!
//! let mk = |id: &str, x: f64, y: f64| {
//!     Hole::new(
//!         "Shot1",
//!         id,
//!         DVec3::new(x, y, 110.0),
//!         DVec3::new(x, y, 100.0),
//!         DVec3::new(x, y, 99.0),
//!     )
//!     .with_charge(250.0)
//! };
//! let holes = vec![
//!     mk("H1", 0.0, 0.0),
//!     mk("H2", 3.0, 0.0).with_connector(HoleRef::new("Shot1", "H1"), 17.0),
//!     mk("H3", 0.0, 3.5),
//!     mk("H4", 3.0, 3.5),
//! ];
//!
//! let config = EngineConfigBuilder::new()
//!     .contour_interval(0.5).unwrap()
//!     .build();
//! let pattern = BlastPattern::solve(holes, &config).unwrap();
//!
//! let h2 = pattern.hole(&HoleRef::new("Shot1", "H2")).unwrap();
//! assert_eq!(h2.firing_time_ms, Some(17.0));
//! assert_eq!(h2.row_id, Some(0));
//! println!("{} cells, {} triangles", pattern.cells().len(), pattern.triangles().len());
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) position-to-hole lookups using a KD-tree
//! - `serde`: serialization support for holes and configuration

// Modules
pub mod error;
pub mod config;
pub mod cancel;
pub mod geometry;
pub mod hole;
pub mod rows;
pub mod timing;
pub mod surface;
pub mod voronoi;
pub mod pattern;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{EngineError, EngineIssue, Result};
pub use config::{EngineConfig, EngineConfigBuilder, HeightBasis, SurfaceBasis};
pub use cancel::CancelToken;
pub use hole::{Connector, Hole, HoleRef};
pub use rows::{compute_burden_spacing, detect_rows, detect_rows_cancellable};
pub use rows::{BurdenSpacing, RowLayout, RowPlace};
pub use timing::{propagate_firing_times, TimingResult};
pub use surface::{generate_contours, triangulate};
pub use surface::{ContourPolyline, ContourSegment, ContourSet, Triangle};
pub use voronoi::{aggregate_metrics, partition, HoleMetrics, VoronoiCell};
pub use pattern::BlastPattern;

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam vector types for convenience
pub use glam::{DVec2, DVec3};
