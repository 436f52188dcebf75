//! Full-pattern computation
//!
//! [`BlastPattern`] runs every stage of the engine over an immutable hole
//! snapshot: row detection, burden/spacing, firing-time propagation,
//! triangulation, contouring, Voronoi partition and metrics. All derived
//! fields are recomputed wholesale on every invocation — the engine keeps
//! no dirty state between calls; the host decides when to recompute.

use std::collections::HashMap;

use glam::DVec2;

use crate::cancel::CancelToken;
use crate::config::{EngineConfig, SurfaceBasis};
use crate::error::{EngineError, EngineIssue, Result};
use crate::hole::{Hole, HoleRef};
use crate::rows::{compute_burden_spacing, detect_rows_cancellable};
use crate::surface::{generate_contours, triangulate, ContourSet, Triangle};
use crate::timing::propagate_firing_times;
use crate::voronoi::{aggregate_metrics, partition, HoleMetrics, VoronoiCell};

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// A fully computed blast pattern
///
/// # Example
///
/// ```
/// use blast_geometry::{BlastPattern, EngineConfig, Hole, HoleRef};
/// use glam::DVec3;
///
/// let mk = |id: &str, x: f64| {
///     Hole::new(
///         "Shot1",
///         id,
///         DVec3::new(x, 0.0, 110.0),
///         DVec3::new(x, 0.0, 100.0),
///         DVec3::new(x, 0.0, 99.0),
///     )
/// };
/// let holes = vec![
///     mk("H1", 0.0),
///     mk("H2", 3.0).with_connector(HoleRef::new("Shot1", "H1"), 17.0),
///     mk("H3", 6.0).with_connector(HoleRef::new("Shot1", "H2"), 17.0),
/// ];
///
/// let pattern = BlastPattern::solve(holes, &EngineConfig::default()).unwrap();
/// let times: Vec<_> = pattern.holes().iter().map(|h| h.firing_time_ms).collect();
/// assert_eq!(times, vec![Some(0.0), Some(17.0), Some(34.0)]);
/// ```
#[derive(Clone)]
pub struct BlastPattern {
    config: EngineConfig,
    holes: Vec<Hole>,
    /// Entity names in first-appearance order
    entities: Vec<String>,
    /// Row orientation per entity, radians
    orientations: HashMap<String, f64>,
    triangles: Vec<Triangle>,
    contours: ContourSet,
    /// Cells with `hole` indexing into the full hole list
    cells: Vec<VoronoiCell>,
    /// Parallel to `cells`
    metrics: Vec<HoleMetrics>,
    issues: Vec<EngineIssue>,
    #[cfg(feature = "spatial-index")]
    spatial_index: Option<SpatialIndex>,
}

impl BlastPattern {
    /// Compute everything for a hole snapshot
    ///
    /// # Errors
    ///
    /// `DuplicateHole` if two holes share an (entity, id) identity.
    pub fn solve(holes: Vec<Hole>, config: &EngineConfig) -> Result<Self> {
        Self::solve_with_cancel(holes, config, &CancelToken::new())
    }

    /// [`BlastPattern::solve`] with cooperative cancellation
    ///
    /// Intended for worker threads: the host cancels the token when a newer
    /// edit supersedes this snapshot, and the computation returns
    /// `EngineError::Cancelled` at the next check.
    pub fn solve_with_cancel(
        mut holes: Vec<Hole>,
        config: &EngineConfig,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let mut seen: HashMap<HoleRef, usize> = HashMap::with_capacity(holes.len());
        for hole in &holes {
            if seen.insert(hole.href(), 0).is_some() {
                return Err(EngineError::DuplicateHole(hole.href()));
            }
        }

        for hole in &mut holes {
            hole.reset_derived();
        }

        let mut issues = Vec::new();

        // Group by entity, preserving first-appearance order
        let mut entities: Vec<String> = Vec::new();
        let mut by_entity: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, hole) in holes.iter().enumerate() {
            by_entity
                .entry(hole.entity.clone())
                .or_insert_with(|| {
                    entities.push(hole.entity.clone());
                    Vec::new()
                })
                .push(i);
        }

        // Rows and burden/spacing, one entity at a time
        let mut orientations = HashMap::new();
        for entity in &entities {
            cancel.check()?;
            let members = &by_entity[entity];
            let positions: Vec<DVec2> = members.iter().map(|&i| holes[i].collar_2d()).collect();

            let layout = detect_rows_cancellable(&positions, config, Some(cancel))?;
            orientations.insert(entity.clone(), layout.orientation);
            for (k, &i) in members.iter().enumerate() {
                holes[i].row_id = Some(layout.places[k].row_id);
                holes[i].pos_id = Some(layout.places[k].pos_id);
            }

            let (burden_spacing, row_issues) = compute_burden_spacing(&positions, &layout, entity);
            issues.extend(row_issues);
            for (k, &i) in members.iter().enumerate() {
                holes[i].burden_m = burden_spacing[k].burden;
                holes[i].spacing_m = burden_spacing[k].spacing;
            }
        }

        // Firing times over the whole snapshot (connectors may cross entities)
        cancel.check()?;
        let (timing, timing_issues) = propagate_firing_times(&holes);
        issues.extend(timing_issues);
        for (i, time) in timing.firing_times_ms.iter().enumerate() {
            holes[i].firing_time_ms = *time;
        }

        // Surface mesh and contours over all entities together
        cancel.check()?;
        let surface_points: Vec<_> = holes
            .iter()
            .map(|h| match config.surface_basis {
                SurfaceBasis::Collar => h.collar,
                SurfaceBasis::Grade => h.grade,
            })
            .collect();
        let (triangles, surface_issues) = triangulate(&surface_points, config.max_edge_length);
        issues.extend(surface_issues);

        cancel.check()?;
        let contours = generate_contours(&triangles, config.contour_interval);

        // Voronoi cells and metrics, one entity at a time
        let mut cells = Vec::with_capacity(holes.len());
        let mut metrics = Vec::with_capacity(holes.len());
        for entity in &entities {
            cancel.check()?;
            let members = &by_entity[entity];
            let positions: Vec<DVec2> = members.iter().map(|&i| holes[i].collar_2d()).collect();

            let toe_radii: Option<Vec<Option<f64>>> = config
                .clip_to_toe_radius
                .then(|| members.iter().map(|&i| holes[i].toe_radius_m).collect());
            let (entity_cells, cell_issues) = partition(
                &positions,
                config.voronoi_margin_m,
                toe_radii.as_deref(),
                Some(cancel),
            )?;
            issues.extend(cell_issues);

            // Remap local cell indices to snapshot indices
            let entity_cells: Vec<VoronoiCell> = entity_cells
                .into_iter()
                .map(|mut cell| {
                    cell.hole = members[cell.hole];
                    cell
                })
                .collect();
            metrics.extend(aggregate_metrics(&entity_cells, &holes, config.height_basis));
            cells.extend(entity_cells);
        }

        #[cfg(feature = "spatial-index")]
        let spatial_index = if holes.is_empty() {
            None
        } else {
            let collars: Vec<DVec2> = holes.iter().map(|h| h.collar_2d()).collect();
            Some(SpatialIndex::new(&collars))
        };

        Ok(Self {
            config: *config,
            holes,
            entities,
            orientations,
            triangles,
            contours,
            cells,
            metrics,
            issues,
            #[cfg(feature = "spatial-index")]
            spatial_index,
        })
    }

    /// Configuration used for this computation
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// All holes with their derived fields filled in, in input order
    #[inline]
    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    /// Entity names in first-appearance order
    #[inline]
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Row orientation of an entity, radians in `[0, π)`
    pub fn orientation(&self, entity: &str) -> Option<f64> {
        self.orientations.get(entity).copied()
    }

    /// Surface mesh after the edge-length filter
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Contour segments and polylines
    #[inline]
    pub fn contours(&self) -> &ContourSet {
        &self.contours
    }

    /// Voronoi cells; `cell.hole` indexes into [`BlastPattern::holes`]
    #[inline]
    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    /// Per-cell metrics, parallel to [`BlastPattern::cells`]
    #[inline]
    pub fn metrics(&self) -> &[HoleMetrics] {
        &self.metrics
    }

    /// Non-fatal issues collected across all stages
    #[inline]
    pub fn issues(&self) -> &[EngineIssue] {
        &self.issues
    }

    /// Look up a hole by identity
    pub fn hole(&self, href: &HoleRef) -> Option<&Hole> {
        self.holes
            .iter()
            .find(|h| h.entity == href.entity && h.id == href.id)
    }

    /// Index of the hole whose collar is nearest to a plan position
    /// (requires the `spatial-index` feature)
    ///
    /// Returns `None` for an empty pattern.
    #[cfg(feature = "spatial-index")]
    pub fn find_hole_at(&self, position: DVec2) -> Option<usize> {
        self.spatial_index
            .as_ref()
            .map(|index| index.find_nearest(position))
    }
}
