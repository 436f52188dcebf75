//! Voronoi influence partition
//!
//! Every hole receives the region of the plane closer to it than to any
//! other hole of the same entity, as a finite polygon: cells are carved
//! from the pattern bounding box (expanded by a margin) by clipping with
//! the perpendicular bisector against each other hole. Because clipping is
//! the only operation, unclipped cell areas always sum to exactly the
//! bounding-box area. Optionally a cell is further clipped to the hole's
//! toe-radius circle.

mod metrics;

pub use metrics::{aggregate_metrics, HoleMetrics};

use glam::DVec2;

use crate::cancel::CancelToken;
use crate::error::{EngineIssue, Result};
use crate::geometry::{circle_polygon, clip_polygon_halfplane, polygon_area, rect_polygon};

/// Segments used when approximating a toe-radius circle for clipping
const CIRCLE_SEGMENTS: usize = 64;

/// One hole's influence polygon
#[derive(Debug, Clone)]
pub struct VoronoiCell {
    /// Index of the hole this cell belongs to, in partition input order
    pub hole: usize,
    /// Cell boundary, counter-clockwise; empty for degenerate input
    pub polygon: Vec<DVec2>,
    /// Enclosed area in square metres
    pub area_m2: f64,
}

/// Partition one entity's holes into finite Voronoi cells
///
/// `margin` expands the collar bounding box that closes perimeter cells.
/// When `toe_radii` is supplied, each cell with a radius is additionally
/// clipped to that circle around its hole. Coincident holes are left
/// unseparated (their cells overlap) and reported as degenerate geometry
/// rather than failing.
///
/// Returns one cell per input position, in input order.
pub fn partition(
    positions: &[DVec2],
    margin: f64,
    toe_radii: Option<&[Option<f64>]>,
    cancel: Option<&CancelToken>,
) -> Result<(Vec<VoronoiCell>, Vec<EngineIssue>)> {
    let mut issues = Vec::new();
    let n = positions.len();
    if n == 0 {
        return Ok((Vec::new(), issues));
    }

    let finite: Vec<bool> = positions
        .iter()
        .map(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    if finite.iter().any(|f| !f) {
        issues.push(EngineIssue::DegenerateGeometry {
            detail: "non-finite positions excluded from Voronoi partition".to_string(),
        });
    }

    let bounds = bounding_box(positions, &finite, margin);
    let mut coincident_pairs = 0usize;

    let mut cells = Vec::with_capacity(n);
    for i in 0..n {
        if let Some(token) = cancel {
            token.check()?;
        }
        if !finite[i] {
            cells.push(VoronoiCell {
                hole: i,
                polygon: Vec::new(),
                area_m2: 0.0,
            });
            continue;
        }

        let mut polygon = rect_polygon(bounds.0, bounds.1);
        for j in 0..n {
            if i == j || !finite[j] {
                continue;
            }
            let towards = positions[j] - positions[i];
            if towards.length_squared() < f64::EPSILON {
                // Coincident holes have no bisector; leave both cells whole
                if i < j {
                    coincident_pairs += 1;
                }
                continue;
            }
            let midpoint = positions[i] + towards * 0.5;
            // Keep the side containing hole i
            polygon = clip_polygon_halfplane(&polygon, midpoint, -towards);
            if polygon.is_empty() {
                break;
            }
        }

        if let Some(radii) = toe_radii {
            if let Some(radius) = radii.get(i).copied().flatten() {
                if radius > 0.0 {
                    let circle = circle_polygon(positions[i], radius, CIRCLE_SEGMENTS);
                    polygon = clip_to_convex(&polygon, &circle);
                }
            }
        }

        let area_m2 = polygon_area(&polygon);
        cells.push(VoronoiCell {
            hole: i,
            polygon,
            area_m2,
        });
    }

    if coincident_pairs > 0 {
        issues.push(EngineIssue::DegenerateGeometry {
            detail: format!(
                "{} coincident hole pairs share overlapping cells",
                coincident_pairs
            ),
        });
    }

    Ok((cells, issues))
}

/// Collar bounding box over the finite positions, expanded by the margin
fn bounding_box(positions: &[DVec2], finite: &[bool], margin: f64) -> (DVec2, DVec2) {
    let mut min = DVec2::splat(f64::INFINITY);
    let mut max = DVec2::splat(f64::NEG_INFINITY);
    for (p, ok) in positions.iter().zip(finite) {
        if *ok {
            min = min.min(*p);
            max = max.max(*p);
        }
    }
    if min.x > max.x {
        // No finite positions at all
        return (DVec2::ZERO, DVec2::ZERO);
    }
    (min - DVec2::splat(margin), max + DVec2::splat(margin))
}

/// Clip a polygon against every edge of a convex polygon
fn clip_to_convex(polygon: &[DVec2], convex: &[DVec2]) -> Vec<DVec2> {
    let mut result = polygon.to_vec();
    for i in 0..convex.len() {
        if result.is_empty() {
            break;
        }
        let a = convex[i];
        let b = convex[(i + 1) % convex.len()];
        let edge = b - a;
        // Inward normal for counter-clockwise winding
        let normal = DVec2::new(-edge.y, edge.x);
        result = clip_polygon_halfplane(&result, a, normal);
    }
    result
}
