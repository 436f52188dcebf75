//! Elevation contours over the triangulated surface
//!
//! For every triangle and every contour level strictly inside its Z range,
//! the two crossing edges are linearly interpolated into a segment; the
//! segment inherits a downslope direction from the triangle's Z gradient.
//! Segments sharing endpoints are then stitched into continuous polylines
//! per level.

use std::collections::HashMap;

use glam::{DVec2, DVec3};

use crate::surface::Triangle;

/// Quantisation used when matching segment endpoints across triangles
const STITCH_QUANTUM: f64 = 1e-6;

/// One contour crossing of a single triangle
#[derive(Debug, Clone, Copy)]
pub struct ContourSegment {
    /// Elevation of this contour
    pub level: f64,
    /// First endpoint, on a triangle edge
    pub a: DVec2,
    /// Second endpoint, on another edge of the same triangle
    pub b: DVec2,
    /// Unit vector pointing downhill across the contour; zero for
    /// triangles with no horizontal gradient
    pub downslope: DVec2,
}

/// A run of stitched contour segments at one level
#[derive(Debug, Clone)]
pub struct ContourPolyline {
    /// Elevation of this contour
    pub level: f64,
    /// Polyline vertices in order; a closed loop ends on its starting point
    pub points: Vec<DVec2>,
}

/// All contours derived from one mesh
#[derive(Debug, Clone, Default)]
pub struct ContourSet {
    /// Raw per-triangle segments with downslope directions
    pub segments: Vec<ContourSegment>,
    /// Segments merged into continuous runs per level
    pub polylines: Vec<ContourPolyline>,
}

/// Generate contour segments and polylines from a triangle mesh
///
/// Levels are the multiples of `interval`. Levels that coincide with a
/// vertex elevation are treated as passing a hair above it, which keeps
/// every crossing a clean two-edge pair without special cases. A
/// non-positive interval yields an empty set.
pub fn generate_contours(triangles: &[Triangle], interval: f64) -> ContourSet {
    if !(interval.is_finite() && interval > 0.0) || triangles.is_empty() {
        return ContourSet::default();
    }

    let mut segments = Vec::new();
    for triangle in triangles {
        let downslope = downslope_direction(triangle);

        let mut level = (triangle.min_z / interval).ceil() * interval;
        while level < triangle.max_z {
            if let Some((a, b)) = cross_triangle(triangle, level) {
                segments.push(ContourSegment {
                    level,
                    a,
                    b,
                    downslope,
                });
            }
            level += interval;
        }
    }

    let polylines = stitch(&segments, interval);
    ContourSet {
        segments,
        polylines,
    }
}

/// Downhill direction of a triangle's plane, projected to 2D
fn downslope_direction(triangle: &Triangle) -> DVec2 {
    let [v0, v1, v2] = triangle.vertices;
    let normal = (v1 - v0).cross(v2 - v0);
    if normal.z.abs() < f64::EPSILON {
        return DVec2::ZERO; // vertical or degenerate triangle
    }
    let gradient = DVec2::new(-normal.x / normal.z, -normal.y / normal.z);
    if gradient.length_squared() < f64::EPSILON {
        DVec2::ZERO // flat triangle
    } else {
        -gradient.normalize()
    }
}

/// Intersect one triangle with one level plane
///
/// Vertex elevations exactly on the level are nudged up by a tiny epsilon
/// so a crossing always involves exactly two edges (or none).
fn cross_triangle(triangle: &Triangle, level: f64) -> Option<(DVec2, DVec2)> {
    let adjust = |z: f64| {
        if (z - level).abs() < 1e-9 {
            level + 1e-9
        } else {
            z
        }
    };
    let zs = [
        adjust(triangle.vertices[0].z),
        adjust(triangle.vertices[1].z),
        adjust(triangle.vertices[2].z),
    ];

    let mut hits = Vec::with_capacity(2);
    for (i, j) in [(0usize, 1usize), (1, 2), (2, 0)] {
        let (za, zb) = (zs[i], zs[j]);
        if (za > level) == (zb > level) {
            continue;
        }
        let t = (level - za) / (zb - za);
        let a = triangle.vertices[i];
        let b = triangle.vertices[j];
        hits.push(DVec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
    }

    match hits.as_slice() {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}

/// Merge segments sharing endpoints into per-level polylines
fn stitch(segments: &[ContourSegment], interval: f64) -> Vec<ContourPolyline> {
    // Group by level index to avoid float keys
    let mut by_level: HashMap<i64, Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_level
            .entry((seg.level / interval).round() as i64)
            .or_default()
            .push(i);
    }

    let mut level_keys: Vec<i64> = by_level.keys().copied().collect();
    level_keys.sort();

    let mut polylines = Vec::new();
    for key in level_keys {
        let members = &by_level[&key];
        polylines.extend(stitch_level(segments, members));
    }
    polylines
}

fn endpoint_key(p: DVec2) -> (i64, i64) {
    (
        (p.x / STITCH_QUANTUM).round() as i64,
        (p.y / STITCH_QUANTUM).round() as i64,
    )
}

fn stitch_level(segments: &[ContourSegment], members: &[usize]) -> Vec<ContourPolyline> {
    // Endpoint -> (member position, is_b_end) adjacency
    let mut by_endpoint: HashMap<(i64, i64), Vec<(usize, bool)>> = HashMap::new();
    for (slot, &seg_idx) in members.iter().enumerate() {
        let seg = &segments[seg_idx];
        by_endpoint.entry(endpoint_key(seg.a)).or_default().push((slot, false));
        by_endpoint.entry(endpoint_key(seg.b)).or_default().push((slot, true));
    }

    let mut used = vec![false; members.len()];
    let mut polylines = Vec::new();

    for start in 0..members.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let seg = &segments[members[start]];
        let mut points: std::collections::VecDeque<DVec2> = [seg.a, seg.b].into_iter().collect();

        // Grow forwards from the tail, then backwards from the head
        loop {
            let tail = *points.back().unwrap_or(&seg.b);
            match take_continuation(segments, members, &by_endpoint, &mut used, tail) {
                Some(next) => points.push_back(next),
                None => break,
            }
        }
        loop {
            let head = *points.front().unwrap_or(&seg.a);
            match take_continuation(segments, members, &by_endpoint, &mut used, head) {
                Some(next) => points.push_front(next),
                None => break,
            }
        }

        polylines.push(ContourPolyline {
            level: seg.level,
            points: points.into_iter().collect(),
        });
    }
    polylines
}

/// Consume an unused segment touching `point` and return its far endpoint
fn take_continuation(
    segments: &[ContourSegment],
    members: &[usize],
    by_endpoint: &HashMap<(i64, i64), Vec<(usize, bool)>>,
    used: &mut [bool],
    point: DVec2,
) -> Option<DVec2> {
    let candidates = by_endpoint.get(&endpoint_key(point))?;
    for &(slot, is_b) in candidates {
        if used[slot] {
            continue;
        }
        used[slot] = true;
        let seg = &segments[members[slot]];
        return Some(if is_b { seg.a } else { seg.b });
    }
    None
}
