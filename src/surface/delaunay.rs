//! Delaunay triangulation of hole positions
//!
//! Standard 2D Delaunay over the (x, y) projection via `spade`, followed by
//! an edge-length filter: triangles whose longest edge exceeds the cutoff
//! are discarded so pattern gaps are not spanned by spurious geometry.

use glam::{DVec2, DVec3};
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation};

use crate::error::EngineIssue;

/// One triangle of the surface mesh
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Indices of the source points (holes) at each corner
    pub holes: [usize; 3],
    /// Corner positions
    pub vertices: [DVec3; 3],
    /// Lowest corner elevation, cached for contour level selection
    pub min_z: f64,
    /// Highest corner elevation, cached for contour level selection
    pub max_z: f64,
}

impl Triangle {
    fn new(holes: [usize; 3], vertices: [DVec3; 3]) -> Self {
        let min_z = vertices[0].z.min(vertices[1].z).min(vertices[2].z);
        let max_z = vertices[0].z.max(vertices[1].z).max(vertices[2].z);
        Self {
            holes,
            vertices,
            min_z,
            max_z,
        }
    }

    /// Length of the longest edge in the (x, y) projection
    pub fn longest_edge_2d(&self) -> f64 {
        let p = |v: DVec3| DVec2::new(v.x, v.y);
        let [a, b, c] = self.vertices;
        p(a).distance(p(b))
            .max(p(b).distance(p(c)))
            .max(p(c).distance(p(a)))
    }
}

/// Input vertex carrying its hole index through the triangulation
struct Site {
    position: Point2<f64>,
    hole: usize,
}

impl HasPosition for Site {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// Triangulate point positions, discarding over-long triangles
///
/// `points[i].z` is the elevation associated with hole `i`; the (x, y)
/// projection drives the triangulation. Fewer than three distinct finite
/// points yield an empty mesh with an `InsufficientData` issue; collinear
/// and duplicate points never panic. Duplicates collapse to their first
/// occurrence and are reported as `DegenerateGeometry`.
pub fn triangulate(points: &[DVec3], max_edge_length: f64) -> (Vec<Triangle>, Vec<EngineIssue>) {
    let mut issues = Vec::new();

    let mut triangulation: DelaunayTriangulation<Site> = DelaunayTriangulation::new();
    let mut seen = std::collections::HashMap::new();
    let mut skipped_non_finite = 0usize;
    let mut skipped_duplicates = 0usize;
    let mut skipped_out_of_range = 0usize;

    for (i, p) in points.iter().enumerate() {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            skipped_non_finite += 1;
            continue;
        }
        if seen
            .insert((p.x.to_bits(), p.y.to_bits()), i)
            .is_some()
        {
            skipped_duplicates += 1;
            continue;
        }
        let site = Site {
            position: Point2::new(p.x, p.y),
            hole: i,
        };
        // Finite coordinates can still exceed the triangulator's permitted
        // magnitude
        if triangulation.insert(site).is_err() {
            skipped_out_of_range += 1;
        }
    }

    if skipped_non_finite > 0 {
        issues.push(EngineIssue::DegenerateGeometry {
            detail: format!("{} non-finite positions skipped", skipped_non_finite),
        });
    }
    if skipped_out_of_range > 0 {
        issues.push(EngineIssue::DegenerateGeometry {
            detail: format!(
                "{} positions outside the triangulator's coordinate range",
                skipped_out_of_range
            ),
        });
    }
    if skipped_duplicates > 0 {
        issues.push(EngineIssue::DegenerateGeometry {
            detail: format!("{} coincident positions collapsed", skipped_duplicates),
        });
    }

    if triangulation.num_vertices() < 3 {
        issues.push(EngineIssue::InsufficientData {
            stage: "triangulation",
            detail: format!(
                "{} distinct points, need at least 3",
                triangulation.num_vertices()
            ),
        });
        return (Vec::new(), issues);
    }

    let mut triangles = Vec::with_capacity(triangulation.num_inner_faces());
    for face in triangulation.inner_faces() {
        let corners = face.vertices();
        let holes = [
            corners[0].data().hole,
            corners[1].data().hole,
            corners[2].data().hole,
        ];
        let vertices = [points[holes[0]], points[holes[1]], points[holes[2]]];
        let triangle = Triangle::new(holes, vertices);
        if triangle.longest_edge_2d() <= max_edge_length {
            triangles.push(triangle);
        }
    }

    (triangles, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points(rows: usize, cols: usize, pitch: f64) -> Vec<DVec3> {
        let mut points = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                points.push(DVec3::new(c as f64 * pitch, r as f64 * pitch, 100.0));
            }
        }
        points
    }

    #[test]
    fn test_grid_triangulates_fully() {
        let points = grid_points(3, 3, 3.0);
        let (triangles, issues) = triangulate(&points, 25.0);

        // A 3x3 grid has 4 quads, each split into 2 triangles
        assert_eq!(triangles.len(), 8);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_edge_length_cutoff() {
        // Two tight clusters far apart: no triangle may bridge the gap
        let mut points = grid_points(2, 2, 3.0);
        for p in grid_points(2, 2, 3.0) {
            points.push(p + DVec3::new(200.0, 0.0, 0.0));
        }
        let (triangles, _) = triangulate(&points, 10.0);

        assert!(!triangles.is_empty());
        for t in &triangles {
            assert!(t.longest_edge_2d() <= 10.0);
        }
        // Each cluster triangulates on its own: 2 triangles per square
        assert_eq!(triangles.len(), 4);
    }

    #[test]
    fn test_isolated_point_in_no_triangle() {
        let mut points = grid_points(2, 2, 3.0);
        points.push(DVec3::new(500.0, 500.0, 100.0));
        let (triangles, _) = triangulate(&points, 10.0);

        assert!(triangles.iter().all(|t| !t.holes.contains(&4)));
    }

    #[test]
    fn test_too_few_points_is_empty_not_error() {
        let (triangles, issues) = triangulate(&[], 25.0);
        assert!(triangles.is_empty());
        assert!(matches!(issues[0], EngineIssue::InsufficientData { .. }));

        let two = vec![DVec3::ZERO, DVec3::new(3.0, 0.0, 0.0)];
        let (triangles, issues) = triangulate(&two, 25.0);
        assert!(triangles.is_empty());
        assert!(matches!(
            issues.last(),
            Some(EngineIssue::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_collinear_points_yield_no_triangles() {
        let points: Vec<DVec3> = (0..5).map(|i| DVec3::new(i as f64 * 3.0, 0.0, 100.0)).collect();
        let (triangles, _) = triangulate(&points, 25.0);
        assert!(triangles.is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut points = grid_points(2, 2, 3.0);
        points.push(points[0]);
        let (triangles, issues) = triangulate(&points, 25.0);

        assert_eq!(triangles.len(), 2);
        assert!(issues
            .iter()
            .any(|i| matches!(i, EngineIssue::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_out_of_range_point_reported() {
        // Finite but far beyond the coordinate magnitude spade accepts
        let mut points = grid_points(2, 2, 3.0);
        points.push(DVec3::new(1.0e300, 0.0, 100.0));
        let (triangles, issues) = triangulate(&points, 25.0);

        assert_eq!(triangles.len(), 2);
        assert!(issues
            .iter()
            .any(|i| matches!(i, EngineIssue::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_non_finite_points_skipped() {
        let mut points = grid_points(2, 2, 3.0);
        points.push(DVec3::new(f64::NAN, 0.0, 0.0));
        let (triangles, issues) = triangulate(&points, 25.0);

        assert_eq!(triangles.len(), 2);
        assert!(issues
            .iter()
            .any(|i| matches!(i, EngineIssue::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_min_max_z_cached() {
        let points = vec![
            DVec3::new(0.0, 0.0, 95.0),
            DVec3::new(3.0, 0.0, 100.0),
            DVec3::new(0.0, 3.0, 105.0),
        ];
        let (triangles, _) = triangulate(&points, 25.0);
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0].min_z, 95.0);
        assert_eq!(triangles[0].max_z, 105.0);
    }
}
