//! Planar geometric primitives
//!
//! Leaf utilities shared by row detection, contouring and the Voronoi
//! partitioner: bearings, principal axes, point-to-line distances and
//! polygon operations. Everything works on `glam::DVec2` in a planar
//! projected coordinate system (x east, y north, metres).

use glam::DVec2;

/// Bearing from `a` to `b` in degrees, clockwise from north, in `[0, 360)`
pub fn bearing_deg(a: DVec2, b: DVec2) -> f64 {
    let d = b - a;
    let deg = d.x.atan2(d.y).to_degrees();
    (deg + 360.0) % 360.0
}

/// Unit vector for an axis angle (radians, measured from the x axis)
#[inline]
pub fn axis_direction(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Left-hand normal of an axis angle
#[inline]
pub fn axis_normal(angle: f64) -> DVec2 {
    DVec2::new(-angle.sin(), angle.cos())
}

/// Principal axis angle of a point cloud, radians in `[0, π)`
///
/// The axis of the best-fit line through the points, from the closed-form
/// eigenvector of the 2x2 covariance matrix. An isotropic or empty cloud
/// yields 0 (the x axis), which keeps downstream ordering deterministic.
pub fn principal_axis(points: &[DVec2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len() as f64;
    let mean = points.iter().copied().sum::<DVec2>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for p in points {
        let d = *p - mean;
        sxx += d.x * d.x;
        sxy += d.x * d.y;
        syy += d.y * d.y;
    }

    let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    // Fold into [0, π): an axis has no direction
    if angle < 0.0 {
        angle + std::f64::consts::PI
    } else {
        angle
    }
}

/// Perpendicular distance from `point` to the infinite line through
/// `origin` with direction `dir` (need not be normalised)
pub fn perpendicular_distance(point: DVec2, origin: DVec2, dir: DVec2) -> f64 {
    let len = dir.length();
    if len < f64::EPSILON {
        return point.distance(origin);
    }
    let d = point - origin;
    (d.x * dir.y - d.y * dir.x).abs() / len
}

/// Signed area of a polygon (shoelace); positive for counter-clockwise winding
pub fn polygon_signed_area(polygon: &[DVec2]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    0.5 * sum
}

/// Absolute area of a polygon
#[inline]
pub fn polygon_area(polygon: &[DVec2]) -> f64 {
    polygon_signed_area(polygon).abs()
}

/// Clip a polygon to the half-plane `(p - origin) · normal >= 0`
///
/// Sutherland-Hodgman against a single clip line. The input winding is
/// preserved; a polygon entirely outside the half-plane clips to empty.
pub fn clip_polygon_halfplane(polygon: &[DVec2], origin: DVec2, normal: DVec2) -> Vec<DVec2> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    if polygon.is_empty() {
        return out;
    }

    let side = |p: DVec2| (p - origin).dot(normal);

    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let da = side(a);
        let db = side(b);

        if da >= 0.0 {
            out.push(a);
        }
        // Edge crosses the clip line: emit the intersection
        if (da >= 0.0) != (db >= 0.0) {
            let t = da / (da - db);
            out.push(a + (b - a) * t);
        }
    }
    out
}

/// Axis-aligned rectangle as a counter-clockwise polygon
pub fn rect_polygon(min: DVec2, max: DVec2) -> Vec<DVec2> {
    vec![
        DVec2::new(min.x, min.y),
        DVec2::new(max.x, min.y),
        DVec2::new(max.x, max.y),
        DVec2::new(min.x, max.y),
    ]
}

/// Regular polygon approximating a circle, counter-clockwise
pub fn circle_polygon(center: DVec2, radius: f64, segments: usize) -> Vec<DVec2> {
    (0..segments)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / segments as f64;
            center + DVec2::new(theta.cos(), theta.sin()) * radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearing() {
        let o = DVec2::ZERO;
        assert!((bearing_deg(o, DVec2::new(0.0, 1.0)) - 0.0).abs() < 1e-9); // north
        assert!((bearing_deg(o, DVec2::new(1.0, 0.0)) - 90.0).abs() < 1e-9); // east
        assert!((bearing_deg(o, DVec2::new(0.0, -1.0)) - 180.0).abs() < 1e-9); // south
        assert!((bearing_deg(o, DVec2::new(-1.0, 0.0)) - 270.0).abs() < 1e-9); // west
    }

    #[test]
    fn test_principal_axis_horizontal_line() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(6.0, 0.0),
        ];
        assert!(principal_axis(&points).abs() < 1e-9);
    }

    #[test]
    fn test_principal_axis_diagonal_line() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 2.0),
        ];
        let angle = principal_axis(&points);
        assert!((angle - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
    }

    #[test]
    fn test_principal_axis_degenerate() {
        // A single point and an isotropic square both fall back to the x axis
        assert_eq!(principal_axis(&[DVec2::new(5.0, 5.0)]), 0.0);
        let square = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        ];
        assert_eq!(principal_axis(&square), 0.0);
    }

    #[test]
    fn test_perpendicular_distance() {
        let d = perpendicular_distance(
            DVec2::new(0.0, 2.5),
            DVec2::new(-10.0, 0.0),
            DVec2::new(1.0, 0.0),
        );
        assert!((d - 2.5).abs() < 1e-12);

        // Zero direction degenerates to point distance
        let d = perpendicular_distance(DVec2::new(3.0, 4.0), DVec2::ZERO, DVec2::ZERO);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_area() {
        let unit = rect_polygon(DVec2::ZERO, DVec2::new(2.0, 3.0));
        assert!((polygon_signed_area(&unit) - 6.0).abs() < 1e-12);
        assert!((polygon_area(&unit) - 6.0).abs() < 1e-12);
        assert_eq!(polygon_area(&unit[..2].to_vec()), 0.0);
    }

    #[test]
    fn test_clip_halfplane_splits_square() {
        let square = rect_polygon(DVec2::ZERO, DVec2::new(2.0, 2.0));
        // Keep the half x >= 1
        let clipped = clip_polygon_halfplane(&square, DVec2::new(1.0, 0.0), DVec2::new(1.0, 0.0));
        assert!((polygon_area(&clipped) - 2.0).abs() < 1e-12);

        // Entirely outside clips to empty
        let clipped = clip_polygon_halfplane(&square, DVec2::new(5.0, 0.0), DVec2::new(1.0, 0.0));
        assert!(clipped.is_empty());
    }

    #[test]
    fn test_circle_polygon_area_converges() {
        let poly = circle_polygon(DVec2::new(1.0, 1.0), 2.0, 64);
        let exact = std::f64::consts::PI * 4.0;
        assert!((polygon_area(&poly) - exact).abs() / exact < 0.01);
    }
}
