//! Row structure detection
//!
//! Turns the flat collar positions of one entity into a row/position grid:
//! every hole receives a `row_id` and `pos_id`, and the entity receives one
//! row orientation angle. Clustering happens in [`cluster`]; this module
//! orders the clusters into rows, force-assigns leftover points and fits
//! the orientation.

mod cluster;
mod spacing;

pub use spacing::{compute_burden_spacing, BurdenSpacing};

use glam::DVec2;

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::geometry::{axis_direction, axis_normal, perpendicular_distance, principal_axis};

use cluster::{cluster_points, ClusterParams};

/// A hole's place in the detected grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPlace {
    /// Row index, 0-based, ascending along the orientation normal
    pub row_id: usize,
    /// Position within the row, 0-based, ascending along the orientation
    pub pos_id: usize,
}

/// Result of row detection for one entity
#[derive(Debug, Clone)]
pub struct RowLayout {
    /// One place per input position, in input order
    pub places: Vec<RowPlace>,
    /// Row orientation: axis angle in radians, `[0, π)`
    pub orientation: f64,
    /// Number of detected rows
    pub row_count: usize,
}

impl RowLayout {
    /// Indices of the holes in each row, sorted by position
    pub fn rows(&self) -> Vec<Vec<usize>> {
        let mut rows = vec![Vec::new(); self.row_count];
        let mut order: Vec<usize> = (0..self.places.len()).collect();
        order.sort_by_key(|&i| (self.places[i].row_id, self.places[i].pos_id));
        for i in order {
            rows[self.places[i].row_id].push(i);
        }
        rows
    }
}

/// Detect rows for one entity's 2D collar positions
///
/// Every hole ends with a row, never "unassigned": clustering leftovers are
/// force-assigned to the row with the smallest perpendicular distance to the
/// row's fitted line. Fewer than two positions degenerate to a single row.
/// Duplicate and collinear inputs terminate normally.
///
/// Identical inputs always yield the identical layout.
pub fn detect_rows(positions: &[DVec2], config: &EngineConfig) -> RowLayout {
    // Cancellation is impossible without a token
    detect_rows_cancellable(positions, config, None).unwrap_or_else(|_| unreachable!())
}

/// [`detect_rows`] with cooperative cancellation
///
/// The pairwise matrix construction checks the token once per point row and
/// returns `EngineError::Cancelled` when the host abandons the computation.
pub fn detect_rows_cancellable(
    positions: &[DVec2],
    config: &EngineConfig,
    cancel: Option<&CancelToken>,
) -> Result<RowLayout> {
    let n = positions.len();
    if n < 2 {
        return Ok(RowLayout {
            places: vec![
                RowPlace {
                    row_id: 0,
                    pos_id: 0
                };
                n
            ],
            orientation: 0.0,
            row_count: n.min(1),
        });
    }

    let params = ClusterParams {
        chain_affinity: config.chain_affinity,
        cluster_scale: config.cluster_scale,
    };
    let labels = cluster_points(positions, &params, cancel)?;

    let cluster_count = labels.iter().flatten().max().map_or(0, |m| m + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
    for (i, label) in labels.iter().enumerate() {
        if let Some(c) = *label {
            members[c].push(i);
        }
    }

    // Orientation from the dominant (largest) cluster, whole entity as a
    // fallback for degenerate dominants
    let dominant = members
        .iter()
        .enumerate()
        .max_by_key(|(c, m)| (m.len(), usize::MAX - c))
        .map(|(c, _)| c)
        .unwrap_or(0);
    let orientation = if members.get(dominant).map_or(0, Vec::len) >= 2 {
        let pts: Vec<DVec2> = members[dominant].iter().map(|&i| positions[i]).collect();
        principal_axis(&pts)
    } else {
        principal_axis(positions)
    };

    // Force-assign noise points to the closest row line
    let lines: Vec<(DVec2, DVec2)> = members
        .iter()
        .map(|m| row_line(positions, m, orientation))
        .collect();
    for (i, label) in labels.iter().enumerate() {
        if label.is_some() {
            continue;
        }
        let closest = lines
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = perpendicular_distance(positions[i], a.0, a.1);
                let db = perpendicular_distance(positions[i], b.0, b.1);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(c, _)| c)
            .unwrap_or(0);
        members[closest].push(i);
    }

    // Number rows by ascending offset along the orientation normal
    let normal = axis_normal(orientation);
    let axis = axis_direction(orientation);
    let mut row_order: Vec<usize> = (0..members.len()).collect();
    let row_key = |c: usize| {
        let m = &members[c];
        m.iter().map(|&i| positions[i].dot(normal)).sum::<f64>() / m.len() as f64
    };
    row_order.sort_by(|&a, &b| {
        row_key(a)
            .partial_cmp(&row_key(b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut places = vec![
        RowPlace {
            row_id: 0,
            pos_id: 0
        };
        n
    ];
    for (row_id, &c) in row_order.iter().enumerate() {
        let mut by_pos = members[c].clone();
        by_pos.sort_by(|&a, &b| {
            positions[a]
                .dot(axis)
                .partial_cmp(&positions[b].dot(axis))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        for (pos_id, &i) in by_pos.iter().enumerate() {
            places[i] = RowPlace { row_id, pos_id };
        }
    }

    Ok(RowLayout {
        places,
        orientation,
        row_count: members.len(),
    })
}

/// Fitted line (origin, direction) for a cluster
///
/// Clusters of one point, or with no spread, use the entity orientation as
/// the direction so force-assignment always has a well-defined distance.
fn row_line(positions: &[DVec2], members: &[usize], orientation: f64) -> (DVec2, DVec2) {
    let pts: Vec<DVec2> = members.iter().map(|&i| positions[i]).collect();
    let centroid = if pts.is_empty() {
        DVec2::ZERO
    } else {
        pts.iter().copied().sum::<DVec2>() / pts.len() as f64
    };
    let dir = if pts.len() >= 2 {
        axis_direction(principal_axis(&pts))
    } else {
        axis_direction(orientation)
    };
    (centroid, dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn grid(rows: usize, cols: usize, spacing: f64, burden: f64) -> Vec<DVec2> {
        let mut points = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                points.push(DVec2::new(c as f64 * spacing, r as f64 * burden));
            }
        }
        points
    }

    #[test]
    fn test_grid_rows_and_positions() {
        let rows = 4;
        let cols = 6;
        let positions = grid(rows, cols, 3.0, 3.5);
        let layout = detect_rows(&positions, &EngineConfig::default());

        assert_eq!(layout.row_count, rows);
        for r in 0..rows {
            for c in 0..cols {
                let place = layout.places[r * cols + c];
                assert_eq!(place.row_id, r, "hole ({}, {})", r, c);
                assert_eq!(place.pos_id, c, "hole ({}, {})", r, c);
            }
        }
        // Rows run along x
        assert!(layout.orientation.abs() < 1e-6);
    }

    #[test]
    fn test_grid_rows_when_spacing_exceeds_burden() {
        // Spacing above burden is the standard bench geometry; rows must
        // still run along the spacing direction
        let rows = 4;
        let cols = 6;
        let positions = grid(rows, cols, 3.5, 3.0);
        let layout = detect_rows(&positions, &EngineConfig::default());

        assert_eq!(layout.row_count, rows);
        for r in 0..rows {
            for c in 0..cols {
                let place = layout.places[r * cols + c];
                assert_eq!(place.row_id, r, "hole ({}, {})", r, c);
                assert_eq!(place.pos_id, c, "hole ({}, {})", r, c);
            }
        }
        assert!(layout.orientation.abs() < 1e-6);
    }

    #[test]
    fn test_rows_accessor_groups_by_row() {
        let positions = grid(2, 3, 3.0, 4.0);
        let layout = detect_rows(&positions, &EngineConfig::default());
        let rows = layout.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![0, 1, 2]);
        assert_eq!(rows[1], vec![3, 4, 5]);
    }

    #[test]
    fn test_single_hole() {
        let layout = detect_rows(&[DVec2::new(4.0, 2.0)], &EngineConfig::default());
        assert_eq!(layout.row_count, 1);
        assert_eq!(
            layout.places,
            vec![RowPlace {
                row_id: 0,
                pos_id: 0
            }]
        );
    }

    #[test]
    fn test_empty_input() {
        let layout = detect_rows(&[], &EngineConfig::default());
        assert_eq!(layout.row_count, 0);
        assert!(layout.places.is_empty());
    }

    #[test]
    fn test_rotated_pattern_orientation() {
        // Same grid rotated 30 degrees; orientation must follow
        let angle: f64 = 30f64.to_radians();
        let rot = |p: DVec2| {
            DVec2::new(
                p.x * angle.cos() - p.y * angle.sin(),
                p.x * angle.sin() + p.y * angle.cos(),
            )
        };
        let positions: Vec<DVec2> = grid(3, 5, 3.0, 3.5).into_iter().map(rot).collect();
        let layout = detect_rows(&positions, &EngineConfig::default());

        assert_eq!(layout.row_count, 3);
        assert!((layout.orientation - angle).abs() < 1e-6);
    }

    #[test]
    fn test_outlier_is_force_assigned() {
        let mut positions = grid(2, 5, 3.0, 4.0);
        // Far off to the side but clearly on row 1's line
        positions.push(DVec2::new(60.0, 4.0));
        let layout = detect_rows(&positions, &EngineConfig::default());

        assert_eq!(layout.row_count, 2);
        let place = layout.places[10];
        assert_eq!(place.row_id, 1);
        assert_eq!(place.pos_id, 5); // past the regular holes
    }

    #[test]
    fn test_duplicate_points_single_row() {
        let positions = vec![DVec2::new(2.0, 2.0); 4];
        let layout = detect_rows(&positions, &EngineConfig::default());
        assert_eq!(layout.row_count, 1);
        // Ties resolve by input order
        let pos_ids: Vec<usize> = layout.places.iter().map(|p| p.pos_id).collect();
        assert_eq!(pos_ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_determinism() {
        let positions = grid(5, 7, 3.2, 3.9);
        let a = detect_rows(&positions, &EngineConfig::default());
        let b = detect_rows(&positions, &EngineConfig::default());
        assert_eq!(a.places, b.places);
        assert_eq!(a.orientation, b.orientation);
        assert_eq!(a.row_count, b.row_count);
    }

    #[test]
    fn test_cancelled_token() {
        let token = CancelToken::new();
        token.cancel();
        let positions = grid(2, 2, 3.0, 4.0);
        let result = detect_rows_cancellable(&positions, &EngineConfig::default(), Some(&token));
        assert!(result.is_err());
    }
}
