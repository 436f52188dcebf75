//! Burden and spacing derivation
//!
//! Once rows are known, burden is the distance to the nearest adjacent row
//! measured along the orientation normal, and spacing is the distance to
//! the adjacent hole in the same row measured along the orientation axis.
//! Interior holes average both sides; boundary holes and rows use the one
//! available neighbour. Values that cannot exist (single-hole row, single
//! row pattern) stay `None` — never NaN, never a panic.

use glam::DVec2;

use crate::error::EngineIssue;
use crate::geometry::{axis_direction, axis_normal};
use crate::rows::RowLayout;

/// Burden and spacing for one hole, metres
///
/// `None` means the metric is unavailable for this hole, which is distinct
/// from a measured zero (coincident holes).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BurdenSpacing {
    /// Perpendicular distance to the nearest adjacent row
    pub burden: Option<f64>,
    /// Distance to the adjacent hole in the same row
    pub spacing: Option<f64>,
}

/// Compute burden and spacing for one entity
///
/// Pure function of its inputs: identical positions and layout always
/// produce identical output. Returns one entry per input position plus a
/// `DegenerateRow` issue for every single-hole row.
pub fn compute_burden_spacing(
    positions: &[DVec2],
    layout: &RowLayout,
    entity: &str,
) -> (Vec<BurdenSpacing>, Vec<EngineIssue>) {
    let n = positions.len();
    let mut result = vec![BurdenSpacing::default(); n];
    let mut issues = Vec::new();
    if n == 0 {
        return (result, issues);
    }

    let axis = axis_direction(layout.orientation);
    let normal = axis_normal(layout.orientation);
    let rows = layout.rows();

    // Mean normal offset per row, in row_id order (ascending by construction)
    let row_offsets: Vec<f64> = rows
        .iter()
        .map(|members| {
            members.iter().map(|&i| positions[i].dot(normal)).sum::<f64>() / members.len() as f64
        })
        .collect();

    for (row_id, members) in rows.iter().enumerate() {
        if members.len() < 2 {
            issues.push(EngineIssue::DegenerateRow {
                entity: entity.to_string(),
                row_id,
            });
        }

        // Along-axis coordinate per member, already sorted by pos_id
        let ts: Vec<f64> = members.iter().map(|&i| positions[i].dot(axis)).collect();

        for (k, &i) in members.iter().enumerate() {
            let before = (k > 0).then(|| (ts[k] - ts[k - 1]).abs());
            let after = (k + 1 < ts.len()).then(|| (ts[k + 1] - ts[k]).abs());
            result[i].spacing = mean_of_available(before, after);

            let offset = positions[i].dot(normal);
            let prev_row = (row_id > 0).then(|| (offset - row_offsets[row_id - 1]).abs());
            let next_row =
                (row_id + 1 < row_offsets.len()).then(|| (row_offsets[row_id + 1] - offset).abs());
            result[i].burden = mean_of_available(prev_row, next_row);
        }
    }

    (result, issues)
}

/// Two-sided average when both neighbours exist, one-sided otherwise
fn mean_of_available(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(0.5 * (a + b)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::rows::detect_rows;

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
    fn test_grid_pitches() {
        let positions = grid(4, 6, 3.0, 3.5);
        let layout = detect_rows(&positions, &EngineConfig::default());
        let (metrics, issues) = compute_burden_spacing(&positions, &layout, "Shot1");

        assert!(issues.is_empty());
        for (i, m) in metrics.iter().enumerate() {
            let spacing = m.spacing.unwrap();
            let burden = m.burden.unwrap();
            assert!((spacing - 3.0).abs() < 1e-9, "hole {}: spacing {}", i, spacing);
            assert!((burden - 3.5).abs() < 1e-9, "hole {}: burden {}", i, burden);
        }
    }

    #[test]
    fn test_grid_pitches_with_wider_spacing() {
        // Column pitch above row pitch: spacing and burden must not come
        // out transposed
        let positions = grid(4, 6, 3.5, 3.0);
        let layout = detect_rows(&positions, &EngineConfig::default());
        let (metrics, issues) = compute_burden_spacing(&positions, &layout, "Shot1");

        assert!(issues.is_empty());
        for (i, m) in metrics.iter().enumerate() {
            let spacing = m.spacing.unwrap();
            let burden = m.burden.unwrap();
            assert!((spacing - 3.5).abs() < 1e-9, "hole {}: spacing {}", i, spacing);
            assert!((burden - 3.0).abs() < 1e-9, "hole {}: burden {}", i, burden);
        }
    }

    #[test]
    fn test_uneven_row_uses_one_sided_ends() {
        // Single row with pitches 3 and 5
        let positions = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(8.0, 0.0),
        ];
        let layout = detect_rows(&positions, &EngineConfig::default());
        let (metrics, _) = compute_burden_spacing(&positions, &layout, "Shot1");

        assert_eq!(metrics[0].spacing, Some(3.0));
        assert_eq!(metrics[1].spacing, Some(4.0)); // (3 + 5) / 2
        assert_eq!(metrics[2].spacing, Some(5.0));
        // Single row: burden is unavailable everywhere
        assert!(metrics.iter().all(|m| m.burden.is_none()));
    }

    #[test]
    fn test_single_hole_row_reports_degenerate() {
        // A layout with a one-hole row: spacing is the explicit sentinel,
        // burden still measures against the adjacent row
        use crate::rows::{RowLayout, RowPlace};

        let positions = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(1.5, 4.0),
        ];
        let layout = RowLayout {
            places: vec![
                RowPlace { row_id: 0, pos_id: 0 },
                RowPlace { row_id: 0, pos_id: 1 },
                RowPlace { row_id: 1, pos_id: 0 },
            ],
            orientation: 0.0,
            row_count: 2,
        };

        let (metrics, issues) = compute_burden_spacing(&positions, &layout, "Shot1");
        assert!(issues.contains(&EngineIssue::DegenerateRow {
            entity: "Shot1".to_string(),
            row_id: 1,
        }));
        let lone = &metrics[2];
        assert_eq!(lone.spacing, None);
        assert_eq!(lone.burden, Some(4.0));
    }

    #[test]
    fn test_empty_input() {
        let layout = detect_rows(&[], &EngineConfig::default());
        let (metrics, issues) = compute_burden_spacing(&[], &layout, "Shot1");
        assert!(metrics.is_empty());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_determinism() {
        let positions = grid(3, 5, 3.1, 4.2);
        let layout = detect_rows(&positions, &EngineConfig::default());
        let (a, _) = compute_burden_spacing(&positions, &layout, "Shot1");
        let (b, _) = compute_burden_spacing(&positions, &layout, "Shot1");
        assert_eq!(a, b);
    }
}
