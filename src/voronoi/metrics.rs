//! Per-hole volume, mass and powder factor
//!
//! Combines the Voronoi cell area with each hole's charge and geometry:
//! `volume = area x height` (the height basis is an explicit configuration
//! choice), `mass` comes from the loaded charge, and
//! `powder factor = mass / volume`. Missing or non-positive inputs yield
//! explicit `None` fields — a division by zero is unrepresentable.

use crate::config::HeightBasis;
use crate::hole::Hole;
use crate::voronoi::VoronoiCell;

/// Influence metrics for one hole
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleMetrics {
    /// Voronoi cell area, square metres
    pub area_m2: f64,
    /// Broken rock volume, cubic metres; `None` when the height basis is
    /// undefined for this hole
    pub volume_m3: Option<f64>,
    /// Explosive mass, kilograms; `None` when the hole carries no charge data
    pub mass_kg: Option<f64>,
    /// Powder factor, kg/m³; `None` unless a positive mass and a positive
    /// volume both exist
    pub powder_factor: Option<f64>,
}

/// Aggregate metrics for a set of cells
///
/// `cells[k].hole` indexes into `holes`; the result is parallel to `cells`.
///
/// # Example
///
/// ```
/// use blast_geometry::{aggregate_metrics, partition, HeightBasis, Hole};
/// use glam::{DVec2, DVec3};
///
/// let hole = Hole::new(
///     "Shot1",
///     "H1",
///     DVec3::new(0.0, 0.0, 110.0),
///     DVec3::new(0.0, 0.0, 100.0),
///     DVec3::new(0.0, 0.0, 99.0),
/// )
/// .with_charge(500.0);
///
/// let (cells, _) = partition(&[DVec2::ZERO], 5.0, None, None).unwrap();
/// let metrics = aggregate_metrics(&cells, &[hole], HeightBasis::GradeDepth);
///
/// // 10 x 10 box, 10 m bench: 1000 m3 at 500 kg
/// assert_eq!(metrics[0].volume_m3, Some(1000.0));
/// assert_eq!(metrics[0].powder_factor, Some(0.5));
/// ```
pub fn aggregate_metrics(
    cells: &[VoronoiCell],
    holes: &[Hole],
    basis: HeightBasis,
) -> Vec<HoleMetrics> {
    cells
        .iter()
        .map(|cell| {
            let hole = &holes[cell.hole];
            let area_m2 = cell.area_m2;

            let height = match basis {
                HeightBasis::GradeDepth => hole.grade_depth(),
                HeightBasis::HoleLength => hole.length_m,
                HeightBasis::Fixed(h) => h,
            };
            let volume_m3 = (height.is_finite() && height > 0.0).then(|| area_m2 * height);

            let mass_kg = hole.charge_mass_kg.filter(|m| m.is_finite() && *m >= 0.0);

            // An uncharged hole has no meaningful powder factor, even with
            // a valid volume
            let powder_factor = match (mass_kg, volume_m3) {
                (Some(mass), Some(volume)) if mass > 0.0 && volume > 0.0 => Some(mass / volume),
                _ => None,
            };

            HoleMetrics {
                area_m2,
                volume_m3,
                mass_kg,
                powder_factor,
            }
        })
        .collect()
}
