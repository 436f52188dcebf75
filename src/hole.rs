//! Hole records and identities
//!
//! A hole is the unit of a blast pattern: a drilled position with collar,
//! grade and toe points plus the design attributes supplied by importers and
//! editing tools. The engine never mutates the supplied fields; it only
//! fills in the derived ones (`row_id`, `pos_id`, `burden_m`, `spacing_m`,
//! `firing_time_ms`), all of which are `Option<T>` so that "not yet
//! computed" is statically distinguishable from "computed as zero".

use std::fmt;

use glam::{DVec2, DVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Separator between entity name and hole id in a textual reference
pub const REF_SEPARATOR: &str = ":::";

/// Globally unique hole identity: entity (pattern) name + hole id
///
/// Renders as `entity:::id`, the form connector references use.
///
/// # Example
///
/// ```
/// use blast_geometry::HoleRef;
///
/// let r = HoleRef::parse("Shot1:::H12").unwrap();
/// assert_eq!(r.entity, "Shot1");
/// assert_eq!(r.id, "H12");
/// assert_eq!(r.to_string(), "Shot1:::H12");
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HoleRef {
    /// Pattern / blast group name
    pub entity: String,
    /// Hole id, unique within the entity
    pub id: String,
}

impl HoleRef {
    /// Create a reference from entity name and hole id
    pub fn new(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Parse a textual `entity:::id` reference
    ///
    /// Returns `None` if the separator is missing or either part is empty.
    pub fn parse(s: &str) -> Option<Self> {
        let (entity, id) = s.split_once(REF_SEPARATOR)?;
        if entity.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(entity, id))
    }
}

impl fmt::Display for HoleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.entity, REF_SEPARATOR, self.id)
    }
}

/// Directed timing relationship into a hole
///
/// `from` is the hole whose detonation triggers this one; `delay_ms` is the
/// delay attributed to that edge. A hole carries at most one connector
/// (`Option<Connector>`), which makes the network a forest by construction —
/// multi-parent graphs are unrepresentable.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    /// Predecessor hole
    pub from: HoleRef,
    /// Delay from the predecessor's detonation, in milliseconds
    pub delay_ms: f64,
}

/// A single blast hole record
///
/// Supplied fields come from importers or editing tools and are treated as
/// opaque inputs except where metrics need them. Derived fields are written
/// only by the engine and are recomputed wholesale on every invocation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Hole {
    /// Pattern / blast group this hole belongs to
    pub entity: String,
    /// Hole id, unique within the entity
    pub id: String,

    /// Surface entry point, planar projected coordinates (metres)
    pub collar: DVec3,
    /// Point at the intended bench elevation, offset from the toe by the subdrill
    pub grade: DVec3,
    /// Bottom of the hole
    pub toe: DVec3,

    /// Hole diameter in millimetres
    pub diameter_mm: f64,
    /// Inclination from vertical, degrees
    pub angle_deg: f64,
    /// Azimuth of the hole axis, degrees clockwise from north
    pub bearing_deg: f64,
    /// Drilled length along the hole axis, metres
    pub length_m: f64,
    /// Extra depth drilled below grade, metres
    pub subdrill_m: f64,

    /// Total explosive mass loaded into the hole, if known
    pub charge_mass_kg: Option<f64>,
    /// Radius of influence at toe level, used for optional Voronoi clipping
    pub toe_radius_m: Option<f64>,

    /// Timing connector into this hole; `None` means the hole is a root
    pub connector: Option<Connector>,

    /// Detected row index (0-based), ascending across rows
    pub row_id: Option<usize>,
    /// Position within the row (0-based), ascending along the row direction
    pub pos_id: Option<usize>,
    /// Perpendicular distance to the nearest adjacent row, metres
    pub burden_m: Option<f64>,
    /// Distance to the adjacent hole in the same row, metres
    pub spacing_m: Option<f64>,
    /// Absolute firing time in milliseconds; `None` means unresolved,
    /// which is never the same thing as a true initiation point at 0 ms
    pub firing_time_ms: Option<f64>,
}

impl Hole {
    /// Create a hole with the given identity and geometry
    ///
    /// Design attributes default to zero and can be filled in directly or
    /// via the `with_*` helpers; derived fields start out unset.
    pub fn new(
        entity: impl Into<String>,
        id: impl Into<String>,
        collar: DVec3,
        grade: DVec3,
        toe: DVec3,
    ) -> Self {
        Self {
            entity: entity.into(),
            id: id.into(),
            collar,
            grade,
            toe,
            diameter_mm: 0.0,
            angle_deg: 0.0,
            bearing_deg: 0.0,
            length_m: 0.0,
            subdrill_m: 0.0,
            charge_mass_kg: None,
            toe_radius_m: None,
            connector: None,
            row_id: None,
            pos_id: None,
            burden_m: None,
            spacing_m: None,
            firing_time_ms: None,
        }
    }

    /// Attach a timing connector from a predecessor hole
    pub fn with_connector(mut self, from: HoleRef, delay_ms: f64) -> Self {
        self.connector = Some(Connector { from, delay_ms });
        self
    }

    /// Set the explosive charge mass
    pub fn with_charge(mut self, mass_kg: f64) -> Self {
        self.charge_mass_kg = Some(mass_kg);
        self
    }

    /// Set the toe influence radius
    pub fn with_toe_radius(mut self, radius_m: f64) -> Self {
        self.toe_radius_m = Some(radius_m);
        self
    }

    /// This hole's identity
    #[inline]
    pub fn href(&self) -> HoleRef {
        HoleRef::new(self.entity.clone(), self.id.clone())
    }

    /// Collar position projected to the horizontal plane
    #[inline]
    pub fn collar_2d(&self) -> DVec2 {
        DVec2::new(self.collar.x, self.collar.y)
    }

    /// Grade position projected to the horizontal plane
    #[inline]
    pub fn grade_2d(&self) -> DVec2 {
        DVec2::new(self.grade.x, self.grade.y)
    }

    /// Vertical distance from collar down to grade, metres
    ///
    /// This is the bench height at the hole; non-positive for malformed
    /// records (grade above collar), which metric computation treats as
    /// an undefined volume basis.
    #[inline]
    pub fn grade_depth(&self) -> f64 {
        self.collar.z - self.grade.z
    }

    /// Clear every engine-derived field
    ///
    /// Called at the start of a recomputation so stale values from a
    /// previous hole set can never leak into a new result.
    pub fn reset_derived(&mut self) {
        self.row_id = None;
        self.pos_id = None;
        self.burden_m = None;
        self.spacing_m = None;
        self.firing_time_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_parse_roundtrip() {
        let r = HoleRef::new("Shot1", "H4");
        let parsed = HoleRef::parse(&r.to_string()).unwrap();
        assert_eq!(r, parsed);
    }

    #[test]
    fn test_ref_parse_rejects_malformed() {
        assert!(HoleRef::parse("no-separator").is_none());
        assert!(HoleRef::parse(":::H4").is_none());
        assert!(HoleRef::parse("Shot1:::").is_none());
    }

    #[test]
    fn test_ref_parse_id_may_contain_colons() {
        let r = HoleRef::parse("Shot1:::A:1").unwrap();
        assert_eq!(r.id, "A:1");
    }

    #[test]
    fn test_hole_helpers() {
        let hole = Hole::new(
            "Shot1",
            "H1",
            DVec3::new(10.0, 20.0, 105.0),
            DVec3::new(10.5, 20.0, 90.0),
            DVec3::new(10.5, 20.0, 89.0),
        )
        .with_charge(120.0)
        .with_connector(HoleRef::new("Shot1", "H0"), 25.0);

        assert_eq!(hole.href(), HoleRef::new("Shot1", "H1"));
        assert_eq!(hole.collar_2d(), DVec2::new(10.0, 20.0));
        assert!((hole.grade_depth() - 15.0).abs() < 1e-12);
        assert_eq!(hole.charge_mass_kg, Some(120.0));
        assert_eq!(hole.connector.as_ref().unwrap().delay_ms, 25.0);
    }

    #[test]
    fn test_reset_derived() {
        let mut hole = Hole::new(
            "Shot1",
            "H1",
            DVec3::ZERO,
            DVec3::ZERO,
            DVec3::ZERO,
        );
        hole.row_id = Some(3);
        hole.firing_time_ms = Some(50.0);
        hole.reset_derived();
        assert_eq!(hole.row_id, None);
        assert_eq!(hole.firing_time_ms, None);
    }
}
