//! Triangulated surface and contour derivation
//!
//! The triangulator turns hole positions into a Delaunay mesh with an
//! edge-length cutoff; the contour generator slices that mesh into
//! elevation polylines with downslope directions.

mod contour;
mod delaunay;

pub use contour::{generate_contours, ContourPolyline, ContourSegment, ContourSet};
pub use delaunay::{triangulate, Triangle};
