//! Engine configuration and builder
//!
//! All tunables are explicit parameters threaded into the engine — there is
//! no global state. The builder validates each setting so an invalid
//! configuration is unrepresentable once built.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Which per-hole position the surface triangulation samples
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceBasis {
    /// Collar positions (the drilled surface)
    #[default]
    Collar,
    /// Grade positions (the designed bench floor)
    Grade,
}

/// Height basis for converting Voronoi cell area to broken volume
///
/// The source material is inconsistent about this, so it is an explicit
/// parameter rather than a baked-in rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HeightBasis {
    /// Vertical distance from collar down to grade at each hole (default)
    #[default]
    GradeDepth,
    /// Full drilled length of each hole
    HoleLength,
    /// One fixed bench height in metres for the whole pattern
    Fixed(f64),
}

/// Configuration for one engine invocation
///
/// Built via [`EngineConfigBuilder`]; the same configuration over the same
/// hole snapshot always produces the identical result.
///
/// # Example
///
/// ```
/// use blast_geometry::EngineConfigBuilder;
///
/// let config = EngineConfigBuilder::new()
///     .max_edge_length(20.0)
///     .unwrap()
///     .contour_interval(0.5)
///     .unwrap()
///     .clip_to_toe_radius(true)
///     .build();
///
/// assert_eq!(config.max_edge_length, 20.0);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Longest triangle edge kept by the triangulator, metres
    ///
    /// Prevents spurious triangles spanning gaps between pattern areas.
    pub max_edge_length: f64,

    /// Vertical distance between contour levels, metres
    pub contour_interval: f64,

    /// Which hole position the triangulation and contours sample
    pub surface_basis: SurfaceBasis,

    /// Clip each Voronoi cell to the hole's toe-radius circle, where the
    /// hole supplies one
    pub clip_to_toe_radius: bool,

    /// Margin added around the pattern bounds when closing perimeter
    /// Voronoi cells, metres
    pub voronoi_margin_m: f64,

    /// Height basis for the volume behind powder factor
    pub height_basis: HeightBasis,

    /// Row clustering: how strongly near-collinear chains are favoured,
    /// `0.0` (pure distance) to just under `1.0`
    pub chain_affinity: f64,

    /// Row clustering: linkage cut as a multiple of the median weighted
    /// nearest-neighbour distance
    pub cluster_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfigBuilder::new().build()
    }
}

/// Builder for [`EngineConfig`] with validation
///
/// Setters that can reject a value return `Result<Self>` so the error
/// surfaces at the call that caused it.
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    max_edge_length: f64,
    contour_interval: f64,
    surface_basis: SurfaceBasis,
    clip_to_toe_radius: bool,
    voronoi_margin_m: f64,
    height_basis: HeightBasis,
    chain_affinity: f64,
    cluster_scale: f64,
}

impl EngineConfigBuilder {
    /// Create a builder with default values
    ///
    /// Defaults:
    /// - max_edge_length: 25.0 m
    /// - contour_interval: 1.0 m
    /// - surface_basis: Collar
    /// - clip_to_toe_radius: false
    /// - voronoi_margin_m: 10.0 m
    /// - height_basis: GradeDepth
    /// - chain_affinity: 0.5
    /// - cluster_scale: 1.3
    ///
    /// The clustering defaults keep rows separated for spacing-to-burden
    /// ratios up to roughly 1.5 either way, which covers standard bench
    /// geometries.
    pub fn new() -> Self {
        Self {
            max_edge_length: 25.0,
            contour_interval: 1.0,
            surface_basis: SurfaceBasis::Collar,
            clip_to_toe_radius: false,
            voronoi_margin_m: 10.0,
            height_basis: HeightBasis::GradeDepth,
            chain_affinity: 0.5,
            cluster_scale: 1.3,
        }
    }

    /// Set the triangle edge-length cutoff
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the length is not finite and positive.
    pub fn max_edge_length(mut self, metres: f64) -> Result<Self> {
        if !metres.is_finite() || metres <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "max edge length must be positive (got {})",
                metres
            )));
        }
        self.max_edge_length = metres;
        Ok(self)
    }

    /// Set the contour interval
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the interval is not finite and positive.
    pub fn contour_interval(mut self, metres: f64) -> Result<Self> {
        if !metres.is_finite() || metres <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "contour interval must be positive (got {})",
                metres
            )));
        }
        self.contour_interval = metres;
        Ok(self)
    }

    /// Choose which hole position the surface triangulation samples
    pub fn surface_basis(mut self, basis: SurfaceBasis) -> Self {
        self.surface_basis = basis;
        self
    }

    /// Enable or disable clipping Voronoi cells to toe-radius circles
    pub fn clip_to_toe_radius(mut self, clip: bool) -> Self {
        self.clip_to_toe_radius = clip;
        self
    }

    /// Set the margin used when closing perimeter Voronoi cells
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the margin is negative or non-finite.
    pub fn voronoi_margin(mut self, metres: f64) -> Result<Self> {
        if !metres.is_finite() || metres < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "voronoi margin must be non-negative (got {})",
                metres
            )));
        }
        self.voronoi_margin_m = metres;
        Ok(self)
    }

    /// Set the height basis used for volume and powder factor
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a fixed height that is not positive.
    pub fn height_basis(mut self, basis: HeightBasis) -> Result<Self> {
        if let HeightBasis::Fixed(h) = basis {
            if !h.is_finite() || h <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "fixed bench height must be positive (got {})",
                    h
                )));
            }
        }
        self.height_basis = basis;
        Ok(self)
    }

    /// Set the chain affinity of the row clustering
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` outside `[0.0, 1.0)`.
    pub fn chain_affinity(mut self, affinity: f64) -> Result<Self> {
        if !affinity.is_finite() || !(0.0..1.0).contains(&affinity) {
            return Err(EngineError::InvalidConfig(format!(
                "chain affinity must be in [0, 1) (got {})",
                affinity
            )));
        }
        self.chain_affinity = affinity;
        Ok(self)
    }

    /// Set the linkage cut multiplier of the row clustering
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for values below 1.0 (which would cut even
    /// nearest-neighbour links) or non-finite values.
    pub fn cluster_scale(mut self, scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale < 1.0 {
            return Err(EngineError::InvalidConfig(format!(
                "cluster scale must be >= 1.0 (got {})",
                scale
            )));
        }
        self.cluster_scale = scale;
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            max_edge_length: self.max_edge_length,
            contour_interval: self.contour_interval,
            surface_basis: self.surface_basis,
            clip_to_toe_radius: self.clip_to_toe_radius,
            voronoi_margin_m: self.voronoi_margin_m,
            height_basis: self.height_basis,
            chain_affinity: self.chain_affinity,
            cluster_scale: self.cluster_scale,
        }
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
