//! Error and issue types for the blast geometry engine

use std::fmt;

use crate::hole::HoleRef;

/// Fatal errors — programmer or configuration mistakes
///
/// Expected domain conditions (cycles, dangling connectors, degenerate
/// geometry) are never errors; they are reported as [`EngineIssue`]s
/// alongside an otherwise-successful result.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// Two holes share the same (entity, id) identity
    DuplicateHole(HoleRef),
    /// The computation was abandoned via a cancellation token
    Cancelled,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            EngineError::DuplicateHole(hole) => write!(f, "duplicate hole identity: {}", hole),
            EngineError::Cancelled => write!(f, "computation cancelled"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Non-fatal conditions collected during a computation
///
/// Every component returns its computed data together with a list of these;
/// a malformed connector network or a degenerate pattern degrades the result
/// locally but never aborts the whole computation.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineIssue {
    /// Not enough input for a stage (e.g. fewer than 3 distinct points for
    /// triangulation); the stage returned an empty result instead
    InsufficientData {
        /// Stage that was skipped
        stage: &'static str,
        /// Human-readable detail
        detail: String,
    },
    /// A connector references a hole that does not exist; the referencing
    /// hole was treated as a root (firing time 0)
    DanglingReference {
        /// Hole carrying the bad connector
        hole: HoleRef,
        /// The nonexistent target
        target: HoleRef,
    },
    /// A hole was never reached from any root (cycle, or a chain that never
    /// terminates at a root); its firing time is unresolved
    UnresolvedConnector {
        /// The unreached hole
        hole: HoleRef,
    },
    /// A connector carried a negative delay, which was clamped to zero to
    /// keep firing times non-decreasing along every path
    NegativeDelay {
        /// Hole carrying the connector
        hole: HoleRef,
        /// The delay as supplied, in milliseconds
        delay_ms: f64,
    },
    /// A row contains a single hole, so spacing is unavailable for it
    DegenerateRow {
        /// Entity the row belongs to
        entity: String,
        /// Row index within the entity
        row_id: usize,
    },
    /// Points were skipped or collapsed by a geometric stage
    /// (non-finite coordinates, coincident positions)
    DegenerateGeometry {
        /// Human-readable detail
        detail: String,
    },
}

impl fmt::Display for EngineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineIssue::InsufficientData { stage, detail } => {
                write!(f, "{}: insufficient data: {}", stage, detail)
            }
            EngineIssue::DanglingReference { hole, target } => {
                write!(f, "hole {} references nonexistent hole {}", hole, target)
            }
            EngineIssue::UnresolvedConnector { hole } => {
                write!(f, "firing time of hole {} is unresolved", hole)
            }
            EngineIssue::NegativeDelay { hole, delay_ms } => {
                write!(f, "hole {} has negative delay {} ms (clamped to 0)", hole, delay_ms)
            }
            EngineIssue::DegenerateRow { entity, row_id } => {
                write!(f, "entity {}: row {} has a single hole", entity, row_id)
            }
            EngineIssue::DegenerateGeometry { detail } => {
                write!(f, "degenerate geometry: {}", detail)
            }
        }
    }
}
