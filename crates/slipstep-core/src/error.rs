//! Error types for the slipstep framework.
//!
//! Organized by layer: field storage, solver collaborators, exporters,
//! and the coupling loop taxonomy that wraps them.

use std::error::Error;
use std::fmt;

use crate::id::{FieldOwner, GridId};
use crate::field::FieldLocation;

/// Errors from [`FieldStore`](crate::FieldStore) access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// No field with this name is attached to the owner.
    Missing {
        /// Grid or edge the field was looked up on.
        owner: FieldOwner,
        /// Field name.
        name: String,
    },
    /// The field exists but has an unexpected number of values.
    SizeMismatch {
        /// Grid or edge the field is attached to.
        owner: FieldOwner,
        /// Field name.
        name: String,
        /// Number of values the caller requires.
        expected: usize,
        /// Number of values actually stored.
        actual: usize,
    },
    /// The field is stored on cells where faces were required, or vice versa.
    WrongLocation {
        /// Grid or edge the field is attached to.
        owner: FieldOwner,
        /// Field name.
        name: String,
        /// Location the caller requires.
        expected: FieldLocation,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { owner, name } => write!(f, "field '{name}' missing on {owner}"),
            Self::SizeMismatch {
                owner,
                name,
                expected,
                actual,
            } => write!(
                f,
                "field '{name}' on {owner} has {actual} values, expected {expected}"
            ),
            Self::WrongLocation {
                owner,
                name,
                expected,
            } => write!(f, "field '{name}' on {owner} is not stored on {expected}"),
        }
    }
}

impl Error for FieldError {}

/// Errors reported by flow, mechanics, and friction solvers.
#[derive(Clone, Debug, PartialEq)]
pub enum SolverError {
    /// An iterative solve did not reach its tolerance.
    DidNotConverge {
        /// Iterations performed before giving up.
        iterations: usize,
        /// Final relative residual.
        residual: f64,
    },
    /// The assembled system is unusable (non-positive diagonal, NaN, ...).
    InvalidSystem {
        /// Description of the defect.
        reason: String,
    },
    /// `solve` was asked to reuse a discretization that does not exist.
    NotDiscretized,
    /// A field the solver reads is not available.
    MissingField {
        /// Field name.
        name: String,
    },
    /// An input array has the wrong length.
    SizeMismatch {
        /// What the array holds.
        what: String,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// A physical parameter is out of range.
    InvalidParameter {
        /// Description of the offending parameter.
        reason: String,
    },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DidNotConverge {
                iterations,
                residual,
            } => write!(
                f,
                "did not converge after {iterations} iterations (residual {residual:e})"
            ),
            Self::InvalidSystem { reason } => write!(f, "invalid system: {reason}"),
            Self::NotDiscretized => write!(f, "no discretization to reuse"),
            Self::MissingField { name } => write!(f, "missing field '{name}'"),
            Self::SizeMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has length {actual}, expected {expected}"),
            Self::InvalidParameter { reason } => write!(f, "invalid parameter: {reason}"),
        }
    }
}

impl Error for SolverError {}

/// Failure of an exporter to persist a snapshot or time series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportError {
    /// Description of the failure.
    pub reason: String,
}

impl ExportError {
    /// Construct an export error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "export failed: {}", self.reason)
    }
}

impl Error for ExportError {}

/// Failure taxonomy of the coupled time-stepping loop.
///
/// Every variant aborts the current run; the engine wraps it with the
/// step index and simulation time at which it occurred.
#[derive(Clone, Debug, PartialEq)]
pub enum CouplingError {
    /// Fracture geometry was malformed or could not be meshed.
    MeshGenerationFailure {
        /// Description of the geometry defect.
        reason: String,
    },
    /// A fracture cell has no incident host face.
    UnmappedCell {
        /// The fracture grid.
        grid: GridId,
        /// Index of the unmapped cell.
        cell: usize,
    },
    /// The inner slip iteration hit its cap with faces still newly slipping.
    SlipNotConverged {
        /// Iterations performed.
        iterations: u32,
        /// Faces that newly slipped in the final iteration.
        newly_slipping: usize,
    },
    /// A flow, mechanics, or friction solver failed.
    SolverFailure {
        /// Name of the failing solver.
        solver: String,
        /// The underlying solver error.
        reason: SolverError,
    },
    /// A required field was missing or malformed.
    Field(FieldError),
    /// The exporter failed.
    ExportFailed(ExportError),
}

impl CouplingError {
    /// Wrap a solver error with the solver's name.
    pub fn solver(solver: &str, reason: SolverError) -> Self {
        Self::SolverFailure {
            solver: solver.to_string(),
            reason,
        }
    }
}

impl fmt::Display for CouplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeshGenerationFailure { reason } => {
                write!(f, "mesh generation failed: {reason}")
            }
            Self::UnmappedCell { grid, cell } => {
                write!(f, "cell {cell} of {grid} has no incident host face")
            }
            Self::SlipNotConverged {
                iterations,
                newly_slipping,
            } => write!(
                f,
                "slip iteration not converged after {iterations} iterations \
                 ({newly_slipping} faces still newly slipping)"
            ),
            Self::SolverFailure { solver, reason } => {
                write!(f, "solver '{solver}' failed: {reason}")
            }
            Self::Field(e) => write!(f, "{e}"),
            Self::ExportFailed(e) => write!(f, "{e}"),
        }
    }
}

impl Error for CouplingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SolverFailure { reason, .. } => Some(reason),
            Self::Field(e) => Some(e),
            Self::ExportFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldError> for CouplingError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

impl From<ExportError> for CouplingError {
    fn from(e: ExportError) -> Self {
        Self::ExportFailed(e)
    }
}
