//! Error types for grid construction and mesh generation.

use slipstep_core::{CouplingError, GridId};
use std::fmt;

/// Errors arising from grid, bucket, or mesh construction.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Attempted to build a grid with zero cells.
    EmptyGrid,
    /// Grid dimension outside `0..=3`.
    InvalidDimension {
        /// The offending dimension.
        dim: u8,
    },
    /// A cell or face carries a non-finite or non-positive measure.
    InvalidGeometry {
        /// What went wrong.
        reason: String,
    },
    /// A face refers to a cell index outside the grid.
    CellOutOfRange {
        /// Face index.
        face: usize,
        /// Referenced cell.
        cell: usize,
        /// Number of cells in the grid.
        num_cells: usize,
    },
    /// An incidence entry lies outside the matrix shape.
    IncidenceOutOfRange {
        /// Face (row) index.
        face: usize,
        /// Cell (column) index.
        cell: usize,
        /// Matrix shape as `(faces, cells)`.
        shape: (usize, usize),
    },
    /// A higher-dimensional face touches more than one lower-dimensional cell.
    AmbiguousFace {
        /// Face index on the higher-dimensional grid.
        face: usize,
    },
    /// No grid with this ID exists in the bucket.
    UnknownGrid(GridId),
    /// An edge joins grids whose dimensions do not differ by one.
    DimensionMismatch {
        /// Higher-dimensional grid.
        high: GridId,
        /// Lower-dimensional grid.
        low: GridId,
    },
    /// The bucket has no unique grid of maximal dimension.
    NoUniqueHost {
        /// Number of grids found at the maximal dimension.
        count: usize,
    },
    /// Fracture geometry is malformed or cannot be meshed.
    MeshGeneration {
        /// Description of the defect.
        reason: String,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid must have at least one cell"),
            Self::InvalidDimension { dim } => write!(f, "grid dimension {dim} not in 0..=3"),
            Self::InvalidGeometry { reason } => write!(f, "invalid geometry: {reason}"),
            Self::CellOutOfRange {
                face,
                cell,
                num_cells,
            } => write!(
                f,
                "face {face} refers to cell {cell}, grid has {num_cells} cells"
            ),
            Self::IncidenceOutOfRange { face, cell, shape } => write!(
                f,
                "incidence entry ({face}, {cell}) outside shape {}x{}",
                shape.0, shape.1
            ),
            Self::AmbiguousFace { face } => {
                write!(f, "face {face} touches more than one lower-dimensional cell")
            }
            Self::UnknownGrid(id) => write!(f, "unknown {id}"),
            Self::DimensionMismatch { high, low } => {
                write!(f, "{high} and {low} do not differ by one dimension")
            }
            Self::NoUniqueHost { count } => {
                write!(f, "expected one grid of maximal dimension, found {count}")
            }
            Self::MeshGeneration { reason } => write!(f, "mesh generation failed: {reason}"),
        }
    }
}

impl std::error::Error for GridError {}

impl From<GridError> for CouplingError {
    fn from(e: GridError) -> Self {
        match e {
            GridError::MeshGeneration { reason } => Self::MeshGenerationFailure { reason },
            other => Self::MeshGenerationFailure {
                reason: other.to_string(),
            },
        }
    }
}
