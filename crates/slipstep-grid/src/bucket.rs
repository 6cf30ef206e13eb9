//! The grid hierarchy: sub-grids of decreasing dimension joined by edges.

use slipstep_core::{EdgeId, GridId};

use crate::error::GridError;
use crate::grid::Grid;
use crate::incidence::Incidence;

/// A dimension-reducing connection between two grids.
#[derive(Clone, Debug)]
pub struct Edge {
    high: GridId,
    low: GridId,
    face_cells: Incidence,
}

impl Edge {
    /// The higher-dimensional grid.
    pub fn high(&self) -> GridId {
        self.high
    }

    /// The lower-dimensional grid.
    pub fn low(&self) -> GridId {
        self.low
    }

    /// Incidence of `high` faces on `low` cells.
    pub fn face_cells(&self) -> &Incidence {
        &self.face_cells
    }
}

/// A hierarchy of grids of dimension 3, 2, 1, and 0.
///
/// Grids and edges are append-only; their IDs are positions in
/// insertion order. Across all edges leaving the same grid, a face may
/// touch at most one lower-dimensional cell.
#[derive(Clone, Debug, Default)]
pub struct GridBucket {
    grids: Vec<Grid>,
    edges: Vec<Edge>,
}

impl GridBucket {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grid and return its ID.
    pub fn add_grid(&mut self, grid: Grid) -> GridId {
        self.grids.push(grid);
        GridId((self.grids.len() - 1) as u32)
    }

    /// Connect `high` to `low` with the given face/cell incidence.
    ///
    /// The incidence shape must match `high`'s face count and `low`'s
    /// cell count, and `high.dim() == low.dim() + 1`.
    pub fn add_edge(
        &mut self,
        high: GridId,
        low: GridId,
        face_cells: Incidence,
    ) -> Result<EdgeId, GridError> {
        let h = self.grid(high).ok_or(GridError::UnknownGrid(high))?;
        let l = self.grid(low).ok_or(GridError::UnknownGrid(low))?;
        if h.dim() != l.dim() + 1 {
            return Err(GridError::DimensionMismatch { high, low });
        }
        if face_cells.shape() != (h.num_faces(), l.num_cells()) {
            return Err(GridError::InvalidGeometry {
                reason: format!(
                    "incidence shape {:?} does not match {high} faces ({}) x {low} cells ({})",
                    face_cells.shape(),
                    h.num_faces(),
                    l.num_cells()
                ),
            });
        }
        for existing in self.edges.iter().filter(|e| e.high == high) {
            if let Some((face, _)) = face_cells
                .iter()
                .find(|&(f, _)| existing.face_cells.cell_of_face(f).is_some())
            {
                return Err(GridError::AmbiguousFace { face });
            }
        }
        self.edges.push(Edge {
            high,
            low,
            face_cells,
        });
        Ok(EdgeId((self.edges.len() - 1) as u32))
    }

    /// Look up a grid.
    pub fn grid(&self, id: GridId) -> Option<&Grid> {
        self.grids.get(id.index())
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Number of grids.
    pub fn num_grids(&self) -> usize {
        self.grids.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// All grids with their IDs.
    pub fn grids(&self) -> impl Iterator<Item = (GridId, &Grid)> {
        self.grids
            .iter()
            .enumerate()
            .map(|(i, g)| (GridId(i as u32), g))
    }

    /// All edges with their IDs.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId(i as u32), e))
    }

    /// Grids of a given dimension.
    pub fn grids_of_dimension(&self, dim: u8) -> impl Iterator<Item = (GridId, &Grid)> {
        self.grids().filter(move |(_, g)| g.dim() == dim)
    }

    /// Edges whose higher-dimensional side is `high`.
    pub fn edges_from(&self, high: GridId) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges().filter(move |(_, e)| e.high == high)
    }

    /// The edge whose lower-dimensional side is `low`, if any.
    pub fn edge_to(&self, low: GridId) -> Option<(EdgeId, &Edge)> {
        self.edges().find(|(_, e)| e.low == low)
    }

    /// Largest grid dimension present, or `None` for an empty bucket.
    pub fn dim_max(&self) -> Option<u8> {
        self.grids.iter().map(Grid::dim).max()
    }

    /// The unique grid of maximal dimension.
    pub fn host(&self) -> Result<(GridId, &Grid), GridError> {
        let dim = self.dim_max().ok_or(GridError::NoUniqueHost { count: 0 })?;
        let mut hosts = self.grids_of_dimension(dim);
        match (hosts.next(), hosts.next()) {
            (Some(h), None) => Ok(h),
            (Some(_), Some(_)) => Err(GridError::NoUniqueHost {
                count: self.grids_of_dimension(dim).count(),
            }),
            (None, _) => Err(GridError::NoUniqueHost { count: 0 }),
        }
    }

    /// Edges from the host to grids one dimension lower, i.e. the fractures.
    pub fn fracture_edges(&self) -> Result<Vec<(EdgeId, &Edge)>, GridError> {
        let (host_id, host) = self.host()?;
        let dim = host.dim();
        Ok(self
            .edges_from(host_id)
            .filter(|(_, e)| {
                self.grid(e.low)
                    .is_some_and(|g| g.dim() + 1 == dim)
            })
            .collect())
    }

    /// Per host face: whether the face touches a fracture cell.
    pub fn fracture_face_mask(&self) -> Result<Vec<bool>, GridError> {
        let (_, host) = self.host()?;
        let mut mask = vec![false; host.num_faces()];
        for (_, edge) in self.fracture_edges()? {
            for (face, _) in edge.face_cells.iter() {
                mask[face] = true;
            }
        }
        Ok(mask)
    }
}
