//! Strongly-typed identifiers for grids, edges, and field owners.

use std::fmt;

/// Identifies a sub-grid within a grid hierarchy.
///
/// Grids are registered in a `GridBucket` and assigned sequential IDs.
/// `GridId(n)` corresponds to the n-th grid added to the bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub u32);

impl GridId {
    /// The grid's position in its bucket.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid {}", self.0)
    }
}

impl From<u32> for GridId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a dimension-reducing edge between two grids.
///
/// An edge joins a grid of dimension `d` to a grid of dimension `d - 1`
/// and owns the face/cell incidence mapping between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// The edge's position in its bucket.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge {}", self.0)
    }
}

impl From<u32> for EdgeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// The entity a stored field is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldOwner {
    /// A node of the grid hierarchy (a sub-grid).
    Grid(GridId),
    /// An edge of the grid hierarchy (a grid pair).
    Edge(EdgeId),
}

impl fmt::Display for FieldOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(g) => write!(f, "{g}"),
            Self::Edge(e) => write!(f, "{e}"),
        }
    }
}

impl From<GridId> for FieldOwner {
    fn from(g: GridId) -> Self {
        Self::Grid(g)
    }
}

impl From<EdgeId> for FieldOwner {
    fn from(e: EdgeId) -> Self {
        Self::Edge(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_display_names_the_entity() {
        assert_eq!(FieldOwner::from(GridId(3)).to_string(), "grid 3");
        assert_eq!(FieldOwner::from(EdgeId(0)).to_string(), "edge 0");
    }

    #[test]
    fn ids_index_their_bucket_slot() {
        assert_eq!(GridId::from(7).index(), 7);
        assert_eq!(EdgeId::from(2).index(), 2);
    }
}
