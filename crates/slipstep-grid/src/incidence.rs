//! Sparse face/cell incidence between a grid and an embedded lower-dimensional grid.

use smallvec::SmallVec;

use crate::error::GridError;

/// Sparse indicator matrix: rows are faces of the higher-dimensional
/// grid, columns are cells of the lower-dimensional grid.
///
/// Each face touches at most one cell. A cell typically touches two
/// faces (one on each side of a split fracture), but any count is
/// representable, including zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Incidence {
    num_faces: usize,
    num_cells: usize,
    /// `(face, cell)` pairs sorted by face.
    pairs: Vec<(u32, u32)>,
    /// Faces touching each cell, in ascending face order.
    cell_faces: Vec<SmallVec<[u32; 2]>>,
}

impl Incidence {
    /// Build from `(face, cell)` pairs.
    ///
    /// Duplicate identical pairs are collapsed. Returns
    /// [`GridError::AmbiguousFace`] if a face is paired with two
    /// different cells and [`GridError::IncidenceOutOfRange`] for indices
    /// outside `num_faces × num_cells`.
    pub fn from_pairs(
        num_faces: usize,
        num_cells: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, GridError> {
        let shape = (num_faces, num_cells);
        let mut sorted = Vec::new();
        for (face, cell) in pairs {
            if face >= num_faces || cell >= num_cells {
                return Err(GridError::IncidenceOutOfRange { face, cell, shape });
            }
            let (Ok(f), Ok(c)) = (u32::try_from(face), u32::try_from(cell)) else {
                return Err(GridError::IncidenceOutOfRange { face, cell, shape });
            };
            sorted.push((f, c));
        }
        sorted.sort_unstable();
        sorted.dedup();
        for w in sorted.windows(2) {
            if w[0].0 == w[1].0 {
                return Err(GridError::AmbiguousFace {
                    face: w[0].0 as usize,
                });
            }
        }
        let mut cell_faces = vec![SmallVec::new(); num_cells];
        for &(f, c) in &sorted {
            cell_faces[c as usize].push(f);
        }
        Ok(Self {
            num_faces,
            num_cells,
            pairs: sorted,
            cell_faces,
        })
    }

    /// Matrix shape as `(faces, cells)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_faces, self.num_cells)
    }

    /// Number of faces of the higher-dimensional grid (rows).
    pub fn num_faces(&self) -> usize {
        self.num_faces
    }

    /// Number of cells of the lower-dimensional grid (columns).
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.pairs.len()
    }

    /// Iterate `(face, cell)` pairs in ascending face order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs.iter().map(|&(f, c)| (f as usize, c as usize))
    }

    /// The cell incident to `face`, if any.
    pub fn cell_of_face(&self, face: usize) -> Option<usize> {
        let f = u32::try_from(face).ok()?;
        self.pairs
            .binary_search_by_key(&f, |&(pf, _)| pf)
            .ok()
            .map(|i| self.pairs[i].1 as usize)
    }

    /// Faces incident to `cell`, ascending. Empty for unknown cells.
    pub fn faces_of_cell(&self, cell: usize) -> &[u32] {
        self.cell_faces.get(cell).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lookup_both_directions() {
        let inc = Incidence::from_pairs(6, 2, [(4, 0), (1, 0), (5, 1)]).unwrap();
        assert_eq!(inc.shape(), (6, 2));
        assert_eq!(inc.nnz(), 3);
        assert_eq!(inc.cell_of_face(1), Some(0));
        assert_eq!(inc.cell_of_face(2), None);
        assert_eq!(inc.faces_of_cell(0), &[1, 4]);
        assert_eq!(inc.faces_of_cell(1), &[5]);
        assert!(inc.faces_of_cell(9).is_empty());
        let pairs: Vec<_> = inc.iter().collect();
        assert_eq!(pairs, vec![(1, 0), (4, 0), (5, 1)]);
    }

    #[test]
    fn duplicate_pair_collapses() {
        let inc = Incidence::from_pairs(3, 1, [(0, 0), (0, 0)]).unwrap();
        assert_eq!(inc.nnz(), 1);
    }

    #[test]
    fn face_with_two_cells_is_ambiguous() {
        assert_eq!(
            Incidence::from_pairs(3, 2, [(0, 0), (0, 1)]).unwrap_err(),
            GridError::AmbiguousFace { face: 0 }
        );
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(matches!(
            Incidence::from_pairs(3, 2, [(3, 0)]),
            Err(GridError::IncidenceOutOfRange { face: 3, .. })
        ));
        assert!(matches!(
            Incidence::from_pairs(3, 2, [(0, 2)]),
            Err(GridError::IncidenceOutOfRange { cell: 2, .. })
        ));
    }

    proptest! {
        #[test]
        fn every_pair_is_visible_from_both_sides(
            assignment in proptest::collection::vec(proptest::option::of(0usize..8), 1..40),
        ) {
            let pairs: Vec<(usize, usize)> = assignment
                .iter()
                .enumerate()
                .filter_map(|(f, c)| c.map(|c| (f, c)))
                .collect();
            let inc = Incidence::from_pairs(assignment.len(), 8, pairs.clone()).unwrap();
            prop_assert_eq!(inc.nnz(), pairs.len());
            for (f, c) in &pairs {
                prop_assert_eq!(inc.cell_of_face(*f), Some(*c));
                prop_assert!(inc.faces_of_cell(*c).contains(&(*f as u32)));
            }
            let total: usize = (0..8).map(|c| inc.faces_of_cell(c).len()).sum();
            prop_assert_eq!(total, pairs.len());
        }
    }
}
