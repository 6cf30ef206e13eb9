//! A single sub-grid: cells, faces, and their geometry.

use crate::error::GridError;
use crate::geometry::{normalize, Vec3};

/// Classification of a face within its grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceTag {
    /// Shared by two cells.
    Interior,
    /// On the outer boundary of the domain.
    Boundary,
    /// One side of a split fracture face; touches one cell.
    Fracture,
}

/// The cells adjacent to a face.
///
/// The face normal points out of `first` (and into `second`, if present).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceCells {
    /// The cell the normal points away from.
    pub first: usize,
    /// The cell on the other side, `None` for boundary and fracture faces.
    pub second: Option<usize>,
}

impl FaceCells {
    /// A face between two cells.
    pub fn interior(first: usize, second: usize) -> Self {
        Self {
            first,
            second: Some(second),
        }
    }

    /// A face with a single adjacent cell.
    pub fn single(cell: usize) -> Self {
        Self {
            first: cell,
            second: None,
        }
    }
}

/// One sub-grid of a [`GridBucket`](crate::GridBucket).
///
/// Geometry is stored per entity in flat vectors. For a grid of
/// dimension `d`, "volume" is the `d`-dimensional measure of a cell and
/// "area" the `(d-1)`-dimensional measure of a face.
#[derive(Clone, Debug)]
pub struct Grid {
    dim: u8,
    cell_volumes: Vec<f64>,
    cell_centers: Vec<Vec3>,
    face_areas: Vec<f64>,
    face_centers: Vec<Vec3>,
    face_normals: Vec<Vec3>,
    face_cells: Vec<FaceCells>,
    face_tags: Vec<FaceTag>,
}

impl Grid {
    /// Start building a grid of dimension `dim`.
    pub fn builder(dim: u8) -> GridBuilder {
        GridBuilder::new(dim)
    }

    /// Topological dimension (0 to 3).
    pub fn dim(&self) -> u8 {
        self.dim
    }

    /// Number of cells.
    pub fn num_cells(&self) -> usize {
        self.cell_volumes.len()
    }

    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.face_areas.len()
    }

    /// Cell measures, indexed by cell.
    pub fn cell_volumes(&self) -> &[f64] {
        &self.cell_volumes
    }

    /// Centre of `cell`.
    pub fn cell_center(&self, cell: usize) -> Vec3 {
        self.cell_centers[cell]
    }

    /// Face measures, indexed by face.
    pub fn face_areas(&self) -> &[f64] {
        &self.face_areas
    }

    /// Centre of `face`.
    pub fn face_center(&self, face: usize) -> Vec3 {
        self.face_centers[face]
    }

    /// Unit normal of `face`.
    pub fn face_normal(&self, face: usize) -> Vec3 {
        self.face_normals[face]
    }

    /// Cells adjacent to `face`.
    pub fn face_cells(&self, face: usize) -> FaceCells {
        self.face_cells[face]
    }

    /// Tag of `face`.
    pub fn face_tag(&self, face: usize) -> FaceTag {
        self.face_tags[face]
    }

    /// Indices of faces carrying `tag`.
    pub fn faces_tagged(&self, tag: FaceTag) -> impl Iterator<Item = usize> + '_ {
        self.face_tags
            .iter()
            .enumerate()
            .filter(move |(_, t)| **t == tag)
            .map(|(i, _)| i)
    }
}

/// Incremental constructor for a [`Grid`].
///
/// Cells are added first (their indices are returned), then faces that
/// reference them. [`build`](GridBuilder::build) validates the result.
///
/// ```
/// use slipstep_grid::{FaceCells, FaceTag, Grid};
///
/// let mut b = Grid::builder(1);
/// let left = b.add_cell(1.0, [0.5, 0.0, 0.0]);
/// let right = b.add_cell(1.0, [1.5, 0.0, 0.0]);
/// b.add_face(1.0, [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], FaceCells::interior(left, right), FaceTag::Interior);
/// let grid = b.build().unwrap();
/// assert_eq!(grid.num_cells(), 2);
/// assert_eq!(grid.num_faces(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct GridBuilder {
    dim: u8,
    cell_volumes: Vec<f64>,
    cell_centers: Vec<Vec3>,
    face_areas: Vec<f64>,
    face_centers: Vec<Vec3>,
    face_normals: Vec<Vec3>,
    face_cells: Vec<FaceCells>,
    face_tags: Vec<FaceTag>,
}

impl GridBuilder {
    /// Create an empty builder for a grid of dimension `dim`.
    pub fn new(dim: u8) -> Self {
        Self {
            dim,
            cell_volumes: Vec::new(),
            cell_centers: Vec::new(),
            face_areas: Vec::new(),
            face_centers: Vec::new(),
            face_normals: Vec::new(),
            face_cells: Vec::new(),
            face_tags: Vec::new(),
        }
    }

    /// Append a cell and return its index.
    pub fn add_cell(&mut self, volume: f64, center: Vec3) -> usize {
        self.cell_volumes.push(volume);
        self.cell_centers.push(center);
        self.cell_volumes.len() - 1
    }

    /// Append a face and return its index.
    pub fn add_face(
        &mut self,
        area: f64,
        center: Vec3,
        normal: Vec3,
        cells: FaceCells,
        tag: FaceTag,
    ) -> usize {
        self.face_areas.push(area);
        self.face_centers.push(center);
        self.face_normals.push(normal);
        self.face_cells.push(cells);
        self.face_tags.push(tag);
        self.face_areas.len() - 1
    }

    /// Number of cells added so far.
    pub fn num_cells(&self) -> usize {
        self.cell_volumes.len()
    }

    /// Validate and produce the grid.
    ///
    /// Normals are normalized. Interior faces must have two distinct
    /// cells; boundary and fracture faces exactly one.
    pub fn build(mut self) -> Result<Grid, GridError> {
        if self.dim > 3 {
            return Err(GridError::InvalidDimension { dim: self.dim });
        }
        if self.cell_volumes.is_empty() {
            return Err(GridError::EmptyGrid);
        }
        for (c, &v) in self.cell_volumes.iter().enumerate() {
            if !v.is_finite() || v <= 0.0 {
                return Err(GridError::InvalidGeometry {
                    reason: format!("cell {c} has measure {v}"),
                });
            }
        }
        let num_cells = self.cell_volumes.len();
        for f in 0..self.face_areas.len() {
            let area = self.face_areas[f];
            if !area.is_finite() || area < 0.0 {
                return Err(GridError::InvalidGeometry {
                    reason: format!("face {f} has measure {area}"),
                });
            }
            self.face_normals[f] =
                normalize(self.face_normals[f]).ok_or_else(|| GridError::InvalidGeometry {
                    reason: format!("face {f} has a degenerate normal"),
                })?;
            let fc = self.face_cells[f];
            for cell in std::iter::once(fc.first).chain(fc.second) {
                if cell >= num_cells {
                    return Err(GridError::CellOutOfRange {
                        face: f,
                        cell,
                        num_cells,
                    });
                }
            }
            let consistent = match (self.face_tags[f], fc.second) {
                (FaceTag::Interior, Some(s)) => s != fc.first,
                (FaceTag::Interior, None) => false,
                (FaceTag::Boundary | FaceTag::Fracture, second) => second.is_none(),
            };
            if !consistent {
                return Err(GridError::InvalidGeometry {
                    reason: format!(
                        "face {f} tagged {:?} has adjacency {:?}",
                        self.face_tags[f], fc
                    ),
                });
            }
        }
        Ok(Grid {
            dim: self.dim,
            cell_volumes: self.cell_volumes,
            cell_centers: self.cell_centers,
            face_areas: self.face_areas,
            face_centers: self.face_centers,
            face_normals: self.face_normals,
            face_cells: self.face_cells,
            face_tags: self.face_tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cells() -> GridBuilder {
        let mut b = GridBuilder::new(3);
        b.add_cell(1.0, [0.5, 0.5, 0.5]);
        b.add_cell(1.0, [0.5, 0.5, 1.5]);
        b
    }

    #[test]
    fn builds_and_normalizes() {
        let mut b = two_cells();
        b.add_face(
            1.0,
            [0.5, 0.5, 1.0],
            [0.0, 0.0, 2.0],
            FaceCells::interior(0, 1),
            FaceTag::Interior,
        );
        let g = b.build().unwrap();
        assert_eq!(g.face_normal(0), [0.0, 0.0, 1.0]);
        assert_eq!(g.faces_tagged(FaceTag::Interior).count(), 1);
    }

    #[test]
    fn rejects_empty_and_bad_dimension() {
        assert_eq!(GridBuilder::new(2).build().unwrap_err(), GridError::EmptyGrid);
        let mut b = GridBuilder::new(4);
        b.add_cell(1.0, [0.0; 3]);
        assert_eq!(
            b.build().unwrap_err(),
            GridError::InvalidDimension { dim: 4 }
        );
    }

    #[test]
    fn rejects_out_of_range_cell() {
        let mut b = two_cells();
        b.add_face(1.0, [0.0; 3], [1.0, 0.0, 0.0], FaceCells::single(5), FaceTag::Boundary);
        assert!(matches!(
            b.build(),
            Err(GridError::CellOutOfRange { face: 0, cell: 5, .. })
        ));
    }

    #[test]
    fn rejects_inconsistent_tags() {
        let mut b = two_cells();
        b.add_face(1.0, [0.0; 3], [1.0, 0.0, 0.0], FaceCells::single(0), FaceTag::Interior);
        assert!(matches!(b.build(), Err(GridError::InvalidGeometry { .. })));

        let mut b = two_cells();
        b.add_face(
            1.0,
            [0.0; 3],
            [1.0, 0.0, 0.0],
            FaceCells::interior(0, 1),
            FaceTag::Fracture,
        );
        assert!(matches!(b.build(), Err(GridError::InvalidGeometry { .. })));
    }

    #[test]
    fn rejects_degenerate_measures() {
        let mut b = GridBuilder::new(3);
        b.add_cell(0.0, [0.0; 3]);
        assert!(matches!(b.build(), Err(GridError::InvalidGeometry { .. })));

        let mut b = two_cells();
        b.add_face(1.0, [0.0; 3], [0.0; 3], FaceCells::single(0), FaceTag::Boundary);
        assert!(matches!(b.build(), Err(GridError::InvalidGeometry { .. })));
    }
}
