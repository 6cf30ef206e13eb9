//! Mesh generation from fracture descriptions.

use log::{debug, info};

use crate::bucket::GridBucket;
use crate::error::GridError;
use crate::fracture::{BoundingBox, EllipticFracture, FractureSet};
use crate::grid::{FaceCells, FaceTag, Grid, GridBuilder};
use crate::incidence::Incidence;

/// Angular tolerance, in radians, for treating a fracture as horizontal.
const HORIZONTAL_TOLERANCE: f64 = 1e-9;

/// Turns a domain and a fracture list into a [`GridBucket`].
pub trait MeshGenerator {
    /// Generate the mixed-dimensional grid.
    ///
    /// Any failure is reported as [`GridError::MeshGeneration`].
    fn generate(
        &self,
        domain: &BoundingBox,
        fractures: &FractureSet,
    ) -> Result<GridBucket, GridError>;
}

/// Cartesian box generator with horizontal fractures.
///
/// Host cells are numbered `i + nx * (j + ny * k)`. Faces are numbered
/// x-faces first, then y-faces, then z-faces, each block in the same
/// lexicographic order; split faces created for the upper side of a
/// fracture are appended after all of them.
///
/// Each fracture is snapped to the nearest interior z-layer of faces.
/// The z-faces of that layer whose centres lie inside the ellipse become
/// fracture cells. Every such face is split: the original keeps the
/// lower cell with normal `+z` and a new face takes the upper cell with
/// normal `-z`, both tagged [`FaceTag::Fracture`] and both mapped to the
/// same fracture cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructuredSplitGenerator {
    /// Cells along x.
    pub nx: usize,
    /// Cells along y.
    pub ny: usize,
    /// Cells along z.
    pub nz: usize,
}

/// The `(i, j)` positions of one fracture's cells within its z-layer.
struct Footprint {
    layer: usize,
    columns: Vec<(usize, usize)>,
}

impl StructuredSplitGenerator {
    /// A generator for an `nx × ny × nz` box.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    fn cell(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.nx * (j + self.ny * k)
    }

    fn num_x_faces(&self) -> usize {
        (self.nx + 1) * self.ny * self.nz
    }

    fn num_y_faces(&self) -> usize {
        self.nx * (self.ny + 1) * self.nz
    }

    /// Index of the z-face below cell layer `k` (`k == nz` is the top).
    fn z_face(&self, i: usize, j: usize, k: usize) -> usize {
        self.num_x_faces() + self.num_y_faces() + i + self.nx * (j + self.ny * k)
    }

    fn footprint(
        &self,
        index: usize,
        frac: &EllipticFracture,
        domain: &BoundingBox,
        claimed: &mut [bool],
    ) -> Result<Footprint, GridError> {
        if !frac.is_horizontal(HORIZONTAL_TOLERANCE) {
            return Err(GridError::MeshGeneration {
                reason: format!("fracture {index} is not horizontal"),
            });
        }
        let [lx, ly, lz] = domain.lengths();
        let (dx, dy, dz) = (
            lx / self.nx as f64,
            ly / self.ny as f64,
            lz / self.nz as f64,
        );
        let layer = ((frac.center[2] - domain.min[2]) / dz).round();
        if layer < 1.0 || layer > (self.nz - 1) as f64 {
            return Err(GridError::MeshGeneration {
                reason: format!(
                    "fracture {index} at z = {} does not lie on an interior face layer",
                    frac.center[2]
                ),
            });
        }
        let layer = layer as usize;
        let z = domain.min[2] + layer as f64 * dz;

        let mut columns = Vec::new();
        for j in 0..self.ny {
            for i in 0..self.nx {
                let center = [
                    domain.min[0] + (i as f64 + 0.5) * dx,
                    domain.min[1] + (j as f64 + 0.5) * dy,
                    frac.center[2],
                ];
                if !frac.contains(center, 0.5 * dz) {
                    continue;
                }
                let slot = &mut claimed[i + self.nx * (j + self.ny * layer)];
                if *slot {
                    return Err(GridError::MeshGeneration {
                        reason: format!(
                            "fracture {index} overlaps another fracture at column ({i}, {j}), z = {z}"
                        ),
                    });
                }
                *slot = true;
                columns.push((i, j));
            }
        }
        if columns.is_empty() {
            return Err(GridError::MeshGeneration {
                reason: format!("fracture {index} covers no face centre at this resolution"),
            });
        }
        debug!(
            "fracture {index}: layer {layer}, {} cells",
            columns.len()
        );
        Ok(Footprint { layer, columns })
    }

    fn fracture_grid(&self, fp: &Footprint, domain: &BoundingBox) -> Result<Grid, GridError> {
        let [lx, ly, lz] = domain.lengths();
        let (dx, dy, dz) = (
            lx / self.nx as f64,
            ly / self.ny as f64,
            lz / self.nz as f64,
        );
        let z = domain.min[2] + fp.layer as f64 * dz;
        let mut b = GridBuilder::new(2);
        let mut local = vec![None; self.nx * self.ny];
        for &(i, j) in &fp.columns {
            let c = b.add_cell(
                dx * dy,
                [
                    domain.min[0] + (i as f64 + 0.5) * dx,
                    domain.min[1] + (j as f64 + 0.5) * dy,
                    z,
                ],
            );
            local[i + self.nx * j] = Some(c);
        }
        // In-plane faces only between neighbouring fracture cells.
        for &(i, j) in &fp.columns {
            let Some(here) = local[i + self.nx * j] else {
                continue;
            };
            if i + 1 < self.nx {
                if let Some(east) = local[i + 1 + self.nx * j] {
                    b.add_face(
                        dy,
                        [
                            domain.min[0] + (i + 1) as f64 * dx,
                            domain.min[1] + (j as f64 + 0.5) * dy,
                            z,
                        ],
                        [1.0, 0.0, 0.0],
                        FaceCells::interior(here, east),
                        FaceTag::Interior,
                    );
                }
            }
            if j + 1 < self.ny {
                if let Some(north) = local[i + self.nx * (j + 1)] {
                    b.add_face(
                        dx,
                        [
                            domain.min[0] + (i as f64 + 0.5) * dx,
                            domain.min[1] + (j + 1) as f64 * dy,
                            z,
                        ],
                        [0.0, 1.0, 0.0],
                        FaceCells::interior(here, north),
                        FaceTag::Interior,
                    );
                }
            }
        }
        b.build()
    }
}

impl MeshGenerator for StructuredSplitGenerator {
    fn generate(
        &self,
        domain: &BoundingBox,
        fractures: &FractureSet,
    ) -> Result<GridBucket, GridError> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 {
            return Err(GridError::MeshGeneration {
                reason: format!(
                    "resolution {}x{}x{} has an empty axis",
                    self.nx, self.ny, self.nz
                ),
            });
        }
        fractures.check_inside(domain)?;

        let mut claimed = vec![false; self.nx * self.ny * (self.nz + 1)];
        let footprints = fractures
            .fractures()
            .iter()
            .enumerate()
            .map(|(n, f)| self.footprint(n, f, domain, &mut claimed))
            .collect::<Result<Vec<_>, _>>()?;

        let [lx, ly, lz] = domain.lengths();
        let (dx, dy, dz) = (
            lx / self.nx as f64,
            ly / self.ny as f64,
            lz / self.nz as f64,
        );
        let at = |i: f64, j: f64, k: f64| {
            [
                domain.min[0] + i * dx,
                domain.min[1] + j * dy,
                domain.min[2] + k * dz,
            ]
        };

        let mut host = GridBuilder::new(3);
        for k in 0..self.nz {
            for j in 0..self.ny {
                for i in 0..self.nx {
                    host.add_cell(
                        dx * dy * dz,
                        at(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5),
                    );
                }
            }
        }

        for k in 0..self.nz {
            for j in 0..self.ny {
                for i in 0..=self.nx {
                    let center = at(i as f64, j as f64 + 0.5, k as f64 + 0.5);
                    let (cells, normal, tag) = if i == 0 {
                        (FaceCells::single(self.cell(0, j, k)), [-1.0, 0.0, 0.0], FaceTag::Boundary)
                    } else if i == self.nx {
                        (FaceCells::single(self.cell(i - 1, j, k)), [1.0, 0.0, 0.0], FaceTag::Boundary)
                    } else {
                        (
                            FaceCells::interior(self.cell(i - 1, j, k), self.cell(i, j, k)),
                            [1.0, 0.0, 0.0],
                            FaceTag::Interior,
                        )
                    };
                    host.add_face(dy * dz, center, normal, cells, tag);
                }
            }
        }

        for k in 0..self.nz {
            for j in 0..=self.ny {
                for i in 0..self.nx {
                    let center = at(i as f64 + 0.5, j as f64, k as f64 + 0.5);
                    let (cells, normal, tag) = if j == 0 {
                        (FaceCells::single(self.cell(i, 0, k)), [0.0, -1.0, 0.0], FaceTag::Boundary)
                    } else if j == self.ny {
                        (FaceCells::single(self.cell(i, j - 1, k)), [0.0, 1.0, 0.0], FaceTag::Boundary)
                    } else {
                        (
                            FaceCells::interior(self.cell(i, j - 1, k), self.cell(i, j, k)),
                            [0.0, 1.0, 0.0],
                            FaceTag::Interior,
                        )
                    };
                    host.add_face(dx * dz, center, normal, cells, tag);
                }
            }
        }

        for k in 0..=self.nz {
            for j in 0..self.ny {
                for i in 0..self.nx {
                    let center = at(i as f64 + 0.5, j as f64 + 0.5, k as f64);
                    let (cells, normal, tag) = if k == 0 {
                        (FaceCells::single(self.cell(i, j, 0)), [0.0, 0.0, -1.0], FaceTag::Boundary)
                    } else if k == self.nz {
                        (FaceCells::single(self.cell(i, j, k - 1)), [0.0, 0.0, 1.0], FaceTag::Boundary)
                    } else if claimed[i + self.nx * (j + self.ny * k)] {
                        (FaceCells::single(self.cell(i, j, k - 1)), [0.0, 0.0, 1.0], FaceTag::Fracture)
                    } else {
                        (
                            FaceCells::interior(self.cell(i, j, k - 1), self.cell(i, j, k)),
                            [0.0, 0.0, 1.0],
                            FaceTag::Interior,
                        )
                    };
                    host.add_face(dx * dy, center, normal, cells, tag);
                }
            }
        }

        // Upper sides of split faces, one per fracture cell, in fracture order.
        let mut incidence_pairs = Vec::with_capacity(footprints.len());
        for fp in &footprints {
            let mut pairs = Vec::with_capacity(2 * fp.columns.len());
            for (c2d, &(i, j)) in fp.columns.iter().enumerate() {
                let lower = self.z_face(i, j, fp.layer);
                let upper = host.add_face(
                    dx * dy,
                    at(i as f64 + 0.5, j as f64 + 0.5, fp.layer as f64),
                    [0.0, 0.0, -1.0],
                    FaceCells::single(self.cell(i, j, fp.layer)),
                    FaceTag::Fracture,
                );
                pairs.push((lower, c2d));
                pairs.push((upper, c2d));
            }
            incidence_pairs.push(pairs);
        }

        let host = host.build()?;
        let num_host_faces = host.num_faces();
        let num_host_cells = host.num_cells();
        let mut bucket = GridBucket::new();
        let host_id = bucket.add_grid(host);
        for (fp, pairs) in footprints.iter().zip(incidence_pairs) {
            let grid = self.fracture_grid(fp, domain)?;
            let num_cells = grid.num_cells();
            let low = bucket.add_grid(grid);
            let incidence = Incidence::from_pairs(num_host_faces, num_cells, pairs)?;
            bucket.add_edge(host_id, low, incidence)?;
        }
        info!(
            "generated {}x{}x{} box: {} host cells, {} host faces, {} fractures",
            self.nx,
            self.ny,
            self.nz,
            num_host_cells,
            num_host_faces,
            footprints.len()
        );
        Ok(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipstep_core::GridId;

    fn unit_box() -> BoundingBox {
        BoundingBox::new([0.0; 3], [1.0; 3]).unwrap()
    }

    fn full_plane(z: f64) -> FractureSet {
        FractureSet::new(vec![EllipticFracture::new(
            [0.5, 0.5, z],
            2.0,
            2.0,
            0.0,
            0.0,
            0.0,
            16,
        )
        .unwrap()])
    }

    #[test]
    fn unfractured_box_counts() {
        let gb = StructuredSplitGenerator::new(2, 3, 4)
            .generate(&unit_box(), &FractureSet::default())
            .unwrap();
        assert_eq!(gb.num_grids(), 1);
        let host = gb.grid(GridId(0)).unwrap();
        assert_eq!(host.num_cells(), 24);
        assert_eq!(host.num_faces(), 3 * 3 * 4 + 2 * 4 * 4 + 2 * 3 * 5);
        let boundary = host.faces_tagged(FaceTag::Boundary).count();
        assert_eq!(boundary, 2 * (3 * 4 + 2 * 4 + 2 * 3));
        let volume: f64 = host.cell_volumes().iter().sum();
        assert!((volume - 1.0).abs() < 1e-12);
    }

    #[test]
    fn full_plane_fracture_splits_every_face_of_the_layer() {
        let gb = StructuredSplitGenerator::new(2, 2, 2)
            .generate(&unit_box(), &full_plane(0.5))
            .unwrap();
        assert_eq!(gb.num_grids(), 2);
        let (host_id, host) = gb.host().unwrap();
        assert_eq!(host_id, GridId(0));
        // 12 x-faces + 12 y-faces + 12 z-faces + 4 split copies.
        assert_eq!(host.num_faces(), 40);
        assert_eq!(host.faces_tagged(FaceTag::Fracture).count(), 8);

        let frac = gb.grid(GridId(1)).unwrap();
        assert_eq!(frac.dim(), 2);
        assert_eq!(frac.num_cells(), 4);
        assert_eq!(frac.num_faces(), 4);
        assert!((frac.cell_volumes().iter().sum::<f64>() - 1.0).abs() < 1e-12);

        let (_, edge) = gb.fracture_edges().unwrap()[0];
        assert_eq!(edge.face_cells().nnz(), 8);
        for cell in 0..4 {
            let faces = edge.face_cells().faces_of_cell(cell);
            assert_eq!(faces.len(), 2);
            let (lower, upper) = (faces[0] as usize, faces[1] as usize);
            assert_eq!(host.face_normal(lower), [0.0, 0.0, 1.0]);
            assert_eq!(host.face_normal(upper), [0.0, 0.0, -1.0]);
            assert_eq!(host.face_center(lower), host.face_center(upper));
            assert!(host.face_cells(lower).first < 4);
            assert!(host.face_cells(upper).first >= 4);
        }
    }

    #[test]
    fn small_ellipse_selects_inner_faces() {
        let set = FractureSet::new(vec![EllipticFracture::new(
            [0.5, 0.5, 0.5],
            0.2,
            0.2,
            0.0,
            0.0,
            0.0,
            16,
        )
        .unwrap()]);
        let gb = StructuredSplitGenerator::new(4, 4, 2)
            .generate(&unit_box(), &set)
            .unwrap();
        let frac = gb.grid(GridId(1)).unwrap();
        // Face centres at 0.375 and 0.625 lie within radius 0.2 of the centre.
        assert_eq!(frac.num_cells(), 4);
    }

    #[test]
    fn fracture_off_interior_layers_fails() {
        let err = StructuredSplitGenerator::new(2, 2, 2)
            .generate(&unit_box(), &full_plane(0.05))
            .unwrap_err();
        assert!(matches!(err, GridError::MeshGeneration { .. }));
    }

    #[test]
    fn tilted_fracture_fails() {
        let set = FractureSet::new(vec![EllipticFracture::new(
            [0.5, 0.5, 0.5],
            0.3,
            0.3,
            0.0,
            0.0,
            0.4,
            16,
        )
        .unwrap()]);
        assert!(StructuredSplitGenerator::new(2, 2, 2)
            .generate(&unit_box(), &set)
            .is_err());
    }

    #[test]
    fn overlapping_fractures_fail() {
        let mut both = full_plane(0.5).fractures().to_vec();
        both.extend(full_plane(0.52).fractures().iter().cloned());
        let err = StructuredSplitGenerator::new(2, 2, 2)
            .generate(&unit_box(), &FractureSet::new(both))
            .unwrap_err();
        assert!(err.to_string().contains("overlaps"));
    }

    #[test]
    fn tiny_fracture_covering_nothing_fails() {
        let set = FractureSet::new(vec![EllipticFracture::new(
            [0.01, 0.01, 0.5],
            0.001,
            0.001,
            0.0,
            0.0,
            0.0,
            16,
        )
        .unwrap()]);
        assert!(StructuredSplitGenerator::new(2, 2, 2)
            .generate(&unit_box(), &set)
            .is_err());
    }
}
