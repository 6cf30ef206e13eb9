//! Reusable grid fixtures.
//!
//! - [`one_to_one_bucket`]: a row of host cells, each with one fracture
//!   face mapped to its own fracture cell.
//! - [`split_box_bucket`]: a unit box split by a full-plane horizontal
//!   fracture, two host faces per fracture cell.
//! - [`unmapped_bucket`]: a fracture grid with a cell no host face touches.

use slipstep_core::{names, FieldStore, GridId};
use slipstep_grid::{
    BoundingBox, EllipticFracture, FaceCells, FaceTag, FractureSet, GridBucket, GridBuilder,
    Incidence, MeshGenerator, StructuredSplitGenerator,
};

/// The host grid of every fixture bucket.
pub const HOST: GridId = GridId(0);

/// The (first) fracture grid of every fixture bucket.
pub const FRACTURE: GridId = GridId(1);

/// `n` unit cubes along x, each with a fracture face on top (normal `+z`)
/// mapped to fracture cell `i`.
///
/// Host faces are numbered: top faces `0..n`, bottom boundary faces
/// `n..2n`, then the `n - 1` interior x-faces.
pub fn one_to_one_bucket(n: usize) -> GridBucket {
    assert!(n > 0, "one_to_one_bucket needs at least one cell");
    let mut host = GridBuilder::new(3);
    for i in 0..n {
        host.add_cell(1.0, [i as f64 + 0.5, 0.5, 0.5]);
    }
    for i in 0..n {
        host.add_face(
            1.0,
            [i as f64 + 0.5, 0.5, 1.0],
            [0.0, 0.0, 1.0],
            FaceCells::single(i),
            FaceTag::Fracture,
        );
    }
    for i in 0..n {
        host.add_face(
            1.0,
            [i as f64 + 0.5, 0.5, 0.0],
            [0.0, 0.0, -1.0],
            FaceCells::single(i),
            FaceTag::Boundary,
        );
    }
    for i in 1..n {
        host.add_face(
            1.0,
            [i as f64, 0.5, 0.5],
            [1.0, 0.0, 0.0],
            FaceCells::interior(i - 1, i),
            FaceTag::Interior,
        );
    }
    let host = host.build().expect("fixture host grid");
    let num_faces = host.num_faces();

    let mut frac = GridBuilder::new(2);
    for i in 0..n {
        frac.add_cell(1.0, [i as f64 + 0.5, 0.5, 1.0]);
    }
    let frac = frac.build().expect("fixture fracture grid");

    let mut bucket = GridBucket::new();
    let h = bucket.add_grid(host);
    let f = bucket.add_grid(frac);
    let incidence = Incidence::from_pairs(num_faces, n, (0..n).map(|i| (i, i)))
        .expect("fixture incidence");
    bucket.add_edge(h, f, incidence).expect("fixture edge");
    bucket
}

/// Unit box of `nx × ny × nz` cells with a horizontal fracture through
/// the whole plane nearest `z = 0.5`.
pub fn split_box_bucket(nx: usize, ny: usize, nz: usize) -> GridBucket {
    let domain = BoundingBox::new([0.0; 3], [1.0; 3]).expect("unit box");
    let fracture = EllipticFracture::new([0.5, 0.5, 0.5], 10.0, 10.0, 0.0, 0.0, 0.0, 16)
        .expect("full-plane fracture");
    StructuredSplitGenerator::new(nx, ny, nz)
        .generate(&domain, &FractureSet::new(vec![fracture]))
        .expect("split box")
}

/// Two host cells and a two-cell fracture grid where only cell 0 is
/// mapped to host faces.
pub fn unmapped_bucket() -> GridBucket {
    let mut host = GridBuilder::new(3);
    host.add_cell(1.0, [0.5, 0.5, 0.5]);
    host.add_cell(1.0, [0.5, 0.5, 1.5]);
    host.add_face(1.0, [0.5, 0.5, 1.0], [0.0, 0.0, 1.0], FaceCells::single(0), FaceTag::Fracture);
    host.add_face(1.0, [0.5, 0.5, 1.0], [0.0, 0.0, -1.0], FaceCells::single(1), FaceTag::Fracture);
    let host = host.build().expect("fixture host grid");

    let mut frac = GridBuilder::new(2);
    frac.add_cell(1.0, [0.5, 0.5, 1.0]);
    frac.add_cell(1.0, [1.5, 0.5, 1.0]);
    let frac = frac.build().expect("fixture fracture grid");

    let mut bucket = GridBucket::new();
    let h = bucket.add_grid(host);
    let f = bucket.add_grid(frac);
    let incidence = Incidence::from_pairs(2, 2, [(0, 0), (1, 0)]).expect("fixture incidence");
    bucket.add_edge(h, f, incidence).expect("fixture edge");
    bucket
}

/// A store holding `aperture` on every fracture grid of `bucket`.
pub fn baseline_store(bucket: &GridBucket, aperture: f64) -> FieldStore {
    let mut store = FieldStore::new();
    for (_, edge) in bucket.fracture_edges().expect("fixture host") {
        let cells = edge.face_cells().num_cells();
        store.insert_cells(edge.low(), names::APERTURE, vec![aperture; cells]);
    }
    store
}
