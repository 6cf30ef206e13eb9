//! Benchmark profiles and utilities for the slipstep coupling framework.
//!
//! - [`reference_profile`]: 20x20x2 split box with an injecting fracture
//!   plane and the reference solvers
//! - [`stress_profile`]: the same setup on 100x100x2
//! - [`pseudo_random_values`]: deterministic values via a seeded hash

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use slipstep_core::units::{degrees, MEGA};
use slipstep_engine::{CouplingConfig, LogExporter, SimulationConfig};
use slipstep_grid::{
    BoundingBox, EllipticFracture, FractureSet, GridBucket, GridError, MeshGenerator,
    StructuredSplitGenerator,
};
use slipstep_physics::{
    CoulombFriction, DomainParams, FaceTractionMechanics, FrictionParams, MechanicsParams,
    SinglePhaseFlow, SourceTerm,
};

/// Unit box of `n × n × 2` cells split by a full horizontal fracture plane.
pub fn split_box(n: usize) -> Result<GridBucket, GridError> {
    let domain = BoundingBox::new([0.0; 3], [1.0; 3])?;
    let plane = EllipticFracture::new([0.5, 0.5, 0.5], 10.0, 10.0, 0.0, 0.0, 0.0, 16)?;
    StructuredSplitGenerator::new(n, n, 2).generate(&domain, &FractureSet::new(vec![plane]))
}

/// Build a reference benchmark profile: 20x20x2 host, 400 fracture cells.
///
/// Injection at the centre fracture cell, 10 MPa normal / 4 MPa shear
/// background stress, friction coefficient 0.6. dt = 1 s, ten steps.
pub fn reference_profile() -> SimulationConfig {
    profile(20)
}

/// Build a stress benchmark profile: 100x100x2 host, 10K fracture cells.
pub fn stress_profile() -> SimulationConfig {
    profile(100)
}

fn profile(n: usize) -> SimulationConfig {
    let bucket = split_box(n).expect("benchmark geometry");
    let source = SourceTerm::constant(1e-3, vec![n * (n / 2) + n / 2]);
    let flow = SinglePhaseFlow::new(
        &bucket,
        vec![DomainParams::matrix(), DomainParams::injection(1e-4, source)],
    )
    .expect("benchmark flow");
    let mechanics = FaceTractionMechanics::new(MechanicsParams {
        background_stress: [
            [0.0, 0.0, 4.0 * MEGA],
            [0.0, 0.0, 0.0],
            [4.0 * MEGA, 0.0, 10.0 * MEGA],
        ],
        biot_coefficient: 1.0,
        shear_stiffness: 1e10,
    })
    .expect("benchmark mechanics");
    let friction = CoulombFriction::new(
        FrictionParams::new(0.6, 1e10).with_dilation_angle(degrees(5.0)),
        &bucket,
    )
    .expect("benchmark friction");

    let mut store = slipstep_core::FieldStore::new();
    for (_, edge) in bucket.fracture_edges().expect("benchmark host") {
        store.insert_cells(
            edge.low(),
            slipstep_core::names::APERTURE,
            vec![1e-4; edge.face_cells().num_cells()],
        );
    }

    SimulationConfig {
        store,
        flow: Box::new(flow),
        mechanics: Box::new(mechanics),
        friction: Box::new(friction),
        exporter: Box::new(LogExporter::new(&[])),
        coupling: CouplingConfig::new(1.0, 10.0),
        bucket,
    }
}

/// Generate `len` deterministic values in `[-1, 1)` from `seed`.
pub fn pseudo_random_values(len: usize, seed: u64) -> Vec<f64> {
    (0..len as u64)
        .map(|i| {
            let h = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(i.wrapping_mul(1442695040888963407));
            let h = (h ^ (h >> 33)).wrapping_mul(0xff51afd7ed558ccd);
            (h >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
        })
        .collect()
}
