//! slipstep: coupled flow, mechanics, and friction simulation of fractured rock.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! slipstep sub-crates. For most users, adding `slipstep` as a single
//! dependency is sufficient.
//!
//! A 3-D host grid with embedded 2-D fracture grids is advanced in time.
//! Flow raises fracture pressure and lowers the effective normal stress.
//! Faces slip once shear exceeds friction, and slip dilates the fracture
//! aperture, which feeds back into flow on the next step. The
//! `injection_slip` example runs this with logging (`RUST_LOG=info`).
//!
//! # Quick start
//!
//! ```rust
//! use slipstep::prelude::*;
//! use slipstep::types::units::{degrees, MEGA};
//!
//! // A unit box split by one horizontal fracture plane.
//! let domain = BoundingBox::new([0.0; 3], [1.0; 3]).unwrap();
//! let fractures = FractureSet::parse("0.5, 0.5, 0.5, 10, 10, 0, 0, 0").unwrap();
//! let bucket = StructuredSplitGenerator::new(4, 4, 2)
//!     .generate(&domain, &fractures)
//!     .unwrap();
//!
//! let flow = SinglePhaseFlow::new(
//!     &bucket,
//!     vec![DomainParams::matrix(), DomainParams::fracture(1e-4)],
//! )
//! .unwrap();
//! let mechanics = FaceTractionMechanics::new(MechanicsParams {
//!     background_stress: [[0.0, 0.0, 4.0 * MEGA], [0.0; 3], [4.0 * MEGA, 0.0, 10.0 * MEGA]],
//!     biot_coefficient: 1.0,
//!     shear_stiffness: 1e10,
//! })
//! .unwrap();
//! let friction = CoulombFriction::new(
//!     FrictionParams::new(0.6, 1e10).with_dilation_angle(degrees(5.0)),
//!     &bucket,
//! )
//! .unwrap();
//!
//! let mut store = FieldStore::new();
//! store.insert_cells(GridId(1), names::APERTURE, vec![1e-4; 16]);
//! let (exporter, log) = RecordingExporter::new(&[names::APERTURE]);
//!
//! let mut sim = CoupledSimulation::new(SimulationConfig {
//!     bucket,
//!     store,
//!     flow: Box::new(flow),
//!     mechanics: Box::new(mechanics),
//!     friction: Box::new(friction),
//!     exporter: Box::new(exporter),
//!     coupling: CouplingConfig::new(1.0, 2.0),
//! })
//! .unwrap();
//! let summary = sim.run().unwrap();
//! assert_eq!(summary.times, vec![0.0, 1.0, 2.0]);
//! assert_eq!(log.len(), 3);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `slipstep-core` | IDs, field store, errors, units |
//! | [`grid`] | `slipstep-grid` | Grids, incidence, grid bucket, fracture geometry, meshing |
//! | [`solver`] | `slipstep-solver` | Flow, mechanics, friction, and exporter traits |
//! | [`physics`] | `slipstep-physics` | Reference solvers and analytical checks |
//! | [`engine`] | `slipstep-engine` | Coupled time-stepping controller |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// IDs, the field store, error types, and units (`slipstep-core`).
pub use slipstep_core as types;

/// Grid hierarchy and mesh generation (`slipstep-grid`).
///
/// [`grid::GridBucket`] holds the host and fracture grids;
/// [`grid::StructuredSplitGenerator`] builds one from a
/// [`grid::FractureSet`].
pub use slipstep_grid as grid;

/// Solver trait seams (`slipstep-solver`).
///
/// Implement [`solver::FlowSolver`], [`solver::MechanicsSolver`],
/// [`solver::FrictionSolver`], or [`solver::Exporter`] to plug in other
/// physics or output formats.
pub use slipstep_solver as solver;

/// Reference solvers (`slipstep-physics`).
///
/// [`physics::SinglePhaseFlow`], [`physics::FaceTractionMechanics`],
/// [`physics::CoulombFriction`], and the [`physics::analysis`] helpers.
pub use slipstep_physics as physics;

/// Coupled time-stepping (`slipstep-engine`).
pub use slipstep_engine as engine;

/// Common imports for typical slipstep usage.
///
/// ```rust
/// use slipstep::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use slipstep_core::{names, EdgeId, FieldLocation, FieldStore, GridId};

    // Errors
    pub use slipstep_core::{CouplingError, ExportError, FieldError, SolverError};

    // Grids and meshing
    pub use slipstep_grid::{
        BoundingBox, EllipticFracture, FractureSet, GridBucket, GridError, MeshGenerator,
        StructuredSplitGenerator,
    };

    // Solver traits
    pub use slipstep_solver::{Exporter, FlowSolver, FrictionSolver, MechanicsSolver};

    // Reference solvers
    pub use slipstep_physics::{
        CoulombFriction, DomainParams, FaceTractionMechanics, FrictionParams, MechanicsParams,
        SinglePhaseFlow, SourceTerm,
    };

    // Engine
    pub use slipstep_engine::{
        ConfigError, CoupledSimulation, CouplingConfig, LogExporter, RecordingExporter,
        SimulationConfig, StepError, StepMetrics, StepResult, UnmappedCellPolicy,
    };
}
