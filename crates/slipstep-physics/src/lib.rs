//! Reference solvers for the slipstep coupling loop.
//!
//! Small, self-contained implementations of the solver traits in
//! `slipstep-solver`, good enough to drive the controller end to end:
//!
//! - [`SinglePhaseFlow`]: implicit two-point flux flow on every grid with
//!   matrix/fracture exchange across edges.
//! - [`FaceTractionMechanics`]: fracture-face tractions from a background
//!   stress, pore pressure, and accumulated slip.
//! - [`CoulombFriction`]: Coulomb slip criterion with dilation.
//!
//! [`analysis`] holds error norms and the Sneddon crack solution used to
//! verify fracture opening.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod flow;
pub mod friction;
pub mod mechanics;
pub mod params;

pub use flow::SinglePhaseFlow;
pub use friction::{CoulombFriction, FrictionParams};
pub use mechanics::{FaceTractionMechanics, MechanicsParams};
pub use params::{BoundaryCondition, DomainKind, DomainParams, Permeability, RateSchedule, SourceTerm};
