//! Solver and exporter interfaces for slipstep.
//!
//! The coupled controller drives four collaborators through these
//! traits: a [`FlowSolver`], a [`MechanicsSolver`], a [`FrictionSolver`],
//! and an [`Exporter`]. All are object-safe and stored as boxed trait
//! objects by the engine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod exporter;
pub mod flow;
pub mod friction;
pub mod mechanics;

pub use exporter::Exporter;
pub use flow::FlowSolver;
pub use friction::FrictionSolver;
pub use mechanics::MechanicsSolver;
