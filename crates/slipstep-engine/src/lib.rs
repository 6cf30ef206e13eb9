//! Coupled time-stepping engine for fractured rock.
//!
//! Provides [`CoupledSimulation`], which advances flow, mechanics, and
//! Coulomb friction over a host grid with embedded fracture grids, moving
//! data between host faces and fracture cells and updating fracture
//! apertures from slip.
//!
//! Each outer step advances the flow solver, projects fracture pressure
//! onto the host faces, iterates mechanics and friction until no face
//! newly slips, maps the slip-induced aperture change back onto the
//! fracture cells, and exports a snapshot.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod aperture;
pub mod config;
pub mod coupled;
pub mod export;
pub mod metrics;
pub mod transfer;

pub use aperture::{update_apertures, ApertureBaseline};
pub use config::{
    ConfigError, CouplingConfig, SimulationConfig, UnmappedCellPolicy,
    DEFAULT_MAX_SLIP_ITERATIONS,
};
pub use coupled::{CoupledSimulation, RunSummary, StepError, StepResult};
pub use export::{ExportLog, ExportedStep, LogExporter, RecordingExporter};
pub use metrics::StepMetrics;
pub use transfer::{cells_to_faces, faces_to_cells};
