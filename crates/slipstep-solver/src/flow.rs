//! The [`FlowSolver`] trait.

use slipstep_core::{EdgeId, GridId, SolverError};
use slipstep_grid::GridBucket;

/// A single-phase flow solver over every grid of a bucket.
///
/// # Contract
///
/// - [`advance_time`](FlowSolver::advance_time) sets the target time of
///   the next [`step`](FlowSolver::step); the step size is the
///   difference from the current time.
/// - [`reassemble`](FlowSolver::reassemble) rebuilds the linear system
///   from current apertures and must be called after
///   [`set_aperture`](FlowSolver::set_aperture) for the new apertures to
///   take effect.
/// - After a successful `step`, [`read_field`](FlowSolver::read_field)
///   returns `"pressure"` with one value per cell of each grid.
pub trait FlowSolver: Send {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Set the time the next step advances to.
    fn advance_time(&mut self, time: f64);

    /// Rebuild the discrete system for the current state.
    fn reassemble(&mut self, bucket: &GridBucket) -> Result<(), SolverError>;

    /// Solve one time step.
    fn step(&mut self, bucket: &GridBucket) -> Result<(), SolverError>;

    /// A per-cell field of `grid`, e.g. `"pressure"`.
    fn read_field(&self, grid: GridId, name: &str) -> Option<&[f64]>;

    /// A per-pair field of an edge, e.g. `"interface_flux"`.
    ///
    /// Default: no edge fields.
    fn read_edge_field(&self, _edge: EdgeId, _name: &str) -> Option<&[f64]> {
        None
    }

    /// Replace the aperture of every cell of the fracture grid `grid`.
    fn set_aperture(&mut self, grid: GridId, aperture: &[f64]) -> Result<(), SolverError>;
}
