//! The [`FrictionSolver`] trait.

use slipstep_core::SolverError;
use slipstep_grid::Grid;

/// A fault-friction model evaluated on host faces.
///
/// Slip state persists across calls to [`step`](FrictionSolver::step)
/// until [`reset_slip_state`](FrictionSolver::reset_slip_state), which
/// the controller calls once per time step before the slip iteration.
/// Accumulated slip distance is not reset.
pub trait FrictionSolver: Send {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Clear the per-step slip flags.
    fn reset_slip_state(&mut self);

    /// Evaluate the friction law for `traction` (three per face of `host`).
    ///
    /// Returns `true` if any face started slipping during this call.
    fn step(&mut self, host: &Grid, traction: &[f64]) -> Result<bool, SolverError>;

    /// Per host face: whether the face slipped since the last reset.
    fn is_slipping(&self) -> &[bool];

    /// Accumulated slip vector, three per host face.
    fn slip_distance(&self) -> &[f64];

    /// Accumulated slip-induced aperture change, one per host face.
    fn read_aperture_change(&self) -> &[f64];

    /// Stiffness converting excess shear into slip, Pa/m, if the model has one.
    fn shear_stiffness(&self) -> Option<f64> {
        None
    }
}
