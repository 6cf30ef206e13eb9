//! The [`MechanicsSolver`] trait.

use slipstep_core::{FieldStore, SolverError};
use slipstep_grid::GridBucket;

/// A solver producing tractions on the host grid's faces.
///
/// Tractions are laid out as three components per host face,
/// `[t0x, t0y, t0z, t1x, ...]`, with compression positive along the
/// face normal.
pub trait MechanicsSolver: Send {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Build the discretization. Called once before the first solve.
    fn discretize(&mut self, bucket: &GridBucket) -> Result<(), SolverError>;

    /// Solve for tractions given the fields in `store`.
    ///
    /// With `reuse_discretization` set, the solver must not rediscretize
    /// and fails with [`SolverError::NotDiscretized`] if it has never
    /// discretized.
    fn solve(
        &mut self,
        bucket: &GridBucket,
        store: &FieldStore,
        reuse_discretization: bool,
    ) -> Result<(), SolverError>;

    /// Tractions from the last solve, three per host face.
    fn read_traction(&self) -> &[f64];

    /// Accumulated slip, three per host face, to account for in the next solve.
    fn set_slip_distance(&mut self, slip: &[f64]) -> Result<(), SolverError>;

    /// Traction relieved per unit slip, Pa/m, if the model has one.
    ///
    /// Must equal the friction model's [`shear_stiffness`](crate::FrictionSolver::shear_stiffness)
    /// for the slip iteration to settle on the Coulomb limit.
    fn shear_stiffness(&self) -> Option<f64> {
        None
    }
}
