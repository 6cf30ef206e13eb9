//! Per-step performance metrics for the coupled simulation.
//!
//! [`StepMetrics`] captures phase timings and slip statistics for a
//! single outer step.

/// Timing and slip statistics collected during a single outer step.
///
/// All durations are in microseconds. The simulation populates these
/// fields after each `step()` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step, in microseconds.
    pub total_us: u64,
    /// Time spent in flow reassembly and solve, in microseconds.
    pub flow_us: u64,
    /// Time spent in mechanics solves across all slip iterations, in microseconds.
    pub mechanics_us: u64,
    /// Time spent in friction updates across all slip iterations, in microseconds.
    pub friction_us: u64,
    /// Time spent in cell↔face transfer and aperture update, in microseconds.
    pub transfer_us: u64,
    /// Time spent writing the snapshot, in microseconds.
    pub export_us: u64,
    /// Inner slip iterations performed.
    pub slip_iterations: u32,
    /// Host faces flagged as slipping at convergence.
    pub slipping_faces: usize,
}
