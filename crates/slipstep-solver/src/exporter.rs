//! The [`Exporter`] trait.

use slipstep_core::{ExportError, FieldStore};

/// Persists simulation state.
///
/// # Examples
///
/// An exporter that only counts the snapshots it receives:
///
/// ```
/// use slipstep_core::{ExportError, FieldStore};
/// use slipstep_solver::Exporter;
///
/// struct Counter(u64);
///
/// impl Exporter for Counter {
///     fn name(&self) -> &str { "counter" }
///
///     fn write_step(&mut self, _step: u64, _time: f64, _store: &FieldStore) -> Result<(), ExportError> {
///         self.0 += 1;
///         Ok(())
///     }
///
///     fn write_time_series(&mut self, _times: &[f64]) -> Result<(), ExportError> {
///         Ok(())
///     }
/// }
///
/// let mut c = Counter(0);
/// c.write_step(0, 0.0, &FieldStore::new()).unwrap();
/// assert_eq!(c.0, 1);
/// ```
pub trait Exporter: Send {
    /// Human-readable name for error reporting.
    fn name(&self) -> &str;

    /// Write the snapshot for `step` at `time`.
    fn write_step(&mut self, step: u64, time: f64, store: &FieldStore) -> Result<(), ExportError>;

    /// Write the list of all snapshot times. Called once at the end of a run.
    fn write_time_series(&mut self, times: &[f64]) -> Result<(), ExportError>;
}
