//! Built-in exporters.
//!
//! - [`RecordingExporter`]: keeps snapshots in memory behind a shared
//!   [`ExportLog`] handle, for tests and post-processing.
//! - [`LogExporter`]: summarises selected fields through the `log` facade.

use std::sync::{Arc, Mutex, MutexGuard};

use log::info;

use slipstep_core::{ExportError, FieldOwner, FieldStore};
use slipstep_solver::Exporter;

// ── RecordingExporter ──────────────────────────────────────────────

/// One recorded snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedStep {
    /// Outer step index; 0 is the initial state.
    pub step: u64,
    /// Simulation time of the snapshot.
    pub time: f64,
    /// Captured fields as `(owner, name, values)`, in store order.
    pub fields: Vec<(FieldOwner, String, Vec<f64>)>,
}

impl ExportedStep {
    /// Values of a captured field.
    pub fn field(&self, owner: impl Into<FieldOwner>, name: &str) -> Option<&[f64]> {
        let owner = owner.into();
        self.fields
            .iter()
            .find(|(o, n, _)| *o == owner && n == name)
            .map(|(_, _, v)| v.as_slice())
    }
}

#[derive(Debug, Default)]
struct Recording {
    steps: Vec<ExportedStep>,
    time_series: Option<Vec<f64>>,
}

/// Shared handle to what a [`RecordingExporter`] has written.
///
/// The exporter is boxed and moved into the simulation; keep the log to
/// inspect the output afterwards.
#[derive(Clone, Debug, Default)]
pub struct ExportLog(Arc<Mutex<Recording>>);

impl ExportLog {
    fn lock(&self) -> Result<MutexGuard<'_, Recording>, ExportError> {
        self.0
            .lock()
            .map_err(|_| ExportError::new("export log mutex poisoned"))
    }

    /// Snapshots written so far.
    pub fn steps(&self) -> Vec<ExportedStep> {
        self.lock().map(|r| r.steps.clone()).unwrap_or_default()
    }

    /// Number of snapshots written so far.
    pub fn len(&self) -> usize {
        self.lock().map(|r| r.steps.len()).unwrap_or(0)
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The time series, once the run has finished.
    pub fn time_series(&self) -> Option<Vec<f64>> {
        self.lock().ok().and_then(|r| r.time_series.clone())
    }
}

/// Exporter keeping snapshots in memory.
#[derive(Debug)]
pub struct RecordingExporter {
    names: Vec<String>,
    log: ExportLog,
}

impl RecordingExporter {
    /// Record only the fields called one of `names`, on any owner.
    pub fn new(names: &[&str]) -> (Self, ExportLog) {
        let log = ExportLog::default();
        let exporter = Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            log: log.clone(),
        };
        (exporter, log)
    }

    /// Record every field.
    pub fn all() -> (Self, ExportLog) {
        Self::new(&[])
    }

    fn wants(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.iter().any(|n| n == name)
    }
}

impl Exporter for RecordingExporter {
    fn name(&self) -> &str {
        "recording"
    }

    fn write_step(&mut self, step: u64, time: f64, store: &FieldStore) -> Result<(), ExportError> {
        let fields = store
            .iter()
            .filter(|(_, name, _)| self.wants(name))
            .map(|(owner, name, entry)| (owner, name.to_string(), entry.values().to_vec()))
            .collect();
        self.log.lock()?.steps.push(ExportedStep { step, time, fields });
        Ok(())
    }

    fn write_time_series(&mut self, times: &[f64]) -> Result<(), ExportError> {
        self.log.lock()?.time_series = Some(times.to_vec());
        Ok(())
    }
}

// ── LogExporter ────────────────────────────────────────────────────

/// Exporter logging min/max/mean of selected fields at `info` level.
#[derive(Clone, Debug)]
pub struct LogExporter {
    names: Vec<String>,
}

impl LogExporter {
    /// Summarise the fields called one of `names`.
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl Exporter for LogExporter {
    fn name(&self) -> &str {
        "log"
    }

    fn write_step(&mut self, step: u64, time: f64, store: &FieldStore) -> Result<(), ExportError> {
        for (owner, name, entry) in store.iter() {
            if !self.names.iter().any(|n| n == name) {
                continue;
            }
            let values = entry.values();
            if values.is_empty() {
                continue;
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            info!("step {step} t={time:.6e} {owner} {name}: min={min:.6e} max={max:.6e} mean={mean:.6e}");
        }
        Ok(())
    }

    fn write_time_series(&mut self, times: &[f64]) -> Result<(), ExportError> {
        info!("run finished: {} snapshots, final t={:.6e}", times.len(), times.last().copied().unwrap_or(0.0));
        Ok(())
    }
}
