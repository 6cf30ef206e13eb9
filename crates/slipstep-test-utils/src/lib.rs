//! Test utilities and mock solvers for slipstep development.
//!
//! Provides mock implementations of the solver traits
//! ([`FlowSolver`], [`FrictionSolver`], [`Exporter`]) with shared call
//! counters, plus grid fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use slipstep_core::{names, EdgeId, ExportError, FieldStore, GridId, SolverError};
use slipstep_grid::{Grid, GridBucket};
use slipstep_solver::{Exporter, FlowSolver, FrictionSolver};

/// Call counters shared between a mock and the test holding it.
///
/// The mock is usually boxed and moved into the simulation; clone the
/// counters first to inspect them afterwards.
#[derive(Clone, Debug, Default)]
pub struct CallCounts {
    steps: Arc<AtomicUsize>,
    reassembles: Arc<AtomicUsize>,
    aperture_updates: Arc<AtomicUsize>,
    last_time: Arc<Mutex<f64>>,
}

impl CallCounts {
    /// Completed `step` calls.
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::Relaxed)
    }

    /// `reassemble` calls.
    pub fn reassembles(&self) -> usize {
        self.reassembles.load(Ordering::Relaxed)
    }

    /// Successful `set_aperture` calls.
    pub fn aperture_updates(&self) -> usize {
        self.aperture_updates.load(Ordering::Relaxed)
    }

    /// Last time passed to `advance_time`.
    pub fn last_time(&self) -> f64 {
        self.last_time.lock().map(|t| *t).unwrap_or(f64::NAN)
    }
}

/// Flow solver returning fixed pressures.
///
/// Pressures default to zero on every grid; override per grid with
/// [`with_pressure`](PrescribedFlow::with_pressure). Apertures pushed via
/// `set_aperture` are stored and readable as `"aperture"`.
pub struct PrescribedFlow {
    pressure: Vec<Vec<f64>>,
    aperture: Vec<Option<Vec<f64>>>,
    counts: CallCounts,
}

impl PrescribedFlow {
    pub fn new(bucket: &GridBucket) -> Self {
        Self {
            pressure: bucket.grids().map(|(_, g)| vec![0.0; g.num_cells()]).collect(),
            aperture: vec![None; bucket.num_grids()],
            counts: CallCounts::default(),
        }
    }

    /// Report `values` as the pressure of `grid` after every step.
    pub fn with_pressure(mut self, grid: GridId, values: Vec<f64>) -> Self {
        self.pressure[grid.index()] = values;
        self
    }

    /// Shared call counters.
    pub fn counts(&self) -> CallCounts {
        self.counts.clone()
    }
}

impl FlowSolver for PrescribedFlow {
    fn name(&self) -> &str {
        "prescribed_flow"
    }

    fn advance_time(&mut self, time: f64) {
        if let Ok(mut t) = self.counts.last_time.lock() {
            *t = time;
        }
    }

    fn reassemble(&mut self, _bucket: &GridBucket) -> Result<(), SolverError> {
        self.counts.reassembles.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn step(&mut self, _bucket: &GridBucket) -> Result<(), SolverError> {
        self.counts.steps.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn read_field(&self, grid: GridId, name: &str) -> Option<&[f64]> {
        match name {
            names::PRESSURE => self.pressure.get(grid.index()).map(Vec::as_slice),
            names::APERTURE => self.aperture.get(grid.index())?.as_deref(),
            _ => None,
        }
    }

    fn set_aperture(&mut self, grid: GridId, aperture: &[f64]) -> Result<(), SolverError> {
        let expected = self
            .pressure
            .get(grid.index())
            .map(Vec::len)
            .ok_or_else(|| SolverError::InvalidParameter {
                reason: format!("unknown {grid}"),
            })?;
        if aperture.len() != expected {
            return Err(SolverError::SizeMismatch {
                what: format!("aperture of {grid}"),
                expected,
                actual: aperture.len(),
            });
        }
        self.aperture[grid.index()] = Some(aperture.to_vec());
        self.counts.aperture_updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Flow solver that succeeds `succeed_count` steps, then fails.
pub struct FailingFlow {
    inner: PrescribedFlow,
    pub succeed_count: usize,
}

impl FailingFlow {
    pub fn new(bucket: &GridBucket, succeed_count: usize) -> Self {
        Self {
            inner: PrescribedFlow::new(bucket),
            succeed_count,
        }
    }

    pub fn counts(&self) -> CallCounts {
        self.inner.counts()
    }
}

impl FlowSolver for FailingFlow {
    fn name(&self) -> &str {
        "failing_flow"
    }

    fn advance_time(&mut self, time: f64) {
        self.inner.advance_time(time);
    }

    fn reassemble(&mut self, bucket: &GridBucket) -> Result<(), SolverError> {
        self.inner.reassemble(bucket)
    }

    fn step(&mut self, bucket: &GridBucket) -> Result<(), SolverError> {
        if self.inner.counts.steps() >= self.succeed_count {
            return Err(SolverError::DidNotConverge {
                iterations: 0,
                residual: f64::INFINITY,
            });
        }
        self.inner.step(bucket)
    }

    fn read_field(&self, grid: GridId, name: &str) -> Option<&[f64]> {
        self.inner.read_field(grid, name)
    }

    fn read_edge_field(&self, edge: EdgeId, name: &str) -> Option<&[f64]> {
        self.inner.read_edge_field(edge, name)
    }

    fn set_aperture(&mut self, grid: GridId, aperture: &[f64]) -> Result<(), SolverError> {
        self.inner.set_aperture(grid, aperture)
    }
}

/// Friction model that never settles.
///
/// Each step flips which half of the faces is slipping, so every call
/// reports newly slipping faces. Slip distance and aperture change stay
/// zero.
pub struct OscillatingFriction {
    slipping: Vec<bool>,
    slip: Vec<f64>,
    aperture_change: Vec<f64>,
    calls: usize,
}

impl OscillatingFriction {
    pub fn new(num_faces: usize) -> Self {
        Self {
            slipping: vec![false; num_faces],
            slip: vec![0.0; 3 * num_faces],
            aperture_change: vec![0.0; num_faces],
            calls: 0,
        }
    }
}

impl FrictionSolver for OscillatingFriction {
    fn name(&self) -> &str {
        "oscillating_friction"
    }

    fn reset_slip_state(&mut self) {
        self.slipping.fill(false);
    }

    fn step(&mut self, _host: &Grid, _traction: &[f64]) -> Result<bool, SolverError> {
        let parity = self.calls % 2;
        for (f, s) in self.slipping.iter_mut().enumerate() {
            *s = f % 2 == parity;
        }
        self.calls += 1;
        Ok(!self.slipping.is_empty())
    }

    fn is_slipping(&self) -> &[bool] {
        &self.slipping
    }

    fn slip_distance(&self) -> &[f64] {
        &self.slip
    }

    fn read_aperture_change(&self) -> &[f64] {
        &self.aperture_change
    }
}

/// Exporter that succeeds `succeed_count` snapshots, then fails.
pub struct FailingExporter {
    pub succeed_count: usize,
    writes: usize,
}

impl FailingExporter {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            writes: 0,
        }
    }
}

impl Exporter for FailingExporter {
    fn name(&self) -> &str {
        "failing_exporter"
    }

    fn write_step(&mut self, step: u64, _time: f64, _store: &FieldStore) -> Result<(), ExportError> {
        if self.writes >= self.succeed_count {
            return Err(ExportError::new(format!("disk full at step {step}")));
        }
        self.writes += 1;
        Ok(())
    }

    fn write_time_series(&mut self, _times: &[f64]) -> Result<(), ExportError> {
        Ok(())
    }
}
