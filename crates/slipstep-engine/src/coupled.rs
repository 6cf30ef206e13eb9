//! The coupled flow / mechanics / friction time-stepping controller.
//!
//! [`CoupledSimulation`] owns the grid hierarchy, the field store, and the
//! solver collaborators. Each outer step advances flow by `dt`, projects
//! fracture pressure onto the host faces, iterates mechanics and friction
//! until no face newly slips, maps the slip-induced aperture change back
//! onto the fracture cells, and exports a snapshot.

use std::error::Error;
use std::fmt;
use std::time::Instant;

use log::{debug, info};

use slipstep_core::names::{self, face_field_name};
use slipstep_core::{CouplingError, FieldLocation, FieldStore, GridId, SolverError};
use slipstep_grid::GridBucket;
use slipstep_solver::{Exporter, FlowSolver, FrictionSolver, MechanicsSolver};

use crate::aperture::{update_apertures, ApertureBaseline};
use crate::config::{ConfigError, CouplingConfig, SimulationConfig};
use crate::metrics::StepMetrics;
use crate::transfer::{cells_to_faces, faces_to_cells};

// ── StepResult / StepError ─────────────────────────────────────────

/// Outcome of a successful outer step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// Index of the completed step, starting at 1.
    pub step: u64,
    /// Simulation time after the step.
    pub time: f64,
    /// Timings and slip statistics.
    pub metrics: StepMetrics,
}

/// A failed outer step.
///
/// `step` and `time` identify the step being attempted and the time it
/// was advancing to.
#[derive(Clone, Debug, PartialEq)]
pub struct StepError {
    /// Index of the failed step.
    pub step: u64,
    /// Target time of the failed step.
    pub time: f64,
    /// What went wrong.
    pub kind: CouplingError,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} (t = {}): {}", self.step, self.time, self.kind)
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
    }
}

/// Summary of a completed [`CoupledSimulation::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Outer steps completed in total.
    pub steps: u64,
    /// Final simulation time.
    pub final_time: f64,
    /// The exported time series, starting with `0`.
    pub times: Vec<f64>,
    /// Inner slip iterations summed over the steps of this run.
    pub slip_iterations: u64,
}

// ── CoupledSimulation ──────────────────────────────────────────────

/// Sequential coupled simulation over a host grid with embedded fractures.
///
/// The clock is `t = step_index * dt`. Every failure aborts the step with
/// a [`StepError`]; the simulation is not rolled back.
pub struct CoupledSimulation {
    bucket: GridBucket,
    store: FieldStore,
    flow: Box<dyn FlowSolver>,
    mechanics: Box<dyn MechanicsSolver>,
    friction: Box<dyn FrictionSolver>,
    exporter: Box<dyn Exporter>,
    coupling: CouplingConfig,
    host: GridId,
    baseline: ApertureBaseline,
    step_index: u64,
    time: f64,
    times: Vec<f64>,
    last_metrics: StepMetrics,
}

impl CoupledSimulation {
    /// Validate `config` and bring the simulation to its initial state.
    ///
    /// Captures the aperture baseline, zeroes `aperture_change`, pushes
    /// the baseline into the flow solver, discretizes mechanics once,
    /// stores the initial pressure, and exports step 0 at `t = 0`.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let SimulationConfig {
            bucket,
            mut store,
            mut flow,
            mut mechanics,
            friction,
            mut exporter,
            coupling,
        } = config;
        let (host, _) = bucket.host()?;

        let baseline = ApertureBaseline::capture(&bucket, &store)?;
        baseline.reset(&mut store);
        for (grid, base) in baseline.iter() {
            flow.set_aperture(grid, base)
                .map_err(|e| CouplingError::solver(flow.name(), e))?;
        }
        mechanics
            .discretize(&bucket)
            .map_err(|e| CouplingError::solver(mechanics.name(), e))?;
        persist_flow_fields(&bucket, &mut store, flow.as_ref())?;
        exporter
            .write_step(0, 0.0, &store)
            .map_err(CouplingError::from)?;

        info!(
            "coupled simulation ready: {} grids, {} fracture grids, dt={:e}, end_time={:e}",
            bucket.num_grids(),
            baseline.len(),
            coupling.dt,
            coupling.end_time
        );
        Ok(Self {
            bucket,
            store,
            flow,
            mechanics,
            friction,
            exporter,
            coupling,
            host,
            baseline,
            step_index: 0,
            time: 0.0,
            times: vec![0.0],
            last_metrics: StepMetrics::default(),
        })
    }

    /// Advance one outer step of length `dt`.
    pub fn step(&mut self) -> Result<StepResult, StepError> {
        let step = self.step_index + 1;
        let time = step as f64 * self.coupling.dt;
        match self.advance(step, time) {
            Ok(metrics) => {
                self.last_metrics = metrics.clone();
                Ok(StepResult {
                    step,
                    time,
                    metrics,
                })
            }
            Err(kind) => Err(StepError { step, time, kind }),
        }
    }

    /// Step until the clock reaches `end_time`, then export the time series.
    pub fn run(&mut self) -> Result<RunSummary, StepError> {
        let mut slip_iterations = 0u64;
        while !self.is_finished() {
            let result = self.step()?;
            slip_iterations += u64::from(result.metrics.slip_iterations);
        }
        self.exporter
            .write_time_series(&self.times)
            .map_err(|e| StepError {
                step: self.step_index,
                time: self.time,
                kind: e.into(),
            })?;
        info!(
            "run finished: {} steps, t={:e}, {slip_iterations} slip iterations",
            self.step_index, self.time
        );
        Ok(RunSummary {
            steps: self.step_index,
            final_time: self.time,
            times: self.times.clone(),
            slip_iterations,
        })
    }

    fn advance(&mut self, step: u64, time: f64) -> Result<StepMetrics, CouplingError> {
        let start = Instant::now();
        let mut metrics = StepMetrics::default();

        // 1. Flow.
        let phase = Instant::now();
        self.flow.advance_time(time);
        self.flow
            .reassemble(&self.bucket)
            .map_err(|e| CouplingError::solver(self.flow.name(), e))?;
        self.flow
            .step(&self.bucket)
            .map_err(|e| CouplingError::solver(self.flow.name(), e))?;
        persist_flow_fields(&self.bucket, &mut self.store, self.flow.as_ref())?;
        metrics.flow_us = phase.elapsed().as_micros() as u64;
        debug!("step {step}: flow solved in {} us", metrics.flow_us);

        // 2. Fracture pressure onto host faces.
        let phase = Instant::now();
        cells_to_faces(&self.bucket, &mut self.store, names::PRESSURE)?;
        metrics.transfer_us = phase.elapsed().as_micros() as u64;

        // 3. Mechanics / friction until no face newly slips.
        self.friction.reset_slip_state();
        let (_, host) = self.bucket.host()?;
        let max = self.coupling.max_slip_iterations;
        let mut converged = None;
        let mut newly_slipping = 0;
        for iteration in 1..=max {
            let phase = Instant::now();
            self.mechanics
                .solve(&self.bucket, &self.store, true)
                .map_err(|e| CouplingError::solver(self.mechanics.name(), e))?;
            let traction = self.mechanics.read_traction();
            self.store
                .insert_faces(self.host, names::TRACTION, 3, traction.to_vec());
            metrics.mechanics_us += phase.elapsed().as_micros() as u64;

            let phase = Instant::now();
            let before = self.friction.is_slipping().to_vec();
            let any_new = self
                .friction
                .step(host, traction)
                .map_err(|e| CouplingError::solver(self.friction.name(), e))?;
            newly_slipping = self
                .friction
                .is_slipping()
                .iter()
                .zip(&before)
                .filter(|(now, was)| **now && !**was)
                .count();
            metrics.friction_us += phase.elapsed().as_micros() as u64;

            self.mechanics
                .set_slip_distance(self.friction.slip_distance())
                .map_err(|e| CouplingError::solver(self.mechanics.name(), e))?;
            debug!("step {step}, slip iteration {iteration}: {newly_slipping} faces newly slipping");
            if !any_new {
                converged = Some(iteration);
                break;
            }
        }
        let iterations = converged.ok_or(CouplingError::SlipNotConverged {
            iterations: max,
            newly_slipping,
        })?;
        metrics.slip_iterations = iterations;

        // 4. Slip state onto the host, aperture change onto the fractures.
        let phase = Instant::now();
        let face_change = face_field_name(names::APERTURE_CHANGE);
        self.store.insert_faces(
            self.host,
            face_change.clone(),
            1,
            self.friction.read_aperture_change().to_vec(),
        );
        self.store.insert_faces(
            self.host,
            names::SLIP_DISTANCE,
            3,
            self.friction.slip_distance().to_vec(),
        );
        let flags: Vec<f64> = self
            .friction
            .is_slipping()
            .iter()
            .map(|&s| if s { 1.0 } else { 0.0 })
            .collect();
        metrics.slipping_faces = self.friction.is_slipping().iter().filter(|s| **s).count();
        self.store.insert_faces(self.host, names::IS_SLIPPING, 1, flags);
        faces_to_cells(
            &self.bucket,
            &mut self.store,
            &face_change,
            names::APERTURE_CHANGE,
            self.coupling.unmapped_cells,
        )?;
        update_apertures(&self.baseline, &mut self.store, self.flow.as_mut())?;
        metrics.transfer_us += phase.elapsed().as_micros() as u64;

        // 5. Clock and snapshot.
        self.step_index = step;
        self.time = time;
        self.times.push(time);
        let phase = Instant::now();
        self.exporter.write_step(step, time, &self.store)?;
        metrics.export_us = phase.elapsed().as_micros() as u64;
        metrics.total_us = start.elapsed().as_micros() as u64;

        info!(
            "step {step} t={time:e}: {} slip iterations, {} faces slipping",
            metrics.slip_iterations, metrics.slipping_faces
        );
        Ok(metrics)
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// Whether the clock has reached `end_time`.
    pub fn is_finished(&self) -> bool {
        self.coupling.is_finished(self.time)
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed outer steps.
    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    /// Initial time followed by the time of every completed step.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The field store.
    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    /// The grid hierarchy.
    pub fn bucket(&self) -> &GridBucket {
        &self.bucket
    }

    /// ID of the host grid.
    pub fn host(&self) -> GridId {
        self.host
    }

    /// Apertures captured at construction.
    pub fn baseline(&self) -> &ApertureBaseline {
        &self.baseline
    }

    /// Time-stepping controls.
    pub fn coupling(&self) -> &CouplingConfig {
        &self.coupling
    }

    /// Metrics of the most recent successful step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The friction model, e.g. to inspect slip flags.
    pub fn friction(&self) -> &dyn FrictionSolver {
        self.friction.as_ref()
    }

    /// The flow solver.
    pub fn flow(&self) -> &dyn FlowSolver {
        self.flow.as_ref()
    }
}

impl fmt::Debug for CoupledSimulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoupledSimulation")
            .field("flow", &self.flow.name())
            .field("mechanics", &self.mechanics.name())
            .field("friction", &self.friction.name())
            .field("exporter", &self.exporter.name())
            .field("step_index", &self.step_index)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

/// Copy `pressure` of every grid and `interface_flux` of every edge that
/// provides one from the flow solver into the store.
fn persist_flow_fields(
    bucket: &GridBucket,
    store: &mut FieldStore,
    flow: &dyn FlowSolver,
) -> Result<(), CouplingError> {
    for (id, grid) in bucket.grids() {
        let pressure = flow.read_field(id, names::PRESSURE).ok_or_else(|| {
            CouplingError::solver(
                flow.name(),
                SolverError::MissingField {
                    name: format!("{} of {id}", names::PRESSURE),
                },
            )
        })?;
        if pressure.len() != grid.num_cells() {
            return Err(CouplingError::solver(
                flow.name(),
                SolverError::SizeMismatch {
                    what: format!("{} of {id}", names::PRESSURE),
                    expected: grid.num_cells(),
                    actual: pressure.len(),
                },
            ));
        }
        store.insert_cells(id, names::PRESSURE, pressure.to_vec());
    }
    for (id, _) in bucket.edges() {
        if let Some(flux) = flow.read_edge_field(id, names::INTERFACE_FLUX) {
            store.insert(id, names::INTERFACE_FLUX, FieldLocation::Pairs, 1, flux.to_vec());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnmappedCellPolicy;
    use crate::export::RecordingExporter;
    use slipstep_core::units::{degrees, MEGA};
    use slipstep_physics::{CoulombFriction, FaceTractionMechanics, FrictionParams, MechanicsParams};
    use slipstep_test_utils::fixtures::{baseline_store, one_to_one_bucket, FRACTURE, HOST};
    use slipstep_test_utils::{FailingExporter, FailingFlow, PrescribedFlow};

    fn mechanics() -> FaceTractionMechanics {
        let stress = [[0.0, 0.0, 4.0 * MEGA], [0.0, 0.0, 0.0], [4.0 * MEGA, 0.0, 10.0 * MEGA]];
        FaceTractionMechanics::new(MechanicsParams {
            background_stress: stress,
            biot_coefficient: 1.0,
            shear_stiffness: 1e10,
        })
        .unwrap()
    }

    fn config(bucket: GridBucket, flow: Box<dyn FlowSolver>, exporter: Box<dyn Exporter>) -> SimulationConfig {
        let friction = CoulombFriction::new(
            FrictionParams::new(0.6, 1e10).with_dilation_angle(degrees(5.0)),
            &bucket,
        )
        .unwrap();
        SimulationConfig {
            store: baseline_store(&bucket, 1e-4),
            flow,
            mechanics: Box::new(mechanics()),
            friction: Box::new(friction),
            exporter,
            coupling: CouplingConfig::new(1.0, 2.0),
            bucket,
        }
    }

    #[test]
    fn construction_exports_initial_state() {
        let bucket = one_to_one_bucket(2);
        let flow = PrescribedFlow::new(&bucket);
        let counts = flow.counts();
        let (exporter, log) = RecordingExporter::all();
        let sim = CoupledSimulation::new(config(bucket, Box::new(flow), Box::new(exporter))).unwrap();

        assert_eq!(sim.times(), &[0.0]);
        assert_eq!(sim.step_index(), 0);
        assert_eq!(counts.aperture_updates(), 1);
        assert_eq!(counts.steps(), 0);
        assert_eq!(sim.store().get(FRACTURE, names::APERTURE_CHANGE), Some(&[0.0, 0.0][..]));
        assert!(sim.store().contains(HOST, names::PRESSURE));
        let steps = log.steps();
        assert_eq!(steps.len(), 1);
        assert_eq!((steps[0].step, steps[0].time), (0, 0.0));
    }

    #[test]
    fn step_advances_clock_and_persists_state() {
        let bucket = one_to_one_bucket(2);
        let flow = PrescribedFlow::new(&bucket);
        let counts = flow.counts();
        let (exporter, _log) = RecordingExporter::all();
        let mut sim = CoupledSimulation::new(config(bucket, Box::new(flow), Box::new(exporter))).unwrap();

        let r = sim.step().unwrap();
        assert_eq!((r.step, r.time), (1, 1.0));
        assert_eq!(counts.last_time(), 1.0);
        assert_eq!(counts.reassembles(), 1);
        assert_eq!(r.metrics.slip_iterations, 1);
        assert_eq!(sim.last_metrics(), &r.metrics);
        for name in [
            "face_pressure",
            names::TRACTION,
            "face_aperture_change",
            names::SLIP_DISTANCE,
            names::IS_SLIPPING,
        ] {
            assert!(sim.store().contains(HOST, name), "{name} missing");
        }
    }

    #[test]
    fn flow_failure_is_annotated() {
        let bucket = one_to_one_bucket(1);
        let flow = FailingFlow::new(&bucket, 1);
        let mut sim = CoupledSimulation::new(config(
            bucket,
            Box::new(flow),
            Box::new(RecordingExporter::all().0),
        ))
        .unwrap();
        sim.step().unwrap();
        let err = sim.step().unwrap_err();
        assert_eq!((err.step, err.time), (2, 2.0));
        assert!(matches!(
            &err.kind,
            CouplingError::SolverFailure { solver, reason: SolverError::DidNotConverge { .. } }
                if solver == "failing_flow"
        ));
        assert!(err.to_string().starts_with("step 2"));
        assert_eq!(sim.step_index(), 1);
    }

    #[test]
    fn export_failure_at_construction() {
        let bucket = one_to_one_bucket(1);
        let flow = PrescribedFlow::new(&bucket);
        let err = CoupledSimulation::new(config(bucket, Box::new(flow), Box::new(FailingExporter::new(0))))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Setup(CouplingError::ExportFailed(_))));
    }

    #[test]
    fn export_failure_during_step() {
        let bucket = one_to_one_bucket(1);
        let flow = PrescribedFlow::new(&bucket);
        let mut sim = CoupledSimulation::new(config(bucket, Box::new(flow), Box::new(FailingExporter::new(1))))
            .unwrap();
        let err = sim.step().unwrap_err();
        assert_eq!(err.step, 1);
        assert_eq!(
            err.kind,
            CouplingError::ExportFailed(slipstep_core::ExportError::new("disk full at step 1"))
        );
    }

    #[test]
    fn zero_horizon_runs_no_steps() {
        let bucket = one_to_one_bucket(1);
        let flow = PrescribedFlow::new(&bucket);
        let (exporter, log) = RecordingExporter::all();
        let mut cfg = config(bucket, Box::new(flow), Box::new(exporter));
        cfg.coupling = CouplingConfig::new(1.0, 0.0).with_unmapped_cells(UnmappedCellPolicy::Zero);
        let mut sim = CoupledSimulation::new(cfg).unwrap();
        let summary = sim.run().unwrap();
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.times, vec![0.0]);
        assert_eq!(log.time_series(), Some(vec![0.0]));
    }
}
