//! Simulation configuration, validation, and error types.

use std::error::Error;
use std::fmt;

use slipstep_core::{names, CouplingError, FieldError, FieldLocation, FieldStore};
use slipstep_grid::{GridBucket, GridError};
use slipstep_solver::{Exporter, FlowSolver, FrictionSolver, MechanicsSolver};

/// Default cap on inner slip iterations per outer step.
pub const DEFAULT_MAX_SLIP_ITERATIONS: u32 = 100;

// ── UnmappedCellPolicy ─────────────────────────────────────────────

/// What face-to-cell transfer does with a fracture cell no host face touches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnmappedCellPolicy {
    /// Abort with [`CouplingError::UnmappedCell`].
    #[default]
    Fail,
    /// Write zero into the cell and log a warning.
    Zero,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating or applying a [`SimulationConfig`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// `dt` is not finite and positive.
    InvalidTimeStep {
        /// The rejected value.
        value: f64,
    },
    /// `end_time` is not finite and non-negative.
    InvalidHorizon {
        /// The rejected value.
        value: f64,
    },
    /// `max_slip_iterations` is zero.
    ZeroSlipIterations,
    /// The grid bucket has no unique host, or is otherwise malformed.
    Grid(GridError),
    /// A fracture grid lacks a usable baseline `aperture` field.
    Baseline(FieldError),
    /// Mechanics and friction disagree on the shear stiffness.
    StiffnessMismatch {
        /// Traction relieved per unit slip by the mechanics solver.
        mechanics: f64,
        /// Slip produced per unit excess shear by the friction model.
        friction: f64,
    },
    /// A collaborator failed while the simulation was being set up.
    Setup(CouplingError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimeStep { value } => {
                write!(f, "dt must be finite and positive, got {value}")
            }
            Self::InvalidHorizon { value } => {
                write!(f, "end_time must be finite and non-negative, got {value}")
            }
            Self::ZeroSlipIterations => write!(f, "max_slip_iterations must be at least 1"),
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::Baseline(e) => write!(f, "baseline aperture: {e}"),
            Self::StiffnessMismatch {
                mechanics,
                friction,
            } => write!(
                f,
                "mechanics shear stiffness {mechanics} differs from friction shear stiffness {friction}"
            ),
            Self::Setup(e) => write!(f, "setup: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Baseline(e) => Some(e),
            Self::Setup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for ConfigError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<CouplingError> for ConfigError {
    fn from(e: CouplingError) -> Self {
        Self::Setup(e)
    }
}

// ── CouplingConfig ─────────────────────────────────────────────────

/// Time-stepping and inner-loop controls.
#[derive(Clone, Debug, PartialEq)]
pub struct CouplingConfig {
    /// Outer time step in seconds.
    pub dt: f64,
    /// Simulation horizon in seconds. Stepping stops once `t >= end_time`.
    pub end_time: f64,
    /// Cap on inner slip iterations per outer step. Default: 100.
    pub max_slip_iterations: u32,
    /// Handling of fracture cells without incident host faces. Default: fail.
    pub unmapped_cells: UnmappedCellPolicy,
}

impl CouplingConfig {
    /// Config with the given step and horizon, other settings at defaults.
    pub fn new(dt: f64, end_time: f64) -> Self {
        Self {
            dt,
            end_time,
            max_slip_iterations: DEFAULT_MAX_SLIP_ITERATIONS,
            unmapped_cells: UnmappedCellPolicy::Fail,
        }
    }

    /// Set the inner iteration cap.
    pub fn with_max_slip_iterations(mut self, max: u32) -> Self {
        self.max_slip_iterations = max;
        self
    }

    /// Set the unmapped cell policy.
    pub fn with_unmapped_cells(mut self, policy: UnmappedCellPolicy) -> Self {
        self.unmapped_cells = policy;
        self
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidTimeStep { value: self.dt });
        }
        if !self.end_time.is_finite() || self.end_time < 0.0 {
            return Err(ConfigError::InvalidHorizon {
                value: self.end_time,
            });
        }
        if self.max_slip_iterations == 0 {
            return Err(ConfigError::ZeroSlipIterations);
        }
        Ok(())
    }

    /// Whether the clock at `time` has reached the horizon.
    pub fn is_finished(&self, time: f64) -> bool {
        time >= self.end_time - 1e-9 * self.dt
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Everything needed to build a [`CoupledSimulation`](crate::CoupledSimulation).
///
/// `store` must hold the baseline `aperture` cell field of every fracture
/// grid; the simulation takes ownership of it and keeps it current.
pub struct SimulationConfig {
    /// Grid hierarchy with exactly one host grid.
    pub bucket: GridBucket,
    /// Initial field data.
    pub store: FieldStore,
    /// Flow solver.
    pub flow: Box<dyn FlowSolver>,
    /// Mechanics solver.
    pub mechanics: Box<dyn MechanicsSolver>,
    /// Friction model.
    pub friction: Box<dyn FrictionSolver>,
    /// Snapshot sink.
    pub exporter: Box<dyn Exporter>,
    /// Time-stepping controls.
    pub coupling: CouplingConfig,
}

impl SimulationConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Stepping controls.
        self.coupling.validate()?;
        // 2. Unique host grid.
        let (_, host) = self.bucket.host()?;
        // 3. Baseline aperture on every fracture grid.
        for (_, edge) in self.bucket.fracture_edges()? {
            let num_cells = edge.face_cells().num_cells();
            self.store
                .require_sized(edge.low(), names::APERTURE, FieldLocation::Cells, num_cells)
                .map_err(ConfigError::Baseline)?;
        }
        // 4. Friction state sized to the host faces.
        let faces = host.num_faces();
        let flags = self.friction.is_slipping().len();
        if flags != faces {
            return Err(ConfigError::Setup(CouplingError::solver(
                self.friction.name(),
                slipstep_core::SolverError::SizeMismatch {
                    what: "slip flags".to_string(),
                    expected: faces,
                    actual: flags,
                },
            )));
        }
        // 5. One shear stiffness for traction relief and slip increments.
        if let (Some(mechanics), Some(friction)) =
            (self.mechanics.shear_stiffness(), self.friction.shear_stiffness())
        {
            if (mechanics - friction).abs() > 1e-12 * mechanics.abs().max(friction.abs()) {
                return Err(ConfigError::StiffnessMismatch {
                    mechanics,
                    friction,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationConfig")
            .field("grids", &self.bucket.num_grids())
            .field("fields", &self.store.len())
            .field("flow", &self.flow.name())
            .field("mechanics", &self.mechanics.name())
            .field("friction", &self.friction.name())
            .field("exporter", &self.exporter.name())
            .field("coupling", &self.coupling)
            .finish()
    }
}
