//! Physical parameters for flow on each grid.
//!
//! Every grid of a bucket gets one [`DomainParams`]. The [`DomainKind`]
//! tag selects how the grid participates: rock matrix, a passive
//! fracture, or a fracture carrying an injection source.

use slipstep_core::SolverError;
use slipstep_grid::geometry::{dot, mat_vec, Tensor3, Vec3};

/// Role of a grid in the flow problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainKind {
    /// Rock matrix; no aperture.
    Matrix,
    /// A fracture without sources.
    Fracture,
    /// A fracture with an injection source.
    Injection,
}

impl DomainKind {
    /// Whether the grid has an aperture.
    pub fn is_fracture(self) -> bool {
        match self {
            Self::Matrix => false,
            Self::Fracture | Self::Injection => true,
        }
    }
}

/// Intrinsic permeability model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Permeability {
    /// Scalar permeability, m².
    Isotropic(f64),
    /// Full tensor, m².
    Tensor(Tensor3),
    /// Parallel-plate law `a² / 12` from the local aperture.
    CubicLaw,
}

impl Permeability {
    /// Permeability along unit direction `n` for a cell with aperture `aperture`.
    pub fn directional(&self, n: Vec3, aperture: f64) -> f64 {
        match self {
            Self::Isotropic(k) => *k,
            Self::Tensor(t) => dot(n, mat_vec(t, n)),
            Self::CubicLaw => aperture * aperture / 12.0,
        }
    }
}

/// Outer boundary condition, applied to faces tagged
/// [`FaceTag::Boundary`](slipstep_grid::FaceTag::Boundary).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryCondition {
    /// Zero flux.
    NoFlow,
    /// Fixed pressure, Pa.
    Dirichlet(f64),
}

/// Time dependence of an injection rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RateSchedule {
    /// Constant mass rate, kg/s.
    Constant(f64),
    /// Linear ramp from zero to `rate` over `ramp_time`, then constant.
    Ramp {
        /// Final mass rate, kg/s.
        rate: f64,
        /// Duration of the ramp, s.
        ramp_time: f64,
    },
}

/// A mass source split evenly over a set of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceTerm {
    /// Total mass rate schedule.
    pub schedule: RateSchedule,
    /// Cells receiving the source.
    pub cells: Vec<usize>,
}

impl SourceTerm {
    /// Constant total mass rate into `cells`.
    pub fn constant(rate: f64, cells: Vec<usize>) -> Self {
        Self {
            schedule: RateSchedule::Constant(rate),
            cells,
        }
    }

    /// Total mass rate at `time`.
    pub fn rate_at(&self, time: f64) -> f64 {
        match self.schedule {
            RateSchedule::Constant(rate) => rate,
            RateSchedule::Ramp { rate, ramp_time } => {
                if ramp_time <= 0.0 || time >= ramp_time {
                    rate
                } else {
                    rate * (time / ramp_time).max(0.0)
                }
            }
        }
    }
}

/// Flow parameters of one grid.
///
/// Construct with [`matrix`](DomainParams::matrix),
/// [`fracture`](DomainParams::fracture) or
/// [`injection`](DomainParams::injection) and adjust with the `with_*`
/// methods.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainParams {
    /// Role of the grid.
    pub kind: DomainKind,
    /// Pressure at `t = 0`, Pa.
    pub initial_pressure: f64,
    /// Fluid compressibility, 1/Pa.
    pub compressibility: f64,
    /// Intrinsic permeability.
    pub permeability: Permeability,
    /// Porosity, in `(0, 1]`.
    pub porosity: f64,
    /// Dynamic viscosity, Pa·s.
    pub viscosity: f64,
    /// Fluid density, kg/m³.
    pub density: f64,
    /// Permeability across the fracture, used for matrix exchange, m².
    pub normal_permeability: f64,
    /// Initial aperture for fracture kinds, m.
    pub aperture: f64,
    /// Outer boundary condition.
    pub boundary: BoundaryCondition,
    /// Optional mass source.
    pub source: Option<SourceTerm>,
}

impl DomainParams {
    /// Water-saturated rock matrix, roughly 1 mD.
    pub fn matrix() -> Self {
        Self {
            kind: DomainKind::Matrix,
            initial_pressure: 0.0,
            compressibility: 4.4e-10,
            permeability: Permeability::Isotropic(1e-15),
            porosity: 0.1,
            viscosity: 1e-3,
            density: 1000.0,
            normal_permeability: 0.0,
            aperture: 1.0,
            boundary: BoundaryCondition::NoFlow,
            source: None,
        }
    }

    /// An open fracture with the given initial aperture.
    pub fn fracture(aperture: f64) -> Self {
        Self {
            kind: DomainKind::Fracture,
            permeability: Permeability::CubicLaw,
            porosity: 1.0,
            normal_permeability: 1e-14,
            aperture,
            ..Self::matrix()
        }
    }

    /// A fracture with an injection source.
    pub fn injection(aperture: f64, source: SourceTerm) -> Self {
        Self {
            kind: DomainKind::Injection,
            source: Some(source),
            ..Self::fracture(aperture)
        }
    }

    /// Set the initial pressure.
    pub fn with_initial_pressure(mut self, pressure: f64) -> Self {
        self.initial_pressure = pressure;
        self
    }

    /// Set the permeability model.
    pub fn with_permeability(mut self, permeability: Permeability) -> Self {
        self.permeability = permeability;
        self
    }

    /// Set the boundary condition.
    pub fn with_boundary(mut self, boundary: BoundaryCondition) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the fluid compressibility.
    pub fn with_compressibility(mut self, compressibility: f64) -> Self {
        self.compressibility = compressibility;
        self
    }

    /// Set the porosity.
    pub fn with_porosity(mut self, porosity: f64) -> Self {
        self.porosity = porosity;
        self
    }

    /// Set the normal permeability.
    pub fn with_normal_permeability(mut self, k: f64) -> Self {
        self.normal_permeability = k;
        self
    }

    /// Storage coefficient `porosity · compressibility`, 1/Pa.
    pub fn storage(&self) -> f64 {
        self.porosity * self.compressibility
    }

    /// Check ranges for a grid with `num_cells` cells.
    pub fn validate(&self, num_cells: usize) -> Result<(), SolverError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(SolverError::InvalidParameter {
                    reason: format!("{name} must be positive and finite, got {v}"),
                })
            }
        };
        positive("compressibility", self.compressibility)?;
        positive("viscosity", self.viscosity)?;
        positive("density", self.density)?;
        if !(self.porosity > 0.0 && self.porosity <= 1.0) {
            return Err(SolverError::InvalidParameter {
                reason: format!("porosity must be in (0, 1], got {}", self.porosity),
            });
        }
        if !self.initial_pressure.is_finite() {
            return Err(SolverError::InvalidParameter {
                reason: "initial pressure is not finite".to_string(),
            });
        }
        match (self.kind, self.permeability) {
            (DomainKind::Matrix, Permeability::CubicLaw) => {
                return Err(SolverError::InvalidParameter {
                    reason: "cubic-law permeability requires a fracture".to_string(),
                })
            }
            (_, Permeability::Isotropic(k)) => positive("permeability", k)?,
            (_, Permeability::Tensor(t)) => {
                for axis in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
                    positive("permeability tensor diagonal", dot(axis, mat_vec(&t, axis)))?;
                }
            }
            (_, Permeability::CubicLaw) => {}
        }
        match self.kind {
            DomainKind::Matrix => {}
            DomainKind::Fracture | DomainKind::Injection => {
                positive("aperture", self.aperture)?;
                positive("normal permeability", self.normal_permeability)?;
            }
        }
        if self.kind == DomainKind::Injection && self.source.is_none() {
            return Err(SolverError::InvalidParameter {
                reason: "injection domain has no source".to_string(),
            });
        }
        if let BoundaryCondition::Dirichlet(p) = self.boundary {
            if !p.is_finite() {
                return Err(SolverError::InvalidParameter {
                    reason: "boundary pressure is not finite".to_string(),
                });
            }
        }
        if let Some(source) = &self.source {
            if let Some(&bad) = source.cells.iter().find(|&&c| c >= num_cells) {
                return Err(SolverError::InvalidParameter {
                    reason: format!("source cell {bad} outside grid of {num_cells} cells"),
                });
            }
            if source.cells.is_empty() {
                return Err(SolverError::InvalidParameter {
                    reason: "source has no cells".to_string(),
                });
            }
        }
        Ok(())
    }
}
