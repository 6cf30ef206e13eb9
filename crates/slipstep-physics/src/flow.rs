//! Implicit single-phase flow on a grid bucket.
//!
//! Each grid is discretized with a two-point flux approximation; grids
//! joined by an edge exchange fluid through the incidence pairs. The
//! resulting symmetric positive definite system is solved by
//! Jacobi-preconditioned conjugate gradients.

use log::{debug, trace};
use smallvec::SmallVec;

use slipstep_core::{names, EdgeId, FieldStore, GridId, SolverError};
use slipstep_grid::geometry::{norm, sub};
use slipstep_grid::{FaceTag, Grid, GridBucket};
use slipstep_solver::FlowSolver;

use crate::params::{BoundaryCondition, DomainParams};

/// Default relative residual tolerance of the linear solve.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Default iteration limit of the linear solve.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Off-diagonal couplings of one unknown: `(column, transmissibility)`.
type Row = SmallVec<[(usize, f64); 8]>;

/// Time-independent part of the linear system.
#[derive(Debug)]
struct Assembly {
    offsets: Vec<usize>,
    rows: Vec<Row>,
    /// Sum of couplings, including Dirichlet boundary faces.
    diag: Vec<f64>,
    boundary_rhs: Vec<f64>,
    /// `storage · volume · specific volume` per unknown.
    accumulation: Vec<f64>,
    /// Per edge, per incidence pair: `(high unknown, low unknown, T)`.
    interface: Vec<Vec<(usize, usize, f64)>>,
}

impl Assembly {
    fn couple(&mut self, i: usize, j: usize, t: f64) {
        if t == 0.0 {
            return;
        }
        self.rows[i].push((j, t));
        self.rows[j].push((i, t));
        self.diag[i] += t;
        self.diag[j] += t;
    }
}

/// Backward-Euler single-phase flow over every grid of a bucket.
///
/// # Discretization
///
/// For a cell `i` of a `d`-dimensional grid the specific volume is
/// `a^(3-d)` on fracture grids and `1` on matrix grids. Between two cells
/// sharing an interior face the transmissibility is the harmonic mean of
/// the half transmissibilities `k · area · sv / dist`, divided by the
/// viscosity. Across an edge, each incidence pair couples the host cell
/// behind the face to the fracture cell with
/// `area · k_n / (a / 2) / μ`. Dirichlet conditions apply to
/// [`FaceTag::Boundary`] faces only; fracture faces of the host are
/// closed and communicate through the interface terms instead.
#[derive(Debug)]
pub struct SinglePhaseFlow {
    params: Vec<DomainParams>,
    tolerance: f64,
    max_iterations: usize,
    time: f64,
    target_time: f64,
    pressure: Vec<Vec<f64>>,
    aperture: Vec<Vec<f64>>,
    interface_flux: Vec<Vec<f64>>,
    assembly: Option<Assembly>,
    last_iterations: usize,
}

impl SinglePhaseFlow {
    /// Create a solver with one parameter set per grid, in grid order.
    pub fn new(bucket: &GridBucket, params: Vec<DomainParams>) -> Result<Self, SolverError> {
        if params.len() != bucket.num_grids() {
            return Err(SolverError::SizeMismatch {
                what: "domain parameters".to_string(),
                expected: bucket.num_grids(),
                actual: params.len(),
            });
        }
        let mut pressure = Vec::with_capacity(params.len());
        let mut aperture = Vec::with_capacity(params.len());
        for ((_, grid), p) in bucket.grids().zip(&params) {
            p.validate(grid.num_cells())?;
            pressure.push(vec![p.initial_pressure; grid.num_cells()]);
            let a = if p.kind.is_fracture() { p.aperture } else { 1.0 };
            aperture.push(vec![a; grid.num_cells()]);
        }
        let interface_flux = bucket
            .edges()
            .map(|(_, e)| vec![0.0; e.face_cells().nnz()])
            .collect();
        Ok(Self {
            params,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time: 0.0,
            target_time: 0.0,
            pressure,
            aperture,
            interface_flux,
            assembly: None,
            last_iterations: 0,
        })
    }

    /// Set the relative residual tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Time reached by the last step.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Linear iterations used by the last step.
    pub fn last_iterations(&self) -> usize {
        self.last_iterations
    }

    /// Store the initial `pressure` of every grid and the `aperture` of
    /// every fracture grid.
    pub fn write_initial_state(&self, store: &mut FieldStore) {
        for (g, p) in self.params.iter().enumerate() {
            let id = GridId(g as u32);
            store.insert_cells(id, names::PRESSURE, self.pressure[g].clone());
            if p.kind.is_fracture() {
                store.insert_cells(id, names::APERTURE, self.aperture[g].clone());
            }
        }
    }

    /// Fluid volume stored by compressibility, `Σ storage · V · sv · p`.
    ///
    /// Differences between two states equal the net injected volume in a
    /// closed domain.
    pub fn stored_volume(&self, bucket: &GridBucket) -> f64 {
        bucket
            .grids()
            .zip(&self.params)
            .enumerate()
            .map(|(g, ((_, grid), p))| {
                (0..grid.num_cells())
                    .map(|c| {
                        p.storage()
                            * grid.cell_volumes()[c]
                            * self.specific_volume(g, grid, c)
                            * self.pressure[g][c]
                    })
                    .sum::<f64>()
            })
            .sum()
    }

    fn specific_volume(&self, g: usize, grid: &Grid, cell: usize) -> f64 {
        if self.params[g].kind.is_fracture() {
            self.aperture[g][cell].powi(3 - i32::from(grid.dim()))
        } else {
            1.0
        }
    }

    /// `k · area · sv / dist` from the centre of `cell` to `face`.
    fn half_transmissibility(
        &self,
        g: usize,
        grid: &Grid,
        cell: usize,
        face: usize,
    ) -> Result<f64, SolverError> {
        let dist = norm(sub(grid.face_center(face), grid.cell_center(cell)));
        if !(dist > 0.0) {
            return Err(SolverError::InvalidSystem {
                reason: format!("cell {cell} centre lies on face {face} of grid {g}"),
            });
        }
        let k = self.params[g]
            .permeability
            .directional(grid.face_normal(face), self.aperture[g][cell]);
        Ok(k * grid.face_areas()[face] * self.specific_volume(g, grid, cell) / dist)
    }

    fn assemble(&self, bucket: &GridBucket) -> Result<Assembly, SolverError> {
        if bucket.num_grids() != self.params.len() {
            return Err(SolverError::SizeMismatch {
                what: "grids".to_string(),
                expected: self.params.len(),
                actual: bucket.num_grids(),
            });
        }
        let mut offsets = Vec::with_capacity(bucket.num_grids());
        let mut n = 0;
        for (_, grid) in bucket.grids() {
            offsets.push(n);
            n += grid.num_cells();
        }
        let mut asm = Assembly {
            offsets,
            rows: vec![Row::new(); n],
            diag: vec![0.0; n],
            boundary_rhs: vec![0.0; n],
            accumulation: vec![0.0; n],
            interface: Vec::with_capacity(bucket.num_edges()),
        };

        for (g, (_, grid)) in bucket.grids().enumerate() {
            let p = &self.params[g];
            let base = asm.offsets[g];
            for c in 0..grid.num_cells() {
                asm.accumulation[base + c] =
                    p.storage() * grid.cell_volumes()[c] * self.specific_volume(g, grid, c);
            }
            for f in 0..grid.num_faces() {
                let fc = grid.face_cells(f);
                match (grid.face_tag(f), fc.second) {
                    (FaceTag::Interior, Some(second)) => {
                        let ti = self.half_transmissibility(g, grid, fc.first, f)?;
                        let tj = self.half_transmissibility(g, grid, second, f)?;
                        let t = if ti > 0.0 && tj > 0.0 {
                            ti * tj / (ti + tj) / p.viscosity
                        } else {
                            0.0
                        };
                        asm.couple(base + fc.first, base + second, t);
                    }
                    (FaceTag::Boundary, _) => {
                        if let BoundaryCondition::Dirichlet(pd) = p.boundary {
                            let t = self.half_transmissibility(g, grid, fc.first, f)? / p.viscosity;
                            asm.diag[base + fc.first] += t;
                            asm.boundary_rhs[base + fc.first] += t * pd;
                        }
                    }
                    _ => {}
                }
            }
        }

        for (_, edge) in bucket.edges() {
            let (hi, lo) = (edge.high().index(), edge.low().index());
            let high = bucket
                .grid(edge.high())
                .ok_or_else(|| SolverError::InvalidSystem {
                    reason: format!("edge refers to unknown {}", edge.high()),
                })?;
            let lp = &self.params[lo];
            let mut pairs = Vec::with_capacity(edge.face_cells().nnz());
            for (face, cell) in edge.face_cells().iter() {
                let host_cell = high.face_cells(face).first;
                let half_aperture = 0.5 * self.aperture[lo][cell];
                let t = high.face_areas()[face]
                    * self.specific_volume(hi, high, host_cell)
                    * lp.normal_permeability
                    / half_aperture
                    / lp.viscosity;
                let (i, j) = (asm.offsets[hi] + host_cell, asm.offsets[lo] + cell);
                asm.couple(i, j, t);
                pairs.push((i, j, t));
            }
            asm.interface.push(pairs);
        }

        if let Some(i) = (0..n).find(|&i| !(asm.diag[i] + asm.accumulation[i]).is_finite()) {
            return Err(SolverError::InvalidSystem {
                reason: format!("non-finite coefficient in row {i}"),
            });
        }
        Ok(asm)
    }

    /// Apply `(diag + acc/dt) x - Σ T x_j` to `x`.
    fn apply(asm: &Assembly, d: &[f64], x: &[f64], y: &mut [f64]) {
        for (i, yi) in y.iter_mut().enumerate() {
            let sigma: f64 = asm.rows[i].iter().map(|&(j, t)| t * x[j]).sum();
            *yi = d[i] * x[i] - sigma;
        }
    }

    /// Jacobi-preconditioned conjugate gradients, starting from `x`.
    ///
    /// Converged when `‖r‖∞ ≤ tolerance · ‖b‖∞`.
    fn solve(
        &self,
        asm: &Assembly,
        dt: f64,
        b: &[f64],
        x: &mut [f64],
    ) -> Result<usize, SolverError> {
        let n = x.len();
        let d: Vec<f64> = (0..n).map(|i| asm.diag[i] + asm.accumulation[i] / dt).collect();
        if let Some(i) = d.iter().position(|&v| !(v > 0.0)) {
            return Err(SolverError::InvalidSystem {
                reason: format!("non-positive diagonal in row {i}"),
            });
        }
        let inf_norm = |v: &[f64]| v.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();

        let b_norm = inf_norm(b);
        let threshold = self.tolerance * b_norm.max(f64::MIN_POSITIVE);
        let mut ap = vec![0.0; n];
        Self::apply(asm, &d, x, &mut ap);
        let mut r: Vec<f64> = b.iter().zip(&ap).map(|(bi, ai)| bi - ai).collect();
        let mut residual = inf_norm(&r);
        if residual <= threshold {
            return Ok(0);
        }
        let mut z: Vec<f64> = r.iter().zip(&d).map(|(ri, di)| ri / di).collect();
        let mut p = z.clone();
        let mut rz = dot(&r, &z);

        for iteration in 1..=self.max_iterations {
            Self::apply(asm, &d, &p, &mut ap);
            let pap = dot(&p, &ap);
            if !(pap > 0.0) {
                return Err(SolverError::InvalidSystem {
                    reason: format!("matrix is not positive definite (pAp = {pap:e})"),
                });
            }
            let alpha = rz / pap;
            for i in 0..n {
                x[i] += alpha * p[i];
                r[i] -= alpha * ap[i];
            }
            residual = inf_norm(&r);
            trace!("cg iteration {iteration}: residual {residual:e}");
            if !residual.is_finite() {
                return Err(SolverError::InvalidSystem {
                    reason: "pressure iteration diverged".to_string(),
                });
            }
            if residual <= threshold {
                return Ok(iteration);
            }
            for i in 0..n {
                z[i] = r[i] / d[i];
            }
            let rz_next = dot(&r, &z);
            let beta = rz_next / rz;
            rz = rz_next;
            for i in 0..n {
                p[i] = z[i] + beta * p[i];
            }
        }
        Err(SolverError::DidNotConverge {
            iterations: self.max_iterations,
            residual: residual / b_norm.max(f64::MIN_POSITIVE),
        })
    }
}

impl FlowSolver for SinglePhaseFlow {
    fn name(&self) -> &str {
        "single_phase_flow"
    }

    fn advance_time(&mut self, time: f64) {
        self.target_time = time;
    }

    fn reassemble(&mut self, bucket: &GridBucket) -> Result<(), SolverError> {
        self.assembly = Some(self.assemble(bucket)?);
        Ok(())
    }

    fn step(&mut self, bucket: &GridBucket) -> Result<(), SolverError> {
        let asm = self.assembly.as_ref().ok_or(SolverError::NotDiscretized)?;
        let dt = self.target_time - self.time;
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SolverError::InvalidParameter {
                reason: format!(
                    "time step {dt} from {} to {}",
                    self.time, self.target_time
                ),
            });
        }

        let mut x: Vec<f64> = self.pressure.iter().flatten().copied().collect();
        let mut b: Vec<f64> = (0..x.len())
            .map(|i| asm.accumulation[i] / dt * x[i] + asm.boundary_rhs[i])
            .collect();
        for (g, p) in self.params.iter().enumerate() {
            if let Some(source) = &p.source {
                let per_cell = source.rate_at(self.target_time) / source.cells.len() as f64;
                for &c in &source.cells {
                    b[asm.offsets[g] + c] += per_cell / p.density;
                }
            }
        }

        let iterations = self.solve(asm, dt, &b, &mut x)?;
        debug!(
            "flow step to t = {}: {} unknowns, {iterations} iterations",
            self.target_time,
            x.len()
        );

        for (g, (_, grid)) in bucket.grids().enumerate() {
            let base = asm.offsets[g];
            self.pressure[g].copy_from_slice(&x[base..base + grid.num_cells()]);
        }
        for (flux, pairs) in self.interface_flux.iter_mut().zip(&asm.interface) {
            for (q, &(i, j, t)) in flux.iter_mut().zip(pairs) {
                *q = t * (x[i] - x[j]);
            }
        }
        self.last_iterations = iterations;
        self.time = self.target_time;
        Ok(())
    }

    fn read_field(&self, grid: GridId, name: &str) -> Option<&[f64]> {
        let g = grid.index();
        match name {
            names::PRESSURE => self.pressure.get(g).map(Vec::as_slice),
            names::APERTURE if self.params.get(g)?.kind.is_fracture() => {
                Some(self.aperture[g].as_slice())
            }
            _ => None,
        }
    }

    fn read_edge_field(&self, edge: EdgeId, name: &str) -> Option<&[f64]> {
        match name {
            names::INTERFACE_FLUX => self.interface_flux.get(edge.index()).map(Vec::as_slice),
            _ => None,
        }
    }

    fn set_aperture(&mut self, grid: GridId, aperture: &[f64]) -> Result<(), SolverError> {
        let g = grid.index();
        match self.params.get(g) {
            Some(p) if p.kind.is_fracture() => {}
            _ => {
                return Err(SolverError::InvalidParameter {
                    reason: format!("{grid} is not a fracture grid"),
                })
            }
        }
        if aperture.len() != self.aperture[g].len() {
            return Err(SolverError::SizeMismatch {
                what: format!("aperture of {grid}"),
                expected: self.aperture[g].len(),
                actual: aperture.len(),
            });
        }
        if let Some(bad) = aperture.iter().find(|a| !(a.is_finite() && **a > 0.0)) {
            return Err(SolverError::InvalidParameter {
                reason: format!("aperture {bad} on {grid} is not positive"),
            });
        }
        self.aperture[g].copy_from_slice(aperture);
        Ok(())
    }
}
