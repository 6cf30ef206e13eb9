//! Error norms and analytical reference solutions.

use slipstep_core::SolverError;
use slipstep_grid::geometry::{norm, sub, Vec3};

/// Area-weighted L2 norm `sqrt(Σ area · v²)`.
pub fn l2_norm(values: &[f64], areas: &[f64]) -> Result<f64, SolverError> {
    if values.len() != areas.len() {
        return Err(SolverError::SizeMismatch {
            what: "areas".to_string(),
            expected: values.len(),
            actual: areas.len(),
        });
    }
    Ok(values
        .iter()
        .zip(areas)
        .map(|(v, a)| a * v * v)
        .sum::<f64>()
        .sqrt())
}

/// Relative L2 error `‖approx - reference‖ / ‖reference‖`.
///
/// Fails with [`SolverError::InvalidParameter`] when the reference norm
/// is zero.
pub fn relative_l2_error(
    reference: &[f64],
    approx: &[f64],
    areas: &[f64],
) -> Result<f64, SolverError> {
    if reference.len() != approx.len() {
        return Err(SolverError::SizeMismatch {
            what: "approximation".to_string(),
            expected: reference.len(),
            actual: approx.len(),
        });
    }
    let diff: Vec<f64> = approx.iter().zip(reference).map(|(a, r)| a - r).collect();
    let denom = l2_norm(reference, areas)?;
    if denom == 0.0 {
        return Err(SolverError::InvalidParameter {
            reason: "reference solution has zero norm".to_string(),
        });
    }
    Ok(l2_norm(&diff, areas)? / denom)
}

/// Elastic constants and load of a pressurised crack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SneddonCrack {
    /// Half length (line crack) or radius (penny-shaped crack), m.
    pub half_length: f64,
    /// Internal overpressure, Pa.
    pub pressure: f64,
    /// Shear modulus, Pa.
    pub shear_modulus: f64,
    /// Poisson ratio.
    pub poisson_ratio: f64,
    /// Penny-shaped instead of a through-thickness line crack.
    pub penny: bool,
}

impl SneddonCrack {
    /// Opening at the crack centre.
    pub fn max_aperture(&self) -> f64 {
        let line = (1.0 - self.poisson_ratio) / self.shear_modulus
            * self.pressure
            * self.half_length
            * 2.0;
        if self.penny {
            line * 2.0 / std::f64::consts::PI
        } else {
            line
        }
    }

    /// Opening at distance `eta` from the centre; zero at and beyond the tip.
    pub fn aperture(&self, eta: f64) -> f64 {
        let r = eta / self.half_length;
        if r.abs() >= 1.0 {
            0.0
        } else {
            self.max_aperture() * (1.0 - r * r).sqrt()
        }
    }

    /// Openings at each point's distance from `center`.
    pub fn apertures(&self, center: Vec3, points: &[Vec3]) -> Vec<f64> {
        points
            .iter()
            .map(|&p| self.aperture(norm(sub(p, center))))
            .collect()
    }
}
