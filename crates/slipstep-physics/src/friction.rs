//! Coulomb friction with slip-induced dilation.

use log::debug;

use slipstep_core::SolverError;
use slipstep_grid::geometry::{dot, norm, scale, sub};
use slipstep_grid::{Grid, GridBucket};
use slipstep_solver::FrictionSolver;

/// Parameters of [`CoulombFriction`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrictionParams {
    /// Friction coefficient `μ`.
    pub friction_coefficient: f64,
    /// Cohesion, Pa.
    pub cohesion: f64,
    /// Shear stiffness converting excess shear into slip, Pa/m.
    pub shear_stiffness: f64,
    /// Dilation angle `ψ`, radians.
    pub dilation_angle: f64,
    /// Relative tolerance on the slip threshold.
    pub tolerance: f64,
}

impl FrictionParams {
    /// Cohesionless, non-dilatant friction.
    pub fn new(friction_coefficient: f64, shear_stiffness: f64) -> Self {
        Self {
            friction_coefficient,
            cohesion: 0.0,
            shear_stiffness,
            dilation_angle: 0.0,
            tolerance: 1e-8,
        }
    }

    /// Set the dilation angle.
    pub fn with_dilation_angle(mut self, angle: f64) -> Self {
        self.dilation_angle = angle;
        self
    }

    /// Set the cohesion.
    pub fn with_cohesion(mut self, cohesion: f64) -> Self {
        self.cohesion = cohesion;
        self
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), SolverError> {
        let ok = self.friction_coefficient.is_finite()
            && self.friction_coefficient >= 0.0
            && self.cohesion.is_finite()
            && self.cohesion >= 0.0
            && self.shear_stiffness.is_finite()
            && self.shear_stiffness > 0.0
            && self.dilation_angle.is_finite()
            && (0.0..std::f64::consts::FRAC_PI_2).contains(&self.dilation_angle)
            && self.tolerance.is_finite()
            && self.tolerance >= 0.0;
        if ok {
            Ok(())
        } else {
            Err(SolverError::InvalidParameter {
                reason: format!("friction parameters out of range: {self:?}"),
            })
        }
    }

    /// Shear strength `μ · max(σn, 0) + c` for compression-positive `σn`.
    pub fn threshold(&self, sigma_n: f64) -> f64 {
        self.friction_coefficient * sigma_n.max(0.0) + self.cohesion
    }
}

/// Coulomb slip criterion evaluated on the fracture faces of the host.
///
/// A face slips when `|τ| > (μ · max(σn, 0) + c) · (1 + tol)`. The slip
/// increment `(|τ| - threshold) / k_s` is added along the shear
/// direction, and the face's aperture change becomes
/// `|slip| · tan(ψ)`.
#[derive(Debug)]
pub struct CoulombFriction {
    params: FrictionParams,
    mask: Vec<bool>,
    slipping: Vec<bool>,
    slip: Vec<f64>,
    aperture_change: Vec<f64>,
}

impl CoulombFriction {
    /// Create a friction model for the fracture faces of `bucket`'s host.
    pub fn new(params: FrictionParams, bucket: &GridBucket) -> Result<Self, SolverError> {
        params.validate()?;
        let mask = bucket
            .fracture_face_mask()
            .map_err(|e| SolverError::InvalidSystem {
                reason: e.to_string(),
            })?;
        let n = mask.len();
        Ok(Self {
            params,
            mask,
            slipping: vec![false; n],
            slip: vec![0.0; 3 * n],
            aperture_change: vec![0.0; n],
        })
    }

    /// The parameters in use.
    pub fn params(&self) -> &FrictionParams {
        &self.params
    }
}

impl FrictionSolver for CoulombFriction {
    fn name(&self) -> &str {
        "coulomb_friction"
    }

    fn reset_slip_state(&mut self) {
        self.slipping.fill(false);
    }

    fn step(&mut self, host: &Grid, traction: &[f64]) -> Result<bool, SolverError> {
        let n = self.mask.len();
        if host.num_faces() != n {
            return Err(SolverError::SizeMismatch {
                what: "host faces".to_string(),
                expected: n,
                actual: host.num_faces(),
            });
        }
        if traction.len() != 3 * n {
            return Err(SolverError::SizeMismatch {
                what: "traction".to_string(),
                expected: 3 * n,
                actual: traction.len(),
            });
        }
        let tan_psi = self.params.dilation_angle.tan();
        let mut newly = 0usize;
        for f in (0..n).filter(|&f| self.mask[f]) {
            let normal = host.face_normal(f);
            let t = [traction[3 * f], traction[3 * f + 1], traction[3 * f + 2]];
            let sigma_n = dot(t, normal);
            let tau = sub(t, scale(normal, sigma_n));
            let tau_norm = norm(tau);
            let threshold = self.params.threshold(sigma_n);
            if tau_norm <= threshold * (1.0 + self.params.tolerance) || tau_norm == 0.0 {
                continue;
            }
            let increment = scale(tau, (tau_norm - threshold) / self.params.shear_stiffness / tau_norm);
            for (s, d) in self.slip[3 * f..3 * f + 3].iter_mut().zip(increment) {
                *s += d;
            }
            let total = norm([self.slip[3 * f], self.slip[3 * f + 1], self.slip[3 * f + 2]]);
            self.aperture_change[f] = total * tan_psi;
            if !self.slipping[f] {
                self.slipping[f] = true;
                newly += 1;
            }
        }
        debug!("friction step: {newly} faces newly slipping");
        Ok(newly > 0)
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

    fn shear_stiffness(&self) -> Option<f64> {
        Some(self.params.shear_stiffness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipstep_core::units::{degrees, MEGA};
    use slipstep_test_utils::fixtures::one_to_one_bucket;

    fn friction(bucket: &GridBucket) -> CoulombFriction {
        CoulombFriction::new(
            FrictionParams::new(0.6, 1e10).with_dilation_angle(degrees(5.0)),
            bucket,
        )
        .unwrap()
    }

    /// Traction `(tx, 0, tz)` on every fracture face.
    fn traction(bucket: &GridBucket, tx: f64, tz: f64) -> Vec<f64> {
        let mask = bucket.fracture_face_mask().unwrap();
        mask.iter()
            .flat_map(|&m| if m { [tx, 0.0, tz] } else { [0.0; 3] })
            .collect()
    }

    #[test]
    fn below_threshold_does_not_slip() {
        let bucket = one_to_one_bucket(3);
        let host = bucket.host().unwrap().1;
        let mut fr = friction(&bucket);
        assert!(!fr.step(host, &traction(&bucket, 4.0 * MEGA, 10.0 * MEGA)).unwrap());
        assert!(fr.is_slipping().iter().all(|s| !s));
        assert!(fr.slip_distance().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn above_threshold_slips_by_excess_over_stiffness() {
        let bucket = one_to_one_bucket(1);
        let host = bucket.host().unwrap().1;
        let mut fr = friction(&bucket);
        // Threshold 0.6 * 5 MPa = 3 MPa, shear 4 MPa: slip 1 MPa / 1e10 Pa/m.
        assert!(fr.step(host, &traction(&bucket, 4.0 * MEGA, 5.0 * MEGA)).unwrap());
        let f = fr.is_slipping().iter().position(|s| *s).unwrap();
        assert!((fr.slip_distance()[3 * f] - 1e-4).abs() < 1e-12);
        let expected = 1e-4 * degrees(5.0).tan();
        assert!((fr.read_aperture_change()[f] - expected).abs() < 1e-15);
    }

    #[test]
    fn relieved_traction_produces_no_new_slip() {
        let bucket = one_to_one_bucket(1);
        let host = bucket.host().unwrap().1;
        let mut fr = friction(&bucket);
        assert!(fr.step(host, &traction(&bucket, 4.0 * MEGA, 5.0 * MEGA)).unwrap());
        let flags = fr.is_slipping().to_vec();
        let slip = fr.slip_distance().to_vec();
        // After relief the shear sits exactly on the threshold.
        assert!(!fr.step(host, &traction(&bucket, 3.0 * MEGA, 5.0 * MEGA)).unwrap());
        assert_eq!(fr.is_slipping(), flags.as_slice());
        assert_eq!(fr.slip_distance(), slip.as_slice());
    }

    #[test]
    fn reset_clears_flags_but_keeps_slip() {
        let bucket = one_to_one_bucket(1);
        let host = bucket.host().unwrap().1;
        let mut fr = friction(&bucket);
        fr.step(host, &traction(&bucket, 4.0 * MEGA, 5.0 * MEGA)).unwrap();
        fr.reset_slip_state();
        assert!(fr.is_slipping().iter().all(|s| !s));
        assert!(fr.slip_distance().iter().any(|s| *s != 0.0));
    }

    #[test]
    fn tension_has_only_cohesion() {
        let bucket = one_to_one_bucket(1);
        let host = bucket.host().unwrap().1;
        let mut fr = CoulombFriction::new(
            FrictionParams::new(0.6, 1e10).with_cohesion(1.0 * MEGA),
            &bucket,
        )
        .unwrap();
        assert!(!fr.step(host, &traction(&bucket, 0.9 * MEGA, -2.0 * MEGA)).unwrap());
        assert!(fr.step(host, &traction(&bucket, 1.1 * MEGA, -2.0 * MEGA)).unwrap());
    }

    #[test]
    fn wrong_traction_length_is_rejected() {
        let bucket = one_to_one_bucket(1);
        let host = bucket.host().unwrap().1;
        let mut fr = friction(&bucket);
        assert!(matches!(
            fr.step(host, &[0.0; 2]),
            Err(SolverError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let bucket = one_to_one_bucket(1);
        assert!(CoulombFriction::new(FrictionParams::new(0.6, 0.0), &bucket).is_err());
        assert!(CoulombFriction::new(FrictionParams::new(-0.1, 1e10), &bucket).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn relieved_shear_never_exceeds_strength(
                shear in 0.0f64..20.0,
                normal in 0.5f64..20.0,
            ) {
                let bucket = one_to_one_bucket(1);
                let host = bucket.host().unwrap().1;
                let mut fr = friction(&bucket);
                let t = traction(&bucket, shear * MEGA, normal * MEGA);
                let slipped = fr.step(host, &t).unwrap();
                prop_assert_eq!(slipped, shear > 0.6 * normal * (1.0 + 1e-8));

                let slip = fr.slip_distance()[0];
                let relieved = shear * MEGA - 1e10 * slip;
                prop_assert!(relieved <= 0.6 * normal * MEGA * (1.0 + 1e-8) + 1e-6);
                prop_assert!(slip >= 0.0);
            }
        }
    }
}
