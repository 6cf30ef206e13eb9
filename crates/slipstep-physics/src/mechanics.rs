//! Fracture-face tractions from a background stress state.

use log::debug;

use slipstep_core::{names, FieldLocation, FieldStore, SolverError};
use slipstep_grid::geometry::{add, dot, mat_vec, scale, sub, Tensor3, Vec3};
use slipstep_grid::GridBucket;
use slipstep_solver::MechanicsSolver;

/// Parameters of [`FaceTractionMechanics`].
#[derive(Clone, Debug, PartialEq)]
pub struct MechanicsParams {
    /// Total stress tensor, compression positive, Pa.
    pub background_stress: Tensor3,
    /// Biot coefficient, in `[0, 1]`.
    pub biot_coefficient: f64,
    /// Elastic shear stiffness relieving traction per unit slip, Pa/m.
    pub shear_stiffness: f64,
}

impl MechanicsParams {
    /// Check ranges.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.background_stress.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SolverError::InvalidParameter {
                reason: "background stress is not finite".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.biot_coefficient) {
            return Err(SolverError::InvalidParameter {
                reason: format!("Biot coefficient {} outside [0, 1]", self.biot_coefficient),
            });
        }
        if !(self.shear_stiffness.is_finite() && self.shear_stiffness >= 0.0) {
            return Err(SolverError::InvalidParameter {
                reason: format!("shear stiffness {} is negative", self.shear_stiffness),
            });
        }
        Ok(())
    }
}

/// Quasi-static traction on fracture faces of the host grid.
///
/// On every face touching a fracture cell, with unit normal `n`:
///
/// ```text
/// t0 = σ · n                     (cached at discretization)
/// σn = n · t0
/// t  = (σn - α p) n + (t0 - σn n) - k_s · slip
/// ```
///
/// where `p` is the host face field `face_pressure`. All other faces
/// carry zero traction.
#[derive(Debug)]
pub struct FaceTractionMechanics {
    params: MechanicsParams,
    /// `σ · n` per host face; zero off the fractures.
    background: Option<Vec<Vec3>>,
    normals: Vec<Vec3>,
    mask: Vec<bool>,
    traction: Vec<f64>,
    slip: Vec<f64>,
    solves: usize,
}

impl FaceTractionMechanics {
    /// Create an undiscretized solver.
    pub fn new(params: MechanicsParams) -> Result<Self, SolverError> {
        params.validate()?;
        Ok(Self {
            params,
            background: None,
            normals: Vec::new(),
            mask: Vec::new(),
            traction: Vec::new(),
            slip: Vec::new(),
            solves: 0,
        })
    }

    /// Number of completed solves.
    pub fn solves(&self) -> usize {
        self.solves
    }

    /// The parameters in use.
    pub fn params(&self) -> &MechanicsParams {
        &self.params
    }
}

impl MechanicsSolver for FaceTractionMechanics {
    fn name(&self) -> &str {
        "face_traction_mechanics"
    }

    fn discretize(&mut self, bucket: &GridBucket) -> Result<(), SolverError> {
        let (_, host) = bucket.host().map_err(|e| SolverError::InvalidSystem {
            reason: e.to_string(),
        })?;
        let mask = bucket
            .fracture_face_mask()
            .map_err(|e| SolverError::InvalidSystem {
                reason: e.to_string(),
            })?;
        let normals: Vec<Vec3> = (0..host.num_faces()).map(|f| host.face_normal(f)).collect();
        let background = normals
            .iter()
            .zip(&mask)
            .map(|(&n, &on_fracture)| {
                if on_fracture {
                    mat_vec(&self.params.background_stress, n)
                } else {
                    [0.0; 3]
                }
            })
            .collect();
        let num_faces = host.num_faces();
        if self.slip.len() != 3 * num_faces {
            self.slip = vec![0.0; 3 * num_faces];
        }
        self.traction = vec![0.0; 3 * num_faces];
        debug!(
            "mechanics discretized: {} of {num_faces} faces on fractures",
            mask.iter().filter(|m| **m).count()
        );
        self.normals = normals;
        self.mask = mask;
        self.background = Some(background);
        Ok(())
    }

    fn solve(
        &mut self,
        bucket: &GridBucket,
        store: &FieldStore,
        reuse_discretization: bool,
    ) -> Result<(), SolverError> {
        if !reuse_discretization {
            self.discretize(bucket)?;
        }
        let background = self.background.as_ref().ok_or(SolverError::NotDiscretized)?;
        let (host_id, _) = bucket.host().map_err(|e| SolverError::InvalidSystem {
            reason: e.to_string(),
        })?;
        let face_pressure = names::face_field_name(names::PRESSURE);
        let pressure = store
            .require_sized(host_id, &face_pressure, FieldLocation::Faces, self.normals.len())
            .map_err(|_| SolverError::MissingField {
                name: face_pressure.clone(),
            })?;

        for (f, (&n, &t0)) in self.normals.iter().zip(background).enumerate() {
            let t = if self.mask[f] {
                let sigma_n = dot(n, t0);
                let normal = scale(n, sigma_n - self.params.biot_coefficient * pressure[f]);
                let shear = sub(t0, scale(n, sigma_n));
                let slip = [self.slip[3 * f], self.slip[3 * f + 1], self.slip[3 * f + 2]];
                sub(add(normal, shear), scale(slip, self.params.shear_stiffness))
            } else {
                [0.0; 3]
            };
            self.traction[3 * f..3 * f + 3].copy_from_slice(&t);
        }
        self.solves += 1;
        Ok(())
    }

    fn read_traction(&self) -> &[f64] {
        &self.traction
    }

    fn set_slip_distance(&mut self, slip: &[f64]) -> Result<(), SolverError> {
        if self.background.is_none() {
            return Err(SolverError::NotDiscretized);
        }
        if slip.len() != 3 * self.normals.len() {
            return Err(SolverError::SizeMismatch {
                what: "slip distance".to_string(),
                expected: 3 * self.normals.len(),
                actual: slip.len(),
            });
        }
        self.slip.copy_from_slice(slip);
        Ok(())
    }
    fn shear_stiffness(&self) -> Option<f64> {
        Some(self.params.shear_stiffness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipstep_core::units::MEGA;
    use slipstep_test_utils::fixtures::{one_to_one_bucket, HOST};

    fn params() -> MechanicsParams {
        MechanicsParams {
            background_stress: [
                [0.0, 0.0, 4.0 * MEGA],
                [0.0, 0.0, 0.0],
                [4.0 * MEGA, 0.0, 10.0 * MEGA],
            ],
            biot_coefficient: 1.0,
            shear_stiffness: 1e10,
        }
    }

    fn store_with_face_pressure(n: usize, p: f64) -> FieldStore {
        let mut store = FieldStore::new();
        store.insert_faces(HOST, "face_pressure", 1, vec![p; n]);
        store
    }

    #[test]
    fn solve_before_discretize_fails() {
        let bucket = one_to_one_bucket(2);
        let mut m = FaceTractionMechanics::new(params()).unwrap();
        let store = store_with_face_pressure(bucket.host().unwrap().1.num_faces(), 0.0);
        assert_eq!(
            m.solve(&bucket, &store, true).unwrap_err(),
            SolverError::NotDiscretized
        );
        assert_eq!(m.set_slip_distance(&[]).unwrap_err(), SolverError::NotDiscretized);
    }

    #[test]
    fn traction_on_fracture_faces_only() {
        let bucket = one_to_one_bucket(2);
        let num_faces = bucket.host().unwrap().1.num_faces();
        let mut m = FaceTractionMechanics::new(params()).unwrap();
        m.discretize(&bucket).unwrap();
        let store = store_with_face_pressure(num_faces, 5.0 * MEGA);
        m.solve(&bucket, &store, true).unwrap();
        let mask = bucket.fracture_face_mask().unwrap();
        let t = m.read_traction();
        assert_eq!(t.len(), 3 * num_faces);
        for f in 0..num_faces {
            let tf = &t[3 * f..3 * f + 3];
            if mask[f] {
                // Normal +z: effective normal stress 10 - 5 MPa, shear 4 MPa along x.
                assert!((tf[0] - 4.0 * MEGA).abs() < 1e-6);
                assert!((tf[2] - 5.0 * MEGA).abs() < 1e-6);
            } else {
                assert_eq!(tf, &[0.0; 3]);
            }
        }
        assert_eq!(m.solves(), 1);
    }

    #[test]
    fn slip_relieves_shear() {
        let bucket = one_to_one_bucket(1);
        let num_faces = bucket.host().unwrap().1.num_faces();
        let mut m = FaceTractionMechanics::new(params()).unwrap();
        m.discretize(&bucket).unwrap();
        let mut slip = vec![0.0; 3 * num_faces];
        let f = bucket.fracture_face_mask().unwrap().iter().position(|m| *m).unwrap();
        slip[3 * f] = 1e-4;
        m.set_slip_distance(&slip).unwrap();
        m.solve(&bucket, &store_with_face_pressure(num_faces, 0.0), true)
            .unwrap();
        assert!((m.read_traction()[3 * f] - 3.0 * MEGA).abs() < 1e-6);
    }

    #[test]
    fn missing_face_pressure_is_reported() {
        let bucket = one_to_one_bucket(1);
        let mut m = FaceTractionMechanics::new(params()).unwrap();
        assert!(matches!(
            m.solve(&bucket, &FieldStore::new(), false),
            Err(SolverError::MissingField { .. })
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut p = params();
        p.biot_coefficient = 1.5;
        assert!(FaceTractionMechanics::new(p).is_err());
        let mut p = params();
        p.shear_stiffness = -1.0;
        assert!(FaceTractionMechanics::new(p).is_err());
    }
}
