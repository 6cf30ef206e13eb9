//! Fracture aperture bookkeeping.
//!
//! The aperture of a fracture cell is its baseline, captured once when
//! the simulation is built, plus the accumulated slip-induced change.

use indexmap::IndexMap;

use slipstep_core::{names, CouplingError, FieldLocation, FieldStore, GridId};
use slipstep_grid::GridBucket;
use slipstep_solver::FlowSolver;

use crate::config::ConfigError;

/// Immutable snapshot of the initial aperture of every fracture grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApertureBaseline {
    apertures: IndexMap<GridId, Vec<f64>>,
}

impl ApertureBaseline {
    /// Copy the `aperture` cell field of every fracture grid in `bucket`.
    pub fn capture(bucket: &GridBucket, store: &FieldStore) -> Result<Self, ConfigError> {
        let mut apertures = IndexMap::new();
        for (_, edge) in bucket.fracture_edges()? {
            let num_cells = edge.face_cells().num_cells();
            let values = store
                .require_sized(edge.low(), names::APERTURE, FieldLocation::Cells, num_cells)
                .map_err(ConfigError::Baseline)?;
            apertures.insert(edge.low(), values.to_vec());
        }
        Ok(Self { apertures })
    }

    /// Baseline of one fracture grid.
    pub fn get(&self, grid: GridId) -> Option<&[f64]> {
        self.apertures.get(&grid).map(Vec::as_slice)
    }

    /// Fracture grids and their baselines, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (GridId, &[f64])> {
        self.apertures.iter().map(|(g, a)| (*g, a.as_slice()))
    }

    /// Number of fracture grids.
    pub fn len(&self) -> usize {
        self.apertures.len()
    }

    /// Whether there are no fracture grids.
    pub fn is_empty(&self) -> bool {
        self.apertures.is_empty()
    }

    /// Write a zero `aperture_change` and the baseline `aperture` on every
    /// fracture grid.
    pub fn reset(&self, store: &mut FieldStore) {
        for (grid, base) in self.iter() {
            store.insert_cells(grid, names::APERTURE_CHANGE, vec![0.0; base.len()]);
            store.insert_cells(grid, names::APERTURE, base.to_vec());
        }
    }
}

/// Set `aperture = baseline + aperture_change` on every fracture grid and
/// push the result into the flow solver.
pub fn update_apertures(
    baseline: &ApertureBaseline,
    store: &mut FieldStore,
    flow: &mut dyn FlowSolver,
) -> Result<(), CouplingError> {
    for (grid, base) in baseline.iter() {
        let change = store.require_sized(
            grid,
            names::APERTURE_CHANGE,
            FieldLocation::Cells,
            base.len(),
        )?;
        let aperture: Vec<f64> = base.iter().zip(change).map(|(b, d)| b + d).collect();
        flow.set_aperture(grid, &aperture)
            .map_err(|e| CouplingError::solver(flow.name(), e))?;
        store.insert_cells(grid, names::APERTURE, aperture);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipstep_core::FieldError;
    use slipstep_test_utils::fixtures::{baseline_store, one_to_one_bucket, FRACTURE};
    use slipstep_test_utils::PrescribedFlow;

    #[test]
    fn capture_requires_every_fracture_grid() {
        let bucket = one_to_one_bucket(2);
        assert!(matches!(
            ApertureBaseline::capture(&bucket, &FieldStore::new()),
            Err(ConfigError::Baseline(FieldError::Missing { .. }))
        ));
        let baseline = ApertureBaseline::capture(&bucket, &baseline_store(&bucket, 1e-4)).unwrap();
        assert_eq!(baseline.len(), 1);
        assert_eq!(baseline.get(FRACTURE), Some(&[1e-4, 1e-4][..]));
    }

    #[test]
    fn update_adds_change_to_baseline() {
        let bucket = one_to_one_bucket(2);
        let mut store = baseline_store(&bucket, 1e-4);
        let baseline = ApertureBaseline::capture(&bucket, &store).unwrap();
        baseline.reset(&mut store);
        let mut flow = PrescribedFlow::new(&bucket);
        let counts = flow.counts();

        store.insert_cells(FRACTURE, names::APERTURE_CHANGE, vec![0.0, 2e-5]);
        update_apertures(&baseline, &mut store, &mut flow).unwrap();
        let a = store.get(FRACTURE, names::APERTURE).unwrap();
        assert_eq!(a[0], 1e-4);
        assert!((a[1] - 1.2e-4).abs() < 1e-18);
        assert_eq!(flow.read_field(FRACTURE, names::APERTURE), Some(a));
        assert_eq!(counts.aperture_updates(), 1);
        // The baseline itself is untouched.
        assert_eq!(baseline.get(FRACTURE), Some(&[1e-4, 1e-4][..]));
    }

    #[test]
    fn aperture_increases_with_change() {
        let bucket = one_to_one_bucket(1);
        let mut store = baseline_store(&bucket, 1e-4);
        let baseline = ApertureBaseline::capture(&bucket, &store).unwrap();
        let mut flow = PrescribedFlow::new(&bucket);
        let mut last = f64::NEG_INFINITY;
        for change in [0.0, 1e-6, 5e-6, 2e-5] {
            store.insert_cells(FRACTURE, names::APERTURE_CHANGE, vec![change]);
            update_apertures(&baseline, &mut store, &mut flow).unwrap();
            let a = store.get(FRACTURE, names::APERTURE).unwrap()[0];
            assert!(a > last);
            last = a;
        }
    }

    #[test]
    fn missing_change_is_a_field_error() {
        let bucket = one_to_one_bucket(1);
        let mut store = baseline_store(&bucket, 1e-4);
        let baseline = ApertureBaseline::capture(&bucket, &store).unwrap();
        let mut flow = PrescribedFlow::new(&bucket);
        assert!(matches!(
            update_apertures(&baseline, &mut store, &mut flow),
            Err(CouplingError::Field(FieldError::Missing { .. }))
        ));
    }
}
