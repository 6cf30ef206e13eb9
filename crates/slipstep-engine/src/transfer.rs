//! Projection of fields between fracture cells and host faces.
//!
//! The incidence mapping of each host→fracture edge is a sparse indicator
//! with at most one fracture cell per host face, so cell→face transfer is
//! a copy and face→cell transfer is an average over the faces that touch
//! each cell.

use log::warn;

use slipstep_core::names::face_field_name;
use slipstep_core::{CouplingError, FieldError, FieldLocation, FieldStore};
use slipstep_grid::GridBucket;

use crate::config::UnmappedCellPolicy;

/// Project the cell field `name` of every fracture grid onto the host faces.
///
/// The result is stored on the host as the face field `face_<name>`,
/// whose name is returned. Faces without a fracture cell hold zero.
/// Multi-component fields are copied component-wise; every fracture
/// grid must carry the same component count.
pub fn cells_to_faces(
    bucket: &GridBucket,
    store: &mut FieldStore,
    name: &str,
) -> Result<String, CouplingError> {
    let (host_id, host) = bucket.host()?;
    let edges = bucket.fracture_edges()?;

    let mut components = None;
    let mut out = Vec::new();
    for (_, edge) in &edges {
        let low = edge.low();
        let entry = store.entry(low, name).ok_or_else(|| FieldError::Missing {
            owner: low.into(),
            name: name.to_string(),
        })?;
        if entry.location() != FieldLocation::Cells {
            return Err(FieldError::WrongLocation {
                owner: low.into(),
                name: name.to_string(),
                expected: FieldLocation::Cells,
            }
            .into());
        }
        let c = *components.get_or_insert(entry.components());
        let expected = c * edge.face_cells().num_cells();
        if entry.components() != c || entry.values().len() != expected {
            return Err(FieldError::SizeMismatch {
                owner: low.into(),
                name: name.to_string(),
                expected,
                actual: entry.values().len(),
            }
            .into());
        }
        if out.is_empty() {
            out = vec![0.0; c * host.num_faces()];
        }
        let values = entry.values();
        for (face, cell) in edge.face_cells().iter() {
            out[c * face..c * (face + 1)].copy_from_slice(&values[c * cell..c * (cell + 1)]);
        }
    }

    let c = components.unwrap_or(1);
    if out.is_empty() {
        out = vec![0.0; c * host.num_faces()];
    }
    let face_name = face_field_name(name);
    store.insert_faces(host_id, face_name.clone(), c, out);
    Ok(face_name)
}

/// Average the host face field `face_name` onto the cells of every
/// fracture grid, storing the result as the cell field `cell_name`.
///
/// Each cell receives the arithmetic mean over its incident faces.
/// Cells without incident faces are handled per `policy`. Nothing is
/// written unless every fracture grid succeeds.
pub fn faces_to_cells(
    bucket: &GridBucket,
    store: &mut FieldStore,
    face_name: &str,
    cell_name: &str,
    policy: UnmappedCellPolicy,
) -> Result<(), CouplingError> {
    let (host_id, host) = bucket.host()?;
    let entry = store
        .entry(host_id, face_name)
        .ok_or_else(|| FieldError::Missing {
            owner: host_id.into(),
            name: face_name.to_string(),
        })?;
    if entry.location() != FieldLocation::Faces {
        return Err(FieldError::WrongLocation {
            owner: host_id.into(),
            name: face_name.to_string(),
            expected: FieldLocation::Faces,
        }
        .into());
    }
    let c = entry.components();
    if entry.values().len() != c * host.num_faces() {
        return Err(FieldError::SizeMismatch {
            owner: host_id.into(),
            name: face_name.to_string(),
            expected: c * host.num_faces(),
            actual: entry.values().len(),
        }
        .into());
    }
    let faces = entry.values();

    let mut results = Vec::new();
    for (_, edge) in bucket.fracture_edges()? {
        let low = edge.low();
        let num_cells = edge.face_cells().num_cells();
        let mut sums = vec![0.0; c * num_cells];
        let mut hits = vec![0usize; num_cells];
        for (face, cell) in edge.face_cells().iter() {
            for k in 0..c {
                sums[c * cell + k] += faces[c * face + k];
            }
            hits[cell] += 1;
        }
        for (cell, &n) in hits.iter().enumerate() {
            if n == 0 {
                match policy {
                    UnmappedCellPolicy::Fail => {
                        return Err(CouplingError::UnmappedCell { grid: low, cell });
                    }
                    UnmappedCellPolicy::Zero => {
                        warn!("cell {cell} of {low} has no incident host face; '{cell_name}' set to zero");
                    }
                }
                continue;
            }
            for v in &mut sums[c * cell..c * (cell + 1)] {
                *v /= n as f64;
            }
        }
        results.push((low, sums));
    }

    for (grid, values) in results {
        store.insert(grid, cell_name, FieldLocation::Cells, c, values);
    }
    Ok(())
}
