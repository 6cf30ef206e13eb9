//! Property tests for cell↔face transfer across the grid hierarchy.

use proptest::prelude::*;

use slipstep_core::{FieldLocation, FieldStore};
use slipstep_engine::{cells_to_faces, faces_to_cells, UnmappedCellPolicy};
use slipstep_test_utils::fixtures::{one_to_one_bucket, split_box_bucket, FRACTURE, HOST};

proptest! {
    #[test]
    fn one_to_one_round_trip_is_identity(
        values in prop::collection::vec(-1e9f64..1e9, 1..40),
    ) {
        let bucket = one_to_one_bucket(values.len());
        let mut store = FieldStore::new();
        store.insert_cells(FRACTURE, "p", values.clone());

        let face = cells_to_faces(&bucket, &mut store, "p").unwrap();
        faces_to_cells(&bucket, &mut store, &face, "p_back", UnmappedCellPolicy::Fail).unwrap();

        prop_assert_eq!(store.get(FRACTURE, "p_back").unwrap(), values.as_slice());
    }

    #[test]
    fn round_trip_preserves_components(
        values in prop::collection::vec(-1.0f64..1.0, 1..10)
            .prop_map(|v| v.into_iter().flat_map(|x| [x, 2.0 * x, -x]).collect::<Vec<_>>()),
    ) {
        let n = values.len() / 3;
        let bucket = one_to_one_bucket(n);
        let mut store = FieldStore::new();
        store.insert(FRACTURE, "u", FieldLocation::Cells, 3, values.clone());

        let face = cells_to_faces(&bucket, &mut store, "u").unwrap();
        faces_to_cells(&bucket, &mut store, &face, "u_back", UnmappedCellPolicy::Fail).unwrap();

        let back = store.entry(FRACTURE, "u_back").unwrap();
        prop_assert_eq!(back.components(), 3);
        prop_assert_eq!(back.values(), values.as_slice());
    }

    #[test]
    fn singleton_faces_copy_their_value(
        values in prop::collection::vec(-1e6f64..1e6, 1..20),
    ) {
        let bucket = one_to_one_bucket(values.len());
        let faces = bucket.host().unwrap().1.num_faces();
        let mut face_values = vec![f64::NAN; faces];
        face_values[..values.len()].copy_from_slice(&values);
        let mut store = FieldStore::new();
        store.insert_faces(HOST, "face_q", 1, face_values);

        faces_to_cells(&bucket, &mut store, "face_q", "q", UnmappedCellPolicy::Fail).unwrap();

        prop_assert_eq!(store.get(FRACTURE, "q").unwrap(), values.as_slice());
    }

    #[test]
    fn split_faces_average_to_the_mean(
        nx in 1usize..5,
        ny in 1usize..5,
        seed in prop::collection::vec(-1e3f64..1e3, 64),
    ) {
        let bucket = split_box_bucket(nx, ny, 2);
        let host = bucket.host().unwrap().1;
        let face_values: Vec<f64> = (0..host.num_faces())
            .map(|f| seed[f % seed.len()] + f as f64)
            .collect();
        let mut store = FieldStore::new();
        store.insert_faces(HOST, "face_q", 1, face_values.clone());

        faces_to_cells(&bucket, &mut store, "face_q", "q", UnmappedCellPolicy::Fail).unwrap();

        let (_, edge) = bucket.edge_to(FRACTURE).unwrap();
        let cells = store.get(FRACTURE, "q").unwrap();
        prop_assert_eq!(cells.len(), nx * ny);
        for (cell, value) in cells.iter().enumerate() {
            let faces = edge.face_cells().faces_of_cell(cell);
            prop_assert_eq!(faces.len(), 2);
            let mean = faces.iter().map(|&f| face_values[f as usize]).sum::<f64>() / 2.0;
            prop_assert!((value - mean).abs() <= 1e-12 * mean.abs().max(1.0));
        }
    }
}
