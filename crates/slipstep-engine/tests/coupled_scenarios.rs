//! Integration test: full coupled steps with the reference mechanics and
//! friction models.
//!
//! The host is a split box with a horizontal fracture plane, loaded by a
//! background stress with 10 MPa normal and 4 MPa shear on the fracture.
//! With friction coefficient 0.6 the fracture holds at zero pore pressure
//! and slips once the pressure lowers the effective normal stress enough.

use slipstep_core::names;
use slipstep_core::units::{degrees, MEGA};
use slipstep_core::{CouplingError, EdgeId, FieldStore, GridId};
use slipstep_engine::{
    ConfigError, CoupledSimulation, CouplingConfig, ExportLog, RecordingExporter, SimulationConfig,
    UnmappedCellPolicy,
};
use slipstep_grid::geometry::{dot, norm, scale, sub};
use slipstep_grid::GridBucket;
use slipstep_physics::{
    CoulombFriction, DomainParams, FaceTractionMechanics, FrictionParams, MechanicsParams,
    RateSchedule, SinglePhaseFlow, SourceTerm,
};
use slipstep_solver::{FlowSolver, FrictionSolver, MechanicsSolver};
use slipstep_test_utils::fixtures::{
    baseline_store, split_box_bucket, unmapped_bucket, FRACTURE, HOST,
};
use slipstep_test_utils::{OscillatingFriction, PrescribedFlow};

const BASE_APERTURE: f64 = 1e-4;
const SHEAR_STIFFNESS: f64 = 1e10;

// ── Helpers ──────────────────────────────────────────────────────────

fn stressed_mechanics() -> FaceTractionMechanics {
    FaceTractionMechanics::new(MechanicsParams {
        background_stress: [
            [0.0, 0.0, 4.0 * MEGA],
            [0.0, 0.0, 0.0],
            [4.0 * MEGA, 0.0, 10.0 * MEGA],
        ],
        biot_coefficient: 1.0,
        shear_stiffness: SHEAR_STIFFNESS,
    })
    .unwrap()
}

fn dilatant_friction(bucket: &GridBucket) -> CoulombFriction {
    CoulombFriction::new(
        FrictionParams::new(0.6, SHEAR_STIFFNESS).with_dilation_angle(degrees(5.0)),
        bucket,
    )
    .unwrap()
}

fn simulation(
    bucket: GridBucket,
    flow: Box<dyn FlowSolver>,
    coupling: CouplingConfig,
) -> (CoupledSimulation, ExportLog) {
    let (exporter, log) = RecordingExporter::new(&[names::APERTURE, names::IS_SLIPPING]);
    let friction = dilatant_friction(&bucket);
    let config = SimulationConfig {
        store: baseline_store(&bucket, BASE_APERTURE),
        flow,
        mechanics: Box::new(stressed_mechanics()),
        friction: Box::new(friction),
        exporter: Box::new(exporter),
        coupling,
        bucket,
    };
    (CoupledSimulation::new(config).unwrap(), log)
}

/// Two fracture cells; cell 0 at `pressure`, cell 1 at zero.
fn pressurised(pressure: f64, coupling: CouplingConfig) -> (CoupledSimulation, ExportLog) {
    let bucket = split_box_bucket(2, 1, 2);
    let flow = PrescribedFlow::new(&bucket).with_pressure(FRACTURE, vec![pressure, 0.0]);
    simulation(bucket, Box::new(flow), coupling)
}

fn slipping_faces_of_cell(sim: &CoupledSimulation, cell: usize) -> Vec<bool> {
    let (_, edge) = sim.bucket().edge_to(FRACTURE).unwrap();
    edge.face_cells()
        .faces_of_cell(cell)
        .iter()
        .map(|&f| sim.friction().is_slipping()[f as usize])
        .collect()
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn below_threshold_single_iteration_and_unchanged_aperture() {
    let (mut sim, log) = pressurised(0.0, CouplingConfig::new(1.0, 1.0));
    let summary = sim.run().unwrap();

    assert_eq!(summary.steps, 1);
    assert_eq!(summary.slip_iterations, 1);
    assert_eq!(sim.last_metrics().slipping_faces, 0);
    assert_eq!(
        sim.store().get(FRACTURE, names::APERTURE).unwrap(),
        &[BASE_APERTURE, BASE_APERTURE]
    );
    assert_eq!(log.time_series(), Some(vec![0.0, 1.0]));
}

#[test]
fn above_threshold_slips_and_opens_the_cell() {
    let (mut sim, log) = pressurised(5.0 * MEGA, CouplingConfig::new(1.0, 1.0));
    let summary = sim.run().unwrap();

    // Both sides of cell 0 slip; cell 1 stays locked.
    assert_eq!(slipping_faces_of_cell(&sim, 0), vec![true, true]);
    assert_eq!(slipping_faces_of_cell(&sim, 1), vec![false, false]);
    assert_eq!(sim.last_metrics().slipping_faces, 2);
    assert_eq!(summary.slip_iterations, 2);

    // Threshold 0.6 * 5 MPa = 3 MPa against 4 MPa shear: 1e-4 m of slip.
    let change = sim.store().get(FRACTURE, names::APERTURE_CHANGE).unwrap();
    let expected = 1e-4 * degrees(5.0).tan();
    assert!((change[0] - expected).abs() < 1e-12, "change {change:?}");
    assert_eq!(change[1], 0.0);
    let aperture = sim.store().get(FRACTURE, names::APERTURE).unwrap();
    assert!(aperture[0] > BASE_APERTURE);
    assert_eq!(aperture[1], BASE_APERTURE);
    assert_eq!(sim.flow().read_field(FRACTURE, names::APERTURE), Some(aperture));

    assert_eq!(summary.times, vec![0.0, 1.0]);
    let steps = log.steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].field(FRACTURE, names::APERTURE), Some(&[BASE_APERTURE; 2][..]));
    assert_eq!(steps[1].field(FRACTURE, names::APERTURE), Some(aperture));
}

#[test]
fn converged_traction_sits_within_the_coulomb_limit() {
    let (mut sim, _log) = pressurised(6.0 * MEGA, CouplingConfig::new(1.0, 1.0));
    sim.step().unwrap();

    let host = sim.bucket().grid(sim.host()).unwrap();
    let traction = sim.store().get(HOST, names::TRACTION).unwrap();
    let flags = sim.friction().is_slipping();
    assert!(flags.iter().any(|s| *s));
    for f in (0..host.num_faces()).filter(|&f| flags[f]) {
        let n = host.face_normal(f);
        let t = [traction[3 * f], traction[3 * f + 1], traction[3 * f + 2]];
        let sigma_n = dot(t, n);
        let tau = norm(sub(t, scale(n, sigma_n)));
        let strength = 0.6 * sigma_n.max(0.0);
        assert!(
            (tau - strength).abs() <= 1e-6 * strength,
            "face {f}: |tau| = {tau:e}, strength = {strength:e}"
        );
    }
}

#[test]
fn mismatched_shear_stiffness_is_rejected() {
    let bucket = split_box_bucket(2, 1, 2);
    let friction =
        CoulombFriction::new(FrictionParams::new(0.6, SHEAR_STIFFNESS / 10.0), &bucket).unwrap();
    let flow = PrescribedFlow::new(&bucket).with_pressure(FRACTURE, vec![5.0 * MEGA, 0.0]);
    let config = SimulationConfig {
        store: baseline_store(&bucket, BASE_APERTURE),
        flow: Box::new(flow),
        mechanics: Box::new(stressed_mechanics()),
        friction: Box::new(friction),
        exporter: Box::new(RecordingExporter::all().0),
        coupling: CouplingConfig::new(1.0, 1.0),
        bucket,
    };
    assert_eq!(
        CoupledSimulation::new(config).unwrap_err(),
        ConfigError::StiffnessMismatch {
            mechanics: SHEAR_STIFFNESS,
            friction: SHEAR_STIFFNESS / 10.0
        }
    );
}

#[test]
fn relieved_fracture_stays_put_on_later_steps() {
    let (mut sim, _log) = pressurised(5.0 * MEGA, CouplingConfig::new(1.0, 3.0));
    sim.step().unwrap();
    let after_first = sim.store().get(FRACTURE, names::APERTURE).unwrap().to_vec();

    let second = sim.step().unwrap();
    assert_eq!(second.metrics.slip_iterations, 1);
    assert_eq!(second.metrics.slipping_faces, 0);
    assert_eq!(sim.store().get(FRACTURE, names::APERTURE).unwrap(), after_first.as_slice());
    assert_eq!(sim.times(), &[0.0, 1.0, 2.0]);
}

#[test]
fn converged_traction_produces_no_new_slip() {
    let (mut sim, _log) = pressurised(5.0 * MEGA, CouplingConfig::new(1.0, 1.0));
    sim.step().unwrap();

    let traction = sim.store().get(HOST, names::TRACTION).unwrap().to_vec();
    let flags = sim.friction().is_slipping().to_vec();
    let slip = sim.friction().slip_distance().to_vec();

    // Replay the converged traction against a model in the converged state.
    let bucket = split_box_bucket(2, 1, 2);
    let host = bucket.host().unwrap().1;
    let mut friction = dilatant_friction(&bucket);
    let mut load = stressed_mechanics();
    let mut store = FieldStore::new();
    store.insert_cells(FRACTURE, names::PRESSURE, vec![5.0 * MEGA, 0.0]);
    slipstep_engine::cells_to_faces(&bucket, &mut store, names::PRESSURE).unwrap();
    load.discretize(&bucket).unwrap();
    for _ in 0..2 {
        load.solve(&bucket, &store, true).unwrap();
        let t = load.read_traction().to_vec();
        friction.step(host, &t).unwrap();
        load.set_slip_distance(friction.slip_distance()).unwrap();
    }
    assert!(!friction.step(host, &traction).unwrap());
    assert_eq!(friction.is_slipping(), flags.as_slice());
    assert_eq!(friction.slip_distance(), slip.as_slice());
}

#[test]
fn aperture_grows_with_pressure() {
    let mut last = BASE_APERTURE;
    for p in [4.0, 5.0, 6.0] {
        let (mut sim, _log) = pressurised(p * MEGA, CouplingConfig::new(1.0, 1.0));
        sim.run().unwrap();
        let a = sim.store().get(FRACTURE, names::APERTURE).unwrap()[0];
        assert!(a > last, "p = {p} MPa: aperture {a} not above {last}");
        last = a;
    }
}

// ── Failure modes ────────────────────────────────────────────────────

#[test]
fn oscillating_friction_hits_the_iteration_cap() {
    let bucket = split_box_bucket(2, 1, 2);
    let faces = bucket.host().unwrap().1.num_faces();
    let config = SimulationConfig {
        store: baseline_store(&bucket, BASE_APERTURE),
        flow: Box::new(PrescribedFlow::new(&bucket)),
        mechanics: Box::new(stressed_mechanics()),
        friction: Box::new(OscillatingFriction::new(faces)),
        exporter: Box::new(RecordingExporter::all().0),
        coupling: CouplingConfig::new(1.0, 1.0).with_max_slip_iterations(5),
        bucket,
    };
    let mut sim = CoupledSimulation::new(config).unwrap();
    let err = sim.run().unwrap_err();
    assert_eq!(err.step, 1);
    match err.kind {
        CouplingError::SlipNotConverged {
            iterations,
            newly_slipping,
        } => {
            assert_eq!(iterations, 5);
            assert!(newly_slipping > 0);
        }
        other => panic!("expected SlipNotConverged, got {other:?}"),
    }
    assert_eq!(sim.times(), &[0.0]);
}

#[test]
fn unmapped_cell_fails_by_default() {
    let bucket = unmapped_bucket();
    let flow = PrescribedFlow::new(&bucket);
    let (mut sim, _log) = simulation(bucket, Box::new(flow), CouplingConfig::new(1.0, 1.0));
    let err = sim.step().unwrap_err();
    assert_eq!(
        err.kind,
        CouplingError::UnmappedCell {
            grid: GridId(1),
            cell: 1
        }
    );
    assert_eq!((err.step, err.time), (1, 1.0));
}

#[test]
fn unmapped_cell_zero_fill_keeps_baseline() {
    let bucket = unmapped_bucket();
    let flow = PrescribedFlow::new(&bucket);
    let coupling = CouplingConfig::new(1.0, 1.0).with_unmapped_cells(UnmappedCellPolicy::Zero);
    let (mut sim, _log) = simulation(bucket, Box::new(flow), coupling);
    sim.run().unwrap();
    assert_eq!(sim.store().get(FRACTURE, names::APERTURE_CHANGE).unwrap(), &[0.0, 0.0]);
    assert_eq!(
        sim.store().get(FRACTURE, names::APERTURE).unwrap(),
        &[BASE_APERTURE, BASE_APERTURE]
    );
}

// ── Reference flow ───────────────────────────────────────────────────

#[test]
fn injection_drives_the_full_loop() {
    let bucket = split_box_bucket(3, 3, 2);
    let source = SourceTerm {
        schedule: RateSchedule::Constant(1e-3),
        cells: vec![4],
    };
    let flow = SinglePhaseFlow::new(
        &bucket,
        vec![
            DomainParams::matrix(),
            DomainParams::injection(BASE_APERTURE, source),
        ],
    )
    .unwrap();
    let (mut sim, log) = simulation(bucket, Box::new(flow), CouplingConfig::new(1.0, 3.0));
    let summary = sim.run().unwrap();

    assert_eq!(summary.steps, 3);
    assert_eq!(summary.times, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(log.len(), 4);
    let p = sim.store().get(FRACTURE, names::PRESSURE).unwrap();
    assert!(p[4] > 0.0);
    assert!(p[4] >= p[0]);
    assert!(sim.store().contains(HOST, names::PRESSURE));
    assert!(sim.store().contains(EdgeId(0), names::INTERFACE_FLUX));
}
