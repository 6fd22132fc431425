//! End-to-end checks on a two-winding distribution transformer.

use approx::assert_relative_eq;
use rabin_core::numeric::{integrate, QuadratureSettings};
use rabin_core::{
    CalculationSettings, CoilId, CoilParams, Core, CurrentDirection, Design, Matrix, Phase, RabinError, Region,
};

const INCH: f64 = 0.0254;
const Z_MIN: f64 = 3.5 * INCH;
const Z_MAX: f64 = (3.5 + 41.025) * INCH;
const BASE_VA: f64 = 10e6 / 3.0;
const BASE_CURRENT: f64 = 83.67;

const LV: CoilId = CoilId(0);
const HV: CoilId = CoilId(1);

fn transformer() -> Phase {
    let core = Core::with_window_multiplier(0.2415, 1.26, 2.5).unwrap();
    let settings = CalculationSettings::default();
    let mut phase = Phase::new(core, settings).unwrap();

    let lv = vec![phase.new_section(Z_MIN, Z_MAX, 64.0).unwrap()];
    phase
        .add_coil(
            CoilParams::new("LV", 0.26035, 0.30128, 801.3).with_direction(CurrentDirection::Negative),
            lv,
        )
        .unwrap();
    let hv = vec![phase.new_section(Z_MIN, Z_MAX, 613.0).unwrap()];
    phase.add_coil(CoilParams::new("HV", 0.33938, 0.38448, 83.67), hv).unwrap();
    phase
}

#[test]
fn test_two_winding_matrix() {
    let mut phase = transformer();
    let matrix = phase.build_inductance_matrix().unwrap().clone();

    assert_eq!(matrix.shape(), (2, 2));
    assert!(matrix.test_symmetry());
    assert_relative_eq!(matrix.get(0, 0).unwrap(), 0.008_481_374_215_884, max_relative = 1e-6);
    assert_relative_eq!(matrix.get(1, 1).unwrap(), 0.774_802_889_838_206, max_relative = 1e-6);
    assert_relative_eq!(matrix.get(0, 1).unwrap(), 0.078_059_544_413_742, max_relative = 1e-6);

    assert!(phase.wait_for_validation().is_positive_definite());
}

#[test]
fn test_per_unit_reactance() {
    let mut phase = transformer();
    let pu = phase.leakage_reactance_pu(BASE_VA, BASE_CURRENT).unwrap();
    assert_relative_eq!(pu, 0.045_567_484_845, max_relative = 1e-5);
    assert!((0.01..0.2).contains(&pu));

    assert_relative_eq!(phase.energy().unwrap(), 201.452_512_705, max_relative = 1e-5);
}

#[test]
fn test_mutual_inductance_is_reciprocal() {
    let phase = transformer();
    let (lv, hv) = (phase.coil(LV).unwrap(), phase.coil(HV).unwrap());
    let (a, b) = (&lv.sections()[0], &hv.sections()[0]);
    assert_eq!(
        a.mutual_inductance_to(lv, b, hv).unwrap(),
        b.mutual_inductance_to(hv, a, lv).unwrap()
    );
}

#[test]
fn test_mutual_inductance_checks_parents() {
    let phase = transformer();
    let (lv, hv) = (phase.coil(LV).unwrap(), phase.coil(HV).unwrap());
    let err = lv.sections()[0].mutual_inductance_to(hv, &hv.sections()[0], lv).unwrap_err();
    assert!(matches!(err, RabinError::ParentMismatch { .. }));
}

#[test]
fn test_split_sections_add_up() {
    let mut whole = transformer();
    let reference = whole.build_inductance_matrix().unwrap().clone();

    let mut split = transformer();
    let target = split.coil(HV).unwrap().sections()[0].id();
    split.split_section(target, 4, 0.0).unwrap();
    let matrix = split.build_inductance_matrix().unwrap().clone();
    assert_eq!(matrix.shape(), (5, 5));

    let discs = [1, 2, 3, 4];
    assert_relative_eq!(
        matrix.block_sum(&discs, &discs).unwrap(),
        reference.get(1, 1).unwrap(),
        max_relative = 1e-9
    );
    assert_relative_eq!(
        matrix.block_sum(&[0], &discs).unwrap(),
        reference.get(0, 1).unwrap(),
        max_relative = 1e-9
    );
    assert_eq!(matrix.get(0, 0).unwrap(), reference.get(0, 0).unwrap());
    assert!(split.wait_for_validation().is_positive_definite());
}

#[test]
fn test_two_winding_cross_check() {
    let mut phase = transformer();
    let ratio = 64.0 / 613.0;
    phase.set_coil_current(HV, 801.3 * ratio).unwrap();

    let from_energy = phase.leakage_inductance(801.3).unwrap();
    let from_matrix = phase.two_winding_leakage_inductance(LV, HV).unwrap();
    assert_relative_eq!(from_energy, from_matrix, max_relative = 1e-9);
    assert!(from_matrix > 0.0);
}

#[test]
fn test_cross_check_with_disc_windings() {
    let mut phase = transformer();
    let target = phase.coil(HV).unwrap().sections()[0].id();
    phase.split_section(target, 3, 0.005).unwrap();
    let hv_turns = phase.coil(HV).unwrap().total_turns();
    phase.set_coil_current(HV, 801.3 * 64.0 / hv_turns).unwrap();

    assert_relative_eq!(
        phase.leakage_inductance(801.3).unwrap(),
        phase.two_winding_leakage_inductance(LV, HV).unwrap(),
        max_relative = 1e-9
    );
}

#[test]
fn test_energy_is_positive_for_any_excitation() {
    let mut phase = transformer();
    for (lv, hv) in [(0.0, 10.0), (500.0, 0.0), (801.3, 83.67), (1.0, 1000.0)] {
        for direction in [CurrentDirection::Negative, CurrentDirection::Positive] {
            phase.set_coil_current(LV, lv).unwrap();
            phase.set_coil_current(HV, hv).unwrap();
            phase.set_coil_direction(LV, direction).unwrap();
            assert!(phase.energy().unwrap() >= 0.0);
        }
    }
    assert!(!phase.is_dirty());
}

#[test]
fn test_rejects_winding_inside_core() {
    let core = Core::with_window_multiplier(0.2415, 1.26, 2.5).unwrap();
    let mut phase = Phase::new(core, CalculationSettings::default()).unwrap();
    let sections = vec![phase.new_section(Z_MIN, Z_MAX, 64.0).unwrap()];
    let err = phase
        .add_coil(CoilParams::new("LV", 0.1663, 0.20723, 801.3), sections)
        .unwrap_err();
    assert!(matches!(err, RabinError::InvalidGeometry { .. }));
    assert!(phase.coils().is_empty());
}

#[test]
fn test_mean_vector_potential_links_self_inductance() {
    let mut phase = transformer();
    let self_inductance = phase.build_inductance_matrix().unwrap().get(0, 0).unwrap();

    let coil = phase.coil(LV).unwrap();
    let (r1, r2) = (coil.inner_radius(), coil.outer_radius());
    let current = coil.rated_current() * coil.direction().sign();
    let quadrature = QuadratureSettings::default().with_max_subdivisions(200);

    let linked = integrate(
        |z| coil.mean_vector_potential(Region::Coil, z).unwrap(),
        Z_MIN,
        Z_MAX,
        &quadrature,
    );
    assert!(linked.converged);

    let turns = coil.total_turns();
    let flux_linkage =
        2.0 * std::f64::consts::PI * turns / (coil.radial_build() * (Z_MAX - Z_MIN)) * linked.value * (r2 * r2 - r1 * r1) / 2.0;
    assert_relative_eq!(flux_linkage / current, self_inductance, max_relative = 1e-6);
}

#[test]
fn test_window_multiplier_sweep() {
    let phase = transformer();
    let mut previous = None;
    for multiplier in [2.0, 2.5, 3.0] {
        let mut variant = phase.with_window_multiplier(multiplier).unwrap();
        assert!(variant.is_dirty());
        let pu = variant.leakage_reactance_pu(BASE_VA, BASE_CURRENT).unwrap();
        assert!((0.01..0.2).contains(&pu));
        assert!(variant.wait_for_validation().is_positive_definite());
        if let Some(previous) = previous {
            assert_relative_eq!(pu, previous, max_relative = 0.05);
        }
        previous = Some(pu);
    }
    assert!(matches!(
        phase.with_window_multiplier(1.0),
        Err(RabinError::InvalidWindowMultiplier { .. })
    ));
}

#[test]
fn test_design_file_matches_programmatic_phase() {
    let input = format!(
        r#"
        [core]
        radius = 0.2415
        window_height = 1.26
        window_multiplier = 2.5

        [settings]
        harmonics = 200

        [[coil]]
        name = "LV"
        direction = -1
        inner_radius = 0.26035
        outer_radius = 0.30128
        rated_current = 801.3
        [[coil.section]]
        z_min = {z_min:?}
        z_max = {z_max:?}
        turns = 64

        [[coil]]
        name = "HV"
        inner_radius = 0.33938
        outer_radius = 0.38448
        rated_current = 83.67
        [[coil.section]]
        z_min = {z_min:?}
        z_max = {z_max:?}
        turns = 613
        "#,
        z_min = Z_MIN,
        z_max = Z_MAX
    );

    let mut from_file = Design::parse(&input).unwrap().build().unwrap();
    let mut programmatic = transformer();
    assert_eq!(
        from_file.build_inductance_matrix().unwrap(),
        programmatic.build_inductance_matrix().unwrap()
    );
}

#[test]
fn test_matrix_survives_persistence() {
    let mut phase = transformer();
    let matrix = phase.build_inductance_matrix().unwrap();
    let restored: Matrix<f64> = Matrix::decode(&matrix.encode().unwrap()).unwrap();
    assert_eq!(&restored, matrix);

    let factor = phase.cholesky_factor().unwrap().clone();
    let b = Matrix::from_row_slice(2, 1, &[1.0, 0.0]).unwrap();
    let x = factor.solve_positive_definite(&b).unwrap();
    let back = phase.inductance_matrix().unwrap().multiply(&x).unwrap();
    assert_relative_eq!(back.get(0, 0).unwrap(), 1.0, max_relative = 1e-10);
    assert_relative_eq!(back.get(1, 0).unwrap(), 0.0, epsilon = 1e-10);
}
