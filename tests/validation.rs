// tests/validation.rs
//
// Physics and interface checks on the public API.
// Run with: cargo test
// Or only these tests: cargo test --test validation

use std::fs;
use std::path::PathBuf;

use vortex_field::fft::Planning;
use vortex_field::params::hc2_from_xi;
use vortex_field::wisdom::Wisdom;
use vortex_field::{
    build_calculator, FieldCalculator, LondonModel, LondonModelCalculator, ModelKind, NglModel,
    NglModelCalculator, NglSettings, VortexParams,
};

fn rel_close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * b.abs().max(1e-300)
}

fn scratch(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("vortex_field_validation_{}_{}", std::process::id(), name));
    p
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

#[test]
fn london_moderate_field() {
    let mut calc = LondonModelCalculator::new(LondonModel::triangular(), 64, None);
    calc.set_parameters(VortexParams::new(100.0, 150.0, 5.0));

    let bmax = calc.b_max();
    let bmin = calc.b_min();
    let data = calc.data_b().to_vec();

    assert_eq!(data.len(), 64 * 64);
    assert!(rel_close(mean(&data), 100.0, 0.01), "mean {}", mean(&data));
    assert!(bmax > 100.0, "core field {bmax}");
    assert!(bmin >= 0.0 && bmin < 100.0, "minimum {bmin}");

    let grid_max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert!(rel_close(bmax, grid_max, 1e-12));
}

#[test]
fn ngl_converges_and_softens_the_core() {
    let p = VortexParams::new(100.0, 150.0, 5.0);

    let mut ngl = NglModelCalculator::new(NglModel::default(), 64, None);
    ngl.set_parameters(p);
    let mut london = LondonModelCalculator::new(LondonModel::triangular(), 64, None);
    london.set_parameters(p);

    let report = ngl
        .calculate_grid()
        .convergence
        .expect("iterative model reports convergence");
    assert!(report.converged);
    assert!(report.iterations < 100, "took {} passes", report.iterations);

    let data = ngl.data_b().to_vec();
    assert!(rel_close(mean(&data), 100.0, 0.01));

    let (n_max, n_min) = (ngl.b_max(), ngl.b_min());
    let (l_max, l_min) = (london.b_max(), london.b_min());
    assert!(n_min >= 0.0);
    // finite core size caps the peak
    assert!(n_max > 100.0 && n_max < l_max, "ngl {n_max} london {l_max}");
    // away from the cores both models agree to within the grid's resolution
    assert!(rel_close(n_min, l_min, 0.15), "ngl {n_min} london {l_min}");
}

#[test]
fn above_hc2_both_models_are_uniform() {
    let field = 1.06 * hc2_from_xi(5.0);
    for kind in [ModelKind::London, ModelKind::Ngl] {
        let mut calc = build_calculator(kind, 32, NglSettings::default(), None);
        calc.set_parameters(VortexParams::new(field, 150.0, 5.0));
        assert!(
            calc.data_b().iter().all(|&b| b == field),
            "{} not uniform",
            calc.model_name()
        );
        assert_eq!(calc.b_max(), field);
        assert_eq!(calc.b_min(), field);
    }
}

#[test]
fn repeated_queries_reuse_the_cached_grid() {
    for kind in ModelKind::ALL {
        let mut calc = build_calculator(kind, 32, NglSettings::default(), None);
        calc.set_parameters(VortexParams::new(3000.0, 120.0, 8.0));
        assert!(!calc.grid_exists());

        let first_ptr = calc.calculate_grid() as *const _;
        let first = calc.data_b().to_vec();
        assert!(calc.grid_exists());

        let second_ptr = calc.calculate_grid() as *const _;
        assert_eq!(first_ptr, second_ptr, "{}", calc.model_name());
        let again = calc.data_b().to_vec();
        assert!(first
            .iter()
            .zip(&again)
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }
}

#[test]
fn new_parameters_invalidate_without_computing() {
    let mut calc = LondonModelCalculator::new(LondonModel::triangular(), 32, None);
    calc.set_parameters(VortexParams::new(1000.0, 100.0, 5.0));
    let before = calc.b_max();
    assert!(calc.grid_exists());

    calc.set_parameters(VortexParams::new(2000.0, 100.0, 5.0));
    assert!(!calc.grid_exists());
    let after = calc.b_max();
    assert!(after > before);
}

#[test]
fn b_max_is_the_grid_maximum_for_every_model() {
    for kind in ModelKind::ALL {
        let mut calc = build_calculator(kind, 32, NglSettings::default(), None);
        calc.set_parameters(VortexParams::new(2000.0, 100.0, 8.0));
        let bmax = calc.b_max();
        let grid_max = calc
            .data_b()
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(
            rel_close(bmax, grid_max, 1e-9),
            "{}: {bmax} vs {grid_max}",
            calc.model_name()
        );
        assert!(calc.b_min() >= 0.0);
    }
}

#[test]
fn degenerate_inputs_fall_back_to_uniform() {
    let cases = [
        VortexParams::new(0.0, 150.0, 5.0),
        VortexParams::new(100.0, 0.0, 5.0),
        VortexParams::new(100.0, 150.0, 0.0),
    ];
    for p in cases {
        for kind in [ModelKind::London, ModelKind::Ngl] {
            let mut calc = build_calculator(kind, 16, NglSettings::default(), None);
            calc.set_parameters(p);
            let field = p.field;
            assert!(
                calc.data_b().iter().all(|&b| b == field),
                "{} with {p:?}",
                calc.model_name()
            );
        }
    }
}

#[test]
fn parameters_from_slice() {
    let p = VortexParams::from_slice(&[-250.0, 120.0, 4.0, 99.0]).unwrap();
    assert_eq!(p, VortexParams::new(250.0, 120.0, 4.0));
    assert!(VortexParams::from_slice(&[1.0, 2.0]).is_err());
}

#[test]
fn steps_are_rounded_per_model() {
    let london = build_calculator(ModelKind::London, 33, NglSettings::default(), None);
    let ngl = build_calculator(ModelKind::Ngl, 33, NglSettings::default(), None);
    assert_eq!(london.steps(), 34);
    assert_eq!(ngl.steps(), 36);
}

#[test]
fn wisdom_file_switches_to_exhaustive_planning() {
    let path = scratch("wisdom.json");
    let _ = fs::remove_file(&path);

    // no file: estimate planning, nothing written
    let calc = LondonModelCalculator::new(LondonModel::triangular(), 16, Some(path.as_path()));
    assert_eq!(calc.fft().planning(), Planning::Estimate);
    drop(calc);
    assert!(!path.exists());

    // an empty table on disk is still wisdom
    drop(Wisdom::load_or_create(&path));
    assert!(path.exists());

    {
        let calc = LondonModelCalculator::new(LondonModel::triangular(), 16, Some(path.as_path()));
        assert_eq!(calc.fft().planning(), Planning::Exhaustive);
    }
    // exported on drop with the measured length recorded
    let w = Wisdom::load(&path).unwrap();
    assert!(w.get(16).is_some());
    drop(w);

    fs::remove_file(&path).unwrap();
}
