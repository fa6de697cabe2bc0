use num_complex::Complex64;
use specular_core::domain::{BackgroundMode, CalcStrategy, Orientation};
use specular_core::modules::dispatch::CalculationControls;
use specular_core::modules::params::{ParameterGroup, ParameterSet};
use specular_core::modules::stack::{Contrast, ContrastData, LayerSpec};
use specular_core::setup::ExperimentSetup;

fn scalar_group(name: &str, value: f64, limits: (f64, f64)) -> ParameterGroup {
    ParameterGroup {
        names: vec![name.to_string()],
        values: vec![value],
        fitted: vec![false],
        limits: vec![limits],
    }
}

/// Silicon-like reference sample: oxide plus a thicker film against D2O-level
/// contrast, with every interface sharing one roughness value.
fn reference_setup() -> ExperimentSetup {
    let layers = vec![
        LayerSpec {
            name: "oxide".to_string(),
            thickness: 1,
            sld_real: 2,
            sld_imag: None,
            roughness: 0,
            coverage: None,
        },
        LayerSpec {
            name: "film".to_string(),
            thickness: 3,
            sld_real: 4,
            sld_imag: None,
            roughness: 0,
            coverage: None,
        },
    ];

    let mut parameters = ParameterSet::default();
    parameters.layers = ParameterGroup {
        names: vec![
            "roughness".to_string(),
            "oxide thickness".to_string(),
            "oxide sld".to_string(),
            "film thickness".to_string(),
            "film sld".to_string(),
        ],
        values: vec![3.0, 10.0, 2.0e-6, 50.0, 4.0e-6],
        fitted: vec![true, true, false, true, false],
        limits: vec![
            (1.0, 8.0),
            (5.0, 20.0),
            (1.0e-6, 3.0e-6),
            (20.0, 80.0),
            (3.0e-6, 5.0e-6),
        ],
    };
    parameters.backgrounds = scalar_group("background", 0.0, (0.0, 1.0e-4));
    parameters.scale_factors = scalar_group("scale", 1.0, (0.5, 2.0));
    parameters.q_shifts = scalar_group("q shift", 0.0, (-0.01, 0.01));
    parameters.bulk_in = scalar_group("air", 0.0, (0.0, 0.0));
    parameters.bulk_out = scalar_group("solvent", 1.0e-6, (0.0, 7.0e-6));
    parameters.resolutions = scalar_group("resolution", 0.0, (0.0, 0.1));

    let contrast = Contrast {
        name: "reference".to_string(),
        layer_order: vec![0, 1],
        orientation: Orientation::MediumToSubstrate,
        background: 0,
        background_mode: BackgroundMode::Additive,
        scale: 0,
        q_shift: 0,
        bulk_in: 0,
        bulk_out: 0,
        resolution: 0,
        substrate_roughness: 0,
        data: Some(ContrastData {
            q: vec![0.01, 0.02, 0.05, 0.1],
            intensity: vec![0.1, 0.01, 1.0e-4, 1.0e-6],
            uncertainty: vec![0.01, 1.0e-3, 1.0e-5, 1.0e-7],
            background_profile: None,
            sim_limits: (0.001, 0.5),
        }),
    };

    ExperimentSetup {
        layers,
        contrasts: vec![contrast],
        parameters,
        controls: CalculationControls::default(),
    }
}

fn fresnel_closed_form(q: f64, bulk_in: f64, bulk_out: f64) -> f64 {
    let four_pi = 4.0 * std::f64::consts::PI;
    let k0 = Complex64::new(0.5 * q, 0.0);
    let k1 = (k0 * k0 - four_pi * Complex64::new(bulk_out - bulk_in, 0.0)).sqrt();
    ((k0 - k1) / (k0 + k1)).norm_sqr()
}

#[test]
fn reference_sample_reproduces_the_pinned_reflectivity() {
    let evaluator = reference_setup().into_evaluator().expect("valid setup");
    let mut evaluator = evaluator;
    evaluator.evaluate_current().expect("forward model runs");

    let evaluation = evaluator.last_evaluation().expect("evaluation retained");
    let result = &evaluation.contrasts[0];

    assert_eq!(result.simulated_q, vec![0.01, 0.02, 0.05, 0.1]);
    for pair in result.simulated.windows(2) {
        assert!(pair[0] > pair[1], "curve is not decreasing: {:?}", result.simulated);
    }
    // Pinned against an independent implementation of the recursion.
    assert!((result.simulated[0] - 0.102280717938).abs() < 1.0e-9);
}

#[test]
fn all_dispatch_strategies_agree_on_the_total() {
    let strategies = [
        CalcStrategy::Sequential,
        CalcStrategy::PointsParallel,
        CalcStrategy::ContrastsParallel,
    ];

    let mut totals = Vec::new();
    for strategy in strategies {
        let mut setup = reference_setup();
        setup.controls.strategy = strategy;
        let mut evaluator = setup.into_evaluator().expect("valid setup");
        totals.push(evaluator.evaluate_current().expect("forward model runs"));
    }

    for &total in &totals[1..] {
        assert!(
            (total - totals[0]).abs() <= 1.0e-9 * totals[0].abs().max(1.0),
            "strategies disagree: {totals:?}"
        );
    }
}

#[test]
fn bare_interface_matches_the_closed_form_fresnel_curve() {
    let mut setup = reference_setup();
    setup.contrasts[0].layer_order.clear();
    setup.parameters.layers.values[0] = 0.0;
    setup.parameters.bulk_out.values[0] = 6.35e-6;
    setup.contrasts[0].data = None;

    let mut evaluator = setup.into_evaluator().expect("valid setup");
    evaluator.evaluate_current().expect("forward model runs");

    let result = &evaluator.last_evaluation().expect("evaluation retained").contrasts[0];
    assert_eq!(result.simulated_q.len(), 500);
    for (&q, &actual) in result.simulated_q.iter().zip(&result.simulated) {
        let expected = fresnel_closed_form(q, 0.0, 6.35e-6);
        assert!(
            (expected - actual).abs() <= 1.0e-12 * expected.max(1.0e-30),
            "q={q} expected={expected:.15e} actual={actual:.15e}"
        );
    }
}

#[test]
fn self_consistent_data_scores_zero_chi_squared() {
    let mut setup = reference_setup();
    setup.contrasts[0].layer_order.clear();
    setup.parameters.layers.values[0] = 0.0;
    setup.parameters.bulk_out.values[0] = 6.35e-6;

    let q = vec![0.01, 0.02, 0.05, 0.1];
    let intensity: Vec<f64> = q
        .iter()
        .map(|&qi| fresnel_closed_form(qi, 0.0, 6.35e-6))
        .collect();
    setup.contrasts[0].data = Some(ContrastData {
        q: q.clone(),
        intensity,
        uncertainty: vec![1.0e-3; q.len()],
        background_profile: None,
        sim_limits: (0.001, 0.5),
    });

    let mut evaluator = setup.into_evaluator().expect("valid setup");
    let total = evaluator.evaluate_current().expect("forward model runs");
    assert!(total.abs() < 1.0e-12, "chi-squared is not zero: {total}");
}

#[test]
fn candidate_vectors_drive_the_fitted_slots_end_to_end() {
    let mut evaluator = reference_setup().into_evaluator().expect("valid setup");
    assert_eq!(evaluator.fitted_values(), &[3.0, 10.0, 50.0]);
    assert_eq!(
        evaluator.fitted_names(),
        &["roughness", "oxide thickness", "film thickness"]
    );
    assert_eq!(evaluator.fitted_limits()[1], (5.0, 20.0));

    let baseline = evaluator.evaluate_current().expect("forward model runs");
    let perturbed = evaluator.evaluate(&[3.0, 12.0, 55.0]).expect("forward model runs");
    assert_ne!(baseline, perturbed);

    // Fixed slots are untouched by candidate propagation.
    assert_eq!(evaluator.params().layers.values, vec![3.0, 12.0, 2.0e-6, 55.0, 4.0e-6]);
    assert_eq!(evaluator.params().bulk_out.values, vec![1.0e-6]);

    let restored = evaluator.evaluate(&[3.0, 10.0, 50.0]).expect("forward model runs");
    assert_eq!(restored, baseline);
}

#[test]
fn log_likelihood_is_half_the_negated_chi_squared() {
    let mut evaluator = reference_setup().into_evaluator().expect("valid setup");
    let chi = evaluator.evaluate_current().expect("forward model runs");
    let candidate = evaluator.fitted_values().to_vec();
    let ll = evaluator.log_likelihood(&candidate).expect("forward model runs");
    assert!((ll + 0.5 * chi).abs() <= 1.0e-12 * chi.abs().max(1.0));
}
