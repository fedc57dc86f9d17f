use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sixlines::core::concentration::ConcentrationMetrics;
use sixlines::core::distribution::{AXES, EnergyDistribution};
use sixlines::core::energy::EnergyDistributionEngine;
use sixlines::core::normalize::{NormalizerParams, VectorNormalizer};

fn assert_concentration_in_bounds(p: &EnergyDistribution) {
    let m = ConcentrationMetrics::analyze(p);
    let eps = 1e-12;
    assert!(
        (0.125 - eps..=1.0 + eps).contains(&m.herfindahl),
        "herfindahl {} for {p:?}",
        m.herfindahl
    );
    assert!(
        (0.0..=1.0).contains(&m.herfindahl_norm),
        "herfindahl_norm {} for {p:?}",
        m.herfindahl_norm
    );
}

fn random_traits(rng: &mut StdRng) -> [f64; AXES] {
    let scale = [1.0, 10.0, 100.0, 1e6][rng.random_range(0..4)];
    let mut v = [0.0; AXES];
    for x in v.iter_mut() {
        *x = rng.random::<f64>() * scale;
    }
    v
}

#[test]
fn relu_path_sums_to_one_without_negatives() {
    let normalizer = VectorNormalizer::default();
    let mut inputs = StdRng::seed_from_u64(11);
    let mut draws = StdRng::seed_from_u64(12);
    for _ in 0..500 {
        let traits = random_traits(&mut inputs);
        let out = normalizer.normalize(&traits, &mut draws).unwrap();
        let p = out.distribution.as_array();
        assert!((p.iter().sum::<f64>() - 1.0).abs() <= 1e-9, "{traits:?} -> {p:?}");
        assert!(p.iter().all(|x| *x >= 0.0 && x.is_finite()));
        assert_concentration_in_bounds(&out.distribution);
    }
}

#[test]
fn softmax_path_sums_to_one_at_every_temperature() {
    let engine = EnergyDistributionEngine::new(NormalizerParams::default());
    let mut inputs = StdRng::seed_from_u64(21);
    let mut draws = StdRng::seed_from_u64(22);
    for t in [0.05, 0.8, 1.0, 1.2, 10.0] {
        for _ in 0..100 {
            let traits = random_traits(&mut inputs);
            let out = engine.distribute(&traits, t, &mut draws).unwrap();
            assert!(out.distribution.is_valid());
            assert_concentration_in_bounds(&out.distribution);
        }
    }
}

#[test]
fn flat_input_is_near_uniform_with_low_concentration() {
    let normalizer = VectorNormalizer::default();
    let mut rng = StdRng::seed_from_u64(5);
    let out = normalizer.normalize(&[10.0; AXES], &mut rng).unwrap();
    assert!(out.perturbed);
    for p in out.distribution.as_array() {
        assert!((p - 0.125).abs() < 0.02, "{p}");
    }
    let m = ConcentrationMetrics::analyze(&out.distribution);
    assert!(m.herfindahl_norm < 0.01);
}

#[test]
fn one_dominant_axis_is_fully_concentrated() {
    let normalizer = VectorNormalizer::default();
    let mut rng = StdRng::seed_from_u64(5);
    let out = normalizer
        .normalize(&[100.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], &mut rng)
        .unwrap();
    assert!(!out.perturbed);
    let m = ConcentrationMetrics::analyze(&out.distribution);
    assert!((m.herfindahl_norm - 1.0).abs() < 1e-12);
    assert_eq!(m.entropy, 0.0);
}
