use sixlines::core::concentration::ConcentrationMetrics;
use sixlines::oracle::profile::{Category, ProfileTable};
use sixlines::oracle::pure_state::{EntropyAdjustment, PureStateController};

fn metrics(herfindahl_norm: f64, entropy: f64) -> ConcentrationMetrics {
    ConcentrationMetrics {
        herfindahl: 0.125 + 0.875 * herfindahl_norm,
        herfindahl_norm,
        entropy,
        top_ratio: 0.5,
        gap: 0.0,
        max_value: 0.125,
        second_value: 0.125,
    }
}

#[test]
fn alpha_never_decreases_with_concentration() {
    let table = ProfileTable::default();
    for category in Category::ALL {
        let controller =
            PureStateController::new(category, *table.get(category), EntropyAdjustment::default());
        for entropy in [0.5, 1.7, 2.07] {
            let mut prev = f64::NEG_INFINITY;
            for i in 0..=200 {
                let hn = i as f64 / 200.0;
                let alpha = controller.decide(&metrics(hn, entropy)).alpha;
                assert!(alpha >= prev, "{category} entropy {entropy} hn {hn}");
                prev = alpha;
            }
        }
    }
}

#[test]
fn alpha_stays_inside_category_bounds_under_any_multiplier() {
    let table = ProfileTable::default();
    let aggressive = EntropyAdjustment {
        low_entropy_boost: 3.0,
        high_entropy_damping: 0.1,
        ..EntropyAdjustment::default()
    };
    for category in Category::ALL {
        let p = table.get(category);
        for adjustment in [EntropyAdjustment::default(), aggressive] {
            let controller = PureStateController::new(category, *p, adjustment);
            for hn in [0.0, 0.3, 0.7, 1.0] {
                for entropy in [0.0, 1.0, 1.5, 1.9, 2.0, 2.5] {
                    let d = controller.decide(&metrics(hn, entropy));
                    assert!(d.alpha >= p.alpha_min && d.alpha <= p.alpha_max);
                }
            }
        }
    }
}

#[test]
fn extremes_land_on_the_bounds() {
    let table = ProfileTable::default();
    for category in Category::ALL {
        let p = table.get(category);
        let c = PureStateController::new(category, *p, EntropyAdjustment::default());
        assert_eq!(c.decide(&metrics(0.0, 2.079)).alpha, p.alpha_min);
        assert_eq!(c.decide(&metrics(1.0, 0.0)).alpha, p.alpha_max);
    }
}
