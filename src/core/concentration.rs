//! Concentration statistics over an energy distribution.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::distribution::{AXES, EnergyDistribution};

/// Herfindahl index of the uniform distribution over eight axes.
pub const HERFINDAHL_FLOOR: f64 = 1.0 / AXES as f64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConcentrationMetrics {
    /// Sum of squared probabilities, in `[0.125, 1]`.
    pub herfindahl: f64,
    /// Herfindahl rescaled onto `[0, 1]`.
    pub herfindahl_norm: f64,
    /// Shannon entropy in nats, in `[0, ln 8]`.
    pub entropy: f64,
    /// `p1 / (p1 + p2)` of the two largest weights; 0.5 on a tie.
    pub top_ratio: f64,
    /// `p1 - p2`.
    pub gap: f64,
    pub max_value: f64,
    pub second_value: f64,
}

impl ConcentrationMetrics {
    pub fn analyze(dist: &EnergyDistribution) -> Self {
        let p = dist.as_array();
        let herfindahl = p
            .iter()
            .map(|v| v * v)
            .sum::<f64>()
            .clamp(HERFINDAHL_FLOOR, 1.0);
        let herfindahl_norm =
            ((herfindahl - HERFINDAHL_FLOOR) / (1.0 - HERFINDAHL_FLOOR)).clamp(0.0, 1.0);
        let entropy = p
            .iter()
            .filter(|v| **v > 0.0)
            .map(|v| -v * v.ln())
            .sum::<f64>()
            .max(0.0);

        let ranked = dist.ranked();
        let max_value = p[ranked[0]];
        let second_value = p[ranked[1]];
        let pair = max_value + second_value;
        let top_ratio = if pair > 0.0 { max_value / pair } else { 0.5 };

        Self {
            herfindahl,
            herfindahl_norm,
            entropy,
            top_ratio,
            gap: max_value - second_value,
            max_value,
            second_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_minimally_concentrated() {
        let m = ConcentrationMetrics::analyze(&EnergyDistribution::uniform());
        assert!((m.herfindahl - 0.125).abs() < 1e-12);
        assert!(m.herfindahl_norm.abs() < 1e-12);
        assert!((m.entropy - (8.0f64).ln()).abs() < 1e-12);
        assert_eq!(m.top_ratio, 0.5);
        assert_eq!(m.gap, 0.0);
    }

    #[test]
    fn one_hot_is_maximally_concentrated() {
        let mut w = [0.0; AXES];
        w[5] = 3.0;
        let m = ConcentrationMetrics::analyze(&EnergyDistribution::from_weights(w));
        assert_eq!(m.herfindahl, 1.0);
        assert_eq!(m.herfindahl_norm, 1.0);
        assert_eq!(m.entropy, 0.0);
        assert_eq!(m.top_ratio, 1.0);
        assert_eq!(m.gap, 1.0);
        assert_eq!(m.second_value, 0.0);
    }

    #[test]
    fn tie_at_top_is_well_defined() {
        let w = [0.3, 0.3, 0.1, 0.1, 0.1, 0.1, 0.0, 0.0];
        let m = ConcentrationMetrics::analyze(&EnergyDistribution::from_weights(w));
        assert!((m.top_ratio - 0.5).abs() < 1e-12);
        assert!(m.gap.abs() < 1e-12);
    }
}
