//! Temperature softmax over standardized trait values.
//!
//! Lower temperatures give sharper distributions; category profiles use this
//! to express how decisive a reading should be.

use tracing::debug;

use super::distribution::{AXES, EnergyDistribution};
use super::normalize::{NormalizerParams, check_finite, population_variance, standardize};
use super::uniform::UniformSource;
use crate::error::{OracleError, Result};

/// Amplitude of the noise injected before the single softmax retry.
const RETRY_NOISE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyOutcome {
    pub distribution: EnergyDistribution,
    pub temperature: f64,
    /// True when the first exponential sum was unusable and noise was injected.
    pub retried: bool,
    /// True when the retry also failed and the uniform distribution was used.
    pub fell_back: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyDistributionEngine {
    params: NormalizerParams,
}

impl EnergyDistributionEngine {
    pub fn new(params: NormalizerParams) -> Self {
        Self { params }
    }

    /// Standardize `values` (zeros when flat) and apply the temperature softmax.
    pub fn distribute<U: UniformSource + ?Sized>(
        &self,
        values: &[f64; AXES],
        temperature: f64,
        rng: &mut U,
    ) -> Result<EnergyOutcome> {
        check_finite(values)?;
        let z = if population_variance(values) < self.params.variance_threshold {
            [0.0; AXES]
        } else {
            standardize(values)
        };
        softmax_with_retry(&z, temperature, rng)
    }
}

/// Numerically stable softmax. `None` when the exponential sum is unusable.
pub fn softmax(values: &[f64; AXES], temperature: f64) -> Option<[f64; AXES]> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut exps = [0.0; AXES];
    for (e, v) in exps.iter_mut().zip(values.iter()) {
        *e = ((v - max) / temperature).exp();
    }
    let sum: f64 = exps.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        return None;
    }
    for e in exps.iter_mut() {
        *e /= sum;
    }
    Some(exps)
}

/// Softmax that injects noise and retries once when the sum degenerates.
/// Draws `AXES` values only on the retry.
pub fn softmax_with_retry<U: UniformSource + ?Sized>(
    values: &[f64; AXES],
    temperature: f64,
    rng: &mut U,
) -> Result<EnergyOutcome> {
    if !temperature.is_finite() || temperature <= 0.0 {
        return Err(OracleError::InvalidTemperature(temperature));
    }
    if let Some(p) = softmax(values, temperature) {
        return Ok(EnergyOutcome {
            distribution: EnergyDistribution::from_weights(p),
            temperature,
            retried: false,
            fell_back: false,
        });
    }

    let mut noisy = *values;
    for v in noisy.iter_mut() {
        let jitter = RETRY_NOISE * (2.0 * rng.next_unit() - 1.0);
        *v = if v.is_finite() { *v + jitter } else { jitter };
    }
    debug!(
        target: "energy",
        temperature,
        "softmax sum degenerate, retrying with noise"
    );
    match softmax(&noisy, temperature) {
        Some(p) => Ok(EnergyOutcome {
            distribution: EnergyDistribution::from_weights(p),
            temperature,
            retried: true,
            fell_back: false,
        }),
        None => Ok(EnergyOutcome {
            distribution: EnergyDistribution::uniform(),
            temperature,
            retried: true,
            fell_back: true,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::concentration::ConcentrationMetrics;
    use crate::core::uniform::ScriptedUniform;

    fn skewed() -> [f64; AXES] {
        [9.0, 4.0, 3.0, 2.0, 2.0, 1.0, 1.0, 0.0]
    }

    #[test]
    fn lower_temperature_is_sharper() {
        let engine = EnergyDistributionEngine::default();
        let mut rng = ScriptedUniform::new(vec![0.5]);
        let cold = engine.distribute(&skewed(), 0.5, &mut rng).unwrap();
        let warm = engine.distribute(&skewed(), 2.0, &mut rng).unwrap();
        let hc = ConcentrationMetrics::analyze(&cold.distribution).herfindahl;
        let hw = ConcentrationMetrics::analyze(&warm.distribution).herfindahl;
        assert!(hc > hw, "cold {hc} should exceed warm {hw}");
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn flat_input_is_uniform() {
        let engine = EnergyDistributionEngine::default();
        let mut rng = ScriptedUniform::new(vec![0.5]);
        let out = engine.distribute(&[4.0; AXES], 1.0, &mut rng).unwrap();
        for axis in 0..AXES {
            assert!((out.distribution.get(axis) - 0.125).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_bad_temperature() {
        let engine = EnergyDistributionEngine::default();
        let mut rng = ScriptedUniform::new(vec![0.5]);
        for t in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                engine.distribute(&skewed(), t, &mut rng),
                Err(OracleError::InvalidTemperature(_))
            ));
        }
    }

    #[test]
    fn degenerate_sum_retries_then_falls_back() {
        let mut rng = ScriptedUniform::new(vec![0.25]);
        let values = [f64::NAN; AXES];
        let out = softmax_with_retry(&values, 1.0, &mut rng).unwrap();
        assert!(out.retried);
        assert!(!out.fell_back);
        assert_eq!(rng.consumed(), AXES);
        assert!(out.distribution.is_valid());
    }
}
