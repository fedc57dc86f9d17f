//! Linear normalization of raw trait values into an energy distribution.
//!
//! Pipeline: z-score -> ReLU -> L1. Inputs whose variance falls below the
//! flatness threshold carry no ranking signal and take the perturbed-uniform
//! fallback instead.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::distribution::{AXES, EnergyDistribution};
use super::uniform::UniformSource;
use crate::error::{OracleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizerParams {
    /// Population variance below which the input counts as flat.
    pub variance_threshold: f64,
    /// Half-width of the multiplicative jitter applied on the flat path,
    /// at most [`MAX_NOISE_AMPLITUDE`].
    pub noise_amplitude: f64,
}

/// Largest accepted flat-path jitter half-width.
pub const MAX_NOISE_AMPLITUDE: f64 = 0.5;

impl Default for NormalizerParams {
    fn default() -> Self {
        Self {
            variance_threshold: 0.01,
            noise_amplitude: 0.05,
        }
    }
}

/// Normalized output plus a record of which path produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub distribution: EnergyDistribution,
    pub variance: f64,
    /// True when the flat-input perturbation was applied.
    pub perturbed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VectorNormalizer {
    params: NormalizerParams,
}

impl VectorNormalizer {
    pub fn new(params: NormalizerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &NormalizerParams {
        &self.params
    }

    /// Draws exactly `AXES` values from `rng` on the flat path and none
    /// otherwise.
    pub fn normalize<U: UniformSource + ?Sized>(
        &self,
        values: &[f64; AXES],
        rng: &mut U,
    ) -> Result<Normalized> {
        check_finite(values)?;
        let variance = population_variance(values);

        if variance < self.params.variance_threshold {
            let amp = self.params.noise_amplitude;
            let mut jittered = [0.0; AXES];
            for w in jittered.iter_mut() {
                *w = 1.0 + amp * (2.0 * rng.next_unit() - 1.0);
            }
            debug!(
                target: "normalize",
                variance,
                amplitude = amp,
                "flat input, using perturbed uniform"
            );
            return Ok(Normalized {
                distribution: EnergyDistribution::from_weights(jittered),
                variance,
                perturbed: true,
            });
        }

        let mut z = standardize(values);
        for v in z.iter_mut() {
            *v = v.max(0.0);
        }
        Ok(Normalized {
            distribution: EnergyDistribution::from_weights(z),
            variance,
            perturbed: false,
        })
    }
}

pub(crate) fn check_finite(values: &[f64; AXES]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(OracleError::NonFinite {
            axis: format!("axis {i}"),
            value: values[i],
        }),
        None => Ok(()),
    }
}

pub fn mean(values: &[f64; AXES]) -> f64 {
    values.iter().sum::<f64>() / AXES as f64
}

pub fn population_variance(values: &[f64; AXES]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / AXES as f64
}

/// Zero mean, unit variance. All zeros when the standard deviation is 0.
pub fn standardize(values: &[f64; AXES]) -> [f64; AXES] {
    let m = mean(values);
    let std = population_variance(values).sqrt();
    if std == 0.0 || !std.is_finite() {
        return [0.0; AXES];
    }
    let mut out = [0.0; AXES];
    for (o, v) in out.iter_mut().zip(values.iter()) {
        *o = (v - m) / std;
    }
    out
}
