//! Probability distribution over the eight trait axes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// Number of trait axes (one per trigram).
pub const AXES: usize = 8;

/// Allowed deviation of a distribution's sum from 1.
pub const SUM_TOLERANCE: f64 = 1e-9;

/// Eight non-negative weights summing to 1.
///
/// Construct through [`EnergyDistribution::from_weights`] or
/// [`EnergyDistribution::uniform`]; both guarantee the invariant.
/// Deserialized vectors are checked, never rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "[f64; AXES]", into = "[f64; AXES]")]
pub struct EnergyDistribution([f64; AXES]);

impl TryFrom<[f64; AXES]> for EnergyDistribution {
    type Error = OracleError;

    fn try_from(p: [f64; AXES]) -> Result<Self, OracleError> {
        Self::try_from_probabilities(p).ok_or_else(|| {
            OracleError::InvalidDistribution(format!(
                "expected {AXES} non-negative weights summing to 1, got {p:?}"
            ))
        })
    }
}

impl From<EnergyDistribution> for [f64; AXES] {
    fn from(d: EnergyDistribution) -> Self {
        d.0
    }
}

impl EnergyDistribution {
    pub fn uniform() -> Self {
        Self([1.0 / AXES as f64; AXES])
    }

    /// L1-normalize non-negative weights. Returns the uniform distribution
    /// when the weights sum to zero or are unusable.
    pub fn from_weights(weights: [f64; AXES]) -> Self {
        let usable = weights.iter().all(|w| w.is_finite() && *w >= 0.0);
        let sum: f64 = weights.iter().sum();
        if !usable || sum <= 0.0 || !sum.is_finite() {
            return Self::uniform();
        }
        let mut out = [0.0; AXES];
        for (o, w) in out.iter_mut().zip(weights.iter()) {
            *o = w / sum;
        }
        Self(out)
    }

    /// Checks an externally supplied probability vector without rescaling it.
    pub fn try_from_probabilities(p: [f64; AXES]) -> Option<Self> {
        let candidate = Self(p);
        candidate.is_valid().then_some(candidate)
    }

    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|v| v.is_finite() && *v >= 0.0)
            && (self.sum() - 1.0).abs() <= SUM_TOLERANCE
    }

    #[inline]
    pub fn get(&self, axis: usize) -> f64 {
        self.0[axis]
    }

    #[inline]
    pub fn as_array(&self) -> &[f64; AXES] {
        &self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Axis indices ordered by descending weight; ties keep axis order.
    pub fn ranked(&self) -> [usize; AXES] {
        let mut idx: [usize; AXES] = std::array::from_fn(|i| i);
        idx.sort_by(|&a, &b| self.0[b].total_cmp(&self.0[a]).then(a.cmp(&b)));
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weights_fall_back_to_uniform() {
        let d = EnergyDistribution::from_weights([0.0; AXES]);
        assert_eq!(d, EnergyDistribution::uniform());
        assert!(d.is_valid());
    }

    #[test]
    fn ranked_is_stable_on_ties() {
        let d = EnergyDistribution::from_weights([1.0, 3.0, 3.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let r = d.ranked();
        assert_eq!(&r[..4], &[1, 2, 0, 5]);
    }

    #[test]
    fn rejects_unnormalized_probabilities() {
        assert!(EnergyDistribution::try_from_probabilities([0.2; AXES]).is_none());
        let mut p = [0.0; AXES];
        p[3] = 1.0;
        assert!(EnergyDistribution::try_from_probabilities(p).is_some());
    }

    #[test]
    fn deserialize_enforces_the_invariant() {
        let d: EnergyDistribution =
            serde_json::from_str("[0.5,0.5,0,0,0,0,0,0]").unwrap();
        assert!(d.is_valid());
        assert_eq!(serde_json::to_string(&d).unwrap(), "[0.5,0.5,0.0,0.0,0.0,0.0,0.0,0.0]");

        for bad in ["[5,0,0,0,0,0,0,-1]", "[0.2,0.2,0.2,0.2,0.2,0.2,0.2,0.2]", "[1,0,0]"] {
            assert!(serde_json::from_str::<EnergyDistribution>(bad).is_err(), "{bad}");
        }
    }
}
