//! Upper/lower trigram selection.
//!
//! The stochastic mode draws the upper trigram from the distribution, then
//! makes the pair pure with probability alpha, else draws the lower trigram
//! from the remaining seven axes. The ranked mode is deterministic and takes
//! the two heaviest axes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::trigram::Trigram;
use crate::core::distribution::{AXES, EnergyDistribution};
use crate::core::uniform::UniformSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Classify the relative gap `(top1 - top2) / total`.
    pub fn classify(top1: f64, top2: f64, total: f64) -> Self {
        if total.is_nan() || total <= 0.0 {
            return Confidence::Low;
        }
        let rel = (top1 - top2) / total;
        if rel > 0.2 {
            Confidence::High
        } else if rel > 0.1 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Stochastic,
    Ranked {
        #[serde(default)]
        avoid_pure: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TrigramSelection {
    pub upper: Trigram,
    pub lower: Trigram,
    pub is_pure: bool,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrigramSelector {
    /// Top-two weight difference treated as a tie by the avoid-pure policy.
    avoid_pure_margin: f64,
}

impl Default for TrigramSelector {
    fn default() -> Self {
        Self {
            avoid_pure_margin: 0.05,
        }
    }
}

impl TrigramSelector {
    pub fn new(avoid_pure_margin: f64) -> Self {
        Self {
            avoid_pure_margin: avoid_pure_margin.max(0.0),
        }
    }

    pub fn select<U: UniformSource + ?Sized>(
        &self,
        mode: SelectionMode,
        dist: &EnergyDistribution,
        alpha: f64,
        rng: &mut U,
    ) -> TrigramSelection {
        match mode {
            SelectionMode::Stochastic => self.select_stochastic(dist, alpha, rng),
            SelectionMode::Ranked { avoid_pure } => self.select_ranked(dist, avoid_pure),
        }
    }

    /// Consumes two draws for a pure pair, three otherwise.
    pub fn select_stochastic<U: UniformSource + ?Sized>(
        &self,
        dist: &EnergyDistribution,
        alpha: f64,
        rng: &mut U,
    ) -> TrigramSelection {
        let weights = dist.as_array();
        let upper_idx = sample_index(weights, rng.next_unit());
        let upper = Trigram::ALL[upper_idx];
        let confidence = confidence_of(dist);

        if rng.next_unit() < alpha {
            return TrigramSelection {
                upper,
                lower: upper,
                is_pure: true,
                confidence,
            };
        }

        let mut rest = [0.0; AXES - 1];
        let mut rest_axes = [0usize; AXES - 1];
        let mut n = 0;
        for (axis, w) in weights.iter().enumerate() {
            if axis != upper_idx {
                rest[n] = *w;
                rest_axes[n] = axis;
                n += 1;
            }
        }
        let u = rng.next_unit();
        let total: f64 = rest.iter().sum();
        let pick = if total > 0.0 && total.is_finite() {
            sample_index(&rest, u * total)
        } else {
            ((u * rest.len() as f64) as usize).min(rest.len() - 1)
        };

        TrigramSelection {
            upper,
            lower: Trigram::ALL[rest_axes[pick]],
            is_pure: false,
            confidence,
        }
    }

    /// Rank-1 over rank-2. With `avoid_pure`, a rank-1/rank-2 difference
    /// within the margin substitutes rank-3 for the lower trigram.
    pub fn select_ranked(&self, dist: &EnergyDistribution, avoid_pure: bool) -> TrigramSelection {
        let ranked = dist.ranked();
        let w = dist.as_array();
        let upper = ranked[0];
        let mut lower = ranked[1];
        if avoid_pure && (w[ranked[0]] - w[ranked[1]]).abs() <= self.avoid_pure_margin {
            lower = ranked[2];
        }
        TrigramSelection {
            upper: Trigram::ALL[upper],
            lower: Trigram::ALL[lower],
            is_pure: upper == lower,
            confidence: confidence_of(dist),
        }
    }

    /// Fraction of `draws` stochastic selections that came out pure.
    pub fn estimate_pure_rate<U: UniformSource + ?Sized>(
        &self,
        dist: &EnergyDistribution,
        alpha: f64,
        draws: usize,
        rng: &mut U,
    ) -> f64 {
        if draws == 0 {
            return 0.0;
        }
        let pure = (0..draws)
            .filter(|_| self.select_stochastic(dist, alpha, rng).is_pure)
            .count();
        pure as f64 / draws as f64
    }
}

/// Cumulative sampling; `target` is compared against running sums of
/// `weights`. Falls back to the last index when rounding leaves the target
/// past the final sum.
fn sample_index(weights: &[f64], target: f64) -> usize {
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if target < acc {
            return i;
        }
    }
    weights.len() - 1
}

fn confidence_of(dist: &EnergyDistribution) -> Confidence {
    let ranked = dist.ranked();
    Confidence::classify(dist.get(ranked[0]), dist.get(ranked[1]), dist.sum())
}
