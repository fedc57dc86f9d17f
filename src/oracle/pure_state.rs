//! Adaptive probability of a pure hexagram (upper == lower).
//!
//! alpha = alpha_min + (alpha_max - alpha_min) * k * herfindahl_norm, scaled
//! by an entropy multiplier and only then clipped to the profile bounds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::profile::{Category, CategoryProfile};
use crate::core::concentration::ConcentrationMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropyAdjustment {
    /// Entropy (nats) below which alpha is boosted.
    pub low_entropy: f64,
    /// Entropy (nats) above which alpha is damped.
    pub high_entropy: f64,
    pub low_entropy_boost: f64,
    pub high_entropy_damping: f64,
}

impl Default for EntropyAdjustment {
    fn default() -> Self {
        Self {
            low_entropy: 1.5,
            high_entropy: 2.0,
            low_entropy_boost: 1.1,
            high_entropy_damping: 0.9,
        }
    }
}

impl EntropyAdjustment {
    pub fn multiplier(&self, entropy: f64) -> f64 {
        if entropy < self.low_entropy {
            self.low_entropy_boost
        } else if entropy > self.high_entropy {
            self.high_entropy_damping
        } else {
            1.0
        }
    }
}

/// Alpha together with every intermediate value that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PureStateDecision {
    pub category: Category,
    pub alpha: f64,
    /// Linear alpha before the entropy multiplier.
    pub alpha_linear: f64,
    pub entropy_multiplier: f64,
    /// Alpha after the multiplier, before clipping.
    pub alpha_unclipped: f64,
    pub clipped: bool,
    pub alpha_min: f64,
    pub alpha_max: f64,
    pub k: f64,
    pub herfindahl_norm: f64,
    pub entropy: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PureStateController {
    category: Category,
    profile: CategoryProfile,
    adjustment: EntropyAdjustment,
}

impl PureStateController {
    pub fn new(
        category: Category,
        profile: CategoryProfile,
        adjustment: EntropyAdjustment,
    ) -> Self {
        Self {
            category,
            profile,
            adjustment,
        }
    }

    pub fn decide(&self, metrics: &ConcentrationMetrics) -> PureStateDecision {
        let p = &self.profile;
        let hn = metrics.herfindahl_norm.clamp(0.0, 1.0);
        let alpha_linear = p.alpha_min + (p.alpha_max - p.alpha_min) * p.k * hn;
        let entropy_multiplier = self.adjustment.multiplier(metrics.entropy);
        let alpha_unclipped = alpha_linear * entropy_multiplier;
        let alpha = alpha_unclipped.clamp(p.alpha_min, p.alpha_max);
        let clipped = alpha != alpha_unclipped;

        debug!(
            target: "pure_state",
            category = %self.category,
            herfindahl_norm = hn,
            entropy = metrics.entropy,
            alpha,
            clipped,
            "pure-state probability"
        );

        PureStateDecision {
            category: self.category,
            alpha,
            alpha_linear,
            entropy_multiplier,
            alpha_unclipped,
            clipped,
            alpha_min: p.alpha_min,
            alpha_max: p.alpha_max,
            k: p.k,
            herfindahl_norm: hn,
            entropy: metrics.entropy,
        }
    }
}
