//! Structural relations between the hexagrams of a triple diagnosis.
//!
//! Each pair of categories is compared on its six-line patterns: identity,
//! complement (every line inverted), reversal (line order upside down),
//! shared trigrams and Hamming distance. The result is a symmetric 3x3
//! matrix in category order.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::hexagram::{Hexagram, LINE_COUNT};
use super::profile::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PairRelation {
    pub identical: bool,
    /// One pattern is the other with every line inverted.
    pub complement: bool,
    /// One pattern is the other read top to bottom.
    pub reversal: bool,
    pub shared_upper: bool,
    pub shared_lower: bool,
    /// Lines that differ, 0..=6.
    pub hamming: u8,
}

impl PairRelation {
    pub fn between(a: &Hexagram, b: &Hexagram) -> Self {
        let (x, y) = (a.line_bits, b.line_bits);
        Self {
            identical: x == y,
            complement: x.complement() == y,
            reversal: x.reversed() == y,
            shared_upper: a.upper == b.upper,
            shared_lower: a.lower == b.lower,
            hamming: x.hamming(&y),
        }
    }

    /// Lines the pair has in common.
    pub fn shared_lines(&self) -> u8 {
        LINE_COUNT - self.hamming
    }
}

/// Pair relations indexed `[a][b]` by [`Category::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InteractionMatrix {
    pub hexagram_ids: [u8; 3],
    pub pairs: [[PairRelation; 3]; 3],
}

impl InteractionMatrix {
    pub fn new(engine: &Hexagram, interface: &Hexagram, safe_mode: &Hexagram) -> Self {
        let hexagrams = [engine, interface, safe_mode];
        let pairs = std::array::from_fn(|i| {
            std::array::from_fn(|j| PairRelation::between(hexagrams[i], hexagrams[j]))
        });
        Self {
            hexagram_ids: hexagrams.map(|h| h.id),
            pairs,
        }
    }

    pub fn get(&self, a: Category, b: Category) -> &PairRelation {
        &self.pairs[a.index()][b.index()]
    }

    /// The three off-diagonal pairs: engine-interface, engine-safe_mode,
    /// interface-safe_mode.
    pub fn distinct_pairs(&self) -> [(Category, Category, PairRelation); 3] {
        use Category::*;
        [(Engine, Interface), (Engine, SafeMode), (Interface, SafeMode)]
            .map(|(a, b)| (a, b, *self.get(a, b)))
    }

    /// Mean Hamming distance over the distinct pairs.
    pub fn mean_distance(&self) -> f64 {
        let total: u32 = self
            .distinct_pairs()
            .iter()
            .map(|(_, _, r)| u32::from(r.hamming))
            .sum();
        f64::from(total) / 3.0
    }
}
