//! Trait-to-hexagram engine.
//!
//! An 8-axis trait vector is normalized into a distribution over the eight
//! trigrams, an adaptive pure-state probability is derived from its
//! concentration, an upper/lower trigram pair is drawn and resolved to one of
//! the 64 hexagrams, and a three-stage scenario tree is grown from a line of
//! that hexagram. Randomness is always injected through
//! [`core::uniform::UniformSource`].

pub mod config;
pub mod core;
pub mod error;
pub mod oracle;
