//! Numeric primitives with no symbolic meaning: distributions, statistics
//! and the random source.

pub mod concentration;
pub mod distribution;
pub mod energy;
pub mod normalize;
pub mod uniform;
