use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sixlines::error::{OracleError, Result};
use sixlines::oracle::profile::Category;
use sixlines::oracle::trigram::TraitVector;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML (written with commented defaults when missing)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Diagnose one trait vector
    Diagnose {
        /// engine, interface or safe-mode
        #[arg(long)]
        category: Category,

        /// 8 numbers in trigram order, or name=value pairs
        #[arg(long)]
        traits: String,

        /// Seed for reproducible draws
        #[arg(long)]
        seed: Option<u64>,

        /// Use the temperature softmax instead of z-score/ReLU
        #[arg(long, default_value_t = false)]
        softmax: bool,

        /// Softmax temperature (defaults to the category profile)
        #[arg(long, requires = "softmax")]
        temperature: Option<f64>,

        /// Deterministic top-two selection
        #[arg(long, default_value_t = false)]
        ranked: bool,

        /// With --ranked, swap in rank three when the top two nearly tie
        #[arg(long, requires = "ranked")]
        avoid_pure: bool,

        /// Grow a scenario tree from this line of the resolved hexagram
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
        tree_line: Option<u8>,

        /// Reference dataset (JSON)
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Include the fallback and draw trace
        #[arg(long, default_value_t = false)]
        debug: bool,
    },

    /// Diagnose one trait vector per category
    Triple {
        #[arg(long)]
        engine: String,

        #[arg(long)]
        interface: String,

        #[arg(long)]
        safe_mode: String,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = false)]
        debug: bool,
    },

    /// Scenario tree from a hexagram and line
    Tree {
        #[arg(long)]
        hexagram: u8,

        #[arg(long)]
        line: u8,

        #[arg(long)]
        reference: Option<PathBuf>,
    },

    /// Resolve an upper/lower trigram pair
    Resolve {
        #[arg(long)]
        upper: String,

        #[arg(long)]
        lower: String,
    },

    /// Estimate the pure-state rate for a trait vector
    Calibrate {
        #[arg(long)]
        category: Category,

        #[arg(long)]
        traits: String,

        #[arg(long, default_value_t = 10_000)]
        draws: usize,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the JSON schema of the diagnosis report
    Schema,
}

/// Parse "1,2,3,4,5,6,7,8" (trigram order) or "qian=1,dui=2,...".
pub fn parse_traits(s: &str) -> Result<TraitVector> {
    let parts: Vec<&str> = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.iter().any(|p| p.contains('=')) {
        let mut pairs = Vec::with_capacity(parts.len());
        for p in &parts {
            let (name, value) = p
                .split_once('=')
                .ok_or_else(|| OracleError::UnknownTrigram(p.to_string()))?;
            pairs.push((name.trim(), parse_number(value)?));
        }
        TraitVector::from_named(pairs)
    } else {
        let values = parts
            .iter()
            .map(|p| parse_number(p))
            .collect::<Result<Vec<f64>>>()?;
        TraitVector::from_slice(&values)
    }
}

fn parse_number(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| OracleError::InvalidConfig(format!("bad trait value {s:?}: {e}")))
}
