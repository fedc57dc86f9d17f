//! Reference dataset: keywords, score and summary per `(hexagram, line)`.
//!
//! The engine only reads from it. Missing records are not fatal; callers
//! substitute [`LineRecord::placeholder`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::hexagram::{check_id, check_line};
use crate::error::{OracleError, Result};

/// Lower and upper bound of reference scores.
pub const SCORE_RANGE: (f64, f64) = (0.0, 100.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LineRecord {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub score: f64,
    #[serde(default)]
    pub summary: String,
}

impl LineRecord {
    /// Stand-in used when the dataset has no entry for a state.
    pub fn placeholder(score: f64) -> Self {
        Self {
            keywords: Vec::new(),
            score,
            summary: String::from("no reference entry"),
        }
    }
}

/// Synchronous read-only lookup by `(hexagram_id, line_position)`.
pub trait ReferenceSource {
    fn lookup(&self, hexagram_id: u8, line_position: u8) -> Option<&LineRecord>;
}

/// A source with no records; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyReference;

impl ReferenceSource for EmptyReference {
    fn lookup(&self, _hexagram_id: u8, _line_position: u8) -> Option<&LineRecord> {
        None
    }
}

/// One row of the JSON dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub hexagram_id: u8,
    pub line: u8,
    #[serde(flatten)]
    pub record: LineRecord,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: BTreeMap<(u8, u8), LineRecord>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects out-of-range keys, duplicate keys and scores outside `[0, 100]`.
    pub fn insert(&mut self, hexagram_id: u8, line: u8, record: LineRecord) -> Result<()> {
        check_id(hexagram_id)?;
        check_line(line)?;
        let (lo, hi) = SCORE_RANGE;
        if !record.score.is_finite() || record.score < lo || record.score > hi {
            return Err(OracleError::Reference(format!(
                "score {} for {hexagram_id}.{line} is outside [{lo}, {hi}]",
                record.score
            )));
        }
        if self.records.insert((hexagram_id, line), record).is_some() {
            return Err(OracleError::Reference(format!(
                "duplicate entry for {hexagram_id}.{line}"
            )));
        }
        Ok(())
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ReferenceEntry>) -> Result<Self> {
        let mut table = Self::new();
        for e in entries {
            table.insert(e.hexagram_id, e.line, e.record)?;
        }
        Ok(table)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<ReferenceEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ReferenceSource for ReferenceTable {
    fn lookup(&self, hexagram_id: u8, line_position: u8) -> Option<&LineRecord> {
        self.records.get(&(hexagram_id, line_position))
    }
}
