//! Hexagram tables and resolution.
//!
//! Two literal tables describe the same 64 states: the King Wen matrix
//! (upper, lower) -> id, and the line table id -> six lines. The matrix is
//! authoritative for forward resolution, the line table for reverse lookup by
//! line pattern. Both are checked against each other at compile time, so an
//! edit that breaks either the bijection or their agreement fails the build.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::trigram::Trigram;
use crate::error::{OracleError, Result};

pub const HEXAGRAM_COUNT: u8 = 64;
pub const LINE_COUNT: u8 = 6;

/// King Wen number indexed `[upper][lower]` in trigram order.
const KING_WEN: [[u8; 8]; 8] = [
    [1, 10, 13, 25, 44, 6, 33, 12],
    [43, 58, 49, 17, 28, 47, 31, 45],
    [14, 38, 30, 21, 50, 64, 56, 35],
    [34, 54, 55, 51, 32, 40, 62, 16],
    [9, 61, 37, 42, 57, 59, 53, 20],
    [5, 60, 63, 3, 48, 29, 39, 8],
    [26, 41, 22, 27, 18, 4, 52, 23],
    [11, 19, 36, 24, 46, 7, 15, 2],
];

/// Lines bottom to top for hexagrams 1..=64 (index 0 is hexagram 1).
const LINES_BY_ID: [[u8; 6]; 64] = [
    [1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 0, 0],
    [1, 0, 0, 0, 1, 0],
    [0, 1, 0, 0, 0, 1],
    [1, 1, 1, 0, 1, 0],
    [0, 1, 0, 1, 1, 1],
    [0, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 0],
    [1, 1, 1, 0, 1, 1],
    [1, 1, 0, 1, 1, 1],
    [1, 1, 1, 0, 0, 0],
    [0, 0, 0, 1, 1, 1],
    [1, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 0, 1],
    [0, 0, 1, 0, 0, 0],
    [0, 0, 0, 1, 0, 0],
    [1, 0, 0, 1, 1, 0],
    [0, 1, 1, 0, 0, 1],
    [1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1],
    [1, 0, 0, 1, 0, 1],
    [1, 0, 1, 0, 0, 1],
    [0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0],
    [1, 0, 0, 1, 1, 1],
    [1, 1, 1, 0, 0, 1],
    [1, 0, 0, 0, 0, 1],
    [0, 1, 1, 1, 1, 0],
    [0, 1, 0, 0, 1, 0],
    [1, 0, 1, 1, 0, 1],
    [0, 0, 1, 1, 1, 0],
    [0, 1, 1, 1, 0, 0],
    [0, 0, 1, 1, 1, 1],
    [1, 1, 1, 1, 0, 0],
    [0, 0, 0, 1, 0, 1],
    [1, 0, 1, 0, 0, 0],
    [1, 0, 1, 0, 1, 1],
    [1, 1, 0, 1, 0, 1],
    [0, 0, 1, 0, 1, 0],
    [0, 1, 0, 1, 0, 0],
    [1, 1, 0, 0, 0, 1],
    [1, 0, 0, 0, 1, 1],
    [1, 1, 1, 1, 1, 0],
    [0, 1, 1, 1, 1, 1],
    [0, 0, 0, 1, 1, 0],
    [0, 1, 1, 0, 0, 0],
    [0, 1, 0, 1, 1, 0],
    [0, 1, 1, 0, 1, 0],
    [1, 0, 1, 1, 1, 0],
    [0, 1, 1, 1, 0, 1],
    [1, 0, 0, 1, 0, 0],
    [0, 0, 1, 0, 0, 1],
    [0, 0, 1, 0, 1, 1],
    [1, 1, 0, 1, 0, 0],
    [1, 0, 1, 1, 0, 0],
    [0, 0, 1, 1, 0, 1],
    [0, 1, 1, 0, 1, 1],
    [1, 1, 0, 1, 1, 0],
    [0, 1, 0, 0, 1, 1],
    [1, 1, 0, 0, 1, 0],
    [1, 1, 0, 0, 1, 1],
    [0, 0, 1, 1, 0, 0],
    [1, 0, 1, 0, 1, 0],
    [0, 1, 0, 1, 0, 1],
];

const NAMES: [&str; 64] = [
    "The Creative",
    "The Receptive",
    "Difficulty at the Beginning",
    "Youthful Folly",
    "Waiting",
    "Conflict",
    "The Army",
    "Holding Together",
    "The Taming Power of the Small",
    "Treading",
    "Peace",
    "Standstill",
    "Fellowship with Men",
    "Possession in Great Measure",
    "Modesty",
    "Enthusiasm",
    "Following",
    "Work on What Has Been Spoiled",
    "Approach",
    "Contemplation",
    "Biting Through",
    "Grace",
    "Splitting Apart",
    "Return",
    "Innocence",
    "The Taming Power of the Great",
    "The Corners of the Mouth",
    "Preponderance of the Great",
    "The Abysmal",
    "The Clinging",
    "Influence",
    "Duration",
    "Retreat",
    "The Power of the Great",
    "Progress",
    "Darkening of the Light",
    "The Family",
    "Opposition",
    "Obstruction",
    "Deliverance",
    "Decrease",
    "Increase",
    "Break-through",
    "Coming to Meet",
    "Gathering Together",
    "Pushing Upward",
    "Oppression",
    "The Well",
    "Revolution",
    "The Caldron",
    "The Arousing",
    "Keeping Still",
    "Development",
    "The Marrying Maiden",
    "Abundance",
    "The Wanderer",
    "The Gentle",
    "The Joyous",
    "Dispersion",
    "Limitation",
    "Inner Truth",
    "Preponderance of the Small",
    "After Completion",
    "Before Completion",
];

const fn pack(lines: [u8; 6]) -> usize {
    let mut packed = 0usize;
    let mut i = 0;
    while i < 6 {
        if lines[i] != 0 {
            packed |= 1 << i;
        }
        i += 1;
    }
    packed
}

const fn matrix_is_bijection() -> bool {
    let mut seen = [false; 64];
    let mut u = 0;
    while u < 8 {
        let mut l = 0;
        while l < 8 {
            let id = KING_WEN[u][l];
            if id < 1 || id > 64 || seen[(id - 1) as usize] {
                return false;
            }
            seen[(id - 1) as usize] = true;
            l += 1;
        }
        u += 1;
    }
    true
}

/// Lower trigram supplies lines 1-3, upper trigram lines 4-6.
const fn tables_agree() -> bool {
    let mut u = 0;
    while u < 8 {
        let mut l = 0;
        while l < 8 {
            let id = KING_WEN[u][l] as usize;
            let lines = LINES_BY_ID[id - 1];
            let upper = Trigram::ALL[u].lines();
            let lower = Trigram::ALL[l].lines();
            let mut i = 0;
            while i < 3 {
                if lines[i] != lower[i] || lines[i + 3] != upper[i] {
                    return false;
                }
                i += 1;
            }
            l += 1;
        }
        u += 1;
    }
    true
}

const fn line_values_are_binary() -> bool {
    let mut id = 0;
    while id < 64 {
        let mut i = 0;
        while i < 6 {
            if LINES_BY_ID[id][i] > 1 {
                return false;
            }
            i += 1;
        }
        id += 1;
    }
    true
}

const _: () = assert!(
    matrix_is_bijection(),
    "King Wen matrix is not a bijection onto 1..=64"
);
const _: () = assert!(
    line_values_are_binary(),
    "line table holds a non-binary line"
);
const _: () = assert!(tables_agree(), "King Wen matrix and line table disagree");

/// Hexagram id by packed line pattern (bit i = line i + 1).
const ID_BY_PATTERN: [u8; 64] = {
    let mut out = [0u8; 64];
    let mut id = 0;
    while id < 64 {
        out[pack(LINES_BY_ID[id])] = (id + 1) as u8;
        id += 1;
    }
    out
};

/// Six lines, index 0 = line 1 (bottom). 1 = solid, 0 = broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct LineBits([u8; 6]);

impl LineBits {
    pub fn from_trigrams(upper: Trigram, lower: Trigram) -> Self {
        let (u, l) = (upper.lines(), lower.lines());
        Self([l[0], l[1], l[2], u[0], u[1], u[2]])
    }

    /// Normalizes any non-zero entry to 1.
    pub fn from_lines(lines: [u8; 6]) -> Self {
        Self(lines.map(|b| (b != 0) as u8))
    }

    #[inline]
    pub fn as_array(&self) -> &[u8; 6] {
        &self.0
    }

    /// Line at `position` (1..=6).
    pub fn line(&self, position: u8) -> Result<u8> {
        check_line(position)?;
        Ok(self.0[(position - 1) as usize])
    }

    /// Copy with the line at `position` (1..=6) inverted.
    pub fn flipped(&self, position: u8) -> Result<Self> {
        check_line(position)?;
        let mut out = self.0;
        let i = (position - 1) as usize;
        out[i] ^= 1;
        Ok(Self(out))
    }

    /// Every line inverted.
    pub fn complement(&self) -> Self {
        Self(self.0.map(|b| b ^ 1))
    }

    /// Line order turned upside down: line 1 becomes line 6.
    pub fn reversed(&self) -> Self {
        let mut out = self.0;
        out.reverse();
        Self(out)
    }

    /// Number of positions at which the two patterns differ.
    pub fn hamming(&self, other: &Self) -> u8 {
        self.0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a != b)
            .count() as u8
    }

    pub fn lower_trigram(&self) -> Trigram {
        Trigram::from_lines([self.0[0], self.0[1], self.0[2]])
    }

    pub fn upper_trigram(&self) -> Trigram {
        Trigram::from_lines([self.0[3], self.0[4], self.0[5]])
    }

    fn packed(&self) -> usize {
        pack(self.0)
    }
}

impl fmt::Display for LineBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Hexagram {
    pub id: u8,
    pub name: String,
    pub upper: Trigram,
    pub lower: Trigram,
    pub line_bits: LineBits,
}

impl Hexagram {
    pub fn is_pure(&self) -> bool {
        self.upper == self.lower
    }
}

/// Stateless access to the hexagram tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexagramResolver;

impl HexagramResolver {
    pub fn resolve(upper: Trigram, lower: Trigram) -> Hexagram {
        let id = KING_WEN[upper.index()][lower.index()];
        Hexagram {
            id,
            name: NAMES[(id - 1) as usize].to_string(),
            upper,
            lower,
            line_bits: LineBits(LINES_BY_ID[(id - 1) as usize]),
        }
    }

    /// Resolve from free-form labels; unknown labels are an error.
    pub fn resolve_labels(upper: &str, lower: &str) -> Result<Hexagram> {
        Ok(Self::resolve(upper.parse()?, lower.parse()?))
    }

    pub fn by_id(id: u8) -> Result<Hexagram> {
        let bits = Self::line_bits(id)?;
        Ok(Self::resolve(bits.upper_trigram(), bits.lower_trigram()))
    }

    pub fn id_for(upper: Trigram, lower: Trigram) -> u8 {
        KING_WEN[upper.index()][lower.index()]
    }

    pub fn line_bits(id: u8) -> Result<LineBits> {
        check_id(id)?;
        Ok(LineBits(LINES_BY_ID[(id - 1) as usize]))
    }

    /// Reverse lookup; every six-line pattern names exactly one hexagram.
    pub fn id_for_lines(bits: LineBits) -> u8 {
        ID_BY_PATTERN[bits.packed()]
    }

    pub fn name(id: u8) -> Result<&'static str> {
        check_id(id)?;
        Ok(NAMES[(id - 1) as usize])
    }
}

pub(crate) fn check_id(id: u8) -> Result<()> {
    if (1..=HEXAGRAM_COUNT).contains(&id) {
        Ok(())
    } else {
        Err(OracleError::InvalidHexagram(id))
    }
}

pub(crate) fn check_line(position: u8) -> Result<()> {
    if (1..=LINE_COUNT).contains(&position) {
        Ok(())
    } else {
        Err(OracleError::InvalidLinePosition(position))
    }
}
