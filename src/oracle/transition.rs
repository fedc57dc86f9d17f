//! Progression and mutation operators over `(hexagram, line)` states.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::hexagram::{HEXAGRAM_COUNT, HexagramResolver, LINE_COUNT, check_id, check_line};
use crate::error::Result;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Advance the line; past the top line, move to the next hexagram.
    Progression,
    /// Invert the current line, keeping the position.
    Mutation,
}

impl Operator {
    pub const fn code(self) -> char {
        match self {
            Operator::Progression => 'P',
            Operator::Mutation => 'M',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Progression => f.write_str("progression"),
            Operator::Mutation => f.write_str("mutation"),
        }
    }
}

/// A validated `(hexagram_id, line_position)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RawLineState")]
pub struct LineState {
    hexagram_id: u8,
    line_position: u8,
}

#[derive(Deserialize, JsonSchema)]
struct RawLineState {
    hexagram_id: u8,
    line_position: u8,
}

impl TryFrom<RawLineState> for LineState {
    type Error = crate::error::OracleError;

    fn try_from(raw: RawLineState) -> Result<Self> {
        LineState::new(raw.hexagram_id, raw.line_position)
    }
}

impl LineState {
    pub fn new(hexagram_id: u8, line_position: u8) -> Result<Self> {
        check_id(hexagram_id)?;
        check_line(line_position)?;
        Ok(Self {
            hexagram_id,
            line_position,
        })
    }

    #[inline]
    pub fn hexagram_id(&self) -> u8 {
        self.hexagram_id
    }

    #[inline]
    pub fn line_position(&self) -> u8 {
        self.line_position
    }
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.hexagram_id, self.line_position)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateTransitionEngine;

impl StateTransitionEngine {
    pub fn apply(state: LineState, op: Operator) -> LineState {
        match op {
            Operator::Progression => Self::progress(state),
            Operator::Mutation => Self::mutate(state),
        }
    }

    pub fn progress(state: LineState) -> LineState {
        if state.line_position < LINE_COUNT {
            LineState {
                line_position: state.line_position + 1,
                ..state
            }
        } else {
            LineState {
                hexagram_id: state.hexagram_id % HEXAGRAM_COUNT + 1,
                line_position: 1,
            }
        }
    }

    pub fn mutate(state: LineState) -> LineState {
        // LineState is validated, so the table lookups cannot fail.
        let bits = HexagramResolver::line_bits(state.hexagram_id)
            .and_then(|b| b.flipped(state.line_position));
        match bits {
            Ok(bits) => LineState {
                hexagram_id: HexagramResolver::id_for_lines(bits),
                ..state
            },
            Err(_) => state,
        }
    }
}
