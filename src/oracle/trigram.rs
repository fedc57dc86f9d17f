//! The eight trigrams and the trait vector indexed by them.
//!
//! Axis order follows the earlier-heaven sequence (Qian, Dui, Li, Zhen, Xun,
//! Kan, Gen, Kun). Every table in this crate is indexed in that order.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::distribution::AXES;
use crate::error::{OracleError, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Trigram {
    Qian,
    Dui,
    Li,
    Zhen,
    Xun,
    Kan,
    Gen,
    Kun,
}

impl Trigram {
    pub const ALL: [Trigram; AXES] = [
        Trigram::Qian,
        Trigram::Dui,
        Trigram::Li,
        Trigram::Zhen,
        Trigram::Xun,
        Trigram::Kan,
        Trigram::Gen,
        Trigram::Kun,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < AXES {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Lines from bottom to top, 1 = solid (yang), 0 = broken (yin).
    pub const fn lines(self) -> [u8; 3] {
        match self {
            Trigram::Qian => [1, 1, 1],
            Trigram::Dui => [1, 1, 0],
            Trigram::Li => [1, 0, 1],
            Trigram::Zhen => [1, 0, 0],
            Trigram::Xun => [0, 1, 1],
            Trigram::Kan => [0, 1, 0],
            Trigram::Gen => [0, 0, 1],
            Trigram::Kun => [0, 0, 0],
        }
    }

    /// Inverse of [`Trigram::lines`]. Any non-zero line value counts as solid.
    pub const fn from_lines(lines: [u8; 3]) -> Self {
        let packed = ((lines[0] != 0) as usize) << 2
            | ((lines[1] != 0) as usize) << 1
            | (lines[2] != 0) as usize;
        Self::ALL[7 - packed]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Trigram::Qian => "qian",
            Trigram::Dui => "dui",
            Trigram::Li => "li",
            Trigram::Zhen => "zhen",
            Trigram::Xun => "xun",
            Trigram::Kan => "kan",
            Trigram::Gen => "gen",
            Trigram::Kun => "kun",
        }
    }

    pub const fn character(self) -> char {
        match self {
            Trigram::Qian => '乾',
            Trigram::Dui => '兌',
            Trigram::Li => '離',
            Trigram::Zhen => '震',
            Trigram::Xun => '巽',
            Trigram::Kan => '坎',
            Trigram::Gen => '艮',
            Trigram::Kun => '坤',
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Trigram::Qian => '☰',
            Trigram::Dui => '☱',
            Trigram::Li => '☲',
            Trigram::Zhen => '☳',
            Trigram::Xun => '☴',
            Trigram::Kan => '☵',
            Trigram::Gen => '☶',
            Trigram::Kun => '☷',
        }
    }

    /// Natural image.
    pub const fn image(self) -> &'static str {
        match self {
            Trigram::Qian => "heaven",
            Trigram::Dui => "lake",
            Trigram::Li => "fire",
            Trigram::Zhen => "thunder",
            Trigram::Xun => "wind",
            Trigram::Kan => "water",
            Trigram::Gen => "mountain",
            Trigram::Kun => "earth",
        }
    }

    /// Personality trait measured on this axis.
    pub const fn trait_label(self) -> &'static str {
        match self {
            Trigram::Qian => "creativity",
            Trigram::Dui => "harmony",
            Trigram::Li => "expression",
            Trigram::Zhen => "action",
            Trigram::Xun => "adaptability",
            Trigram::Kan => "inquiry",
            Trigram::Gen => "stability",
            Trigram::Kun => "receptivity",
        }
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Trigram {
    type Err = OracleError;

    /// Accepts the pinyin name, CJK character, symbol, image, trait label, or
    /// a combined `乾_創造性` style label (matched on the part before `_`).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let head = trimmed.split('_').next().unwrap_or(trimmed);
        let lowered = head.to_ascii_lowercase();
        Trigram::ALL
            .into_iter()
            .find(|t| {
                lowered == t.name()
                    || lowered == t.image()
                    || lowered == t.trait_label()
                    || head.chars().eq(std::iter::once(t.character()))
                    || head.chars().eq(std::iter::once(t.symbol()))
            })
            .ok_or_else(|| OracleError::UnknownTrigram(s.to_string()))
    }
}

/// Raw trait scores, one finite non-negative value per trigram axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct TraitVector {
    values: [f64; AXES],
}

impl TraitVector {
    /// Values in trigram order.
    pub fn new(values: [f64; AXES]) -> Result<Self> {
        for (t, v) in Trigram::ALL.iter().zip(values.iter()) {
            if !v.is_finite() {
                return Err(OracleError::NonFinite {
                    axis: t.name().to_string(),
                    value: *v,
                });
            }
            if *v < 0.0 {
                return Err(OracleError::NegativeValue {
                    axis: t.name().to_string(),
                    value: *v,
                });
            }
        }
        Ok(Self { values })
    }

    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let arr: [f64; AXES] = values
            .try_into()
            .map_err(|_| OracleError::DimensionMismatch {
                expected: AXES,
                got: values.len(),
            })?;
        Self::new(arr)
    }

    /// Every axis must be named exactly once, by any label `Trigram` parses.
    pub fn from_named<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut slots: [Option<f64>; AXES] = [None; AXES];
        let mut count = 0usize;
        for (label, value) in pairs {
            let t: Trigram = label.parse()?;
            count += 1;
            if slots[t.index()].replace(value).is_some() {
                return Err(OracleError::DimensionMismatch {
                    expected: AXES,
                    got: count,
                });
            }
        }
        let mut values = [0.0; AXES];
        for (v, slot) in values.iter_mut().zip(slots.iter()) {
            *v = slot.ok_or(OracleError::DimensionMismatch {
                expected: AXES,
                got: count,
            })?;
        }
        Self::new(values)
    }

    #[inline]
    pub fn values(&self) -> &[f64; AXES] {
        &self.values
    }

    #[inline]
    pub fn get(&self, t: Trigram) -> f64 {
        self.values[t.index()]
    }
}

impl TryFrom<BTreeMap<String, f64>> for TraitVector {
    type Error = OracleError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self> {
        Self::from_named(map.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

impl From<TraitVector> for BTreeMap<String, f64> {
    fn from(v: TraitVector) -> Self {
        Trigram::ALL
            .iter()
            .map(|t| (t.name().to_string(), v.get(*t)))
            .collect()
    }
}

// Serialized as a name -> value map, so the schema is the map's schema.
impl JsonSchema for TraitVector {
    fn schema_name() -> Cow<'static, str> {
        "TraitVector".into()
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        <BTreeMap<String, f64>>::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_round_trip_through_from_lines() {
        for t in Trigram::ALL {
            assert_eq!(Trigram::from_lines(t.lines()), t);
        }
    }

    #[test]
    fn parses_every_label_form() {
        assert_eq!("Qian".parse::<Trigram>().unwrap(), Trigram::Qian);
        assert_eq!("lake".parse::<Trigram>().unwrap(), Trigram::Dui);
        assert_eq!("離".parse::<Trigram>().unwrap(), Trigram::Li);
        assert_eq!("☳".parse::<Trigram>().unwrap(), Trigram::Zhen);
        assert_eq!("adaptability".parse::<Trigram>().unwrap(), Trigram::Xun);
        assert_eq!("坎_探求性".parse::<Trigram>().unwrap(), Trigram::Kan);
        assert!(matches!(
            "dragon".parse::<Trigram>(),
            Err(OracleError::UnknownTrigram(_))
        ));
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        assert!(matches!(
            TraitVector::from_slice(&[1.0; 7]),
            Err(OracleError::DimensionMismatch {
                expected: 8,
                got: 7
            })
        ));
    }

    #[test]
    fn named_vector_requires_every_axis_once() {
        let mut pairs: Vec<(&str, f64)> = Trigram::ALL.iter().map(|t| (t.name(), 1.0)).collect();
        assert!(TraitVector::from_named(pairs.clone()).is_ok());
        pairs.pop();
        assert!(TraitVector::from_named(pairs.clone()).is_err());
        pairs.push(("heaven", 2.0));
        assert!(TraitVector::from_named(pairs).is_err());
    }

    #[test]
    fn deserializes_from_named_map() {
        let json = r#"{"qian":1,"dui":2,"li":3,"zhen":4,"xun":5,"kan":6,"gen":7,"kun":8}"#;
        let v: TraitVector = serde_json::from_str(json).unwrap();
        assert_eq!(v.get(Trigram::Gen), 7.0);
        let bad = r#"{"qian":1,"dui":2,"li":3,"zhen":4,"xun":5,"kan":6,"gen":7,"kun":-8}"#;
        assert!(serde_json::from_str::<TraitVector>(bad).is_err());
    }
}
