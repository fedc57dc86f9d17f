//! Category profiles: per-category constants for the softmax temperature and
//! the pure-state probability law.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{OracleError, Result};

/// The three fixed diagnosis categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Inner drive and values.
    Engine,
    /// Social presentation.
    Interface,
    /// Behaviour under stress.
    SafeMode,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Engine, Category::Interface, Category::SafeMode];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Category::Engine => "engine",
            Category::Interface => "interface",
            Category::SafeMode => "safe_mode",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "engine" | "engine_os" => Ok(Category::Engine),
            "interface" | "interface_os" => Ok(Category::Interface),
            "safe_mode" | "safe" | "safe_mode_os" => Ok(Category::SafeMode),
            _ => Err(OracleError::InvalidProfile(format!("unknown category {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryProfile {
    /// Softmax temperature; lower is more decisive.
    pub temperature: f64,
    pub alpha_min: f64,
    pub alpha_max: f64,
    /// Gain applied to the normalized Herfindahl index.
    pub k: f64,
}

impl CategoryProfile {
    pub const ENGINE: CategoryProfile = CategoryProfile {
        temperature: 0.8,
        alpha_min: 0.10,
        alpha_max: 0.22,
        k: 1.2,
    };
    pub const INTERFACE: CategoryProfile = CategoryProfile {
        temperature: 1.2,
        alpha_min: 0.12,
        alpha_max: 0.20,
        k: 1.0,
    };
    pub const SAFE_MODE: CategoryProfile = CategoryProfile {
        temperature: 1.0,
        alpha_min: 0.11,
        alpha_max: 0.18,
        k: 1.1,
    };

    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(OracleError::InvalidProfile(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        let in_unit = |x: f64| x.is_finite() && (0.0..=1.0).contains(&x);
        if !in_unit(self.alpha_min) || !in_unit(self.alpha_max) {
            return Err(OracleError::InvalidProfile(format!(
                "alpha bounds must lie in [0, 1], got [{}, {}]",
                self.alpha_min, self.alpha_max
            )));
        }
        if self.alpha_min > self.alpha_max {
            return Err(OracleError::InvalidProfile(format!(
                "alpha_min {} exceeds alpha_max {}",
                self.alpha_min, self.alpha_max
            )));
        }
        if !self.k.is_finite() || self.k < 0.0 {
            return Err(OracleError::InvalidProfile(format!(
                "k must be non-negative, got {}",
                self.k
            )));
        }
        Ok(())
    }
}

/// Immutable lookup table from category to profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileTable {
    profiles: [CategoryProfile; 3],
}

impl ProfileTable {
    pub fn new(
        engine: CategoryProfile,
        interface: CategoryProfile,
        safe_mode: CategoryProfile,
    ) -> Result<Self> {
        for (category, p) in Category::ALL.iter().zip([&engine, &interface, &safe_mode]) {
            p.validate()
                .map_err(|e| OracleError::InvalidProfile(format!("{category}: {e}")))?;
        }
        Ok(Self {
            profiles: [engine, interface, safe_mode],
        })
    }

    #[inline]
    pub fn get(&self, category: Category) -> &CategoryProfile {
        &self.profiles[category.index()]
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            profiles: [
                CategoryProfile::ENGINE,
                CategoryProfile::INTERFACE,
                CategoryProfile::SAFE_MODE,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_in_documented_ranges() {
        let table = ProfileTable::default();
        for c in Category::ALL {
            let p = table.get(c);
            p.validate().unwrap();
            assert!((0.10..=0.12).contains(&p.alpha_min));
            assert!((0.18..=0.22).contains(&p.alpha_max));
            assert!((1.0..=1.2).contains(&p.k));
        }
    }

    #[test]
    fn engine_is_the_most_decisive() {
        let table = ProfileTable::default();
        let t = |c| table.get(c).temperature;
        assert!(t(Category::Engine) < t(Category::SafeMode));
        assert!(t(Category::SafeMode) < t(Category::Interface));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let bad = CategoryProfile {
            alpha_min: 0.3,
            alpha_max: 0.2,
            ..CategoryProfile::ENGINE
        };
        assert!(
            ProfileTable::new(bad, CategoryProfile::INTERFACE, CategoryProfile::SAFE_MODE).is_err()
        );
    }

    #[test]
    fn category_parses_cli_spellings() {
        assert_eq!("safe-mode".parse::<Category>().unwrap(), Category::SafeMode);
        assert_eq!("Interface OS".parse::<Category>().unwrap(), Category::Interface);
        assert!("shadow".parse::<Category>().is_err());
    }
}
