use crate::core::normalize::{MAX_NOISE_AMPLITUDE, NormalizerParams};
use crate::error::{OracleError, Result};
use crate::oracle::diagnosis::EngineParams;
use crate::oracle::profile::{Category, CategoryProfile, ProfileTable};
use crate::oracle::pure_state::EntropyAdjustment;
use crate::oracle::reference::SCORE_RANGE;
use crate::oracle::scenario::ScenarioParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizerConfig {
    #[serde(default = "NormalizerConfig::default_variance_threshold")]
    pub variance_threshold: f64,
    #[serde(default = "NormalizerConfig::default_noise_amplitude")]
    pub noise_amplitude: f64,
}

impl NormalizerConfig {
    fn default_variance_threshold() -> f64 {
        NormalizerParams::default().variance_threshold
    }
    fn default_noise_amplitude() -> f64 {
        NormalizerParams::default().noise_amplitude
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            variance_threshold: Self::default_variance_threshold(),
            noise_amplitude: Self::default_noise_amplitude(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PureStateConfig {
    #[serde(default = "PureStateConfig::default_low_entropy")]
    pub low_entropy: f64,
    #[serde(default = "PureStateConfig::default_high_entropy")]
    pub high_entropy: f64,
    #[serde(default = "PureStateConfig::default_low_entropy_boost")]
    pub low_entropy_boost: f64,
    #[serde(default = "PureStateConfig::default_high_entropy_damping")]
    pub high_entropy_damping: f64,
}

impl PureStateConfig {
    fn default_low_entropy() -> f64 {
        EntropyAdjustment::default().low_entropy
    }
    fn default_high_entropy() -> f64 {
        EntropyAdjustment::default().high_entropy
    }
    fn default_low_entropy_boost() -> f64 {
        EntropyAdjustment::default().low_entropy_boost
    }
    fn default_high_entropy_damping() -> f64 {
        EntropyAdjustment::default().high_entropy_damping
    }
}

impl Default for PureStateConfig {
    fn default() -> Self {
        Self {
            low_entropy: Self::default_low_entropy(),
            high_entropy: Self::default_high_entropy(),
            low_entropy_boost: Self::default_low_entropy_boost(),
            high_entropy_damping: Self::default_high_entropy_damping(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectorConfig {
    #[serde(default = "SelectorConfig::default_avoid_pure_margin")]
    pub avoid_pure_margin: f64,
}

impl SelectorConfig {
    fn default_avoid_pure_margin() -> f64 {
        0.05
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            avoid_pure_margin: Self::default_avoid_pure_margin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default = "ScenarioConfig::default_trend_threshold")]
    pub trend_threshold: f64,
    #[serde(default = "ScenarioConfig::default_volatility_threshold")]
    pub volatility_threshold: f64,
    #[serde(default = "ScenarioConfig::default_placeholder_score")]
    pub placeholder_score: f64,
}

impl ScenarioConfig {
    fn default_trend_threshold() -> f64 {
        ScenarioParams::default().trend_threshold
    }
    fn default_volatility_threshold() -> f64 {
        ScenarioParams::default().volatility_threshold
    }
    fn default_placeholder_score() -> f64 {
        ScenarioParams::default().placeholder_score
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            trend_threshold: Self::default_trend_threshold(),
            volatility_threshold: Self::default_volatility_threshold(),
            placeholder_score: Self::default_placeholder_score(),
        }
    }
}

/// Per-category overrides; unset keys keep the category's built-in value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
}

impl ProfileConfig {
    fn resolve(&self, base: CategoryProfile) -> CategoryProfile {
        CategoryProfile {
            temperature: self.temperature.unwrap_or(base.temperature),
            alpha_min: self.alpha_min.unwrap_or(base.alpha_min),
            alpha_max: self.alpha_max.unwrap_or(base.alpha_max),
            k: self.k.unwrap_or(base.k),
        }
    }
}

impl From<CategoryProfile> for ProfileConfig {
    fn from(p: CategoryProfile) -> Self {
        Self {
            temperature: Some(p.temperature),
            alpha_min: Some(p.alpha_min),
            alpha_max: Some(p.alpha_max),
            k: Some(p.k),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfilesConfig {
    #[serde(default = "ProfilesConfig::default_engine")]
    pub engine: ProfileConfig,
    #[serde(default = "ProfilesConfig::default_interface")]
    pub interface: ProfileConfig,
    #[serde(default = "ProfilesConfig::default_safe_mode")]
    pub safe_mode: ProfileConfig,
}

impl ProfilesConfig {
    fn default_engine() -> ProfileConfig {
        CategoryProfile::ENGINE.into()
    }
    fn default_interface() -> ProfileConfig {
        CategoryProfile::INTERFACE.into()
    }
    fn default_safe_mode() -> ProfileConfig {
        CategoryProfile::SAFE_MODE.into()
    }

    pub fn resolve(&self, category: Category) -> CategoryProfile {
        match category {
            Category::Engine => self.engine.resolve(CategoryProfile::ENGINE),
            Category::Interface => self.interface.resolve(CategoryProfile::INTERFACE),
            Category::SafeMode => self.safe_mode.resolve(CategoryProfile::SAFE_MODE),
        }
    }
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            engine: Self::default_engine(),
            interface: Self::default_interface(),
            safe_mode: Self::default_safe_mode(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub pure_state: PureStateConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

impl AppConfig {
    /// Strict load: missing, unreadable or unparsable files are errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Missing file: write a commented default file and return defaults.
    /// Unreadable or unparsable file: warn and return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_obj = path.as_ref();
        let path = path_obj.display();
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                let mut commented = String::new();
                for line in text.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        commented.push('\n');
                    } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                        commented.push_str(line);
                        commented.push('\n');
                    } else {
                        commented.push_str("# ");
                        commented.push_str(line);
                        commented.push('\n');
                    }
                }
                match fs::write(path_obj, commented) {
                    Ok(()) => info!("Wrote default config to {path}"),
                    Err(err) => warn!("Failed to write default config to {path}: {err}"),
                }
            }
            Err(err) => {
                warn!("Failed to serialize default config: {err}; continuing with defaults")
            }
        }
        default_cfg
    }

    /// Check every section and build the immutable engine parameters.
    pub fn engine_params(&self) -> Result<EngineParams> {
        let n = &self.normalizer;
        if !(n.variance_threshold.is_finite() && n.variance_threshold >= 0.0) {
            return Err(invalid("normalizer.variance_threshold must be finite and >= 0"));
        }
        if !(0.0..=MAX_NOISE_AMPLITUDE).contains(&n.noise_amplitude) {
            return Err(invalid("normalizer.noise_amplitude must lie in [0, 0.5]"));
        }

        let p = &self.pure_state;
        if !(p.low_entropy.is_finite() && p.high_entropy.is_finite())
            || p.low_entropy > p.high_entropy
        {
            return Err(invalid("pure_state.low_entropy must not exceed pure_state.high_entropy"));
        }
        if !(p.low_entropy_boost > 0.0 && p.high_entropy_damping > 0.0) {
            return Err(invalid("pure_state multipliers must be positive"));
        }

        let margin = self.selector.avoid_pure_margin;
        if !(margin.is_finite() && margin >= 0.0) {
            return Err(invalid("selector.avoid_pure_margin must be finite and >= 0"));
        }

        let s = &self.scenario;
        if !(s.trend_threshold >= 0.0 && s.volatility_threshold >= 0.0) {
            return Err(invalid("scenario thresholds must be >= 0"));
        }
        let (lo, hi) = SCORE_RANGE;
        if !(lo..=hi).contains(&s.placeholder_score) {
            return Err(invalid("scenario.placeholder_score must lie in the score range"));
        }

        let profiles = ProfileTable::new(
            self.profiles.resolve(Category::Engine),
            self.profiles.resolve(Category::Interface),
            self.profiles.resolve(Category::SafeMode),
        )?;

        Ok(EngineParams {
            normalizer: NormalizerParams {
                variance_threshold: n.variance_threshold,
                noise_amplitude: n.noise_amplitude,
            },
            entropy: EntropyAdjustment {
                low_entropy: p.low_entropy,
                high_entropy: p.high_entropy,
                low_entropy_boost: p.low_entropy_boost,
                high_entropy_damping: p.high_entropy_damping,
            },
            avoid_pure_margin: margin,
            scenario: ScenarioParams {
                trend_threshold: s.trend_threshold,
                volatility_threshold: s.volatility_threshold,
                placeholder_score: s.placeholder_score,
            },
            profiles,
        })
    }
}

fn invalid(msg: &str) -> OracleError {
    OracleError::InvalidConfig(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "sixlines_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn load_or_default_writes_defaults_cleanly() {
        let path = unique_path("defaults.toml");
        let _ = fs::remove_file(&path);

        let cfg = AppConfig::load_or_default(&path);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.normalizer.variance_threshold, 0.01);
        assert_eq!(cfg.scenario.placeholder_score, 50.0);

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[normalizer]"));
        assert!(contents.contains("# variance_threshold = 0.01"));
        assert!(contents.contains("[profiles.engine]"));
        assert!(contents.contains("# temperature = 0.8"));

        // Only section headers are live, so the file resolves to the defaults.
        let reread = AppConfig::load(&path).unwrap();
        assert_eq!(
            reread.engine_params().unwrap(),
            AppConfig::default().engine_params().unwrap()
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_or_default_reads_existing() {
        let path = unique_path("custom.toml");
        let mut custom = AppConfig::default();
        custom.normalizer.noise_amplitude = 0.02;
        custom.scenario.trend_threshold = 3.0;
        custom.profiles.interface.alpha_max = Some(0.19);
        let text = toml::to_string_pretty(&custom).unwrap();
        fs::write(&path, text).unwrap();

        let cfg = AppConfig::load_or_default(&path);
        assert_eq!(cfg, custom);
        let params = cfg.engine_params().unwrap();
        assert_eq!(params.normalizer.noise_amplitude, 0.02);
        assert_eq!(params.scenario.trend_threshold, 3.0);
        assert_eq!(params.profiles.get(Category::Interface).alpha_max, 0.19);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_profile_keeps_category_values() {
        let cfg: AppConfig = toml::from_str("[profiles.safe_mode]\nk = 1.05\n").unwrap();
        let params = cfg.engine_params().unwrap();
        let safe = params.profiles.get(Category::SafeMode);
        assert_eq!(safe.k, 1.05);
        assert_eq!(safe.temperature, CategoryProfile::SAFE_MODE.temperature);
        assert_eq!(*params.profiles.get(Category::Engine), CategoryProfile::ENGINE);
    }

    #[test]
    fn inconsistent_values_are_rejected() {
        let mut cfg = AppConfig::default();
        cfg.profiles.engine.alpha_min = Some(0.3);
        assert!(matches!(cfg.engine_params(), Err(OracleError::InvalidProfile(_))));

        let mut cfg = AppConfig::default();
        cfg.pure_state.low_entropy = 2.5;
        assert!(matches!(cfg.engine_params(), Err(OracleError::InvalidConfig(_))));

        let mut cfg = AppConfig::default();
        cfg.scenario.placeholder_score = 120.0;
        assert!(matches!(cfg.engine_params(), Err(OracleError::InvalidConfig(_))));
    }

    #[test]
    fn noise_amplitude_is_bounded_at_one_half() {
        let mut cfg = AppConfig::default();
        cfg.normalizer.noise_amplitude = MAX_NOISE_AMPLITUDE;
        let params = cfg.engine_params().unwrap();
        assert_eq!(params.normalizer.noise_amplitude, 0.5);

        for bad in [0.500_001, 0.8, -0.01, f64::NAN] {
            cfg.normalizer.noise_amplitude = bad;
            assert!(
                matches!(cfg.engine_params(), Err(OracleError::InvalidConfig(_))),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let path = unique_path("broken.toml");
        fs::write(&path, "[normalizer\nvariance_threshold = ").unwrap();
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
        assert!(AppConfig::load(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
