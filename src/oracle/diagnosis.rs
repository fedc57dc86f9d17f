//! End-to-end diagnosis: traits -> distribution -> alpha -> trigrams ->
//! hexagram, optionally followed by a scenario tree.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::hexagram::{Hexagram, HexagramResolver};
use super::interaction::InteractionMatrix;
use super::profile::{Category, ProfileTable};
use super::pure_state::{EntropyAdjustment, PureStateController, PureStateDecision};
use super::reference::ReferenceSource;
use super::scenario::{ScenarioParams, ScenarioTree, ScenarioTreeGenerator};
use super::selector::{SelectionMode, TrigramSelection, TrigramSelector};
use super::transition::LineState;
use super::trigram::TraitVector;
use crate::core::concentration::ConcentrationMetrics;
use crate::core::distribution::EnergyDistribution;
use crate::core::energy::EnergyDistributionEngine;
use crate::core::normalize::{NormalizerParams, VectorNormalizer, population_variance};
use crate::core::uniform::{CountingUniform, UniformSource};
use crate::error::Result;

/// How raw traits become a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Normalization {
    /// z-score, clamp negatives, L1-normalize.
    #[default]
    Relu,
    /// Temperature softmax; `None` uses the category profile's temperature.
    Softmax {
        #[serde(default)]
        temperature: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosisRequest {
    pub traits: TraitVector,
    pub category: Category,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub selection: SelectionMode,
    /// Line position of the resolved hexagram to grow a scenario tree from.
    #[serde(default)]
    pub scenario_line: Option<u8>,
    #[serde(default)]
    pub debug: bool,
}

impl DiagnosisRequest {
    pub fn new(traits: TraitVector, category: Category) -> Self {
        Self {
            traits,
            category,
            normalization: Normalization::default(),
            selection: SelectionMode::default(),
            scenario_line: None,
            debug: false,
        }
    }
}

/// Fallbacks taken and randomness consumed during one diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosisTrace {
    pub normalization: Normalization,
    /// Population variance of the raw traits.
    pub variance: f64,
    pub perturbed: bool,
    pub softmax_retried: bool,
    pub softmax_fell_back: bool,
    pub selection: SelectionMode,
    pub rng_draws: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosisReport {
    pub category: Category,
    pub distribution: EnergyDistribution,
    pub concentration: ConcentrationMetrics,
    pub pure_state: PureStateDecision,
    pub selection: TrigramSelection,
    pub hexagram: Hexagram,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_tree: Option<ScenarioTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<DiagnosisTrace>,
}

/// One trait vector per category, diagnosed in category order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TripleRequest {
    pub engine: TraitVector,
    pub interface: TraitVector,
    pub safe_mode: TraitVector,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub selection: SelectionMode,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TripleReport {
    pub engine: DiagnosisReport,
    pub interface: DiagnosisReport,
    pub safe_mode: DiagnosisReport,
    /// Line-pattern relations between the three resolved hexagrams.
    pub interactions: InteractionMatrix,
}

/// Immutable parameters for every stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    pub normalizer: NormalizerParams,
    pub entropy: EntropyAdjustment,
    pub avoid_pure_margin: f64,
    pub scenario: ScenarioParams,
    pub profiles: ProfileTable,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            normalizer: NormalizerParams::default(),
            entropy: EntropyAdjustment::default(),
            avoid_pure_margin: 0.05,
            scenario: ScenarioParams::default(),
            profiles: ProfileTable::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnoser {
    params: EngineParams,
    normalizer: VectorNormalizer,
    energy: EnergyDistributionEngine,
    selector: TrigramSelector,
}

impl Diagnoser {
    pub fn new(params: EngineParams) -> Self {
        Self {
            params,
            normalizer: VectorNormalizer::new(params.normalizer),
            energy: EnergyDistributionEngine::new(params.normalizer),
            selector: TrigramSelector::new(params.avoid_pure_margin),
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn selector(&self) -> &TrigramSelector {
        &self.selector
    }

    /// The normalization stage of [`Diagnoser::diagnose`] on its own.
    pub fn distribution<U: UniformSource + ?Sized>(
        &self,
        traits: &TraitVector,
        category: Category,
        normalization: Normalization,
        rng: &mut U,
    ) -> Result<(EnergyDistribution, Stages)> {
        let values = traits.values();
        match normalization {
            Normalization::Relu => {
                let n = self.normalizer.normalize(values, rng)?;
                Ok((
                    n.distribution,
                    Stages {
                        variance: n.variance,
                        perturbed: n.perturbed,
                        ..Stages::default()
                    },
                ))
            }
            Normalization::Softmax { temperature } => {
                let t = temperature.unwrap_or(self.params.profiles.get(category).temperature);
                let out = self.energy.distribute(values, t, rng)?;
                Ok((
                    out.distribution,
                    Stages {
                        variance: population_variance(values),
                        temperature: Some(t),
                        softmax_retried: out.retried,
                        softmax_fell_back: out.fell_back,
                        ..Stages::default()
                    },
                ))
            }
        }
    }

    pub fn diagnose<U, S>(
        &self,
        request: &DiagnosisRequest,
        rng: &mut U,
        reference: &S,
    ) -> Result<DiagnosisReport>
    where
        U: UniformSource + ?Sized,
        S: ReferenceSource + ?Sized,
    {
        let category = request.category;
        // Reject a bad scenario line before consuming any randomness.
        if let Some(line) = request.scenario_line {
            super::hexagram::check_line(line)?;
        }

        let mut rng = CountingUniform::new(rng);
        let (distribution, stages) =
            self.distribution(&request.traits, category, request.normalization, &mut rng)?;
        let concentration = ConcentrationMetrics::analyze(&distribution);

        let controller = PureStateController::new(
            category,
            *self.params.profiles.get(category),
            self.params.entropy,
        );
        let pure_state = controller.decide(&concentration);
        let selection = self
            .selector
            .select(request.selection, &distribution, pure_state.alpha, &mut rng);
        let hexagram = HexagramResolver::resolve(selection.upper, selection.lower);
        let rng_draws = rng.draws();

        let scenario_tree = match request.scenario_line {
            Some(line) => {
                let start = LineState::new(hexagram.id, line)?;
                let generator = ScenarioTreeGenerator::new(reference, self.params.scenario);
                Some(generator.generate(start))
            }
            None => None,
        };

        info!(
            target: "diagnosis",
            category = %category,
            hexagram = hexagram.id,
            upper = %selection.upper,
            lower = %selection.lower,
            pure = selection.is_pure,
            alpha = pure_state.alpha,
            "diagnosis complete"
        );
        debug!(
            target: "diagnosis",
            rng_draws,
            perturbed = stages.perturbed,
            "diagnosis trace"
        );

        let normalization = match request.normalization {
            Normalization::Softmax { .. } => Normalization::Softmax {
                temperature: stages.temperature,
            },
            other => other,
        };
        let trace = request.debug.then(|| DiagnosisTrace {
            normalization,
            variance: stages.variance,
            perturbed: stages.perturbed,
            softmax_retried: stages.softmax_retried,
            softmax_fell_back: stages.softmax_fell_back,
            selection: request.selection,
            rng_draws,
        });

        Ok(DiagnosisReport {
            category,
            distribution,
            concentration,
            pure_state,
            selection,
            hexagram,
            scenario_tree,
            trace,
        })
    }

    /// Engine, interface, then safe mode, all drawing from `rng` in that order.
    pub fn diagnose_triple<U, S>(
        &self,
        request: &TripleRequest,
        rng: &mut U,
        reference: &S,
    ) -> Result<TripleReport>
    where
        U: UniformSource + ?Sized,
        S: ReferenceSource + ?Sized,
    {
        let mut run = |traits: &TraitVector, category: Category| {
            let req = DiagnosisRequest {
                traits: *traits,
                category,
                normalization: request.normalization,
                selection: request.selection,
                scenario_line: None,
                debug: request.debug,
            };
            self.diagnose(&req, &mut *rng, reference)
        };
        let engine = run(&request.engine, Category::Engine)?;
        let interface = run(&request.interface, Category::Interface)?;
        let safe_mode = run(&request.safe_mode, Category::SafeMode)?;
        let interactions =
            InteractionMatrix::new(&engine.hexagram, &interface.hexagram, &safe_mode.hexagram);
        debug!(
            target: "diagnosis",
            ids = ?interactions.hexagram_ids,
            mean_distance = interactions.mean_distance(),
            "triple interactions"
        );
        Ok(TripleReport {
            engine,
            interface,
            safe_mode,
            interactions,
        })
    }

    /// Observed pure-state frequency over `draws` stochastic selections for
    /// the distribution and alpha a diagnosis of `traits` would use.
    pub fn calibrate<U: UniformSource + ?Sized>(
        &self,
        traits: &TraitVector,
        category: Category,
        draws: usize,
        rng: &mut U,
    ) -> Result<Calibration> {
        let (distribution, _) = self.distribution(traits, category, Normalization::Relu, rng)?;
        let concentration = ConcentrationMetrics::analyze(&distribution);
        let controller = PureStateController::new(
            category,
            *self.params.profiles.get(category),
            self.params.entropy,
        );
        let alpha = controller.decide(&concentration).alpha;
        let observed = self.selector.estimate_pure_rate(&distribution, alpha, draws, rng);
        debug!(
            target: "diagnosis",
            category = %category,
            alpha,
            observed,
            draws,
            "pure-rate calibration"
        );
        Ok(Calibration {
            category,
            alpha,
            herfindahl_norm: concentration.herfindahl_norm,
            entropy: concentration.entropy,
            draws,
            observed_pure_rate: observed,
        })
    }
}

/// Intermediate facts from the normalization stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stages {
    pub variance: f64,
    pub perturbed: bool,
    pub temperature: Option<f64>,
    pub softmax_retried: bool,
    pub softmax_fell_back: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Calibration {
    pub category: Category,
    pub alpha: f64,
    pub herfindahl_norm: f64,
    pub entropy: f64,
    pub draws: usize,
    pub observed_pure_rate: f64,
}
