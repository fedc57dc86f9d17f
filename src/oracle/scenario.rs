//! Scenario trees: every three-stage combination of progression and mutation
//! from a starting state, scored against the reference dataset.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::hexagram::HexagramResolver;
use super::reference::{LineRecord, ReferenceSource, SCORE_RANGE};
use super::transition::{LineState, Operator, StateTransitionEngine};

pub const STAGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// Mean per-stage delta beyond which a path trends up or down.
    pub trend_threshold: f64,
    /// Spread of per-stage deltas beyond which a path is volatile.
    pub volatility_threshold: f64,
    /// Score given to states without a reference entry.
    pub placeholder_score: f64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            trend_threshold: 5.0,
            volatility_threshold: 10.0,
            placeholder_score: 50.0,
        }
    }
}

/// One of the eight operator sequences, stage 1 first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Combination([Operator; STAGES]);

impl Combination {
    /// Canonical order: PPP, PPM, PMP, PMM, MPP, MPM, MMP, MMM.
    pub const ALL: [Combination; 8] = {
        let mut out = [Combination([Operator::Progression; STAGES]); 8];
        let mut i = 0;
        while i < 8 {
            let mut stage = 0;
            while stage < STAGES {
                if (i >> (STAGES - 1 - stage)) & 1 == 1 {
                    out[i].0[stage] = Operator::Mutation;
                }
                stage += 1;
            }
            i += 1;
        }
        out
    };

    pub fn new(operators: [Operator; STAGES]) -> Self {
        Self(operators)
    }

    #[inline]
    pub fn operators(&self) -> &[Operator; STAGES] {
        &self.0
    }

    /// Position in canonical order, 1..=8.
    pub fn index(&self) -> u8 {
        let bits = self
            .0
            .iter()
            .fold(0u8, |acc, op| (acc << 1) | (*op == Operator::Mutation) as u8);
        bits + 1
    }

    pub fn code(&self) -> String {
        self.0.iter().map(|op| op.code()).collect()
    }

    pub fn label(&self) -> &'static str {
        match self.index() {
            1 => "steady deepening",
            2 => "two-step deepening, then a shift",
            3 => "deepen, shift, deepen again",
            4 => "early deepening, then repeated shifts",
            5 => "shift, then two-step deepening",
            6 => "shift, deepen, shift again",
            7 => "repeated shifts, then deepening",
            _ => "continuous reframing",
        }
    }

    pub fn balance(&self) -> OperatorBalance {
        let mutations = self.0.iter().filter(|op| **op == Operator::Mutation).count();
        let progressions = STAGES - mutations;
        match mutations.abs_diff(progressions) {
            d if d == STAGES => OperatorBalance::Focused,
            0 | 1 => OperatorBalance::Balanced,
            _ => OperatorBalance::Variable,
        }
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Upward,
    Downward,
    Volatile,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperatorBalance {
    /// All stages use one operator.
    Focused,
    /// Operator counts differ by at most one.
    Balanced,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ThemeShift {
    /// Progression within the same hexagram.
    Continuation,
    /// Progression past the top line into the next hexagram.
    Structural,
    /// Mutation.
    Reframe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StateMetadata {
    pub hexagram_name: String,
    pub keywords: Vec<String>,
    pub summary: String,
    /// True when the reference dataset had no usable entry.
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioState {
    pub hexagram_id: u8,
    pub line_position: u8,
    pub score: f64,
    pub metadata: StateMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioStep {
    /// 1..=3.
    pub stage: u8,
    pub operator: Operator,
    pub from: LineState,
    pub to: LineState,
    pub score_delta: f64,
    pub shift: ThemeShift,
    pub keywords_gained: Vec<String>,
    pub keywords_lost: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioPath {
    combination: Combination,
    pub code: String,
    pub label: String,
    /// Initial state followed by one state per stage.
    pub states: Vec<ScenarioState>,
    pub steps: Vec<ScenarioStep>,
    pub final_score: f64,
    pub score_change: f64,
    pub trend: Trend,
    pub balance: OperatorBalance,
}

impl ScenarioPath {
    /// Identity of the path; independent of any display ordering.
    #[inline]
    pub fn combination(&self) -> Combination {
        self.combination
    }

    pub fn initial_score(&self) -> f64 {
        self.states.first().map(|s| s.score).unwrap_or_default()
    }

    pub fn stage_deltas(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.score_delta).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioTree {
    pub start: LineState,
    /// Always eight paths, in canonical combination order.
    pub paths: Vec<ScenarioPath>,
}

impl ScenarioTree {
    pub fn path(&self, combination: Combination) -> Option<&ScenarioPath> {
        self.paths.iter().find(|p| p.combination == combination)
    }

    /// Paths by descending final score; ties keep canonical order. The tree
    /// itself is not reordered.
    pub fn ranked_by_final_score(&self) -> Vec<&ScenarioPath> {
        let mut ranked: Vec<&ScenarioPath> = self.paths.iter().collect();
        ranked.sort_by(|a, b| {
            b.final_score
                .total_cmp(&a.final_score)
                .then(a.combination.index().cmp(&b.combination.index()))
        });
        ranked
    }
}

/// Classify a path's per-stage score deltas.
pub fn classify_trend(deltas: &[f64], params: &ScenarioParams) -> Trend {
    if deltas.is_empty() {
        return Trend::Stable;
    }
    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    let max = deltas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = deltas.iter().copied().fold(f64::INFINITY, f64::min);
    if mean > params.trend_threshold {
        Trend::Upward
    } else if mean < -params.trend_threshold {
        Trend::Downward
    } else if max - min > params.volatility_threshold {
        Trend::Volatile
    } else {
        Trend::Stable
    }
}

pub struct ScenarioTreeGenerator<'a, S: ReferenceSource + ?Sized> {
    reference: &'a S,
    params: ScenarioParams,
}

impl<'a, S: ReferenceSource + ?Sized> ScenarioTreeGenerator<'a, S> {
    pub fn new(reference: &'a S, params: ScenarioParams) -> Self {
        Self { reference, params }
    }

    /// Never fails: missing reference data becomes placeholder states.
    pub fn generate(&self, start: LineState) -> ScenarioTree {
        let mut cache: BTreeMap<(u8, u8), ScenarioState> = BTreeMap::new();
        let paths = Combination::ALL
            .iter()
            .map(|c| self.walk(*c, start, &mut cache))
            .collect();
        let placeholders = cache.values().filter(|s| s.metadata.placeholder).count();
        debug!(
            target: "scenario",
            start = %start,
            distinct_states = cache.len(),
            placeholders,
            "scenario tree generated"
        );
        ScenarioTree { start, paths }
    }

    fn walk(
        &self,
        combination: Combination,
        start: LineState,
        cache: &mut BTreeMap<(u8, u8), ScenarioState>,
    ) -> ScenarioPath {
        let mut current = start;
        let mut states = Vec::with_capacity(STAGES + 1);
        let mut steps = Vec::with_capacity(STAGES);
        states.push(self.state_at(current, cache));

        for (i, op) in combination.operators().iter().enumerate() {
            let next = StateTransitionEngine::apply(current, *op);
            let after = self.state_at(next, cache);
            let before = &states[i];
            let shift = match op {
                Operator::Mutation => ThemeShift::Reframe,
                Operator::Progression if next.hexagram_id() != current.hexagram_id() => {
                    ThemeShift::Structural
                }
                Operator::Progression => ThemeShift::Continuation,
            };
            let (gained, lost) = keyword_diff(&before.metadata.keywords, &after.metadata.keywords);
            steps.push(ScenarioStep {
                stage: (i + 1) as u8,
                operator: *op,
                from: current,
                to: next,
                score_delta: after.score - before.score,
                shift,
                keywords_gained: gained,
                keywords_lost: lost,
            });
            states.push(after);
            current = next;
        }

        let initial = states[0].score;
        let final_score = states[STAGES].score;
        let deltas: Vec<f64> = steps.iter().map(|s| s.score_delta).collect();
        ScenarioPath {
            combination,
            code: combination.code(),
            label: combination.label().to_string(),
            trend: classify_trend(&deltas, &self.params),
            balance: combination.balance(),
            states,
            steps,
            final_score,
            score_change: final_score - initial,
        }
    }

    fn state_at(
        &self,
        state: LineState,
        cache: &mut BTreeMap<(u8, u8), ScenarioState>,
    ) -> ScenarioState {
        let key = (state.hexagram_id(), state.line_position());
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }
        let (record, placeholder) = match self.reference.lookup(key.0, key.1) {
            Some(r) if r.score.is_finite() => {
                let (lo, hi) = SCORE_RANGE;
                let mut r = r.clone();
                r.score = r.score.clamp(lo, hi);
                (r, false)
            }
            Some(_) => {
                warn!(
                    target: "scenario",
                    state = %state,
                    "reference score is not finite, using placeholder"
                );
                (LineRecord::placeholder(self.params.placeholder_score), true)
            }
            None => {
                warn!(
                    target: "scenario",
                    state = %state,
                    "no reference entry, using placeholder"
                );
                (LineRecord::placeholder(self.params.placeholder_score), true)
            }
        };
        let out = ScenarioState {
            hexagram_id: key.0,
            line_position: key.1,
            score: record.score,
            metadata: StateMetadata {
                hexagram_name: HexagramResolver::name(key.0).unwrap_or_default().to_string(),
                keywords: record.keywords,
                summary: record.summary,
                placeholder,
            },
        };
        cache.insert(key, out.clone());
        out
    }
}

fn keyword_diff(before: &[String], after: &[String]) -> (Vec<String>, Vec<String>) {
    let b: BTreeSet<&String> = before.iter().collect();
    let a: BTreeSet<&String> = after.iter().collect();
    let gained = after.iter().filter(|k| !b.contains(k)).cloned().collect();
    let lost = before.iter().filter(|k| !a.contains(k)).cloned().collect();
    (gained, lost)
}
