//! Feature aggregation: attempt history → axis scores + coverage.
//!
//! Each considered game gets a 0..=100 performance from its latest attempt
//! (error rate and share of slow answers). Performances are spread over the
//! axes with the catalog's contribution weights. Coverage records how much of
//! each axis' weight was actually backed by an attempt, which keeps "weak
//! skill" apart from "never tested".

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::PlacementError;
use crate::fuzzy::defuzzify::round_to;
use crate::model::{Attempt, Axis, AxisScores, Coverage, GameType, MiniGameResults};

/// Axes only reachable through games the learner never played.
pub type MissedAxes = BTreeSet<Axis>;

/// Weights and fallback scores of the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceWeights {
    /// Weight of the error rate in the performance score.
    pub error_weight: f64,
    /// Weight of the slow-answer rate for games without an override.
    pub default_slow_weight: f64,
    /// Score of an uncovered axis whose games were skipped.
    pub missed_axis_score: f64,
    /// Score of an axis with no evidence and nothing skipped.
    pub neutral_axis_score: f64,
}

impl Default for PerformanceWeights {
    fn default() -> Self {
        Self {
            error_weight: 0.7,
            default_slow_weight: 0.3,
            missed_axis_score: 30.0,
            neutral_axis_score: 50.0,
        }
    }
}

/// Axis scores and their coverage, ready for the inference engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuzzyInputs {
    pub axes: AxisScores,
    pub coverage: Coverage,
}

/// Latest non-null attempt.
pub fn latest_attempt(attempts: &[Option<Attempt>]) -> Option<&Attempt> {
    attempts.iter().rev().find_map(Option::as_ref)
}

/// `1 - score/100` clamped to `0..=1`; 1 without an attempt.
pub fn error_rate(attempt: Option<&Attempt>) -> f64 {
    match attempt {
        Some(a) => (1.0 - a.score_percent.unwrap_or(0.0) / 100.0).clamp(0.0, 1.0),
        None => 1.0,
    }
}

/// Share of the attempt's questions answered slowly.
pub fn slow_rate(attempt: Option<&Attempt>) -> f64 {
    let Some(a) = attempt else {
        return 0.0;
    };
    if a.logs.is_empty() {
        return 0.0;
    }
    let slow = a.logs.iter().filter(|l| l.is_slow()).count();
    slow as f64 / a.logs.len() as f64
}

/// Performance 0..=100 from error and speed.
pub fn performance_score(attempt: Option<&Attempt>, error_weight: f64, slow_weight: f64) -> f64 {
    let v = 1.0 - (error_rate(attempt) * error_weight + slow_rate(attempt) * slow_weight);
    (v.clamp(0.0, 1.0) * 100.0).round()
}

/// Converts attempt history into fuzzy inputs.
#[derive(Debug, Clone)]
pub struct FeatureAggregator {
    catalog: Arc<Catalog>,
    weights: PerformanceWeights,
}

impl FeatureAggregator {
    pub fn new(catalog: Arc<Catalog>, weights: PerformanceWeights) -> Self {
        Self { catalog, weights }
    }

    pub fn weights(&self) -> &PerformanceWeights {
        &self.weights
    }

    /// Performance of a game, or `None` if it has no recorded attempt.
    pub fn game_performance(&self, game: GameType, attempts: &[Option<Attempt>]) -> Option<f64> {
        let latest = latest_attempt(attempts)?;
        let slow_weight = self
            .catalog
            .speed_weight(game, self.weights.default_slow_weight);
        Some(performance_score(
            Some(latest),
            self.weights.error_weight,
            slow_weight,
        ))
    }

    /// Build axis scores and coverage from a learner's results.
    ///
    /// `included` restricts the games considered; `None` (or an empty slice)
    /// considers every game in the contribution matrix. An explicit game the
    /// matrix does not map is a configuration error.
    pub fn build_fuzzy_inputs(
        &self,
        results: &MiniGameResults,
        included: Option<&[GameType]>,
        missed: &MissedAxes,
    ) -> Result<FuzzyInputs, PlacementError> {
        let considered = self.considered_games(included)?;

        for game in results.keys() {
            if !considered.contains(game) {
                tracing::debug!(%game, "results for a game outside the considered set ignored");
            }
        }

        let performances: Vec<(GameType, Option<f64>)> = considered
            .iter()
            .map(|&game| {
                let perf = results
                    .get(&game)
                    .and_then(|attempts| self.game_performance(game, attempts));
                tracing::debug!(%game, performance = ?perf, "game performance");
                (game, perf)
            })
            .collect();

        let mut inputs = FuzzyInputs::default();
        for axis in Axis::ALL {
            let mut denom = 0.0;
            let mut have = 0.0;
            let mut num = 0.0;
            for &(game, perf) in &performances {
                let w = self.catalog.contribution(game, axis);
                if w <= 0.0 {
                    continue;
                }
                denom += w;
                if let Some(p) = perf {
                    have += w;
                    num += p * w;
                }
            }

            inputs.coverage[axis] = if denom > 0.0 {
                round_to(have / denom, 3)
            } else {
                0.0
            };
            inputs.axes[axis] = if have > 0.0 {
                (num / have).round()
            } else if missed.contains(&axis) {
                self.weights.missed_axis_score
            } else {
                self.weights.neutral_axis_score
            };
        }

        Ok(inputs)
    }

    /// Axes touched by any game in `all` that is not in `completed`.
    pub fn missed_axes_from_incomplete_games(
        &self,
        all: &[GameType],
        completed: &[GameType],
    ) -> MissedAxes {
        all.iter()
            .filter(|g| !completed.contains(g))
            .flat_map(|&g| self.catalog.axes_for(g))
            .collect()
    }

    fn considered_games(
        &self,
        included: Option<&[GameType]>,
    ) -> Result<Vec<GameType>, PlacementError> {
        match included {
            Some(games) if !games.is_empty() => {
                let mut seen = HashSet::new();
                let mut considered = Vec::with_capacity(games.len());
                for &game in games {
                    if !self.catalog.is_mapped(game) {
                        return Err(PlacementError::config(format!(
                            "game \"{game}\" has no axis contributions"
                        )));
                    }
                    if seen.insert(game) {
                        considered.push(game);
                    }
                }
                Ok(considered)
            }
            _ => Ok(self.catalog.mapped_games()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionLog, TimeCategory};

    fn aggregator() -> FeatureAggregator {
        FeatureAggregator::new(Arc::new(Catalog::default()), PerformanceWeights::default())
    }

    fn log(slow: bool) -> QuestionLog {
        QuestionLog {
            is_correct: true,
            time_spent_ms: 1500.0,
            answer_time_category: Some(if slow {
                TimeCategory::Slow
            } else {
                TimeCategory::Fast
            }),
            error_type: None,
            extra: Default::default(),
        }
    }

    fn scored(score: f64) -> Option<Attempt> {
        Some(Attempt {
            score_percent: Some(score),
            ..Default::default()
        })
    }

    #[test]
    fn rates_and_performance() {
        let attempt = Attempt {
            score_percent: Some(80.0),
            success: None,
            logs: vec![log(true), log(false), log(false), log(false)],
        };
        assert!((error_rate(Some(&attempt)) - 0.2).abs() < 1e-12);
        assert_eq!(slow_rate(Some(&attempt)), 0.25);
        // 1 - (0.2 * 0.7 + 0.25 * 0.35) = 0.7725
        assert_eq!(performance_score(Some(&attempt), 0.7, 0.35), 77.0);
        assert_eq!(error_rate(None), 1.0);
        assert_eq!(performance_score(None, 0.7, 0.3), 30.0);
    }

    #[test]
    fn score_outside_range_is_clamped() {
        let over = Attempt {
            score_percent: Some(140.0),
            ..Default::default()
        };
        assert_eq!(error_rate(Some(&over)), 0.0);
        assert_eq!(error_rate(Some(&Attempt::default())), 1.0);
    }

    #[test]
    fn latest_skips_null_attempts() {
        let attempts = vec![scored(20.0), scored(90.0), None];
        assert_eq!(latest_attempt(&attempts).unwrap().score_percent, Some(90.0));
        assert_eq!(
            aggregator().game_performance(GameType::CompareNumbers, &attempts),
            Some(93.0)
        );
        assert_eq!(
            aggregator().game_performance(GameType::CompareNumbers, &[None]),
            None
        );
    }

    #[test]
    fn weighted_axis_merge() {
        let mut results = MiniGameResults::new();
        results.insert(
            GameType::VerticalOperations,
            vec![Some(Attempt {
                score_percent: Some(80.0),
                success: None,
                logs: vec![log(true), log(false), log(false), log(false)],
            })],
        );
        results.insert(GameType::ChooseAnswer, vec![scored(100.0)]);

        let inputs = aggregator()
            .build_fuzzy_inputs(
                &results,
                Some(&[GameType::VerticalOperations, GameType::ChooseAnswer]),
                &MissedAxes::new(),
            )
            .unwrap();
        // (77 * 1.0 + 100 * 0.6) / 1.6
        assert_eq!(inputs.axes.arithmetic_fluency, 86.0);
        assert_eq!(inputs.axes.number_sense, 100.0);
        assert_eq!(inputs.axes.sequential_thinking, 100.0);
        assert_eq!(inputs.coverage.arithmetic_fluency, 1.0);
        assert_eq!(inputs.axes.visual_matching, 50.0);
        assert_eq!(inputs.coverage.visual_matching, 0.0);
    }

    #[test]
    fn partial_coverage_is_rounded() {
        let mut results = MiniGameResults::new();
        results.insert(GameType::VerticalOperations, vec![scored(100.0)]);
        results.insert(GameType::ChooseAnswer, vec![scored(100.0)]);

        let inputs = aggregator()
            .build_fuzzy_inputs(
                &results,
                Some(&[
                    GameType::VerticalOperations,
                    GameType::ChooseAnswer,
                    GameType::FindCompositions,
                ]),
                &MissedAxes::new(),
            )
            .unwrap();
        // 1.6 / 2.2 and 0.2 / 0.6
        assert_eq!(inputs.coverage.arithmetic_fluency, 0.727);
        assert_eq!(inputs.coverage.number_sense, 0.333);
    }

    #[test]
    fn missed_axis_is_penalized() {
        let mut results = MiniGameResults::new();
        results.insert(GameType::VerticalOperations, vec![scored(90.0)]);
        let missed = MissedAxes::from([Axis::ComparisonSkill]);

        let inputs = aggregator()
            .build_fuzzy_inputs(
                &results,
                Some(&[GameType::VerticalOperations, GameType::CompareNumbers]),
                &missed,
            )
            .unwrap();
        assert_eq!(inputs.axes.comparison_skill, 30.0);
        assert_eq!(inputs.coverage.comparison_skill, 0.0);
        assert_eq!(inputs.axes.audio_recognition, 50.0);
    }

    #[test]
    fn default_considers_whole_matrix() {
        let mut results = MiniGameResults::new();
        results.insert(GameType::TapMatchingPairs, vec![scored(100.0)]);
        let inputs = aggregator()
            .build_fuzzy_inputs(&results, None, &MissedAxes::new())
            .unwrap();
        assert_eq!(inputs.axes.visual_matching, 100.0);
        assert_eq!(inputs.coverage.visual_matching, 1.0);
        assert_eq!(inputs.coverage.number_sense, 0.0);
        assert_eq!(inputs.axes.number_sense, 50.0);
    }

    #[test]
    fn unmapped_explicit_game_is_config_error() {
        let mut catalog = Catalog::default();
        catalog.contributions.remove(&GameType::ReadNumberAloud);
        let aggregator = FeatureAggregator::new(Arc::new(catalog), PerformanceWeights::default());
        let err = aggregator
            .build_fuzzy_inputs(
                &MiniGameResults::new(),
                Some(&[GameType::ReadNumberAloud]),
                &MissedAxes::new(),
            )
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn missed_axes_from_skipped_games() {
        let missed = aggregator().missed_axes_from_incomplete_games(
            &[
                GameType::VerticalOperations,
                GameType::MultiStepProblem,
                GameType::CompareNumbers,
            ],
            &[GameType::VerticalOperations],
        );
        assert_eq!(
            missed,
            MissedAxes::from([
                Axis::ArithmeticFluency,
                Axis::SequentialThinking,
                Axis::ComparisonSkill
            ])
        );
    }
}
