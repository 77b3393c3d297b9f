//! Placement sessions.
//!
//! A [`PlacementSession`] drives one learner through a test plan: it asks
//! the decision runner which game comes next, records every attempt and
//! finally hands the attempt log to a [`PlacementEvaluator`].

use std::sync::Arc;

use crate::aggregator::{latest_attempt, FeatureAggregator};
use crate::catalog::Catalog;
use crate::config::LevelcheckConfig;
use crate::decision_tree::{build_default_decision_tree, Advance, DecisionTreeRunner};
use crate::error::PlacementError;
use crate::fuzzy::{InferenceEngine, MembershipMode};
use crate::model::{Attempt, GameType, MiniGameResults};
use crate::parser::TestPlan;
use crate::report::{GameSummary, PlacementReport, PlanSummary};

/// Turns a learner's attempt log into a placement report.
#[derive(Debug, Clone)]
pub struct PlacementEvaluator {
    catalog: Arc<Catalog>,
    aggregator: FeatureAggregator,
    engine: InferenceEngine,
    provisional_below: f64,
}

impl PlacementEvaluator {
    pub fn new(config: &LevelcheckConfig) -> Result<Self, PlacementError> {
        let catalog = config.catalog()?;
        Ok(Self::with_catalog(catalog, config))
    }

    fn with_catalog(catalog: Arc<Catalog>, config: &LevelcheckConfig) -> Self {
        Self {
            aggregator: FeatureAggregator::new(catalog.clone(), config.weights.clone()),
            engine: InferenceEngine::new(catalog.clone(), config.calibration.clone()),
            catalog,
            provisional_below: config.provisional_below,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Evaluate `results` against `plan`.
    ///
    /// Games of the plan without a recorded attempt count as skipped, so the
    /// axes only they reach are scored as missed.
    pub fn evaluate(
        &self,
        plan: &TestPlan,
        results: &MiniGameResults,
        mode: MembershipMode,
    ) -> Result<PlacementReport, PlacementError> {
        let order = plan.play_order(&self.catalog);

        for game in results.keys() {
            if !order.contains(game) {
                tracing::warn!(
                    %game,
                    plan = %plan.id,
                    "ignoring results for a game outside the plan"
                );
            }
        }

        let completed: Vec<GameType> = order
            .iter()
            .copied()
            .filter(|g| results.get(g).and_then(|a| latest_attempt(a)).is_some())
            .collect();
        let missed = self
            .aggregator
            .missed_axes_from_incomplete_games(&order, &completed);

        let scored: Vec<GameType> = order
            .iter()
            .copied()
            .filter(|g| self.catalog.is_mapped(*g))
            .collect();
        if scored.is_empty() {
            return Err(PlacementError::config(format!(
                "plan \"{}\" has no scored mini-games",
                plan.id
            )));
        }
        let inputs = self
            .aggregator
            .build_fuzzy_inputs(results, Some(scored.as_slice()), &missed)?;

        let played = plan.played_configs(&self.catalog);
        let inference = self
            .engine
            .infer(&inputs.axes, &inputs.coverage, Some(played.as_slice()), mode);

        let games = order
            .iter()
            .map(|&game| {
                let attempts = results.get(&game).map(Vec::as_slice).unwrap_or_default();
                GameSummary {
                    game_type: game,
                    attempts: attempts.len(),
                    performance: self.aggregator.game_performance(game, attempts),
                    difficulty: plan
                        .config_for(game)
                        .map(|c| c.difficulty())
                        .unwrap_or_default(),
                }
            })
            .collect();

        let report = PlacementReport::new(
            PlanSummary::from(plan),
            mode,
            games,
            &missed,
            inputs,
            inference,
            self.provisional_below,
        );
        tracing::info!(
            plan = %plan.id,
            grade = report.inference.inferred_grade,
            confidence = report.inference.confidence,
            provisional = report.provisional,
            "placement evaluated"
        );
        Ok(report)
    }
}

/// Evaluate a finished attempt log with the given configuration.
pub fn evaluate_results(
    plan: &TestPlan,
    results: &MiniGameResults,
    config: &LevelcheckConfig,
    mode: MembershipMode,
) -> Result<PlacementReport, PlacementError> {
    PlacementEvaluator::new(config)?.evaluate(plan, results, mode)
}

/// One learner working through a test plan.
#[derive(Debug, Clone)]
pub struct PlacementSession {
    plan: TestPlan,
    runner: DecisionTreeRunner,
    evaluator: PlacementEvaluator,
    current: Option<String>,
    results: MiniGameResults,
    default_pass_percent: f64,
    mode: MembershipMode,
}

impl PlacementSession {
    /// Start a session on a linear flow over the plan's games.
    pub fn new(plan: TestPlan, config: &LevelcheckConfig) -> Result<Self, PlacementError> {
        let catalog = config.catalog()?;
        let order = plan.play_order(&catalog);
        let runner = DecisionTreeRunner::new(build_default_decision_tree(&order), catalog.clone())?
            .with_exhaustion_policy(config.exhaustion);
        let current = Some(runner.root()?.node_id.clone());

        Ok(Self {
            plan,
            runner,
            evaluator: PlacementEvaluator::with_catalog(catalog, config),
            current,
            results: MiniGameResults::new(),
            default_pass_percent: config.default_pass_percent,
            mode: config.mode,
        })
    }

    pub fn with_mode(mut self, mode: MembershipMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    pub fn runner(&self) -> &DecisionTreeRunner {
        &self.runner
    }

    pub fn results(&self) -> &MiniGameResults {
        &self.results
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    /// The game the learner should play next, or `None` once finished.
    pub fn current_game(&self) -> Option<GameType> {
        let id = self.current.as_deref()?;
        self.runner.node(id).map(|n| n.game_type)
    }

    /// Whether a failure on the current game would use up its forgiveness.
    pub fn is_last_attempt(&self) -> Result<bool, PlacementError> {
        let id = self.current.as_deref().ok_or(PlacementError::FlowFinished)?;
        self.runner.is_last_attempt(id)
    }

    /// Record an attempt on the current game and move the flow on.
    pub fn submit(&mut self, attempt: Attempt) -> Result<Advance, PlacementError> {
        let game = self.current_game().ok_or(PlacementError::FlowFinished)?;
        let passed = attempt.passed(self.plan.pass_percent_for(game, self.default_pass_percent));
        self.results.entry(game).or_default().push(Some(attempt));
        self.advance(passed)
    }

    /// Record that the learner abandoned the current game; counts as a failure.
    pub fn abandon(&mut self) -> Result<Advance, PlacementError> {
        let game = self.current_game().ok_or(PlacementError::FlowFinished)?;
        self.results.entry(game).or_default().push(None);
        self.advance(false)
    }

    fn advance(&mut self, passed: bool) -> Result<Advance, PlacementError> {
        let id = self.current.take().ok_or(PlacementError::FlowFinished)?;
        let advance = self.runner.record_and_advance(&id, passed)?;
        self.current = advance.next_node_id().map(str::to_string);
        Ok(advance)
    }

    /// Infer the learner's grade from everything recorded so far.
    pub fn evaluate(&self) -> Result<PlacementReport, PlacementError> {
        self.evaluator.evaluate(&self.plan, &self.results, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision_tree::ExhaustionPolicy;
    use crate::difficulty::{GameConfig, NumberRangeConfig};
    use crate::model::Axis;

    fn plan(games: &[GameType]) -> TestPlan {
        TestPlan {
            id: "unit".into(),
            name: "Unit plan".into(),
            description: String::new(),
            canonical_order: true,
            mini_games: games.iter().map(|g| GameConfig::default_for(*g)).collect(),
        }
    }

    fn scored(score: f64) -> Attempt {
        Attempt {
            score_percent: Some(score),
            ..Default::default()
        }
    }

    #[test]
    fn walks_plan_in_canonical_order() {
        let mut session = PlacementSession::new(
            plan(&[GameType::CompareNumbers, GameType::VerticalOperations]),
            &LevelcheckConfig::default(),
        )
        .unwrap();
        assert_eq!(session.current_game(), Some(GameType::VerticalOperations));

        let next = session.submit(scored(90.0)).unwrap();
        assert_eq!(next, Advance::Next("compare_numbers".into()));
        assert_eq!(session.current_game(), Some(GameType::CompareNumbers));

        assert!(session.submit(scored(80.0)).unwrap().is_finished());
        assert!(session.is_finished());
        assert_eq!(
            session.submit(scored(80.0)),
            Err(PlacementError::FlowFinished)
        );
    }

    #[test]
    fn failures_retry_then_end_the_flow() {
        let mut session = PlacementSession::new(
            plan(&[GameType::CompareNumbers, GameType::OrderNumbers]),
            &LevelcheckConfig::default(),
        )
        .unwrap();
        assert!(!session.is_last_attempt().unwrap());
        assert_eq!(
            session.submit(scored(20.0)).unwrap(),
            Advance::Next("compare_numbers".into())
        );
        assert!(session.submit(scored(30.0)).unwrap().is_finished());
        assert_eq!(session.results()[&GameType::CompareNumbers].len(), 2);
    }

    #[test]
    fn plan_threshold_decides_pass() {
        let mut p = plan(&[GameType::CompareNumbers, GameType::OrderNumbers]);
        p.mini_games[0] = GameConfig::CompareNumbers(NumberRangeConfig {
            required_correct_answers_minimum_percent: Some(90.0),
            ..Default::default()
        });
        let mut session = PlacementSession::new(p, &LevelcheckConfig::default()).unwrap();
        // 80 would pass the default threshold of 50
        assert_eq!(
            session.submit(scored(80.0)).unwrap(),
            Advance::Next("compare_numbers".into())
        );
        let explicit = Attempt {
            score_percent: Some(10.0),
            success: Some(true),
            logs: vec![],
        };
        assert_eq!(
            session.submit(explicit).unwrap(),
            Advance::Next("order_numbers".into())
        );
    }

    #[test]
    fn advance_policy_reaches_every_game() {
        let config = LevelcheckConfig {
            exhaustion: ExhaustionPolicy::Advance,
            ..Default::default()
        };
        let mut session = PlacementSession::new(
            plan(&[GameType::CompareNumbers, GameType::OrderNumbers]),
            &config,
        )
        .unwrap();
        session.abandon().unwrap();
        assert_eq!(
            session.abandon().unwrap(),
            Advance::Next("order_numbers".into())
        );
        assert_eq!(session.results()[&GameType::CompareNumbers], vec![None, None]);
    }

    #[test]
    fn skipped_games_penalize_their_axes() {
        let mut session = PlacementSession::new(
            plan(&[GameType::VerticalOperations, GameType::CompareNumbers]),
            &LevelcheckConfig::default(),
        )
        .unwrap();
        session.submit(scored(10.0)).unwrap();
        session.submit(scored(10.0)).unwrap();
        assert!(session.submit(scored(10.0)).unwrap().is_finished());

        let report = session.evaluate().unwrap();
        assert_eq!(report.missed_axes, vec![Axis::ComparisonSkill]);
        assert_eq!(report.inputs.axes.comparison_skill, 30.0);
        assert_eq!(report.inputs.coverage.comparison_skill, 0.0);
        assert_eq!(report.inputs.coverage.arithmetic_fluency, 1.0);
        // 1 - 0.9 * 0.7 = 0.37
        assert_eq!(report.inputs.axes.arithmetic_fluency, 37.0);
        assert_eq!(report.games.len(), 2);
        assert_eq!(report.games[0].attempts, 3);
        assert_eq!(report.games[1].performance, None);
    }

    #[test]
    fn evaluate_warns_and_ignores_foreign_games() {
        let p = plan(&[GameType::TapMatchingPairs]);
        let mut results = MiniGameResults::new();
        results.insert(GameType::TapMatchingPairs, vec![Some(scored(100.0))]);
        results.insert(GameType::CompareNumbers, vec![Some(scored(100.0))]);

        let report = evaluate_results(
            &p,
            &results,
            &LevelcheckConfig::default(),
            MembershipMode::Static,
        )
        .unwrap();
        assert_eq!(report.inputs.axes.visual_matching, 100.0);
        assert_eq!(report.inputs.coverage.comparison_skill, 0.0);
        assert_eq!(report.inputs.axes.comparison_skill, 50.0);
    }

    #[test]
    fn dynamic_triangles_ignore_unplayed_duplicates() {
        use crate::difficulty::VerticalOperationsConfig;

        let single = plan(&[GameType::VerticalOperations]);
        let mut duplicated = single.clone();
        duplicated
            .mini_games
            .push(GameConfig::VerticalOperations(VerticalOperationsConfig {
                max_number_range: Some(3),
                num_operations: Some(3),
                allow_carry: true,
                allow_borrow: true,
                ..Default::default()
            }));

        let mut results = MiniGameResults::new();
        results.insert(GameType::VerticalOperations, vec![Some(scored(70.0))]);
        let config = LevelcheckConfig::default();
        let a = evaluate_results(&single, &results, &config, MembershipMode::Dynamic).unwrap();
        let b = evaluate_results(&duplicated, &results, &config, MembershipMode::Dynamic).unwrap();

        assert_eq!(a.games, b.games);
        assert_eq!(a.inference.triangles, b.inference.triangles);
        assert_eq!(a.inference.inferred_grade, b.inference.inferred_grade);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let err = PlacementSession::new(plan(&[]), &LevelcheckConfig::default()).unwrap_err();
        assert!(err.is_configuration());
    }
}
