//! End-to-end placement tests: plan TOML → session → report.

use std::path::PathBuf;

use levelcheck_core::config::LevelcheckConfig;
use levelcheck_core::decision_tree::ExhaustionPolicy;
use levelcheck_core::difficulty::membership_by_axis_difficulty;
use levelcheck_core::fuzzy::MembershipMode;
use levelcheck_core::model::{Attempt, Axis, GameType, QuestionLog, TimeCategory};
use levelcheck_core::parser::{parse_test_plan_str, validate_test_plan, TestPlan};
use levelcheck_core::report::PlacementReport;
use levelcheck_core::session::PlacementSession;

const FULL_PLAN: &str = r#"
[plan]
id = "full"
name = "Full placement"

[[mini_games]]
game_type = "compare_numbers"

[[mini_games]]
game_type = "vertical_operations"

[mini_games.config]
max_number_range = 2
num_operations = 2
allow_carry = true

[[mini_games]]
game_type = "choose_answer"

[[mini_games]]
game_type = "identify_place_value"

[[mini_games]]
game_type = "order_numbers"

[[mini_games]]
game_type = "tap_matching_pairs"

[[mini_games]]
game_type = "what_number_do_you_hear"
"#;

fn full_plan() -> TestPlan {
    parse_test_plan_str(FULL_PLAN, &PathBuf::from("full.toml")).unwrap()
}

fn attempt(score: f64, slow: usize, total: usize) -> Attempt {
    let logs = (0..total)
        .map(|i| QuestionLog {
            is_correct: true,
            time_spent_ms: 2000.0,
            answer_time_category: Some(if i < slow {
                TimeCategory::Slow
            } else {
                TimeCategory::Medium
            }),
            error_type: None,
            extra: Default::default(),
        })
        .collect();
    Attempt {
        score_percent: Some(score),
        success: None,
        logs,
    }
}

fn play_all(session: &mut PlacementSession, score: f64) {
    while !session.is_finished() {
        session.submit(attempt(score, 0, 4)).unwrap();
    }
}

#[test]
fn plan_is_valid_and_played_in_canonical_order() {
    let plan = full_plan();
    let config = LevelcheckConfig::default();
    assert!(validate_test_plan(&plan, &config.catalog().unwrap()).is_empty());

    let mut session = PlacementSession::new(plan, &config).unwrap();
    let mut played = Vec::new();
    while let Some(game) = session.current_game() {
        played.push(game);
        session.submit(attempt(100.0, 0, 4)).unwrap();
    }
    assert_eq!(
        played,
        vec![
            GameType::VerticalOperations,
            GameType::ChooseAnswer,
            GameType::TapMatchingPairs,
            GameType::OrderNumbers,
            GameType::CompareNumbers,
            GameType::WhatNumberDoYouHear,
            GameType::IdentifyPlaceValue,
        ]
    );
}

#[test]
fn strong_learner_places_high_with_full_confidence() {
    let mut session = PlacementSession::new(full_plan(), &LevelcheckConfig::default()).unwrap();
    // 1 - 0.28 * 0.7 rounds to 80, the peak of the static high triangle
    play_all(&mut session, 72.0);

    let report = session.evaluate().unwrap();
    for (axis, score) in report.inputs.axes.iter() {
        assert_eq!(*score, 80.0, "{axis}");
        assert_eq!(report.inputs.coverage[axis], 1.0, "{axis}");
    }
    assert!(report.missed_axes.is_empty());
    assert_eq!(report.inference.rule_firing.g5, 1.0);
    assert_eq!(report.inference.rule_firing.g6, 1.0);
    assert!(report.inference.inferred_grade >= 5.0);
    assert_eq!(report.inference.confidence, 1.0);
    assert!(!report.provisional);
}

#[test]
fn early_failure_ends_flow_and_is_provisional() {
    let mut session = PlacementSession::new(full_plan(), &LevelcheckConfig::default()).unwrap();
    // vertical_operations allows three attempts
    for _ in 0..3 {
        session.submit(attempt(10.0, 4, 4)).unwrap();
    }
    assert!(session.is_finished());

    let report = session.evaluate().unwrap();
    assert_eq!(
        report.missed_axes,
        vec![
            Axis::ArithmeticFluency,
            Axis::NumberSense,
            Axis::SequentialThinking,
            Axis::ComparisonSkill,
            Axis::VisualMatching,
            Axis::AudioRecognition,
        ]
    );
    // 1 - (0.9 * 0.7 + 1.0 * 0.35)
    assert_eq!(report.inputs.axes.arithmetic_fluency, 2.0);
    // 1.0 of 1.6 arithmetic weight observed
    assert_eq!(report.inputs.coverage.arithmetic_fluency, 0.625);
    assert_eq!(report.inputs.axes.number_sense, 30.0);
    assert_eq!(report.inputs.coverage.number_sense, 0.0);
    assert!(report.provisional);
    assert!(report.inference.inferred_grade < 3.0);
}

#[test]
fn advance_policy_collects_evidence_after_failures() {
    let config = LevelcheckConfig {
        exhaustion: ExhaustionPolicy::Advance,
        ..Default::default()
    };
    let mut session = PlacementSession::new(full_plan(), &config).unwrap();
    let mut submissions = 0;
    while !session.is_finished() {
        session.submit(attempt(20.0, 0, 4)).unwrap();
        submissions += 1;
    }
    // every game runs to its attempt limit: 3 + 2 * 6
    assert_eq!(submissions, 15);

    let report = session.evaluate().unwrap();
    assert!(report.missed_axes.is_empty());
    assert_eq!(report.inference.confidence, 1.0);
    assert!(report.games.iter().all(|g| g.performance == Some(44.0)));
}

#[test]
fn dynamic_mode_uses_plan_difficulty() {
    let mut session = PlacementSession::new(full_plan(), &LevelcheckConfig::default())
        .unwrap()
        .with_mode(MembershipMode::Dynamic);
    play_all(&mut session, 70.0);

    let report = session.evaluate().unwrap();
    assert_eq!(report.mode, MembershipMode::Dynamic);
    let difficulty = |game: GameType| {
        report
            .games
            .iter()
            .find(|g| g.game_type == game)
            .map(|g| g.difficulty)
            .unwrap()
    };
    // (2*2 + 2*1.5 + 1.2 + 3) * 5
    assert!((difficulty(GameType::VerticalOperations) - 56.0).abs() < 1e-9);
    assert_eq!(difficulty(GameType::ChooseAnswer), 32.5);

    // vertical_operations and choose_answer share the arithmetic axis
    let shared =
        (difficulty(GameType::VerticalOperations) + difficulty(GameType::ChooseAnswer)) / 2.0;
    assert_eq!(
        report.inference.triangles.arithmetic_fluency,
        membership_by_axis_difficulty(shared)
    );
    assert_eq!(
        report.inference.triangles.visual_matching,
        membership_by_axis_difficulty(difficulty(GameType::TapMatchingPairs))
    );
}

#[test]
fn report_survives_a_save_and_load() {
    let mut session = PlacementSession::new(full_plan(), &LevelcheckConfig::default()).unwrap();
    play_all(&mut session, 80.0);
    let report = session.evaluate().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{}.json", report.id));
    report.save_json(&path).unwrap();
    let loaded = PlacementReport::load_json(&path).unwrap();
    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.plan.id, "full");
    assert_eq!(loaded.games.len(), 7);
}
