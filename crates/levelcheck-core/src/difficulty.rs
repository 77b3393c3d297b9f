//! Game difficulty estimation.
//!
//! Each game type scores its configuration with a fixed linear weighting.
//! The raw score is scaled by 5 and clamped to `1..=100`. Missing fields fall
//! back to neutral values, so an empty config still has a defined difficulty.

use serde::{Deserialize, Serialize};

use crate::fuzzy::membership::{Triangle, TriangleSet};
use crate::model::{GameType, Operation};

/// Configuration of `vertical_operations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalOperationsConfig {
    pub max_number_range: Option<u32>,
    pub num_operations: Option<u32>,
    pub operations_allowed: Option<Vec<Operation>>,
    pub allow_carry: bool,
    pub allow_borrow: bool,
    pub allow_multi_step_mul: bool,
    pub allow_multi_step_div: bool,
    pub required_correct_answers_minimum_percent: Option<f64>,
}

/// Configuration of `choose_answer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChooseAnswerConfig {
    pub max_number_range: Option<u32>,
    pub num_questions: Option<u32>,
    pub operations_allowed: Option<Vec<Operation>>,
    pub num_options: Option<u32>,
    pub required_correct_answers_minimum_percent: Option<f64>,
}

/// Configuration of `find_compositions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FindCompositionsConfig {
    pub max_number_range: Option<u32>,
    pub min_num_compositions: Option<u32>,
    pub operation: Option<Operation>,
    pub required_correct_answers_minimum_percent: Option<f64>,
}

/// Configuration of `multi_step_problem`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiStepProblemConfig {
    pub max_number_range: Option<u32>,
    pub num_questions: Option<u32>,
    pub num_steps: Option<u32>,
    pub operations_allowed: Option<Vec<Operation>>,
    pub allow_carry: bool,
    pub allow_borrow: bool,
    pub allow_multi_step_mul: bool,
    pub allow_multi_step_div: bool,
    pub required_correct_answers_minimum_percent: Option<f64>,
}

/// Configuration of `order_numbers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderNumbersConfig {
    pub max_number_range: Option<u32>,
    pub num_questions: Option<u32>,
    pub max_numbers_in_sequence: Option<u32>,
    pub required_correct_answers_minimum_percent: Option<f64>,
}

/// Configuration of `tap_matching_pairs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapMatchingPairsConfig {
    pub max_number_range: Option<u32>,
    pub num_pairs: Option<u32>,
    pub required_correct_answers_minimum_percent: Option<f64>,
}

/// Configuration of `read_number_aloud`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadNumberAloudConfig {
    pub max_number_range: Option<u32>,
    pub num_questions: Option<u32>,
    /// Seconds the number stays on screen.
    pub display_time: Option<f64>,
    pub required_correct_answers_minimum_percent: Option<f64>,
}

/// Configuration shared by games that only vary range and question count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberRangeConfig {
    pub max_number_range: Option<u32>,
    pub num_questions: Option<u32>,
    pub required_correct_answers_minimum_percent: Option<f64>,
}

/// A mini-game together with its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game_type", content = "config", rename_all = "snake_case")]
pub enum GameConfig {
    VerticalOperations(VerticalOperationsConfig),
    ChooseAnswer(ChooseAnswerConfig),
    FindCompositions(FindCompositionsConfig),
    MultiStepProblem(MultiStepProblemConfig),
    FindPreviousNextNumber(NumberRangeConfig),
    OrderNumbers(OrderNumbersConfig),
    CompareNumbers(NumberRangeConfig),
    TapMatchingPairs(TapMatchingPairsConfig),
    WriteNumberInLetters(NumberRangeConfig),
    DecomposeNumber(NumberRangeConfig),
    IdentifyPlaceValue(NumberRangeConfig),
    ReadNumberAloud(ReadNumberAloudConfig),
    WhatNumberDoYouHear(NumberRangeConfig),
}

impl GameConfig {
    /// A config with every field left at its default.
    pub fn default_for(game: GameType) -> Self {
        match game {
            GameType::VerticalOperations => GameConfig::VerticalOperations(Default::default()),
            GameType::ChooseAnswer => GameConfig::ChooseAnswer(Default::default()),
            GameType::FindCompositions => GameConfig::FindCompositions(Default::default()),
            GameType::MultiStepProblem => GameConfig::MultiStepProblem(Default::default()),
            GameType::FindPreviousNextNumber => {
                GameConfig::FindPreviousNextNumber(Default::default())
            }
            GameType::OrderNumbers => GameConfig::OrderNumbers(Default::default()),
            GameType::CompareNumbers => GameConfig::CompareNumbers(Default::default()),
            GameType::TapMatchingPairs => GameConfig::TapMatchingPairs(Default::default()),
            GameType::WriteNumberInLetters => GameConfig::WriteNumberInLetters(Default::default()),
            GameType::DecomposeNumber => GameConfig::DecomposeNumber(Default::default()),
            GameType::IdentifyPlaceValue => GameConfig::IdentifyPlaceValue(Default::default()),
            GameType::ReadNumberAloud => GameConfig::ReadNumberAloud(Default::default()),
            GameType::WhatNumberDoYouHear => GameConfig::WhatNumberDoYouHear(Default::default()),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            GameConfig::VerticalOperations(_) => GameType::VerticalOperations,
            GameConfig::ChooseAnswer(_) => GameType::ChooseAnswer,
            GameConfig::FindCompositions(_) => GameType::FindCompositions,
            GameConfig::MultiStepProblem(_) => GameType::MultiStepProblem,
            GameConfig::FindPreviousNextNumber(_) => GameType::FindPreviousNextNumber,
            GameConfig::OrderNumbers(_) => GameType::OrderNumbers,
            GameConfig::CompareNumbers(_) => GameType::CompareNumbers,
            GameConfig::TapMatchingPairs(_) => GameType::TapMatchingPairs,
            GameConfig::WriteNumberInLetters(_) => GameType::WriteNumberInLetters,
            GameConfig::DecomposeNumber(_) => GameType::DecomposeNumber,
            GameConfig::IdentifyPlaceValue(_) => GameType::IdentifyPlaceValue,
            GameConfig::ReadNumberAloud(_) => GameType::ReadNumberAloud,
            GameConfig::WhatNumberDoYouHear(_) => GameType::WhatNumberDoYouHear,
        }
    }

    /// Minimum score (percent) for an attempt to count as a pass.
    pub fn pass_percent(&self) -> Option<f64> {
        match self {
            GameConfig::VerticalOperations(c) => c.required_correct_answers_minimum_percent,
            GameConfig::ChooseAnswer(c) => c.required_correct_answers_minimum_percent,
            GameConfig::FindCompositions(c) => c.required_correct_answers_minimum_percent,
            GameConfig::MultiStepProblem(c) => c.required_correct_answers_minimum_percent,
            GameConfig::OrderNumbers(c) => c.required_correct_answers_minimum_percent,
            GameConfig::TapMatchingPairs(c) => c.required_correct_answers_minimum_percent,
            GameConfig::ReadNumberAloud(c) => c.required_correct_answers_minimum_percent,
            GameConfig::FindPreviousNextNumber(c)
            | GameConfig::CompareNumbers(c)
            | GameConfig::WriteNumberInLetters(c)
            | GameConfig::DecomposeNumber(c)
            | GameConfig::IdentifyPlaceValue(c)
            | GameConfig::WhatNumberDoYouHear(c) => c.required_correct_answers_minimum_percent,
        }
    }

    /// Difficulty of this configuration, `1..=100`.
    pub fn difficulty(&self) -> f64 {
        compute_game_difficulty(self)
    }
}

fn count(value: Option<u32>, default: u32) -> f64 {
    f64::from(value.unwrap_or(default))
}

fn op_count(ops: &Option<Vec<Operation>>) -> f64 {
    ops.as_ref().map(|o| o.len() as f64).unwrap_or(1.0)
}

fn flag(enabled: bool, weight: f64) -> f64 {
    if enabled {
        weight
    } else {
        0.0
    }
}

/// Raw weighted sum before scaling.
fn raw_score(config: &GameConfig) -> f64 {
    match config {
        GameConfig::VerticalOperations(c) => {
            count(c.max_number_range, 1) * 2.0
                + count(c.num_operations, 1) * 1.5
                + op_count(&c.operations_allowed) * 1.2
                + flag(c.allow_carry, 3.0)
                + flag(c.allow_borrow, 3.0)
                + flag(c.allow_multi_step_mul, 2.5)
                + flag(c.allow_multi_step_div, 2.5)
        }
        GameConfig::ChooseAnswer(c) => {
            count(c.max_number_range, 1) * 2.0
                + count(c.num_questions, 1)
                + op_count(&c.operations_allowed) * 1.5
                + count(c.num_options, 2)
        }
        GameConfig::FindCompositions(c) => {
            count(c.max_number_range, 1) * 2.0 + count(c.min_num_compositions, 1)
        }
        GameConfig::MultiStepProblem(c) => {
            count(c.max_number_range, 1) * 2.0
                + count(c.num_questions, 1)
                + count(c.num_steps, 1) * 1.5
                + op_count(&c.operations_allowed) * 1.5
                + flag(c.allow_carry, 1.5)
                + flag(c.allow_borrow, 1.5)
                + flag(c.allow_multi_step_mul, 2.5)
                + flag(c.allow_multi_step_div, 2.5)
        }
        GameConfig::OrderNumbers(c) => {
            count(c.max_number_range, 1) * 2.0
                + count(c.num_questions, 1)
                + count(c.max_numbers_in_sequence, 4)
        }
        GameConfig::TapMatchingPairs(c) => {
            count(c.max_number_range, 1) * 2.0 + count(c.num_pairs, 4)
        }
        GameConfig::ReadNumberAloud(c) => {
            count(c.max_number_range, 1) * 2.0
                + count(c.num_questions, 2)
                + (30.0 - c.display_time.unwrap_or(30.0)) * 0.1
        }
        GameConfig::FindPreviousNextNumber(c) | GameConfig::CompareNumbers(c) => {
            count(c.max_number_range, 1) * 2.0 + count(c.num_questions, 1)
        }
        GameConfig::WriteNumberInLetters(c)
        | GameConfig::DecomposeNumber(c)
        | GameConfig::IdentifyPlaceValue(c)
        | GameConfig::WhatNumberDoYouHear(c) => {
            count(c.max_number_range, 1) * 2.0 + count(c.num_questions, 2)
        }
    }
}

/// Difficulty score of a mini-game configuration, clamped to `1..=100`.
pub fn compute_game_difficulty(config: &GameConfig) -> f64 {
    (raw_score(config) * 5.0).clamp(1.0, 100.0)
}

/// Membership triangles for an axis whose games average `difficulty`.
///
/// Difficulty 50 gives the neutral set; harder tests shift every triangle
/// right, so the same raw score earns less `high` membership.
pub fn membership_by_axis_difficulty(difficulty: f64) -> TriangleSet {
    let clamp = |x: f64| x.clamp(0.0, 100.0);
    let shift = (difficulty - 50.0) / 2.0;

    TriangleSet {
        low: Triangle::new(0.0, 0.0, clamp(50.0 + shift)),
        medium: Triangle::new(
            clamp(30.0 + shift / 2.0),
            clamp(50.0 + shift),
            clamp(70.0 + shift / 2.0),
        ),
        high: Triangle::new(clamp(50.0 + shift), 100.0, 100.0),
    }
}
