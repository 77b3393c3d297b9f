//! Core data model types for levelcheck.
//!
//! Mini-game identifiers, the six cognitive axes, per-axis vectors and the
//! attempt log produced by the host application for each mini-game session.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The mini-games a placement test can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    FindCompositions,
    VerticalOperations,
    ChooseAnswer,
    MultiStepProblem,
    FindPreviousNextNumber,
    TapMatchingPairs,
    OrderNumbers,
    CompareNumbers,
    WhatNumberDoYouHear,
    DecomposeNumber,
    WriteNumberInLetters,
    IdentifyPlaceValue,
    ReadNumberAloud,
}

impl GameType {
    /// Every game, in authoring order.
    pub const ALL: [GameType; 13] = [
        GameType::FindCompositions,
        GameType::VerticalOperations,
        GameType::ChooseAnswer,
        GameType::MultiStepProblem,
        GameType::FindPreviousNextNumber,
        GameType::TapMatchingPairs,
        GameType::OrderNumbers,
        GameType::CompareNumbers,
        GameType::WhatNumberDoYouHear,
        GameType::DecomposeNumber,
        GameType::WriteNumberInLetters,
        GameType::IdentifyPlaceValue,
        GameType::ReadNumberAloud,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::FindCompositions => "find_compositions",
            GameType::VerticalOperations => "vertical_operations",
            GameType::ChooseAnswer => "choose_answer",
            GameType::MultiStepProblem => "multi_step_problem",
            GameType::FindPreviousNextNumber => "find_previous_next_number",
            GameType::TapMatchingPairs => "tap_matching_pairs",
            GameType::OrderNumbers => "order_numbers",
            GameType::CompareNumbers => "compare_numbers",
            GameType::WhatNumberDoYouHear => "what_number_do_you_hear",
            GameType::DecomposeNumber => "decompose_number",
            GameType::WriteNumberInLetters => "write_number_in_letters",
            GameType::IdentifyPlaceValue => "identify_place_value",
            GameType::ReadNumberAloud => "read_number_aloud",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        GameType::ALL
            .into_iter()
            .find(|g| g.as_str() == needle)
            .ok_or_else(|| format!("unknown game type: {s}"))
    }
}

/// The six cognitive skill dimensions a learner is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    ArithmeticFluency,
    NumberSense,
    SequentialThinking,
    ComparisonSkill,
    VisualMatching,
    AudioRecognition,
}

impl Axis {
    pub const ALL: [Axis; 6] = [
        Axis::ArithmeticFluency,
        Axis::NumberSense,
        Axis::SequentialThinking,
        Axis::ComparisonSkill,
        Axis::VisualMatching,
        Axis::AudioRecognition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::ArithmeticFluency => "arithmetic_fluency",
            Axis::NumberSense => "number_sense",
            Axis::SequentialThinking => "sequential_thinking",
            Axis::ComparisonSkill => "comparison_skill",
            Axis::VisualMatching => "visual_matching",
            Axis::AudioRecognition => "audio_recognition",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Axis::ALL
            .into_iter()
            .find(|a| a.as_str() == needle)
            .ok_or_else(|| format!("unknown axis: {s}"))
    }
}

/// One value per axis. Absent keys deserialize to `T::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct AxisMap<T> {
    pub arithmetic_fluency: T,
    pub number_sense: T,
    pub sequential_thinking: T,
    pub comparison_skill: T,
    pub visual_matching: T,
    pub audio_recognition: T,
}

impl<T> AxisMap<T> {
    pub fn from_fn(mut f: impl FnMut(Axis) -> T) -> Self {
        Self {
            arithmetic_fluency: f(Axis::ArithmeticFluency),
            number_sense: f(Axis::NumberSense),
            sequential_thinking: f(Axis::SequentialThinking),
            comparison_skill: f(Axis::ComparisonSkill),
            visual_matching: f(Axis::VisualMatching),
            audio_recognition: f(Axis::AudioRecognition),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, &T)> + '_ {
        Axis::ALL.into_iter().map(move |axis| (axis, &self[axis]))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Axis, &T) -> U) -> AxisMap<U> {
        AxisMap::from_fn(|axis| f(axis, &self[axis]))
    }
}

impl<T: Copy> AxisMap<T> {
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value)
    }
}

impl<T> Index<Axis> for AxisMap<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        match axis {
            Axis::ArithmeticFluency => &self.arithmetic_fluency,
            Axis::NumberSense => &self.number_sense,
            Axis::SequentialThinking => &self.sequential_thinking,
            Axis::ComparisonSkill => &self.comparison_skill,
            Axis::VisualMatching => &self.visual_matching,
            Axis::AudioRecognition => &self.audio_recognition,
        }
    }
}

impl<T> IndexMut<Axis> for AxisMap<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::ArithmeticFluency => &mut self.arithmetic_fluency,
            Axis::NumberSense => &mut self.number_sense,
            Axis::SequentialThinking => &mut self.sequential_thinking,
            Axis::ComparisonSkill => &mut self.comparison_skill,
            Axis::VisualMatching => &mut self.visual_matching,
            Axis::AudioRecognition => &mut self.audio_recognition,
        }
    }
}

/// Performance per axis, 0..=100 (higher is better).
pub type AxisScores = AxisMap<f64>;

/// Fraction of each axis' contribution weight that was observed, 0..=1.
pub type Coverage = AxisMap<f64>;

/// Arithmetic operations a game may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

/// How quickly a question was answered relative to the game's expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeCategory {
    Fast,
    Medium,
    Slow,
}

/// A single answered question inside one mini-game attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionLog {
    pub is_correct: bool,
    #[serde(default)]
    pub time_spent_ms: f64,
    #[serde(default)]
    pub answer_time_category: Option<TimeCategory>,
    #[serde(default)]
    pub error_type: Option<String>,
    /// Game-specific fields the aggregator does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl QuestionLog {
    pub fn is_slow(&self) -> bool {
        self.answer_time_category == Some(TimeCategory::Slow)
    }
}

/// One play-through of a mini-game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Percentage of correct answers, 0..=100.
    #[serde(default)]
    pub score_percent: Option<f64>,
    /// Explicit pass/fail verdict from the host, if it made one.
    #[serde(default)]
    pub success: Option<bool>,
    /// Question-level events, in order.
    #[serde(default)]
    pub logs: Vec<QuestionLog>,
}

impl Attempt {
    /// Whether this attempt counts as a pass. An explicit verdict wins;
    /// otherwise the score is compared against `pass_percent`.
    pub fn passed(&self, pass_percent: f64) -> bool {
        self.success
            .unwrap_or_else(|| self.score_percent.unwrap_or(0.0) >= pass_percent)
    }
}

/// Chronological attempts per game. `None` entries are attempts the host
/// recorded as abandoned and are skipped when picking the latest one.
pub type MiniGameResults = BTreeMap<GameType, Vec<Option<Attempt>>>;
