//! Static mini-game catalog and policy tables.
//!
//! A [`Catalog`] is built once (usually from [`crate::config::LevelcheckConfig`])
//! and shared read-only by the decision runner, the feature aggregator and the
//! inference engine.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{Axis, AxisMap, GameType};

/// Per-game retry and forgiveness limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTable {
    /// Attempts allowed on a node before a failure ends the flow.
    pub default_max_attempts: u32,
    /// Mistakes tolerated before the flow stops retrying a node.
    pub default_max_mistakes: u32,
    #[serde(default)]
    pub max_attempts: BTreeMap<GameType, u32>,
    #[serde(default)]
    pub max_mistakes: BTreeMap<GameType, u32>,
}

impl PolicyTable {
    pub fn max_attempts_for(&self, game: GameType) -> u32 {
        self.max_attempts
            .get(&game)
            .copied()
            .unwrap_or(self.default_max_attempts)
    }

    pub fn max_mistakes_for(&self, game: GameType) -> u32 {
        self.max_mistakes
            .get(&game)
            .copied()
            .unwrap_or(self.default_max_mistakes)
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        use GameType::*;

        let max_attempts = BTreeMap::from([
            (VerticalOperations, 3),
            (ChooseAnswer, 2),
            (IdentifyPlaceValue, 2),
            (WhatNumberDoYouHear, 2),
            (FindPreviousNextNumber, 2),
            (WriteNumberInLetters, 2),
            (TapMatchingPairs, 2),
        ]);
        let max_mistakes = BTreeMap::from([
            (VerticalOperations, 3),
            (ChooseAnswer, 3),
            (IdentifyPlaceValue, 4),
            (WhatNumberDoYouHear, 4),
            (FindPreviousNextNumber, 3),
            (WriteNumberInLetters, 3),
            (TapMatchingPairs, 3),
        ]);

        Self {
            default_max_attempts: 2,
            default_max_mistakes: 3,
            max_attempts,
            max_mistakes,
        }
    }
}

/// Game → axis weights. Each game's weights are expected to sum to 1.
pub type ContributionMatrix = BTreeMap<GameType, AxisMap<f64>>;

/// Contribution matrix matching the skills each mini-game exercises.
pub fn default_contributions() -> ContributionMatrix {
    use GameType::*;

    fn weights(pairs: &[(Axis, f64)]) -> AxisMap<f64> {
        let mut map = AxisMap::default();
        for &(axis, w) in pairs {
            map[axis] = w;
        }
        map
    }

    BTreeMap::from([
        (VerticalOperations, weights(&[(Axis::ArithmeticFluency, 1.0)])),
        (
            ChooseAnswer,
            weights(&[
                (Axis::ArithmeticFluency, 0.6),
                (Axis::NumberSense, 0.2),
                (Axis::SequentialThinking, 0.2),
            ]),
        ),
        (
            FindCompositions,
            weights(&[(Axis::ArithmeticFluency, 0.6), (Axis::NumberSense, 0.4)]),
        ),
        (
            MultiStepProblem,
            weights(&[
                (Axis::ArithmeticFluency, 0.5),
                (Axis::SequentialThinking, 0.5),
            ]),
        ),
        (FindPreviousNextNumber, weights(&[(Axis::SequentialThinking, 1.0)])),
        (OrderNumbers, weights(&[(Axis::SequentialThinking, 1.0)])),
        (CompareNumbers, weights(&[(Axis::ComparisonSkill, 1.0)])),
        (TapMatchingPairs, weights(&[(Axis::VisualMatching, 1.0)])),
        (IdentifyPlaceValue, weights(&[(Axis::NumberSense, 1.0)])),
        (DecomposeNumber, weights(&[(Axis::NumberSense, 1.0)])),
        (WriteNumberInLetters, weights(&[(Axis::NumberSense, 1.0)])),
        (WhatNumberDoYouHear, weights(&[(Axis::AudioRecognition, 1.0)])),
        (ReadNumberAloud, weights(&[(Axis::NumberSense, 1.0)])),
    ])
}

/// Speed weights for games where answer time matters more than the default.
pub fn default_speed_weights() -> BTreeMap<GameType, f64> {
    BTreeMap::from([
        (GameType::VerticalOperations, 0.35),
        (GameType::ChooseAnswer, 0.3),
        (GameType::MultiStepProblem, 0.3),
    ])
}

/// Immutable mini-game catalog: canonical order, policies and axis weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Canonical order in which mini-games are presented.
    pub order: Vec<GameType>,
    pub policy: PolicyTable,
    pub contributions: ContributionMatrix,
    pub speed_weights: BTreeMap<GameType, f64>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            order: GameType::ALL.to_vec(),
            policy: PolicyTable::default(),
            contributions: default_contributions(),
            speed_weights: default_speed_weights(),
        }
    }
}

impl Catalog {
    /// Weight of `game` on `axis`; 0 when the game is unmapped.
    pub fn contribution(&self, game: GameType, axis: Axis) -> f64 {
        self.contributions
            .get(&game)
            .map(|w| w[axis])
            .unwrap_or(0.0)
    }

    /// Whether the game appears in the contribution matrix at all.
    pub fn is_mapped(&self, game: GameType) -> bool {
        self.contributions.contains_key(&game)
    }

    /// Axes the game carries a non-zero weight on.
    pub fn axes_for(&self, game: GameType) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|&axis| self.contribution(game, axis) > 0.0)
            .collect()
    }

    /// Every mapped game, in canonical order.
    pub fn mapped_games(&self) -> Vec<GameType> {
        self.order
            .iter()
            .copied()
            .filter(|g| self.is_mapped(*g))
            .collect()
    }

    pub fn speed_weight(&self, game: GameType, default: f64) -> f64 {
        self.speed_weights.get(&game).copied().unwrap_or(default)
    }

    /// Reorder an educator's chosen games to the catalog's canonical order.
    ///
    /// Only the first instance of each game type is kept; games absent from
    /// the canonical order are dropped.
    pub fn order_mini_games<T: Clone>(
        &self,
        items: &[T],
        game_of: impl Fn(&T) -> GameType,
    ) -> Vec<T> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(items.len());
        for game in &self.order {
            if let Some(item) = items.iter().find(|i| game_of(i) == *game) {
                if seen.insert(*game) {
                    ordered.push(item.clone());
                }
            }
        }
        ordered
    }
}
