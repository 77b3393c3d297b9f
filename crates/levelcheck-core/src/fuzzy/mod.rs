//! Fuzzy grade inference.
//!
//! Fuzzifies the six axis scores, fires the masked rule base, defuzzifies the
//! grade with a centroid and derives a coverage-weighted confidence.

pub mod defuzzify;
pub mod membership;
pub mod rules;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::difficulty::{membership_by_axis_difficulty, GameConfig};
use crate::error::PlacementError;
use crate::model::{Axis, AxisMap, AxisScores, Coverage};

use self::defuzzify::{centroid, round_to};
use self::membership::{FuzzyTruth, TriangleSet};
use self::rules::{evaluate_rules, RuleFiring};

/// How axis membership triangles are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipMode {
    /// The same calibrated triangles for every axis.
    #[default]
    Static,
    /// Triangles shifted by the average difficulty of each axis' games.
    Dynamic,
}

impl std::fmt::Display for MembershipMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipMode::Static => write!(f, "static"),
            MembershipMode::Dynamic => write!(f, "dynamic"),
        }
    }
}

impl std::str::FromStr for MembershipMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(MembershipMode::Static),
            "dynamic" => Ok(MembershipMode::Dynamic),
            other => Err(format!("unknown membership mode: {other}")),
        }
    }
}

/// Tunable constants of the inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyCalibration {
    /// Value a supporting rule term takes when its axis was never observed.
    pub neutral: f64,
    /// Half-width of each grade's output triangle (0.7..=1.0 in practice).
    pub grade_half_width: f64,
    /// Grid step of the centroid integration.
    pub integration_step: f64,
    /// Triangles used in static mode.
    pub static_triangles: TriangleSet,
    /// Difficulty assumed for an axis no configured game touches.
    pub default_axis_difficulty: f64,
    /// Confidence weight of the arithmetic-fluency/number-sense coverage.
    pub core_weight: f64,
    /// Confidence weight of the mean coverage over all axes.
    pub overall_weight: f64,
}

impl Default for FuzzyCalibration {
    fn default() -> Self {
        Self {
            neutral: 0.5,
            grade_half_width: 1.0,
            integration_step: 0.01,
            static_triangles: TriangleSet::default(),
            default_axis_difficulty: 50.0,
            core_weight: 0.6,
            overall_weight: 0.4,
        }
    }
}

impl FuzzyCalibration {
    /// Reject constants the centroid integration cannot work with.
    pub fn validate(&self) -> Result<(), PlacementError> {
        if !(self.integration_step.is_finite() && self.integration_step > 0.0) {
            return Err(PlacementError::config(format!(
                "[calibration] integration_step must be a positive number, got {}",
                self.integration_step
            )));
        }
        if !(self.grade_half_width.is_finite() && self.grade_half_width > 0.0) {
            return Err(PlacementError::config(format!(
                "[calibration] grade_half_width must be a positive number, got {}",
                self.grade_half_width
            )));
        }
        if !(0.0..=1.0).contains(&self.neutral) {
            return Err(PlacementError::config(format!(
                "[calibration] neutral must lie in 0..=1, got {}",
                self.neutral
            )));
        }
        Ok(())
    }
}

/// Everything the engine derived for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Continuous grade estimate in `1..=6`.
    pub inferred_grade: f64,
    pub memberships: AxisMap<FuzzyTruth>,
    pub triangles: AxisMap<TriangleSet>,
    pub coverage: Coverage,
    pub rule_firing: RuleFiring,
    /// `0..=1`, weighted toward the two core axes.
    pub confidence: f64,
}

impl InferenceResult {
    /// Whether the grade should be shown as provisional.
    pub fn is_provisional(&self, threshold: f64) -> bool {
        self.confidence < threshold
    }
}

/// Mamdani-style grade inference over the six axes.
///
/// Pure: identical inputs always give identical results, so one engine can
/// be shared across threads.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    catalog: Arc<Catalog>,
    calibration: FuzzyCalibration,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::default()), FuzzyCalibration::default())
    }
}

impl InferenceEngine {
    pub fn new(catalog: Arc<Catalog>, calibration: FuzzyCalibration) -> Self {
        Self {
            catalog,
            calibration,
        }
    }

    pub fn calibration(&self) -> &FuzzyCalibration {
        &self.calibration
    }

    /// Average difficulty of the configured games contributing to `axis`.
    pub fn axis_difficulty(&self, axis: Axis, test_config: &[GameConfig]) -> f64 {
        let relevant: Vec<f64> = test_config
            .iter()
            .filter(|g| self.catalog.contribution(g.game_type(), axis) > 0.0)
            .map(GameConfig::difficulty)
            .collect();
        if relevant.is_empty() {
            self.calibration.default_axis_difficulty
        } else {
            relevant.iter().sum::<f64>() / relevant.len() as f64
        }
    }

    /// Membership triangles per axis.
    ///
    /// Dynamic mode needs a test configuration; without one the static
    /// triangles are used.
    pub fn triangles(
        &self,
        test_config: Option<&[GameConfig]>,
        mode: MembershipMode,
    ) -> AxisMap<TriangleSet> {
        match (mode, test_config) {
            (MembershipMode::Dynamic, Some(games)) => AxisMap::from_fn(|axis| {
                membership_by_axis_difficulty(self.axis_difficulty(axis, games))
            }),
            _ => AxisMap::splat(self.calibration.static_triangles),
        }
    }

    /// Infer a grade and confidence from axis scores and their coverage.
    pub fn infer(
        &self,
        axes: &AxisScores,
        coverage: &Coverage,
        test_config: Option<&[GameConfig]>,
        mode: MembershipMode,
    ) -> InferenceResult {
        let triangles = self.triangles(test_config, mode);
        let memberships = axes.map(|axis, &score| triangles[axis].fuzzify(score));
        let rule_firing = evaluate_rules(&memberships, coverage, self.calibration.neutral);
        let inferred_grade = centroid(
            &rule_firing,
            self.calibration.grade_half_width,
            self.calibration.integration_step,
        );
        let confidence = self.confidence(coverage);

        tracing::debug!(
            inferred_grade,
            confidence,
            %mode,
            "fuzzy grade inferred"
        );

        InferenceResult {
            inferred_grade,
            memberships,
            triangles,
            coverage: *coverage,
            rule_firing,
            confidence,
        }
    }

    /// Coverage-weighted confidence, rounded to 2 decimals.
    pub fn confidence(&self, coverage: &Coverage) -> f64 {
        let core = (coverage.arithmetic_fluency + coverage.number_sense) / 2.0;
        let mean = coverage.iter().map(|(_, c)| *c).sum::<f64>() / Axis::ALL.len() as f64;
        round_to(
            self.calibration.core_weight * core + self.calibration.overall_weight * mean,
            2,
        )
    }
}

/// Infer with the default catalog and calibration.
pub fn infer_fuzzy_grade(
    axes: &AxisScores,
    coverage: &Coverage,
    test_config: Option<&[GameConfig]>,
    mode: MembershipMode,
) -> InferenceResult {
    InferenceEngine::default().infer(axes, coverage, test_config, mode)
}
