//! Placement report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::{FuzzyInputs, MissedAxes};
use crate::fuzzy::{InferenceResult, MembershipMode};
use crate::model::{Axis, GameType};
use crate::parser::TestPlan;

/// A complete placement report for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the test plan.
    pub plan: PlanSummary,
    /// Membership mode the grade was inferred with.
    pub mode: MembershipMode,
    /// Per-game evidence, in play order.
    pub games: Vec<GameSummary>,
    /// Axes only reachable through games that were never played.
    pub missed_axes: Vec<Axis>,
    /// Axis scores and coverage fed to the engine.
    pub inputs: FuzzyInputs,
    pub inference: InferenceResult,
    /// Confidence fell below the configured threshold.
    pub provisional: bool,
}

/// Summary of a test plan (without the game configurations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: String,
    pub name: String,
    pub game_count: usize,
}

impl From<&TestPlan> for PlanSummary {
    fn from(plan: &TestPlan) -> Self {
        Self {
            id: plan.id.clone(),
            name: plan.name.clone(),
            game_count: plan.mini_games.len(),
        }
    }
}

/// What one game contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_type: GameType,
    /// Recorded attempts, abandoned ones included.
    pub attempts: usize,
    /// Performance of the latest attempt, if any was recorded.
    pub performance: Option<f64>,
    /// Difficulty of the game's configuration.
    pub difficulty: f64,
}

impl PlacementReport {
    pub fn new(
        plan: PlanSummary,
        mode: MembershipMode,
        games: Vec<GameSummary>,
        missed: &MissedAxes,
        inputs: FuzzyInputs,
        inference: InferenceResult,
        provisional_below: f64,
    ) -> Self {
        let provisional = inference.is_provisional(provisional_below);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            plan,
            mode,
            games,
            missed_axes: missed.iter().copied().collect(),
            inputs,
            inference,
            provisional,
        }
    }

    /// Nearest whole grade, `1..=6`.
    pub fn rounded_grade(&self) -> u8 {
        self.inference.inferred_grade.round().clamp(1.0, 6.0) as u8
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: PlacementReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## Placement: {}\n\n", self.plan.name));
        md.push_str(&format!(
            "**Grade:** {:.2}{} (confidence {:.2}, {} mode)\n\n",
            self.inference.inferred_grade,
            if self.provisional { " provisional" } else { "" },
            self.inference.confidence,
            self.mode
        ));

        md.push_str("| Axis | Score | Coverage |\n");
        md.push_str("|------|-------|----------|\n");
        for (axis, score) in self.inputs.axes.iter() {
            md.push_str(&format!(
                "| {} | {:.0} | {:.3} |\n",
                axis, score, self.inputs.coverage[axis]
            ));
        }
        md.push('\n');

        if !self.missed_axes.is_empty() {
            let missed: Vec<&str> = self.missed_axes.iter().map(Axis::as_str).collect();
            md.push_str(&format!("**Missed axes:** {}\n", missed.join(", ")));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::infer_fuzzy_grade;
    use crate::model::{AxisScores, Coverage};

    fn sample() -> PlacementReport {
        let inputs = FuzzyInputs {
            axes: AxisScores::splat(50.0),
            coverage: Coverage::default(),
        };
        let inference = infer_fuzzy_grade(
            &inputs.axes,
            &inputs.coverage,
            None,
            MembershipMode::Static,
        );
        PlacementReport::new(
            PlanSummary {
                id: "grade3".into(),
                name: "Grade 3 placement".into(),
                game_count: 2,
            },
            MembershipMode::Static,
            vec![GameSummary {
                game_type: GameType::CompareNumbers,
                attempts: 0,
                performance: None,
                difficulty: 15.0,
            }],
            &MissedAxes::from([Axis::ComparisonSkill]),
            inputs,
            inference,
            0.6,
        )
    }

    #[test]
    fn unobserved_learner_is_provisional() {
        let report = sample();
        assert!(report.provisional);
        assert_eq!(report.inference.confidence, 0.0);
        assert_eq!(report.missed_axes, vec![Axis::ComparisonSkill]);
        assert_eq!(report.rounded_grade(), 4);
    }

    #[test]
    fn json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let report = sample();
        report.save_json(&path).unwrap();

        let loaded = PlacementReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.created_at, report.created_at);
        assert_eq!(loaded.plan, report.plan);
        assert_eq!(loaded.games, report.games);
        assert_eq!(loaded.inference.inferred_grade, report.inference.inferred_grade);
        assert!(loaded.provisional);
    }

    #[test]
    fn markdown_lists_every_axis() {
        let md = sample().to_markdown();
        assert!(md.contains("Grade 3 placement"));
        assert!(md.contains("provisional"));
        for axis in Axis::ALL {
            assert!(md.contains(axis.as_str()), "missing {axis}");
        }
        assert!(md.contains("**Missed axes:** comparison_skill"));
    }
}
