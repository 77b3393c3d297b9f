//! The `levelcheck evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use levelcheck_core::config::load_config_from;
use levelcheck_core::fuzzy::MembershipMode;
use levelcheck_core::model::MiniGameResults;
use levelcheck_core::parser::parse_test_plan;
use levelcheck_core::report::PlacementReport;
use levelcheck_core::session::evaluate_results;

pub fn execute(
    plan_path: PathBuf,
    results_path: PathBuf,
    dynamic: bool,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if !matches!(format.as_str(), "text" | "json" | "markdown" | "md") {
        anyhow::bail!("unknown format: {format} (expected text, json or markdown)");
    }

    let config = load_config_from(config_path.as_deref())?;
    let plan = parse_test_plan(&plan_path)?;

    let content = std::fs::read_to_string(&results_path)
        .with_context(|| format!("failed to read results: {}", results_path.display()))?;
    let results: MiniGameResults = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse results: {}", results_path.display()))?;

    let mode = if dynamic {
        MembershipMode::Dynamic
    } else {
        config.mode
    };
    let report = evaluate_results(&plan, &results, &config, mode)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_text(&report),
    }

    if let Some(dir) = output {
        let path = dir.join(format!("placement-{}.json", report.id));
        report.save_json(&path)?;
        eprintln!("JSON report: {}", path.display());
    }

    Ok(())
}

fn print_text(report: &PlacementReport) {
    use comfy_table::{Cell, Table};

    println!("Plan: {} ({} games)", report.plan.name, report.plan.game_count);
    println!(
        "Grade: {:.2} (nearest {}){}",
        report.inference.inferred_grade,
        report.rounded_grade(),
        if report.provisional { " [provisional]" } else { "" }
    );
    println!(
        "Confidence: {:.2} ({} mode)",
        report.inference.confidence, report.mode
    );

    let mut games = Table::new();
    games.set_header(vec!["Game", "Attempts", "Performance", "Difficulty"]);
    for g in &report.games {
        games.add_row(vec![
            Cell::new(g.game_type),
            Cell::new(g.attempts),
            Cell::new(
                g.performance
                    .map(|p| format!("{p:.0}"))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(format!("{:.1}", g.difficulty)),
        ]);
    }
    println!("\n{games}");

    let mut axes = Table::new();
    axes.set_header(vec!["Axis", "Score", "Coverage", "Low", "Medium", "High"]);
    for (axis, score) in report.inputs.axes.iter() {
        let truth = report.inference.memberships[axis];
        axes.add_row(vec![
            Cell::new(axis),
            Cell::new(format!("{score:.0}")),
            Cell::new(format!("{:.3}", report.inputs.coverage[axis])),
            Cell::new(format!("{:.2}", truth.low)),
            Cell::new(format!("{:.2}", truth.medium)),
            Cell::new(format!("{:.2}", truth.high)),
        ]);
    }
    println!("\n{axes}");

    let firing = report.inference.rule_firing.as_array();
    let rules: Vec<String> = firing
        .iter()
        .enumerate()
        .map(|(i, s)| format!("G{}={s:.2}", i + 1))
        .collect();
    println!("\nRules: {}", rules.join(" "));

    if !report.missed_axes.is_empty() {
        let missed: Vec<&str> = report.missed_axes.iter().map(|a| a.as_str()).collect();
        println!("Missed axes: {}", missed.join(", "));
    }
}
