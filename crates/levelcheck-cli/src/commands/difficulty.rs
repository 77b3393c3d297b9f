//! The `levelcheck difficulty` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use levelcheck_core::config::load_config_from;
use levelcheck_core::difficulty::membership_by_axis_difficulty;
use levelcheck_core::fuzzy::membership::Triangle;
use levelcheck_core::fuzzy::InferenceEngine;
use levelcheck_core::model::Axis;
use levelcheck_core::parser::parse_test_plan;

pub fn execute(plan_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = config.catalog()?;
    let plan = parse_test_plan(&plan_path)?;
    let engine = InferenceEngine::new(catalog.clone(), config.calibration.clone());

    println!("Plan: {} ({} games)", plan.name, plan.mini_games.len());

    let mut games = Table::new();
    games.set_header(vec!["Game", "Difficulty", "Pass %", "Axes"]);
    for game in &plan.mini_games {
        let game_type = game.game_type();
        let axes: Vec<&str> = catalog
            .axes_for(game_type)
            .into_iter()
            .map(|a| a.as_str())
            .collect();
        games.add_row(vec![
            Cell::new(game_type),
            Cell::new(format!("{:.1}", game.difficulty())),
            Cell::new(format!(
                "{:.0}",
                game.pass_percent().unwrap_or(config.default_pass_percent)
            )),
            Cell::new(axes.join(", ")),
        ]);
    }
    println!("\n{games}");

    let played = plan.played_configs(&catalog);
    let mut axes = Table::new();
    axes.set_header(vec!["Axis", "Difficulty", "Low", "Medium", "High"]);
    for axis in Axis::ALL {
        let difficulty = engine.axis_difficulty(axis, &played);
        let triangles = membership_by_axis_difficulty(difficulty);
        axes.add_row(vec![
            Cell::new(axis),
            Cell::new(format!("{difficulty:.2}")),
            Cell::new(format_triangle(&triangles.low)),
            Cell::new(format_triangle(&triangles.medium)),
            Cell::new(format_triangle(&triangles.high)),
        ]);
    }
    println!("\n{axes}");

    Ok(())
}

fn format_triangle(t: &Triangle) -> String {
    format!("[{:.1}, {:.1}, {:.1}]", t.a, t.b, t.c)
}
