//! The `levelcheck validate` command.

use std::path::PathBuf;

use anyhow::Result;

use levelcheck_core::config::load_config_from;
use levelcheck_core::parser::{load_plan_directory, parse_test_plan, validate_test_plan};

pub fn execute(plan_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = config.catalog()?;

    let plans = if plan_path.is_dir() {
        load_plan_directory(&plan_path)?
    } else {
        vec![parse_test_plan(&plan_path)?]
    };

    let mut total_warnings = 0;

    for plan in &plans {
        println!("Test plan: {} ({} games)", plan.name, plan.mini_games.len());

        let warnings = validate_test_plan(plan, &catalog);
        for w in &warnings {
            let prefix = w
                .game
                .map(|g| format!("  [{g}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All test plans valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
