//! The `levelcheck flow` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use levelcheck_core::config::load_config_from;
use levelcheck_core::decision_tree::{
    build_default_decision_tree, Advance, DecisionTreeRunner, ExhaustionPolicy,
};
use levelcheck_core::parser::parse_test_plan;

pub fn execute(
    plan_path: PathBuf,
    outcomes_str: String,
    exhaustion: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = config.catalog()?;
    let plan = parse_test_plan(&plan_path)?;

    let policy: ExhaustionPolicy = match exhaustion {
        Some(p) => p.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?,
        None => config.exhaustion,
    };

    let outcomes = outcomes_str
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<bool>()
                .with_context(|| format!("invalid outcome \"{s}\" (expected true or false)"))
        })
        .collect::<Result<Vec<_>>>()?;

    let order = plan.play_order(&catalog);
    let mut runner = DecisionTreeRunner::new(build_default_decision_tree(&order), catalog)?
        .with_exhaustion_policy(policy);
    let mut current = Some(runner.root()?.node_id.clone());

    println!("Flow: {} ({} games, {policy})", plan.name, order.len());

    let mut used = 0;
    for outcome in &outcomes {
        let Some(node_id) = current.take() else {
            break;
        };
        let last = runner.is_last_attempt(&node_id)?;
        let advance = runner.record_and_advance(&node_id, *outcome)?;
        let attempts = runner.node_state(&node_id).map(|s| s.attempts).unwrap_or(0);
        used += 1;

        let verdict = if *outcome { "pass" } else { "fail" };
        let marker = if last && !*outcome { " (last forgiven mistake)" } else { "" };
        match &advance {
            Advance::Next(next) => {
                println!("  {used}. {node_id} #{attempts} {verdict}{marker} -> {next}")
            }
            Advance::Finished => {
                println!("  {used}. {node_id} #{attempts} {verdict}{marker} -> end")
            }
        }
        current = advance.next_node_id().map(str::to_string);
    }

    match current {
        Some(next) => println!("Next: {next}"),
        None => println!("Flow finished."),
    }
    if used < outcomes.len() {
        println!("{} outcome(s) unused.", outcomes.len() - used);
    }

    Ok(())
}
