//! TOML test plan parser.
//!
//! A test plan names the mini-games of one placement test and their
//! configuration. Plans are loaded from TOML files and directories, and
//! validated against a catalog.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::difficulty::GameConfig;
use crate::model::GameType;

/// A configured placement test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Present the games in the catalog's canonical order rather than the
    /// order they were listed in.
    #[serde(default = "default_true")]
    pub canonical_order: bool,
    pub mini_games: Vec<GameConfig>,
}

impl TestPlan {
    /// Game types in the order they are listed.
    pub fn game_types(&self) -> Vec<GameType> {
        self.mini_games.iter().map(GameConfig::game_type).collect()
    }

    /// First configuration listed for `game`.
    pub fn config_for(&self, game: GameType) -> Option<&GameConfig> {
        self.mini_games.iter().find(|g| g.game_type() == game)
    }

    /// Pass threshold of `game`, falling back to `default`.
    pub fn pass_percent_for(&self, game: GameType, default: f64) -> f64 {
        self.config_for(game)
            .and_then(GameConfig::pass_percent)
            .unwrap_or(default)
    }

    /// Games in play order: canonical (deduplicated) when the plan asks for
    /// it, otherwise as listed.
    pub fn play_order(&self, catalog: &Catalog) -> Vec<GameType> {
        if self.canonical_order {
            catalog.order_mini_games(&self.game_types(), |g| *g)
        } else {
            let mut seen = HashSet::new();
            self.game_types()
                .into_iter()
                .filter(|g| seen.insert(*g))
                .collect()
        }
    }

    /// Configurations of the games actually played, in play order. Later
    /// duplicates of a game type are never played and are left out.
    pub fn played_configs(&self, catalog: &Catalog) -> Vec<GameConfig> {
        self.play_order(catalog)
            .into_iter()
            .filter_map(|g| self.config_for(g).cloned())
            .collect()
    }
}

/// Intermediate TOML structure for parsing plan files.
#[derive(Debug, Deserialize)]
struct TomlPlanFile {
    plan: TomlPlanHeader,
    #[serde(default)]
    mini_games: Vec<TomlMiniGame>,
}

#[derive(Debug, Deserialize)]
struct TomlPlanHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_true")]
    canonical_order: bool,
}

#[derive(Debug, Deserialize)]
struct TomlMiniGame {
    game_type: String,
    #[serde(default)]
    config: toml::Table,
}

fn default_true() -> bool {
    true
}

/// Parse a single TOML file into a `TestPlan`.
pub fn parse_test_plan(path: &Path) -> Result<TestPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test plan file: {}", path.display()))?;

    parse_test_plan_str(&content, path)
}

/// Parse a TOML string into a `TestPlan` (useful for testing).
pub fn parse_test_plan_str(content: &str, source_path: &Path) -> Result<TestPlan> {
    let parsed: TomlPlanFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mini_games = parsed
        .mini_games
        .into_iter()
        .map(|g| {
            let game: GameType = g
                .game_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{}", e))?;

            let mut table = toml::Table::new();
            table.insert("game_type".into(), toml::Value::String(game.to_string()));
            table.insert("config".into(), toml::Value::Table(g.config));
            let config: GameConfig = toml::Value::Table(table).try_into().with_context(|| {
                format!("invalid config for {game} in {}", source_path.display())
            })?;
            Ok(config)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TestPlan {
        id: parsed.plan.id,
        name: parsed.plan.name,
        description: parsed.plan.description,
        canonical_order: parsed.plan.canonical_order,
        mini_games,
    })
}

/// Recursively load all `.toml` test plans from a directory.
pub fn load_plan_directory(dir: &Path) -> Result<Vec<TestPlan>> {
    let mut plans = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            plans.extend(load_plan_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_test_plan(&path) {
                Ok(plan) => plans.push(plan),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(plans)
}

/// A warning from test plan validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The game the warning is about (if applicable).
    pub game: Option<GameType>,
    /// Warning message.
    pub message: String,
}

/// Validate a test plan against a catalog.
pub fn validate_test_plan(plan: &TestPlan, catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if plan.mini_games.is_empty() {
        warnings.push(ValidationWarning {
            game: None,
            message: "plan has no mini-games".into(),
        });
    }

    let mut seen = HashSet::new();
    for game in plan.game_types() {
        if !seen.insert(game) {
            warnings.push(ValidationWarning {
                game: Some(game),
                message: format!("duplicate game type: {game} (only the first is played)"),
            });
        }
    }

    // Unmapped games are played but never scored
    for game in plan.game_types() {
        if !catalog.is_mapped(game) {
            warnings.push(ValidationWarning {
                game: Some(game),
                message: format!("{game} has no axis contributions and will not be scored"),
            });
        }
    }

    for config in &plan.mini_games {
        if let Some(pct) = config.pass_percent() {
            if !(0.0..=100.0).contains(&pct) {
                warnings.push(ValidationWarning {
                    game: Some(config.game_type()),
                    message: format!("pass percent {pct} is outside 0..=100"),
                });
            }
        }
    }

    warnings
}
