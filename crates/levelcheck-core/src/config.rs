//! levelcheck configuration.
//!
//! Search order:
//! 1. an explicit path
//! 2. `levelcheck.toml` in the current directory
//! 3. `~/.config/levelcheck/config.toml`
//!
//! Environment overrides: `LEVELCHECK_MODE`, `LEVELCHECK_EXHAUSTION`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::aggregator::PerformanceWeights;
use crate::catalog::Catalog;
use crate::decision_tree::ExhaustionPolicy;
use crate::error::PlacementError;
use crate::fuzzy::{FuzzyCalibration, MembershipMode};
use crate::model::{AxisMap, GameType};

/// Top-level levelcheck configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelcheckConfig {
    /// Membership triangle mode used when none is requested explicitly.
    #[serde(default)]
    pub mode: MembershipMode,
    /// What a failed node does once its retries are used up.
    #[serde(default)]
    pub exhaustion: ExhaustionPolicy,
    /// Results with a lower confidence are marked provisional.
    #[serde(default = "default_provisional_below")]
    pub provisional_below: f64,
    /// Pass threshold for games whose config sets none.
    #[serde(default = "default_pass_percent")]
    pub default_pass_percent: f64,
    #[serde(default)]
    pub calibration: FuzzyCalibration,
    #[serde(default)]
    pub weights: PerformanceWeights,
    /// Per-game attempt limits, keyed by game type.
    #[serde(default)]
    pub max_attempts: BTreeMap<String, u32>,
    /// Per-game mistake limits, keyed by game type.
    #[serde(default)]
    pub max_mistakes: BTreeMap<String, u32>,
    /// Per-game slow-answer weights, keyed by game type.
    #[serde(default)]
    pub speed_weights: BTreeMap<String, f64>,
    /// Replacement axis weights for individual games.
    #[serde(default)]
    pub contributions: BTreeMap<String, AxisMap<f64>>,
}

fn default_provisional_below() -> f64 {
    0.6
}
fn default_pass_percent() -> f64 {
    50.0
}

impl Default for LevelcheckConfig {
    fn default() -> Self {
        Self {
            mode: MembershipMode::default(),
            exhaustion: ExhaustionPolicy::default(),
            provisional_below: default_provisional_below(),
            default_pass_percent: default_pass_percent(),
            calibration: FuzzyCalibration::default(),
            weights: PerformanceWeights::default(),
            max_attempts: BTreeMap::new(),
            max_mistakes: BTreeMap::new(),
            speed_weights: BTreeMap::new(),
            contributions: BTreeMap::new(),
        }
    }
}

fn game_key(key: &str, table: &str) -> Result<GameType, PlacementError> {
    key.parse::<GameType>()
        .map_err(|e| PlacementError::config(format!("[{table}] {e}")))
}

impl LevelcheckConfig {
    /// Build the immutable catalog: defaults with this config's overrides.
    pub fn catalog(&self) -> Result<Arc<Catalog>, PlacementError> {
        self.calibration.validate()?;
        let mut catalog = Catalog::default();

        for (key, &limit) in &self.max_attempts {
            if limit == 0 {
                return Err(PlacementError::config(format!(
                    "[max_attempts] {key} must allow at least one attempt"
                )));
            }
            catalog
                .policy
                .max_attempts
                .insert(game_key(key, "max_attempts")?, limit);
        }
        for (key, &limit) in &self.max_mistakes {
            catalog
                .policy
                .max_mistakes
                .insert(game_key(key, "max_mistakes")?, limit);
        }
        for (key, &weight) in &self.speed_weights {
            catalog
                .speed_weights
                .insert(game_key(key, "speed_weights")?, weight);
        }
        for (key, weights) in &self.contributions {
            if weights.iter().any(|(_, w)| *w < 0.0) {
                return Err(PlacementError::config(format!(
                    "[contributions] {key} has a negative weight"
                )));
            }
            catalog
                .contributions
                .insert(game_key(key, "contributions")?, *weights);
        }

        Ok(Arc::new(catalog))
    }

    /// Apply `LEVELCHECK_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(mode) = lookup("LEVELCHECK_MODE") {
            self.mode = mode
                .parse()
                .map_err(|e: String| anyhow::anyhow!("LEVELCHECK_MODE: {e}"))?;
        }
        if let Some(policy) = lookup("LEVELCHECK_EXHAUSTION") {
            self.exhaustion = policy
                .parse()
                .map_err(|e: String| anyhow::anyhow!("LEVELCHECK_EXHAUSTION: {e}"))?;
        }
        Ok(())
    }
}

/// Load configuration from the well-known paths.
pub fn load_config() -> Result<LevelcheckConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LevelcheckConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("levelcheck.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config_file(&path)?
        }
        None => LevelcheckConfig::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<LevelcheckConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<LevelcheckConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("levelcheck"))
}
