//! Adaptive mini-game flow.
//!
//! A [`DecisionTreeRunner`] walks a static tree of [`DecisionNode`]s, one per
//! mini-game, tracking attempts per node and applying the catalog's retry
//! policy to decide what runs next.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::PlacementError;
use crate::model::GameType;

/// An outgoing edge taken when the node's outcome equals `condition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionChild {
    pub condition: bool,
    pub node_id: String,
}

/// A node of the placement flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNode {
    pub node_id: String,
    pub game_type: GameType,
    /// Which configuration block of the game this node runs with.
    #[serde(default = "default_config_key")]
    pub config_key: String,
    #[serde(default)]
    pub children: Vec<DecisionChild>,
}

fn default_config_key() -> String {
    "grade_config".to_string()
}

impl DecisionNode {
    fn child_for(&self, outcome: bool) -> Option<&DecisionChild> {
        self.children.iter().find(|c| c.condition == outcome)
    }
}

/// Execution record of a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub attempts: u32,
    pub last_result: Option<bool>,
}

impl NodeState {
    fn record_result(&mut self, success: bool) {
        self.attempts += 1;
        self.last_result = Some(success);
    }
}

/// What happens once a node's retries are used up by failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// End the flow.
    #[default]
    Terminate,
    /// Follow the node's `true` edge so later games are still played.
    Advance,
}

impl std::fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExhaustionPolicy::Terminate => write!(f, "terminate"),
            ExhaustionPolicy::Advance => write!(f, "advance"),
        }
    }
}

impl std::str::FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terminate" => Ok(ExhaustionPolicy::Terminate),
            "advance" => Ok(ExhaustionPolicy::Advance),
            other => Err(format!("unknown exhaustion policy: {other}")),
        }
    }
}

/// Outcome of recording a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Run this node next (may be the same node, for a retry).
    Next(String),
    /// The flow is over.
    Finished,
}

impl Advance {
    pub fn next_node_id(&self) -> Option<&str> {
        match self {
            Advance::Next(id) => Some(id.as_str()),
            Advance::Finished => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Advance::Finished)
    }
}

/// Walks a decision tree for one learner.
///
/// Node state is owned by the runner; learners must not share an instance.
#[derive(Debug, Clone)]
pub struct DecisionTreeRunner {
    tree: Vec<DecisionNode>,
    index: HashMap<String, usize>,
    states: HashMap<String, NodeState>,
    catalog: Arc<Catalog>,
    exhaustion: ExhaustionPolicy,
}

impl DecisionTreeRunner {
    /// Build a runner, rejecting duplicate ids, dangling child references and
    /// nodes with two edges for the same condition.
    ///
    /// An empty tree is accepted here and reported by [`Self::root`].
    pub fn new(tree: Vec<DecisionNode>, catalog: Arc<Catalog>) -> Result<Self, PlacementError> {
        let mut index = HashMap::with_capacity(tree.len());
        let mut states = HashMap::with_capacity(tree.len());
        for (i, node) in tree.iter().enumerate() {
            if index.insert(node.node_id.clone(), i).is_some() {
                return Err(PlacementError::config(format!(
                    "duplicate node id \"{}\"",
                    node.node_id
                )));
            }
            states.insert(node.node_id.clone(), NodeState::default());
        }

        for node in &tree {
            let mut conditions = HashSet::new();
            for child in &node.children {
                if !conditions.insert(child.condition) {
                    return Err(PlacementError::config(format!(
                        "node \"{}\" has more than one \"{}\" edge",
                        node.node_id, child.condition
                    )));
                }
                if !index.contains_key(&child.node_id) {
                    return Err(PlacementError::config(format!(
                        "node \"{}\" points at missing node \"{}\"",
                        node.node_id, child.node_id
                    )));
                }
            }
        }

        Ok(Self {
            tree,
            index,
            states,
            catalog,
            exhaustion: ExhaustionPolicy::default(),
        })
    }

    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    pub fn exhaustion_policy(&self) -> ExhaustionPolicy {
        self.exhaustion
    }

    /// The first node of the tree.
    pub fn root(&self) -> Result<&DecisionNode, PlacementError> {
        self.tree
            .first()
            .ok_or_else(|| PlacementError::config("empty decision tree"))
    }

    pub fn node(&self, id: &str) -> Option<&DecisionNode> {
        self.index.get(id).map(|&i| &self.tree[i])
    }

    pub fn node_state(&self, id: &str) -> Option<&NodeState> {
        self.states.get(id)
    }

    pub fn nodes(&self) -> &[DecisionNode] {
        &self.tree
    }

    /// Record the outcome of the node that just ran and pick the next one.
    pub fn record_and_advance(
        &mut self,
        node_id: &str,
        success: bool,
    ) -> Result<Advance, PlacementError> {
        let node = self
            .index
            .get(node_id)
            .map(|&i| &self.tree[i])
            .ok_or_else(|| PlacementError::UnknownNode(node_id.to_string()))?;
        let state = self
            .states
            .get_mut(node_id)
            .ok_or_else(|| PlacementError::UnknownNode(node_id.to_string()))?;
        state.record_result(success);

        let max_attempts = self.catalog.policy.max_attempts_for(node.game_type);
        let attempts = state.attempts;

        let next = if !success && attempts >= max_attempts {
            match self.exhaustion {
                ExhaustionPolicy::Terminate => None,
                ExhaustionPolicy::Advance => node.child_for(true),
            }
        } else if !success {
            return Ok(Advance::Next(node_id.to_string()));
        } else {
            node.child_for(true)
        };

        let advance = match next {
            Some(child) => Advance::Next(child.node_id.clone()),
            None => Advance::Finished,
        };
        tracing::debug!(
            node = node_id,
            success,
            attempts,
            max_attempts,
            next = advance.next_node_id().unwrap_or("<end>"),
            "recorded mini-game result"
        );
        Ok(advance)
    }

    /// Count a new attempt on a node without an outcome yet.
    pub fn record_attempt(&mut self, node_id: &str) -> Result<(), PlacementError> {
        let state = self
            .states
            .get_mut(node_id)
            .ok_or_else(|| PlacementError::UnknownNode(node_id.to_string()))?;
        state.attempts += 1;
        state.last_result = None;
        Ok(())
    }

    /// Whether the learner is on their final forgiven mistake for this node.
    pub fn is_last_attempt(&self, node_id: &str) -> Result<bool, PlacementError> {
        let node = self
            .node(node_id)
            .ok_or_else(|| PlacementError::UnknownNode(node_id.to_string()))?;
        let attempts = self.states.get(node_id).map(|s| s.attempts).unwrap_or(0);
        let max_mistakes = self.catalog.policy.max_mistakes_for(node.game_type);
        Ok(attempts + 1 >= max_mistakes)
    }
}

/// Build a linear tree in authoring order.
///
/// Each node's `true` edge points at the next game and its `false` edge at
/// itself. The last node only has the `false` edge, so succeeding on it ends
/// the flow.
pub fn build_default_decision_tree(games: &[GameType]) -> Vec<DecisionNode> {
    games
        .iter()
        .enumerate()
        .map(|(i, game)| {
            let mut children = Vec::with_capacity(2);
            if let Some(next) = games.get(i + 1) {
                children.push(DecisionChild {
                    condition: true,
                    node_id: next.to_string(),
                });
            }
            children.push(DecisionChild {
                condition: false,
                node_id: game.to_string(),
            });

            DecisionNode {
                node_id: game.to_string(),
                game_type: *game,
                config_key: default_config_key(),
                children,
            }
        })
        .collect()
}
