//! levelcheck-core — Adaptive mini-game flow and fuzzy grade placement.
//!
//! This crate holds the mini-game catalog, the decision-tree runner that
//! sequences games for a learner, the feature aggregator that turns attempt
//! logs into six axis scores, and the fuzzy engine that infers a grade from
//! them.

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod decision_tree;
pub mod difficulty;
pub mod error;
pub mod fuzzy;
pub mod model;
pub mod parser;
pub mod report;
pub mod session;

pub use error::PlacementError;
