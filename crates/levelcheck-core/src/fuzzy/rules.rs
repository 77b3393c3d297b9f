//! Masked rule base mapping axis truth degrees to grade firing strengths.
//!
//! Evidence masking keeps unseen axes from deciding the outcome: a
//! supporting term on an uncovered axis reads as the neutral value, and an
//! accusing term on an uncovered axis reads as 0.

use serde::{Deserialize, Serialize};

use crate::fuzzy::membership::FuzzyTruth;
use crate::model::{AxisMap, Coverage};

/// Firing strength of each candidate grade, `0..=1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleFiring {
    pub g1: f64,
    pub g2: f64,
    pub g3: f64,
    pub g4: f64,
    pub g5: f64,
    pub g6: f64,
}

impl RuleFiring {
    /// Strengths indexed by `grade - 1`.
    pub fn as_array(&self) -> [f64; 6] {
        [self.g1, self.g2, self.g3, self.g4, self.g5, self.g6]
    }

    /// The grade whose rule fired hardest, if any fired at all.
    pub fn strongest(&self) -> Option<u8> {
        self.as_array()
            .iter()
            .enumerate()
            .filter(|(_, s)| **s > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i as u8 + 1)
    }
}

#[derive(Debug, Clone, Copy)]
struct Mask {
    neutral: f64,
}

impl Mask {
    /// Supporting evidence: neutral when the axis was never observed.
    fn pos(&self, mu: f64, coverage: f64) -> f64 {
        if coverage > 0.0 {
            mu
        } else {
            self.neutral
        }
    }

    /// Accusing evidence: silent when the axis was never observed.
    fn neg(&self, mu: f64, coverage: f64) -> f64 {
        if coverage > 0.0 {
            mu
        } else {
            0.0
        }
    }
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Evaluate the six grade rules.
pub fn evaluate_rules(
    truth: &AxisMap<FuzzyTruth>,
    coverage: &Coverage,
    neutral: f64,
) -> RuleFiring {
    let m = Mask { neutral };
    let (af, ns, st) = (
        &truth.arithmetic_fluency,
        &truth.number_sense,
        &truth.sequential_thinking,
    );
    let (cs, vm, ar) = (
        &truth.comparison_skill,
        &truth.visual_matching,
        &truth.audio_recognition,
    );
    let c = coverage;

    let g1 = max_of(&[
        min_of(&[
            m.neg(af.low, c.arithmetic_fluency),
            m.neg(ns.low, c.number_sense),
        ]),
        min_of(&[
            m.neg(ns.low, c.number_sense),
            m.neg(st.low, c.sequential_thinking),
        ]),
    ]);

    let g2 = min_of(&[
        m.pos(af.medium, c.arithmetic_fluency),
        m.neg(ns.low, c.number_sense),
    ]);

    let g3 = min_of(&[
        m.pos(af.medium, c.arithmetic_fluency),
        m.pos(ns.medium, c.number_sense),
    ]);

    let g4 = min_of(&[
        m.pos(af.high, c.arithmetic_fluency),
        m.pos(ns.medium, c.number_sense),
        max_of(&[
            m.pos(st.medium, c.sequential_thinking),
            m.pos(cs.medium, c.comparison_skill),
        ]),
    ]);

    let g5 = min_of(&[
        m.pos(af.high, c.arithmetic_fluency),
        m.pos(ns.high, c.number_sense),
        max_of(&[
            m.pos(st.medium, c.sequential_thinking),
            m.pos(cs.high, c.comparison_skill),
        ]),
    ]);

    let g6 = min_of(&[
        m.pos(af.high, c.arithmetic_fluency),
        m.pos(ns.high, c.number_sense),
        m.pos(st.high, c.sequential_thinking),
        max_of(&[
            m.pos(cs.high, c.comparison_skill),
            m.pos(vm.high, c.visual_matching),
            m.pos(ar.high, c.audio_recognition),
        ]),
    ]);

    RuleFiring {
        g1,
        g2,
        g3,
        g4,
        g5,
        g6,
    }
}
