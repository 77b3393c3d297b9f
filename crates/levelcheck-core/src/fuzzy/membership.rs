//! Triangular membership functions.

use serde::{Deserialize, Serialize};

/// A triangle `(a, b, c)` with `a <= b <= c`, peaking at `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Triangle {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Triangle {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Truth degree of `x`: 1 at the peak, 0 outside `(a, c)`, linear between.
    ///
    /// The peak is tested first so shoulder triangles such as `[0, 0, 50]`
    /// or `[50, 100, 100]` reach 1 at their shoulder.
    pub fn membership(&self, x: f64) -> f64 {
        if x == self.b {
            return 1.0;
        }
        if x <= self.a || x >= self.c {
            return 0.0;
        }
        if x < self.b {
            (x - self.a) / (self.b - self.a)
        } else {
            (self.c - x) / (self.c - self.b)
        }
    }

    pub fn breakpoints(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }
}

impl From<[f64; 3]> for Triangle {
    fn from([a, b, c]: [f64; 3]) -> Self {
        Self { a, b, c }
    }
}

impl From<Triangle> for [f64; 3] {
    fn from(t: Triangle) -> Self {
        t.breakpoints()
    }
}

/// The `low / medium / high` triangles used to fuzzify one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleSet {
    pub low: Triangle,
    pub medium: Triangle,
    pub high: Triangle,
}

impl TriangleSet {
    pub fn fuzzify(&self, x: f64) -> FuzzyTruth {
        FuzzyTruth {
            low: self.low.membership(x),
            medium: self.medium.membership(x),
            high: self.high.membership(x),
        }
    }
}

impl Default for TriangleSet {
    /// Static breakpoints shared by every axis.
    fn default() -> Self {
        Self {
            low: Triangle::new(0.0, 0.0, 50.0),
            medium: Triangle::new(40.0, 55.0, 70.0),
            high: Triangle::new(65.0, 80.0, 100.0),
        }
    }
}

/// Truth degrees of one axis score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FuzzyTruth {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_triangle() {
        let t = Triangle::new(40.0, 55.0, 70.0);
        assert_eq!(t.membership(55.0), 1.0);
        assert_eq!(t.membership(40.0), 0.0);
        assert_eq!(t.membership(70.0), 0.0);
        assert_eq!(t.membership(10.0), 0.0);
        assert!((t.membership(47.5) - 0.5).abs() < 1e-12);
        assert!((t.membership(65.0) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn shoulders_peak_at_edge() {
        let low = Triangle::new(0.0, 0.0, 50.0);
        assert_eq!(low.membership(0.0), 1.0);
        assert!((low.membership(25.0) - 0.5).abs() < 1e-12);
        assert_eq!(low.membership(50.0), 0.0);

        let high = Triangle::new(50.0, 100.0, 100.0);
        assert_eq!(high.membership(100.0), 1.0);
        assert!((high.membership(75.0) - 0.5).abs() < 1e-12);
        assert_eq!(high.membership(50.0), 0.0);
    }

    #[test]
    fn static_set_fuzzifies_score() {
        let truth = TriangleSet::default().fuzzify(85.0);
        assert_eq!(truth.low, 0.0);
        assert_eq!(truth.medium, 0.0);
        assert!((truth.high - 0.75).abs() < 1e-12);
    }

    #[test]
    fn triangle_serializes_as_breakpoints() {
        let json = serde_json::to_string(&Triangle::new(30.0, 50.0, 70.0)).unwrap();
        assert_eq!(json, "[30.0,50.0,70.0]");
        let back: Triangle = serde_json::from_str("[0, 0, 50]").unwrap();
        assert_eq!(back, Triangle::new(0.0, 0.0, 50.0));
    }
}
