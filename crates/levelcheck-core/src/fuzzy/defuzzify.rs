//! Centroid defuzzification over the grade axis.

use crate::fuzzy::membership::Triangle;
use crate::fuzzy::rules::RuleFiring;

/// Lowest and highest grade on the output axis.
pub const GRADE_RANGE: (f64, f64) = (1.0, 6.0);

/// Output triangle of a grade label.
pub fn grade_triangle(grade: u8, half_width: f64) -> Triangle {
    let center = f64::from(grade);
    Triangle::new(center - half_width, center, center + half_width)
}

/// Aggregated output membership at `x`: the max over grades of each grade
/// triangle clipped at its rule's firing strength.
pub fn aggregated_membership(firing: &RuleFiring, half_width: f64, x: f64) -> f64 {
    firing
        .as_array()
        .iter()
        .zip(1u8..)
        .map(|(&strength, grade)| strength.min(grade_triangle(grade, half_width).membership(x)))
        .fold(0.0, f64::max)
}

/// Centroid of the aggregated output on a grid over [`GRADE_RANGE`],
/// rounded to 2 decimals. Falls back to the lowest grade when nothing fires.
///
/// `step` must be positive and finite; see [`FuzzyCalibration::validate`].
///
/// [`FuzzyCalibration::validate`]: crate::fuzzy::FuzzyCalibration::validate
pub fn centroid(firing: &RuleFiring, half_width: f64, step: f64) -> f64 {
    let (lo, hi) = GRADE_RANGE;
    if !(step.is_finite() && step > 0.0) {
        tracing::warn!(step, "invalid integration step, using the lowest grade");
        return lo;
    }
    let steps = ((hi - lo) / step).round() as usize;

    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..=steps {
        let x = lo + i as f64 * step;
        let mu = aggregated_membership(firing, half_width, x);
        num += mu * x;
        den += mu;
    }

    if den > 0.0 {
        round_to(num / den, 2)
    } else {
        lo
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rule_centers_on_its_grade() {
        let firing = RuleFiring {
            g3: 0.7,
            ..Default::default()
        };
        assert_eq!(centroid(&firing, 1.0, 0.01), 3.0);
        assert_eq!(centroid(&firing, 0.7, 0.01), 3.0);
    }

    #[test]
    fn nothing_fired_falls_back_to_first_grade() {
        assert_eq!(centroid(&RuleFiring::default(), 1.0, 0.01), 1.0);
    }

    #[test]
    fn two_equal_neighbours_meet_in_the_middle() {
        let firing = RuleFiring {
            g2: 0.5,
            g3: 0.5,
            ..Default::default()
        };
        let grade = centroid(&firing, 1.0, 0.01);
        assert!((grade - 2.5).abs() <= 0.01, "got {grade}");
    }

    #[test]
    fn clipped_triangles_aggregate_with_max() {
        let firing = RuleFiring {
            g4: 0.3,
            g5: 0.9,
            ..Default::default()
        };
        assert_eq!(aggregated_membership(&firing, 1.0, 5.0), 0.9);
        assert_eq!(aggregated_membership(&firing, 1.0, 4.0), 0.3);
        assert_eq!(aggregated_membership(&firing, 1.0, 1.5), 0.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(4.126, 2), 4.13);
        assert_eq!(round_to(0.72727, 3), 0.727);
    }

    #[test]
    fn invalid_step_does_not_loop() {
        let firing = RuleFiring {
            g3: 1.0,
            ..Default::default()
        };
        assert_eq!(centroid(&firing, 1.0, 0.0), 1.0);
        assert_eq!(centroid(&firing, 1.0, f64::NAN), 1.0);
    }
}
