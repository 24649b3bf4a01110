//! Confusion-matrix counts and the metrics derived from them.

use std::ops::{Add, AddAssign};

use serde::Serialize;

/// Outcome of comparing predicted against actual constraint sets.
///
/// Ratios whose denominator is zero are reported as 1.0: with no
/// positives there is nothing to miss, with no predictions nothing is wrong.
///
/// # Examples
///
/// ```
/// use cutforge_learn::ClassifierEvaluation;
///
/// let eval = ClassifierEvaluation::new(1, 1, 1, 0);
/// assert_eq!(eval.total(), 3);
/// assert_eq!(eval.precision(), 0.5);
/// assert_eq!(eval.recall(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassifierEvaluation {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

impl ClassifierEvaluation {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self { tp, tn, fp, fn_ }
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    pub fn predicted_positive(&self) -> usize {
        self.tp + self.fp
    }

    pub fn predicted_negative(&self) -> usize {
        self.tn + self.fn_
    }

    pub fn condition_positive(&self) -> usize {
        self.tp + self.fn_
    }

    pub fn condition_negative(&self) -> usize {
        self.tn + self.fp
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.predicted_positive())
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.condition_positive())
    }

    pub fn f1_score(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        1.0
    } else {
        num as f64 / den as f64
    }
}

impl Add for ClassifierEvaluation {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            tp: self.tp + other.tp,
            tn: self.tn + other.tn,
            fp: self.fp + other.fp,
            fn_: self.fn_ + other.fn_,
        }
    }
}

impl AddAssign for ClassifierEvaluation {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}
