//! Binary confusion counts and derived accuracy metrics.

use std::fmt;

/// Tally of decisions against true labels for a binary classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Evaluation {
    /// Label `true`, decided `true`.
    pub true_positive: usize,
    /// Label `true`, decided `false`.
    pub false_negative: usize,
    /// Label `false`, decided `true`.
    pub false_positive: usize,
    /// Label `false`, decided `false`.
    pub true_negative: usize,
}

impl Evaluation {
    /// Build an evaluation from parallel `(decision, label)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (bool, bool)>) -> Self {
        let mut evaluation = Self::default();
        for (decision, label) in pairs {
            evaluation.add(decision, label);
        }
        evaluation
    }

    /// Record one decision against its true label.
    pub fn add(&mut self, decision: bool, label: bool) {
        match (label, decision) {
            (true, true) => self.true_positive += 1,
            (true, false) => self.false_negative += 1,
            (false, true) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
        }
    }

    /// Number of evaluated records.
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positive + self.false_negative + self.false_positive + self.true_negative
    }

    /// Number of correct decisions.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.true_positive + self.true_negative
    }

    /// Fraction of correct decisions, or `None` when nothing was evaluated.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            None
        } else {
            Some(self.correct() as f64 / total as f64)
        }
    }

    /// `1 - accuracy`, or `None` when nothing was evaluated.
    #[must_use]
    pub fn error_rate(&self) -> Option<f64> {
        self.accuracy().map(|a| 1.0 - a)
    }

    /// Precision of the positive class: TP / (TP + FP). 0.0 with no positive decisions.
    #[must_use]
    pub fn precision(&self) -> f64 {
        let predicted = self.true_positive + self.false_positive;
        if predicted == 0 {
            0.0
        } else {
            self.true_positive as f64 / predicted as f64
        }
    }

    /// Recall of the positive class: TP / (TP + FN). 0.0 with no positive labels.
    #[must_use]
    pub fn recall(&self) -> f64 {
        let support = self.true_positive + self.false_negative;
        if support == 0 {
            0.0
        } else {
            self.true_positive as f64 / support as f64
        }
    }

    /// Harmonic mean of precision and recall. 0.0 if both are zero.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} {:>10} {:>10}", "", "pred_true", "pred_false")?;
        writeln!(
            f,
            "{:>10} {:>10} {:>10}",
            "true", self.true_positive, self.false_negative
        )?;
        writeln!(
            f,
            "{:>10} {:>10} {:>10}",
            "false", self.false_positive, self.true_negative
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_decisions() {
        let e = Evaluation::from_pairs([(true, true), (false, false), (true, true)]);
        assert_eq!(e.accuracy(), Some(1.0));
        assert_eq!(e.error_rate(), Some(0.0));
        assert!((e.precision() - 1.0).abs() < f64::EPSILON);
        assert!((e.recall() - 1.0).abs() < f64::EPSILON);
        assert!((e.f1() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn known_tally() {
        // (decision, label)
        let e = Evaluation::from_pairs([
            (true, true),
            (true, true),
            (false, true),
            (true, false),
            (false, false),
        ]);
        assert_eq!(e.true_positive, 2);
        assert_eq!(e.false_negative, 1);
        assert_eq!(e.false_positive, 1);
        assert_eq!(e.true_negative, 1);
        assert_eq!(e.total(), 5);
        assert!((e.accuracy().unwrap() - 0.6).abs() < 1e-12);
        assert!((e.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((e.recall() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_evaluation_has_no_accuracy() {
        let e = Evaluation::default();
        assert_eq!(e.accuracy(), None);
        assert_eq!(e.error_rate(), None);
        assert_eq!(e.precision(), 0.0);
        assert_eq!(e.f1(), 0.0);
    }

    #[test]
    fn display_formatting() {
        let out = format!("{}", Evaluation::from_pairs([(true, false)]));
        assert!(out.contains("pred_true"));
        assert!(out.contains("false"));
    }
}
