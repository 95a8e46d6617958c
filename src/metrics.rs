use std::fmt;

use ndarray::Array2;

use crate::error::{ClassifierError, Result};
use crate::linear_model::predict_proba;
use crate::{Matrix, Vector};

/// 2×2 outcome counts indexed `[predicted][actual]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_counts(counts: [[usize; 2]; 2]) -> Self {
        Self { counts }
    }

    pub fn from_predictions(predicted: &Vector, actual: &Vector) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("{} labels", predicted.len()),
                got: format!("{} labels", actual.len()),
            });
        }

        let mut counts = [[0; 2]; 2];
        for (&p, &a) in predicted.iter().zip(actual.iter()) {
            counts[binary_index(p)?][binary_index(a)?] += 1;
        }
        Ok(Self { counts })
    }

    /// Count of samples predicted as `predicted` whose label is `actual`.
    ///
    /// # Panics
    ///
    /// Panics if either index is not 0 or 1.
    pub fn get(&self, predicted: usize, actual: usize) -> usize {
        self.counts[predicted][actual]
    }

    pub fn counts(&self) -> [[usize; 2]; 2] {
        self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn true_positives(&self) -> usize {
        self.counts[1][1]
    }

    pub fn true_negatives(&self) -> usize {
        self.counts[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.counts[1][0]
    }

    pub fn false_negatives(&self) -> usize {
        self.counts[0][1]
    }

    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.true_positives() + self.true_negatives(), self.total())
    }

    pub fn precision(&self) -> Option<f64> {
        ratio(
            self.true_positives(),
            self.true_positives() + self.false_positives(),
        )
    }

    pub fn recall(&self) -> Option<f64> {
        ratio(
            self.true_positives(),
            self.true_positives() + self.false_negatives(),
        )
    }

    pub fn f1(&self) -> Option<f64> {
        let precision = self.precision()?;
        let recall = self.recall()?;
        if precision + recall == 0.0 {
            return None;
        }
        Some(2.0 * precision * recall / (precision + recall))
    }

    pub fn to_array(&self) -> Array2<usize> {
        Array2::from_shape_fn((2, 2), |(p, a)| self.counts[p][a])
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(8);
        writeln!(f, "{:>11} {:>width$} {:>width$}", "", "actual 0", "actual 1")?;
        for (p, row) in self.counts.iter().enumerate() {
            writeln!(f, "predicted {p} {:>width$} {:>width$}", row[0], row[1])?;
        }
        Ok(())
    }
}

/// Thresholds the predictions of `weights` on `x` and tabulates them against `y`.
pub fn confusion_matrix(x: &Matrix, weights: &Vector, y: &Vector) -> Result<ConfusionMatrix> {
    if x.ncols() != weights.len() {
        return Err(ClassifierError::ShapeMismatch {
            expected: format!("{} features", weights.len()),
            got: format!("{} features", x.ncols()),
        });
    }
    let predicted = predict_proba(x, weights).mapv(f64::round_ties_even);
    ConfusionMatrix::from_predictions(&predicted, y)
}

fn binary_index(value: f64) -> Result<usize> {
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(ClassifierError::InvalidLabel { value })
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_hand_computed_counts() {
        let x = array![[1.0], [-1.0], [2.0], [-2.0], [0.0]];
        let w = array![1.0];
        let y = array![1.0, 0.0, 0.0, 1.0, 0.0];

        let m = confusion_matrix(&x, &w, &y).unwrap();
        assert_eq!(m.counts(), [[2, 1], [1, 1]]);
        assert_eq!(m.total(), 5);
        assert_eq!(m.get(1, 0), 1);
        assert_eq!(m.to_array(), array![[2, 1], [1, 1]]);
    }

    #[test]
    fn test_cells_sum_to_sample_count() {
        let x = array![
            [0.3, -1.0],
            [2.0, 0.5],
            [-0.7, 0.1],
            [1.0, 1.0],
            [0.0, -3.0],
            [4.0, 4.0]
        ];
        let w = array![0.8, -0.2];
        let y = array![0.0, 1.0, 1.0, 0.0, 0.0, 1.0];

        let m = confusion_matrix(&x, &w, &y).unwrap();
        assert_eq!(m.total(), x.nrows());
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        ConfusionMatrix::default().get(2, 0);
    }

    #[test]
    fn test_scores() {
        let m = ConfusionMatrix::from_counts([[5, 1], [2, 2]]);
        assert!((m.accuracy().unwrap() - 0.7).abs() < 1e-12);
        assert!((m.precision().unwrap() - 0.5).abs() < 1e-12);
        assert!((m.recall().unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1().unwrap() - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_scores_without_positives() {
        let m = ConfusionMatrix::from_counts([[3, 0], [0, 0]]);
        assert_eq!(m.accuracy(), Some(1.0));
        assert_eq!(m.precision(), None);
        assert_eq!(m.f1(), None);
        assert_eq!(ConfusionMatrix::default().accuracy(), None);
    }

    #[test]
    fn test_rejects_non_binary_labels() {
        let predicted = array![0.0, 1.0];
        let actual = array![0.0, 2.0];
        assert!(matches!(
            ConfusionMatrix::from_predictions(&predicted, &actual),
            Err(ClassifierError::InvalidLabel { .. })
        ));
    }

    #[test]
    fn test_display_has_all_cells() {
        let text = ConfusionMatrix::from_counts([[10, 2], [3, 40]]).to_string();
        assert!(text.contains("actual 0"));
        assert!(text.contains("predicted 1"));
        assert!(text.contains("40"));
    }
}
