use log::info;

use crate::config::TrainingConfig;
use crate::error::{ClassifierError, Result};
use crate::report::format_loss;
use crate::{Matrix, Vector};

/// Logistic function. The exponent argument is kept non-positive on both
/// branches so neither tail overflows.
pub fn sigmoid(z: f64) -> f64 {
    if z < 0.0 {
        let e = z.exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + (-z).exp())
    }
}

/// Probability of class 1 for every row of `x`.
pub fn predict_proba(x: &Matrix, weights: &Vector) -> Vector {
    x.dot(weights).mapv(sigmoid)
}

/// Summed cross-entropy of the predictions of `weights` against `y`.
///
/// `ln(0)` terms are replaced by 0 before summing, so a saturated
/// prediction contributes nothing instead of turning the sum into
/// infinity or NaN. Confidently wrong samples are under-counted as a result.
pub fn cross_entropy(x: &Matrix, weights: &Vector, y: &Vector) -> f64 {
    let p = predict_proba(x, weights);
    let log_p = p.mapv(finite_log);
    let log_not_p = p.mapv(|v| finite_log(1.0 - v));
    let not_y = y.mapv(|v| 1.0 - v);

    -(y.dot(&log_p) + not_y.dot(&log_not_p))
}

/// `Xᵗ·(sigmoid(X·w) − y)`.
pub fn gradient(x: &Matrix, weights: &Vector, y: &Vector) -> Vector {
    let error = predict_proba(x, weights) - y;
    x.t().dot(&error)
}

/// Progress line logged before each gradient step.
pub fn iteration_line(iteration: usize, loss: f64) -> String {
    format!("{iteration} th iteration : [loss : {}]", format_loss(loss))
}

fn finite_log(v: f64) -> f64 {
    let log = v.ln();
    if log == f64::NEG_INFINITY { 0.0 } else { log }
}

#[derive(Clone, Debug)]
pub struct LogisticRegression {
    pub weights: Option<Vector>,
    learning_rate: f64,
    iterations: usize,
    loss_history: Vec<f64>,
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self::with_params(1e-4, 100)
    }

    pub fn with_params(learning_rate: f64, iterations: usize) -> Self {
        Self {
            weights: None,
            learning_rate,
            iterations,
            loss_history: Vec::new(),
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::with_params(config.learning_rate, config.iterations)
    }

    /// Runs exactly `iterations` gradient steps from all-zero weights.
    ///
    /// The loss recorded for iteration `i` is measured before that
    /// iteration's update.
    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("{} labels", x.nrows()),
                got: format!("{} labels", y.len()),
            });
        }
        validate_labels(y)?;

        let mut weights = Vector::zeros(x.ncols());
        self.loss_history = Vec::with_capacity(self.iterations);

        for iteration in 0..self.iterations {
            let loss = cross_entropy(x, &weights, y);
            info!("{}", iteration_line(iteration, loss));
            self.loss_history.push(loss);

            let step = gradient(x, &weights, y);
            weights.scaled_add(-self.learning_rate, &step);
        }

        self.weights = Some(weights);
        Ok(())
    }

    pub fn predict_proba(&self, x: &Matrix) -> Result<Vector> {
        let weights = self.fitted_weights(x)?;
        Ok(predict_proba(x, weights))
    }

    /// Class predictions, thresholded at 0.5 with ties going to class 0.
    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let probabilities = self.predict_proba(x)?;
        Ok(probabilities.mapv(f64::round_ties_even))
    }

    /// Cross-entropy of the fitted weights on `(x, y)`.
    pub fn loss(&self, x: &Matrix, y: &Vector) -> Result<f64> {
        let weights = self.fitted_weights(x)?;
        if x.nrows() != y.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("{} labels", x.nrows()),
                got: format!("{} labels", y.len()),
            });
        }
        Ok(cross_entropy(x, weights, y))
    }

    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn fitted_weights(&self, x: &Matrix) -> Result<&Vector> {
        let weights = self.weights.as_ref().ok_or(ClassifierError::NotFitted)?;
        if x.ncols() != weights.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("{} features", weights.len()),
                got: format!("{} features", x.ncols()),
            });
        }
        Ok(weights)
    }
}

fn validate_labels(y: &Vector) -> Result<()> {
    match y.iter().find(|&&label| label != 0.0 && label != 1.0) {
        Some(&value) => Err(ClassifierError::InvalidLabel { value }),
        None => Ok(()),
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}
