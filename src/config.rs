use crate::error::{ClassifierError, Result};

/// Hyperparameters and class selection for one binary training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingConfig {
    /// Ordered pair of class labels; the first maps to 0, the second to 1.
    pub labels: [i64; 2],
    pub learning_rate: f64,
    pub iterations: usize,
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self {
            labels: [1, 2],
            learning_rate: 1e-4,
            iterations: 100,
        }
    }

    pub fn labels(mut self, negative: i64, positive: i64) -> Self {
        self.labels = [negative, positive];
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.labels[0] == self.labels[1] {
            return Err(ClassifierError::InvalidConfig(format!(
                "binary classification needs two distinct labels, got {:?}",
                self.labels
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ClassifierError::InvalidConfig(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        if self.iterations == 0 {
            return Err(ClassifierError::InvalidConfig(
                "iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new()
    }
}
