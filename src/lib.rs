pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod config;
pub mod dataset;
pub mod decomposition;
pub mod error;
pub mod linear_model;
pub mod metrics;
pub mod pipeline;
pub mod report;

pub use config::TrainingConfig;
pub use dataset::{Dataset, LabeledTable, load_dataset};
pub use decomposition::FisherLDA;
pub use error::{ClassifierError, Result};
pub use linear_model::LogisticRegression;
pub use metrics::{ConfusionMatrix, confusion_matrix};
pub use pipeline::{run, train_and_evaluate};
pub use report::{ConsoleRenderer, CsvRenderer, DiagnosticRenderer, TrainingReport};

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_types_work() {
        let vec = Vector::zeros(5);
        let mat = Matrix::zeros((3, 4));
        assert_eq!(vec.len(), 5);
        assert_eq!(mat.shape(), &[3, 4]);
    }
}
