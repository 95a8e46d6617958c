use std::path::Path;

use log::info;

use crate::config::TrainingConfig;
use crate::dataset::{Dataset, load_dataset};
use crate::error::{ClassifierError, Result};
use crate::linear_model::LogisticRegression;
use crate::metrics::confusion_matrix;
use crate::report::{TrainingReport, format_loss};

/// Loads both tables, trains on the first and evaluates on both.
///
/// The configuration is validated before any file is read.
pub fn run<P, Q>(train_path: P, test_path: Q, config: &TrainingConfig) -> Result<TrainingReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    config.validate()?;
    let train = load_dataset(train_path, &config.labels)?;
    let test = load_dataset(test_path, &config.labels)?;
    train_and_evaluate(&train, &test, config)
}

pub fn train_and_evaluate(
    train: &Dataset,
    test: &Dataset,
    config: &TrainingConfig,
) -> Result<TrainingReport> {
    config.validate()?;
    if train.n_features() != test.n_features() {
        return Err(ClassifierError::ShapeMismatch {
            expected: format!("{} test features", train.n_features()),
            got: format!("{} test features", test.n_features()),
        });
    }

    info!(
        "training on {} samples for {} iterations (lr {})",
        train.n_samples(),
        config.iterations,
        config.learning_rate
    );
    let mut model = LogisticRegression::from_config(config);
    model.fit(&train.features, &train.labels)?;

    let test_loss = model.loss(&test.features, &test.labels)?;
    info!("{}", testing_line(test_loss));

    let weights = model.weights.take().ok_or(ClassifierError::NotFitted)?;
    let train_confusion = confusion_matrix(&train.features, &weights, &train.labels)?;
    let test_confusion = confusion_matrix(&test.features, &weights, &test.labels)?;

    Ok(TrainingReport {
        loss_history: model.loss_history().to_vec(),
        weights,
        test_loss,
        train_confusion,
        test_confusion,
    })
}

/// Line logged with the held-out loss after training.
pub fn testing_line(loss: f64) -> String {
    format!("testing : [loss : {}]", format_loss(loss))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;
    use std::path::PathBuf;

    fn write_table(name: &str, rows: &[(i64, u8, u8)]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "digit_classifier_pipeline_{}_{name}.csv",
            std::process::id()
        ));
        let mut text = String::from("label,pixel0,pixel1\n");
        for (label, p0, p1) in rows {
            text.push_str(&format!("{label},{p0},{p1}\n"));
        }
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_run_end_to_end() {
        let train = write_table(
            "train",
            &[
                (1, 255, 0),
                (2, 0, 255),
                (1, 250, 3),
                (0, 9, 9),
                (2, 4, 240),
                (1, 255, 0),
            ],
        );
        let test = write_table("test", &[(2, 0, 200), (1, 200, 0), (1, 180, 20)]);

        let config = TrainingConfig::new().learning_rate(0.1).iterations(100);
        let report = run(&train, &test, &config).unwrap();

        assert_eq!(report.loss_history.len(), 100);
        assert!(report.loss_history[99] < report.loss_history[0]);
        assert_eq!(report.weights.len(), 2);
        assert!(report.test_loss.is_finite());
        assert_eq!(report.train_confusion.counts(), [[3, 0], [0, 2]]);
        assert_eq!(report.test_confusion.counts(), [[2, 0], [0, 1]]);

        fs::remove_file(train).unwrap();
        fs::remove_file(test).unwrap();
    }

    #[test]
    fn test_testing_line() {
        assert_eq!(testing_line(0.6931), "testing : [loss : 0.693]");
        assert_eq!(testing_line(250.0), "testing : [loss : 2.5e+02]");
    }

    #[test]
    fn test_run_rejects_config_before_loading() {
        let config = TrainingConfig::new().labels(4, 4);
        let result = run("missing_train.csv", "missing_test.csv", &config);
        assert!(matches!(result, Err(ClassifierError::InvalidConfig(_))));
    }

    #[test]
    fn test_run_missing_file() {
        let result = run("missing_train.csv", "missing_test.csv", &TrainingConfig::new());
        assert!(matches!(result, Err(ClassifierError::Io(_))));
    }

    #[test]
    fn test_run_reports_empty_class() {
        let train = write_table("only_ones", &[(1, 255, 0), (1, 200, 0)]);
        let result = run(&train, &train, &TrainingConfig::new());
        assert!(matches!(result, Err(ClassifierError::EmptyClass { label: 2 })));
        fs::remove_file(train).unwrap();
    }

    #[test]
    fn test_feature_count_mismatch() {
        let train =
            Dataset::new(array![[0.0, 1.0], [1.0, 0.0]], array![0.0, 1.0], vec![1, 2]).unwrap();
        let test = Dataset::new(array![[0.0], [1.0]], array![0.0, 1.0], vec![1, 2]).unwrap();
        let result = train_and_evaluate(&train, &test, &TrainingConfig::new());
        assert!(matches!(result, Err(ClassifierError::ShapeMismatch { .. })));
    }
}
