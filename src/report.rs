//! Diagnostic output of a training run.
//!
//! Plotting itself happens outside the crate; a [`DiagnosticRenderer`]
//! receives the loss curve, the confusion matrices and LDA projections and
//! turns them into whatever the caller wants to look at.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use ndarray::{Axis, s};
use serde::Serialize;

use crate::dataset::class_ranges;
use crate::error::{ClassifierError, Result};
use crate::metrics::ConfusionMatrix;
use crate::{Matrix, Vector};

pub const TRAIN_TITLE: &str = "On training set";
pub const TEST_TITLE: &str = "On testing set";

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 60;

pub trait DiagnosticRenderer {
    /// One loss value per iteration, in order.
    fn loss_curve(&mut self, losses: &[f64]) -> Result<()>;

    fn confusion_heatmap(&mut self, matrix: &ConfusionMatrix, title: &str) -> Result<()>;

    /// Projected rows grouped into class blocks ending at `splits`.
    fn projection_scatter(&mut self, projection: &Matrix, splits: &[usize]) -> Result<()>;
}

/// Everything a training run produces.
#[derive(Clone, Debug)]
pub struct TrainingReport {
    pub loss_history: Vec<f64>,
    pub weights: Vector,
    pub test_loss: f64,
    pub train_confusion: ConfusionMatrix,
    pub test_confusion: ConfusionMatrix,
}

impl TrainingReport {
    pub fn render<R: DiagnosticRenderer + ?Sized>(&self, renderer: &mut R) -> Result<()> {
        renderer.loss_curve(&self.loss_history)?;
        renderer.confusion_heatmap(&self.train_confusion, TRAIN_TITLE)?;
        renderer.confusion_heatmap(&self.test_confusion, TEST_TITLE)
    }
}

/// Plain-text rendering to any writer.
pub struct ConsoleRenderer<W: Write> {
    out: W,
}

impl ConsoleRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticRenderer for ConsoleRenderer<W> {
    fn loss_curve(&mut self, losses: &[f64]) -> Result<()> {
        let (Some(first), Some(last)) = (losses.first(), losses.last()) else {
            writeln!(self.out, "loss curve: no iterations")?;
            return Ok(());
        };
        let min = losses.iter().copied().fold(f64::INFINITY, f64::min);

        writeln!(self.out, "loss curve ({} iterations)", losses.len())?;
        writeln!(self.out, "  {}", sparkline(losses))?;
        writeln!(
            self.out,
            "  first {}  last {}  min {}",
            format_loss(*first),
            format_loss(*last),
            format_loss(min)
        )?;
        Ok(())
    }

    fn confusion_heatmap(&mut self, matrix: &ConfusionMatrix, title: &str) -> Result<()> {
        writeln!(self.out, "{title}")?;
        write!(self.out, "{matrix}")?;
        if let Some(accuracy) = matrix.accuracy() {
            writeln!(self.out, "  accuracy {:.2}%", accuracy * 100.0)?;
        }
        Ok(())
    }

    fn projection_scatter(&mut self, projection: &Matrix, splits: &[usize]) -> Result<()> {
        writeln!(self.out, "projection ({} components)", projection.ncols())?;
        for (class, range) in class_ranges(splits).into_iter().enumerate() {
            let count = range.len();
            let block = projection.slice(s![range, ..]);
            match block.mean_axis(Axis(0)) {
                Some(centroid) => {
                    writeln!(self.out, "  class {class}: {count} points, centroid {centroid:.3}")?
                }
                None => writeln!(self.out, "  class {class}: no points")?,
            }
        }
        Ok(())
    }
}

/// Formats a loss with three significant digits, switching to exponent
/// notation below `1e-4` or from `100` upward so the fixed form never needs a
/// fourth digit. Fixed output keeps at least one decimal (`1.0`, `99.0`).
pub fn format_loss(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return format!("{value:.1}");
    }

    let scientific = format!("{value:.2e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..2).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    } else {
        let decimals = (2 - exponent) as usize;
        let mut fixed = trim_fraction(&format!("{value:.decimals$}")).to_string();
        if !fixed.contains('.') {
            fixed.push_str(".0");
        }
        fixed
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn sparkline(values: &[f64]) -> String {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let step = values.len().div_ceil(SPARK_WIDTH).max(1);

    values
        .iter()
        .step_by(step)
        .map(|&v| {
            if !span.is_finite() || span <= 0.0 {
                return SPARK_LEVELS[0];
            }
            let level = ((v - min) / span * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

#[derive(Serialize)]
struct LossRecord {
    iteration: usize,
    loss: f64,
}

#[derive(Serialize)]
struct ConfusionRecord {
    predicted: usize,
    actual_0: usize,
    actual_1: usize,
}

/// Writes each diagnostic as a CSV file under one directory, ready for an
/// external plotting tool.
pub struct CsvRenderer {
    out_dir: PathBuf,
}

impl CsvRenderer {
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;
        Ok(Self { out_dir })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl DiagnosticRenderer for CsvRenderer {
    fn loss_curve(&mut self, losses: &[f64]) -> Result<()> {
        let path = self.out_dir.join("loss_history.csv");
        let mut w = csv::Writer::from_path(&path)?;
        for (iteration, &loss) in losses.iter().enumerate() {
            w.serialize(LossRecord { iteration, loss })?;
        }
        w.flush()?;
        info!("wrote {}", path.display());
        Ok(())
    }

    fn confusion_heatmap(&mut self, matrix: &ConfusionMatrix, title: &str) -> Result<()> {
        let path = self.out_dir.join(format!("{}.csv", file_stem(title)));
        let mut w = csv::Writer::from_path(&path)?;
        for (predicted, row) in matrix.counts().iter().enumerate() {
            w.serialize(ConfusionRecord {
                predicted,
                actual_0: row[0],
                actual_1: row[1],
            })?;
        }
        w.flush()?;
        info!("wrote {}", path.display());
        Ok(())
    }

    fn projection_scatter(&mut self, projection: &Matrix, splits: &[usize]) -> Result<()> {
        if splits.last().copied().unwrap_or(0) != projection.nrows() {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("splits ending at {}", projection.nrows()),
                got: format!("{splits:?}"),
            });
        }

        let path = self.out_dir.join("projection.csv");
        let mut w = csv::Writer::from_path(&path)?;

        let mut header = vec!["class".to_string()];
        header.extend((0..projection.ncols()).map(|c| format!("component_{c}")));
        w.write_record(&header)?;

        for (class, range) in class_ranges(splits).into_iter().enumerate() {
            for row in projection.slice(s![range, ..]).rows() {
                let mut record = vec![class.to_string()];
                record.extend(row.iter().map(|v| v.to_string()));
                w.write_record(&record)?;
            }
        }
        w.flush()?;
        info!("wrote {}", path.display());
        Ok(())
    }
}

/// "On training set" -> "on_training_set"
fn file_stem(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
