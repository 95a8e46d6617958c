use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::Path;

use log::{debug, info};
use ndarray::{Array2, Axis};

use crate::error::{ClassifierError, Result};
use crate::{Matrix, Vector};

/// Name of the column holding the digit class.
pub const LABEL_COLUMN: &str = "label";
/// Raw pixel intensities are divided by this to land in `[0, 1]`.
pub const PIXEL_SCALE: f64 = 255.0;

/// A parsed image table: one class label and one row of raw pixel
/// intensities per sample, in file order.
#[derive(Clone, Debug)]
pub struct LabeledTable {
    pub labels: Vec<i64>,
    pub pixels: Array2<u8>,
}

impl LabeledTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Reads a headed CSV table. The label column is located by name and may
    /// sit anywhere; every other column is a pixel column.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let label_idx = headers
            .iter()
            .position(|name| name == LABEL_COLUMN)
            .ok_or_else(|| ClassifierError::MissingLabelColumn(LABEL_COLUMN.to_string()))?;
        let n_features = headers.len() - 1;
        if n_features == 0 {
            return Err(ClassifierError::NoFeatureColumns);
        }

        let mut labels = Vec::new();
        let mut pixels = Vec::new();

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let parse_error = |col: usize, value: &str| ClassifierError::Parse {
                row: row + 1,
                column: headers.get(col).unwrap_or_default().to_string(),
                value: value.to_string(),
            };

            for (col, field) in record.iter().enumerate() {
                if col == label_idx {
                    let label = field.parse::<i64>().map_err(|_| parse_error(col, field))?;
                    labels.push(label);
                } else {
                    let pixel = field.parse::<u8>().map_err(|_| parse_error(col, field))?;
                    pixels.push(pixel);
                }
            }
        }

        let n_samples = labels.len();
        let pixels = Array2::from_shape_vec((n_samples, n_features), pixels).map_err(|e| {
            ClassifierError::ShapeMismatch {
                expected: format!("{n_samples} x {n_features} pixels"),
                got: e.to_string(),
            }
        })?;

        Ok(Self { labels, pixels })
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.pixels.ncols()
    }

    /// Builds a normalized dataset from the rows matching `classes`.
    ///
    /// Rows are grouped into contiguous blocks, one per class in the order
    /// given, and each row is labelled with the position of its class in
    /// `classes`. The running row count after each block is recorded in
    /// `splits`.
    pub fn select_classes(&self, classes: &[i64]) -> Result<Dataset> {
        if classes.is_empty() {
            return Err(ClassifierError::InvalidConfig(
                "at least one class label must be requested".to_string(),
            ));
        }
        for (i, class) in classes.iter().enumerate() {
            if classes[..i].contains(class) {
                return Err(ClassifierError::InvalidConfig(format!(
                    "label {class} requested more than once"
                )));
            }
        }

        let n_features = self.n_features();
        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut splits = Vec::with_capacity(classes.len());

        for (index, &class) in classes.iter().enumerate() {
            let rows: Vec<usize> = self
                .labels
                .iter()
                .enumerate()
                .filter(|&(_, &label)| label == class)
                .map(|(row, _)| row)
                .collect();
            if rows.is_empty() {
                return Err(ClassifierError::EmptyClass { label: class });
            }
            debug!("label {class}: {} rows -> class {index}", rows.len());

            let block = self.pixels.select(Axis(0), &rows);
            features.extend(block.iter().map(|&pixel| f64::from(pixel)));
            labels.extend(std::iter::repeat_n(index as f64, rows.len()));
            splits.push(labels.len());
        }

        let n_samples = labels.len();
        let mut features = Matrix::from_shape_vec((n_samples, n_features), features).map_err(
            |e| ClassifierError::ShapeMismatch {
                expected: format!("{n_samples} x {n_features} features"),
                got: e.to_string(),
            },
        )?;
        features.mapv_inplace(|v| v / PIXEL_SCALE);

        Dataset::new(features, Vector::from(labels), splits)
    }
}

/// Loads `path` and selects `classes` from it.
pub fn load_dataset<P: AsRef<Path>>(path: P, classes: &[i64]) -> Result<Dataset> {
    let path = path.as_ref();
    info!("loading data from {} ...", path.display());
    let table = LabeledTable::from_path(path)?;
    let dataset = table.select_classes(classes)?;
    info!(
        "finish loading: {} of {} rows, {} features, splits {:?}",
        dataset.n_samples(),
        table.n_samples(),
        dataset.n_features(),
        dataset.splits
    );
    Ok(dataset)
}

#[derive(Clone, Debug)]
pub struct Dataset {
    pub features: Matrix,
    pub labels: Vector,
    /// Cumulative row counts marking the end of each class block.
    pub splits: Vec<usize>,
}

impl Dataset {
    pub fn new(features: Matrix, labels: Vector, splits: Vec<usize>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("{} labels", features.nrows()),
                got: format!("{} labels", labels.len()),
            });
        }
        if splits.windows(2).any(|w| w[0] >= w[1])
            || splits.last().copied().unwrap_or(0) != features.nrows()
        {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("increasing splits ending at {}", features.nrows()),
                got: format!("{splits:?}"),
            });
        }

        Ok(Self {
            features,
            labels,
            splits,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.splits.len()
    }

    /// Row range of each class block.
    pub fn class_ranges(&self) -> Vec<Range<usize>> {
        class_ranges(&self.splits)
    }
}

pub(crate) fn class_ranges(splits: &[usize]) -> Vec<Range<usize>> {
    let mut begin = 0;
    splits
        .iter()
        .map(|&end| {
            let range = begin..end;
            begin = end;
            range
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const PIXELS: usize = 784;

    fn digits_csv(rows: &[(i64, u8)]) -> String {
        let mut text = String::from(LABEL_COLUMN);
        for i in 0..PIXELS {
            text.push_str(&format!(",pixel{i}"));
        }
        text.push('\n');
        for &(label, first_pixel) in rows {
            text.push_str(&format!("{label},{first_pixel}"));
            for _ in 1..PIXELS {
                text.push_str(",0");
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_select_two_classes() {
        let csv = digits_csv(&[(1, 255), (2, 51), (1, 255), (7, 9), (2, 51), (1, 255)]);
        let table = LabeledTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.n_samples(), 6);

        let dataset = table.select_classes(&[1, 2]).unwrap();
        assert_eq!(dataset.features.shape(), &[5, PIXELS]);
        assert_eq!(dataset.splits, vec![3, 5]);
        assert_eq!(dataset.labels, array![0.0, 0.0, 0.0, 1.0, 1.0]);
        assert_eq!(dataset.features[[0, 0]], 1.0);
        assert!((dataset.features[[3, 0]] - 0.2).abs() < 1e-12);
        assert!(dataset.features.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_blocks_follow_requested_order() {
        let csv = digits_csv(&[(1, 10), (2, 20), (2, 20)]);
        let table = LabeledTable::from_reader(csv.as_bytes()).unwrap();

        let dataset = table.select_classes(&[2, 1]).unwrap();
        assert_eq!(dataset.splits, vec![2, 3]);
        assert_eq!(dataset.labels, array![0.0, 0.0, 1.0]);
        assert_eq!(dataset.features[[0, 0]], 20.0 / 255.0);
        assert_eq!(dataset.class_ranges(), vec![0..2, 2..3]);
    }

    #[test]
    fn test_non_consecutive_labels_stay_binary() {
        let csv = digits_csv(&[(1, 0), (3, 0), (3, 0)]);
        let table = LabeledTable::from_reader(csv.as_bytes()).unwrap();

        let dataset = table.select_classes(&[1, 3]).unwrap();
        assert_eq!(dataset.labels, array![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_label_column_anywhere() {
        let csv = "p0,label,p1\n255,4,0\n0,5,255\n";
        let table = LabeledTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.labels, vec![4, 5]);
        assert_eq!(table.pixels, array![[255u8, 0], [0, 255]]);
    }

    #[test]
    fn test_missing_label_column() {
        let csv = "digit,p0\n1,0\n";
        let result = LabeledTable::from_reader(csv.as_bytes());
        assert!(matches!(result, Err(ClassifierError::MissingLabelColumn(_))));
    }

    #[test]
    fn test_empty_class_is_reported() {
        let csv = digits_csv(&[(1, 0), (1, 0)]);
        let table = LabeledTable::from_reader(csv.as_bytes()).unwrap();
        let result = table.select_classes(&[1, 9]);
        assert!(matches!(result, Err(ClassifierError::EmptyClass { label: 9 })));
    }

    #[test]
    fn test_duplicate_or_missing_selection() {
        let csv = digits_csv(&[(1, 0), (2, 0)]);
        let table = LabeledTable::from_reader(csv.as_bytes()).unwrap();
        assert!(table.select_classes(&[1, 1]).is_err());
        assert!(table.select_classes(&[]).is_err());
    }

    #[test]
    fn test_out_of_range_pixel() {
        let csv = "label,p0,p1\n1,12,256\n";
        match LabeledTable::from_reader(csv.as_bytes()) {
            Err(ClassifierError::Parse { row, column, value }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "p1");
                assert_eq!(value, "256");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_ragged_row() {
        let csv = "label,p0,p1\n1,12\n";
        let result = LabeledTable::from_reader(csv.as_bytes());
        assert!(matches!(result, Err(ClassifierError::Csv(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_dataset("definitely/not/here.csv", &[1, 2]);
        assert!(matches!(result, Err(ClassifierError::Io(_))));
    }

    #[test]
    fn test_dataset_creation() {
        let features = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let labels = array![0.0, 1.0, 1.0];

        let dataset = Dataset::new(features, labels, vec![1, 3]).unwrap();
        assert_eq!(dataset.n_samples(), 3);
        assert_eq!(dataset.n_features(), 2);
        assert_eq!(dataset.n_classes(), 2);
    }

    #[test]
    fn test_dataset_rejects_bad_splits() {
        let features = array![[1.0], [2.0]];
        let labels = array![0.0, 1.0];
        assert!(Dataset::new(features.clone(), labels.clone(), vec![1]).is_err());
        assert!(Dataset::new(features.clone(), labels.clone(), vec![2, 2]).is_err());
        assert!(Dataset::new(features, array![0.0], vec![2]).is_err());
    }
}
