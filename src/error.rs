use std::fmt;

/// All errors that can occur while loading data, training or rendering diagnostics.
#[derive(Debug)]
pub enum ClassifierError {
    /// File could not be opened, read or written.
    Io(std::io::Error),
    /// CSV reading/writing failure (ragged rows, bad quoting, ...).
    Csv(csv::Error),
    /// The table header has no column with the expected label name.
    MissingLabelColumn(String),
    /// The table has a label column and nothing else.
    NoFeatureColumns,
    /// A cell could not be parsed. `row` is 1-based and excludes the header.
    Parse {
        row: usize,
        column: String,
        value: String,
    },
    /// A requested class label matched zero rows.
    EmptyClass { label: i64 },
    /// Hyperparameters or label selection rejected before any computation.
    InvalidConfig(String),
    /// A label that should be binary was neither 0 nor 1.
    InvalidLabel { value: f64 },
    /// Shape or dimensionality mismatch
    ShapeMismatch { expected: String, got: String },
    /// Model used before calling `fit`
    NotFitted,
    /// Numerical failure inside the discriminant projection.
    Decomposition(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Csv(e) => write!(f, "csv error: {e}"),
            Self::MissingLabelColumn(name) => write!(f, "missing label column '{name}'"),
            Self::NoFeatureColumns => write!(f, "table has no feature columns"),
            Self::Parse { row, column, value } => {
                write!(f, "row {row}, column '{column}': cannot parse '{value}'")
            }
            Self::EmptyClass { label } => write!(f, "no rows found for label {label}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::InvalidLabel { value } => write!(f, "label {value} is not binary (0 or 1)"),
            Self::ShapeMismatch { expected, got } => {
                write!(f, "shape mismatch: expected {expected}, got {got}")
            }
            Self::NotFitted => write!(f, "model not fitted, call fit() first"),
            Self::Decomposition(msg) => write!(f, "decomposition failed: {msg}"),
        }
    }
}

impl std::error::Error for ClassifierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClassifierError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for ClassifierError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
