//! Binary logistic regression trained by full-batch gradient descent.
//!
//! The free functions are the numeric building blocks: [`sigmoid`],
//! [`predict_proba`], [`cross_entropy`] and [`gradient`]. The
//! [`LogisticRegression`] model drives them for a fixed number of iterations
//! and keeps the per-iteration training loss.
//!
//! # Examples
//!
//! ```rust
//! use digit_classifier::LogisticRegression;
//! use ndarray::array;
//!
//! let x = array![[1.0, 2.0], [2.0, 1.0], [-1.0, -2.0], [-2.0, -1.0]];
//! let y = array![1.0, 1.0, 0.0, 0.0];
//!
//! let mut model = LogisticRegression::with_params(0.1, 50);
//! model.fit(&x, &y).unwrap();
//! let predictions = model.predict(&x).unwrap();
//! assert_eq!(predictions, y);
//! ```

mod logistic_regression;

pub use logistic_regression::{
    LogisticRegression, cross_entropy, gradient, iteration_line, predict_proba, sigmoid,
};
