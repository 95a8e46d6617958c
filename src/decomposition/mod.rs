//! Supervised projection of the image data for visualisation.
//!
//! - `FisherLDA`: Fisher's linear discriminant over the class blocks of a [`Dataset`]
//!
//! # Examples
//!
//! ```rust
//! use digit_classifier::{Dataset, FisherLDA};
//! use ndarray::array;
//!
//! let x = array![
//!     [1.0, 2.0],
//!     [2.0, 3.0],
//!     [3.0, 3.0],
//!     [8.0, 9.0],
//!     [9.0, 10.0],
//!     [10.0, 9.0]
//! ];
//! let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
//! let dataset = Dataset::new(x, y, vec![3, 6]).unwrap();
//!
//! let mut lda = FisherLDA::new();
//! let projection = lda.fit_transform(&dataset).unwrap();
//! assert_eq!(projection.shape(), &[6, 1]);
//! ```
//!
//! [`Dataset`]: crate::Dataset

mod lda;

pub use lda::FisherLDA;
