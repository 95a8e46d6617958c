use log::{debug, warn};
use ndarray::{Array1, ArrayView2, Axis, s};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::dataset::{Dataset, class_ranges};
use crate::error::{ClassifierError, Result};
use crate::{Matrix, Vector};

#[derive(Clone, Debug)]
pub struct FisherLDA {
    /// Discriminant directions, one per column (`n_features × n_components`).
    pub components: Option<Matrix>,
    /// Generalized eigenvalues matching `components`, largest first.
    pub eigenvalues: Option<Vector>,
    n_components: usize,
    regularization: f64,
    max_iterations: usize,
    tolerance: f64,
    seed: u64,
}

impl FisherLDA {
    pub fn new() -> Self {
        Self {
            components: None,
            eigenvalues: None,
            n_components: 2,
            regularization: 1e-6,
            max_iterations: 1000,
            tolerance: 1e-10,
            seed: 0,
        }
    }

    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }

    /// Ridge added to the within-class scatter diagonal so constant pixels
    /// do not make it singular.
    pub fn regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    /// Cap on power-iteration steps per component.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Seed for the power-iteration start vectors.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&mut self, dataset: &Dataset) -> Result<()> {
        self.fit_blocks(&dataset.features, &dataset.splits)
    }

    /// Fits on `x` whose rows are grouped in class blocks ending at `splits`.
    pub fn fit_blocks(&mut self, x: &Matrix, splits: &[usize]) -> Result<()> {
        let n_classes = splits.len();
        if n_classes < 2 {
            return Err(ClassifierError::InvalidConfig(
                "LDA requires at least 2 classes".to_string(),
            ));
        }
        if self.n_components == 0 {
            return Err(ClassifierError::InvalidConfig(
                "number of components must be positive".to_string(),
            ));
        }
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(ClassifierError::InvalidConfig(format!(
                "regularization must be non-negative, got {}",
                self.regularization
            )));
        }
        let ranges = class_ranges(splits);
        if ranges.iter().any(|r| r.is_empty()) || splits[n_classes - 1] != x.nrows() {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("non-empty class blocks covering {} rows", x.nrows()),
                got: format!("{splits:?}"),
            });
        }

        let n_features = x.ncols();
        let max_components = (n_classes - 1).min(n_features);
        let n_components = if self.n_components > max_components {
            warn!(
                "requested {} components, only {max_components} available for {n_classes} classes",
                self.n_components
            );
            max_components
        } else {
            self.n_components
        };

        // total scatter
        let overall_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ClassifierError::Decomposition("empty input".to_string()))?;
        let centered = x - &overall_mean;
        let st = centered.t().dot(&centered);

        // within-class scatter
        let mut sw = Matrix::zeros((n_features, n_features));
        for range in ranges {
            let block = x.slice(s![range, ..]);
            let class_mean = block
                .mean_axis(Axis(0))
                .ok_or_else(|| ClassifierError::Decomposition("empty class block".to_string()))?;
            let centered = &block - &class_mean;
            sw += &centered.t().dot(&centered);
        }

        let sb = &st - &sw;
        for i in 0..n_features {
            sw[[i, i]] += self.regularization;
        }

        // Sb v = λ Sw v  <=>  (L⁻¹ Sb L⁻ᵀ) u = λ u  with  v = L⁻ᵀ u
        let l = cholesky(&sw)?;
        let l_inv = lower_triangular_inverse(&l);
        let reduced = l_inv.dot(&sb).dot(&l_inv.t());
        let reduced = (&reduced + &reduced.t()) * 0.5;

        let (eigenvalues, vectors) = self.top_eigenpairs(&reduced, n_components);
        debug!("LDA eigenvalues: {eigenvalues}");

        self.components = Some(l_inv.t().dot(&vectors));
        self.eigenvalues = Some(eigenvalues);
        Ok(())
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let components = self.components.as_ref().ok_or(ClassifierError::NotFitted)?;

        if x.ncols() != components.nrows() {
            return Err(ClassifierError::ShapeMismatch {
                expected: format!("{} features", components.nrows()),
                got: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(components))
    }

    pub fn fit_transform(&mut self, dataset: &Dataset) -> Result<Matrix> {
        self.fit(dataset)?;
        self.transform(&dataset.features)
    }

    /// Leading eigenpairs of a symmetric positive semi-definite matrix by
    /// power iteration, deflating against the vectors already found.
    fn top_eigenpairs(&self, matrix: &Matrix, k: usize) -> (Vector, Matrix) {
        let n = matrix.nrows();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut eigenvalues = Vector::zeros(k);
        let mut eigenvectors = Matrix::zeros((n, k));

        for i in 0..k {
            let start: Vector = Array1::random_using(n, Uniform::new(-1.0, 1.0), &mut rng);
            let (v, converged) =
                self.power_iteration(matrix, start, eigenvectors.slice(s![.., ..i]));
            if !converged {
                warn!(
                    "component {i} did not converge within {} power iterations",
                    self.max_iterations
                );
            }

            eigenvalues[i] = v.dot(&matrix.dot(&v));
            eigenvectors.column_mut(i).assign(&v);
        }

        (eigenvalues, eigenvectors)
    }

    /// Dominant unit eigenvector of `matrix` restricted to the complement of
    /// `basis`. The flag is `false` when `max_iterations` ran out first.
    fn power_iteration(
        &self,
        matrix: &Matrix,
        mut v: Vector,
        basis: ArrayView2<f64>,
    ) -> (Vector, bool) {
        orthogonalize(&mut v, basis);
        normalize(&mut v);

        for _ in 0..self.max_iterations {
            let mut next = matrix.dot(&v);
            orthogonalize(&mut next, basis);
            if !normalize(&mut next) {
                // nothing left outside the basis: eigenvalue 0
                return (v, true);
            }

            let delta = (&next - &v).fold(0.0_f64, |acc, d| acc.max(d.abs()));
            v = next;
            if delta < self.tolerance {
                return (v, true);
            }
        }

        (v, false)
    }
}

impl Default for FisherLDA {
    fn default() -> Self {
        Self::new()
    }
}

fn orthogonalize(v: &mut Vector, basis: ArrayView2<f64>) {
    for column in basis.columns() {
        let projection = column.dot(&*v);
        v.scaled_add(-projection, &column);
    }
}

/// Scales `v` to unit length. Returns `false` when `v` is numerically zero.
fn normalize(v: &mut Vector) -> bool {
    let norm = v.dot(&*v).sqrt();
    if norm < 1e-12 {
        return false;
    }
    *v /= norm;
    true
}

fn cholesky(a: &Matrix) -> Result<Matrix> {
    let n = a.nrows();
    let mut l = Matrix::zeros((n, n));

    for j in 0..n {
        let row_j = l.slice(s![j, ..j]);
        let diag = a[[j, j]] - row_j.dot(&row_j);
        if diag.is_nan() || diag <= 0.0 {
            return Err(ClassifierError::Decomposition(format!(
                "within-class scatter is not positive definite (pivot {j})"
            )));
        }
        let pivot = diag.sqrt();
        l[[j, j]] = pivot;

        for i in (j + 1)..n {
            let dot = l.slice(s![i, ..j]).dot(&l.slice(s![j, ..j]));
            l[[i, j]] = (a[[i, j]] - dot) / pivot;
        }
    }

    Ok(l)
}

fn lower_triangular_inverse(l: &Matrix) -> Matrix {
    let n = l.nrows();
    let mut inv = Matrix::zeros((n, n));

    for col in 0..n {
        inv[[col, col]] = 1.0 / l[[col, col]];
        for i in (col + 1)..n {
            let dot = l.slice(s![i, col..i]).dot(&inv.slice(s![col..i, col]));
            inv[[i, col]] = -dot / l[[i, i]];
        }
    }

    inv
}
