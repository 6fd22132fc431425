//! Factorizations and linear solves.

use log::debug;
use nalgebra::{Cholesky, DMatrix, DVector, Dyn, LU, PermutationSequence};

use super::{Element, Factorization, Matrix};
use crate::error::{RabinError, Result};

/// True if the leading `order × order` block has a Cholesky factor.
fn leading_minor_is_positive<T: Element>(data: &DMatrix<T>, order: usize) -> bool {
    let block = data.view((0, 0), (order, order)).clone_owned();
    Cholesky::new(block).is_some()
}

/// Rebuild a permutation from the arrangement it produces on `0..n`.
pub(super) fn permutation_from_arrangement(arrangement: &[usize]) -> Result<PermutationSequence<Dyn>> {
    let n = arrangement.len();
    let mut seen = vec![false; n];
    for &i in arrangement {
        if i >= n || seen[i] {
            return Err(RabinError::record(format!("{:?} is not a permutation", arrangement)));
        }
        seen[i] = true;
    }

    let mut permutation = PermutationSequence::identity_generic(Dyn(n));
    let mut current: Vec<usize> = (0..n).collect();
    for i in 0..n {
        let j = (i..n).find(|&j| current[j] == arrangement[i]).unwrap_or(i);
        if j != i {
            current.swap(i, j);
            permutation.append_permutation(i, j);
        }
    }
    Ok(permutation)
}

/// Arrangement of `0..n` after applying `permutation`.
pub(super) fn arrangement_of(permutation: &PermutationSequence<Dyn>, n: usize) -> Vec<usize> {
    let mut indices = DVector::<f64>::from_iterator(n, (0..n).map(|i| i as f64));
    permutation.permute_rows(&mut indices);
    indices.iter().map(|&i| i as usize).collect()
}

impl<T: Element> Matrix<T> {
    /// Check that the matrix is Hermitian positive definite.
    ///
    /// On failure the error names the order of the first leading minor that
    /// is not positive definite. With `overwrite`, success replaces the buffer
    /// by the lower Cholesky factor.
    pub fn test_positive_definite(&mut self, overwrite: bool) -> Result<()> {
        self.require_original("original")?;
        if !self.test_symmetry() {
            return Err(RabinError::NotSymmetric);
        }

        match Cholesky::new(self.data.clone()) {
            Some(cholesky) => {
                if overwrite {
                    self.data = cholesky.unpack();
                    self.factorization = Factorization::Cholesky;
                }
                Ok(())
            }
            None => {
                // leading minors fail monotonically, so bisect for the first
                let (mut good, mut bad) = (0, self.rows());
                while bad - good > 1 {
                    let mid = (good + bad) / 2;
                    if leading_minor_is_positive(&self.data, mid) {
                        good = mid;
                    } else {
                        bad = mid;
                    }
                }
                debug!("Cholesky failed at leading minor {} of {}", bad, self.rows());
                Err(RabinError::NotPositiveDefinite { order: bad })
            }
        }
    }

    /// Solve `A X = B` with a pivoted LU factorization.
    ///
    /// A buffer already holding an LU factorization is reused. With
    /// `overwrite_a`, a fresh factorization replaces the buffer.
    pub fn solve_general(&mut self, b: &Matrix<T>, overwrite_a: bool) -> Result<Matrix<T>> {
        if !self.is_square() || b.rows() != self.rows() {
            return Err(RabinError::dimensions(self.shape(), b.shape()));
        }
        b.require_original("original")?;

        if let Factorization::Lu(permutation) = &self.factorization {
            return Ok(Matrix::from_dmatrix(solve_packed_lu(&self.data, permutation, &b.data)?));
        }
        self.require_original("LU")?;

        let lu = LU::new(self.data.clone());
        let u = lu.u();
        if let Some(pivot) = (0..u.nrows()).find(|&i| u[(i, i)] == T::from_real(0.0)) {
            return Err(RabinError::SingularMatrix { pivot: pivot + 1 });
        }

        let mut x = b.data.clone();
        if !lu.solve_mut(&mut x) {
            return Err(RabinError::SingularMatrix { pivot: self.rows() });
        }

        if overwrite_a {
            let l = lu.l();
            let mut packed = u;
            for j in 0..packed.ncols() {
                for i in (j + 1)..packed.nrows() {
                    packed[(i, j)] = l[(i, j)];
                }
            }
            self.factorization = Factorization::Lu(lu.p().clone());
            self.data = packed;
        }

        Ok(Matrix::from_dmatrix(x))
    }

    /// Solve `A X = B` with the Cholesky factor already in the buffer.
    ///
    /// The factor is not re-validated; call
    /// [`test_positive_definite(true)`](Self::test_positive_definite) first.
    pub fn solve_positive_definite(&self, b: &Matrix<T>) -> Result<Matrix<T>> {
        if !matches!(self.factorization, Factorization::Cholesky) {
            return Err(RabinError::WrongFactorization {
                expected: "Cholesky",
                found: self.factorization.kind().name(),
            });
        }
        if b.rows() != self.rows() {
            return Err(RabinError::dimensions(self.shape(), b.shape()));
        }
        let cholesky = Cholesky::pack_dirty(self.data.clone());
        Ok(Matrix::from_dmatrix(cholesky.solve(&b.data)))
    }
}

fn solve_packed_lu<T: Element>(
    packed: &DMatrix<T>,
    permutation: &PermutationSequence<Dyn>,
    b: &DMatrix<T>,
) -> Result<DMatrix<T>> {
    let mut x = b.clone();
    permutation.permute_rows(&mut x);
    let solved = packed.solve_lower_triangular_with_diag_mut(&mut x, T::from_real(1.0))
        && packed.solve_upper_triangular_mut(&mut x);
    if !solved {
        let pivot = (0..packed.nrows())
            .find(|&i| packed[(i, i)] == T::from_real(0.0))
            .unwrap_or(0);
        return Err(RabinError::SingularMatrix { pivot: pivot + 1 });
    }
    Ok(x)
}
