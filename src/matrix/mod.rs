//! Dense matrices over `f64` and `Complex64`.
//!
//! [`Matrix`] wraps a nalgebra `DMatrix` and remembers whether its buffer
//! still holds the original values or has been overwritten by a
//! factorization. Factorizing in place is opt-in (`overwrite` flags) and the
//! caller must keep track of which form it holds; operations that need the
//! original values refuse a factorized buffer.

mod persist;
mod solve;

use std::fmt;

use nalgebra::{ComplexField, DMatrix, Dyn, PermutationSequence};
use num_complex::Complex64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{RabinError, Result};

pub use persist::MatrixRecord;

/// Scalar kind of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Real,
    Complex,
}

/// Element types a [`Matrix`] can hold.
pub trait Element: ComplexField<RealField = f64> + Copy + Serialize + DeserializeOwned {
    /// Kind tag used in persisted records.
    const KIND: ElementKind;

    /// Fixed-width cell for [`Matrix`]'s `Display`.
    fn format_cell(&self) -> String;
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Real;

    fn format_cell(&self) -> String {
        format!(" {:6.3}", self)
    }
}

impl Element for Complex64 {
    const KIND: ElementKind = ElementKind::Complex;

    fn format_cell(&self) -> String {
        format!(" {:5.3}I{:5.3}", self.re, self.im)
    }
}

/// What the buffer currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorizationKind {
    /// Original values
    None,
    /// Lower-triangular Cholesky factor `L` with `A = L Lᴴ`
    Cholesky,
    /// Packed `L\U` with a row permutation
    Lu,
}

impl FactorizationKind {
    fn name(self) -> &'static str {
        match self {
            FactorizationKind::None => "original",
            FactorizationKind::Cholesky => "Cholesky",
            FactorizationKind::Lu => "LU",
        }
    }
}

#[derive(Debug, Clone)]
enum Factorization {
    None,
    Cholesky,
    Lu(PermutationSequence<Dyn>),
}

impl Factorization {
    fn kind(&self) -> FactorizationKind {
        match self {
            Factorization::None => FactorizationKind::None,
            Factorization::Cholesky => FactorizationKind::Cholesky,
            Factorization::Lu(_) => FactorizationKind::Lu,
        }
    }
}

/// Dense matrix with an explicit factorization state.
#[derive(Debug, Clone)]
pub struct Matrix<T: Element> {
    data: DMatrix<T>,
    factorization: Factorization,
}

impl<T: Element> Matrix<T> {
    /// Zero matrix of the given shape.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self::from_dmatrix(DMatrix::zeros(rows, columns))
    }

    /// The 0×0 matrix.
    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    /// Identity matrix.
    pub fn identity(order: usize) -> Self {
        Self::from_dmatrix(DMatrix::identity(order, order))
    }

    /// Build from row-major values.
    pub fn from_row_slice(rows: usize, columns: usize, values: &[T]) -> Result<Self> {
        if values.len() != rows * columns {
            return Err(RabinError::dimensions((rows, columns), (values.len(), 1)));
        }
        Ok(Self::from_dmatrix(DMatrix::from_row_slice(rows, columns, values)))
    }

    /// Wrap an existing nalgebra matrix.
    pub fn from_dmatrix(data: DMatrix<T>) -> Self {
        Self {
            data,
            factorization: Factorization::None,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Check if the matrix has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if the matrix is square.
    pub fn is_square(&self) -> bool {
        self.data.is_square()
    }

    /// Scalar kind.
    pub fn kind(&self) -> ElementKind {
        T::KIND
    }

    /// What the buffer holds.
    pub fn factorization(&self) -> FactorizationKind {
        self.factorization.kind()
    }

    /// Underlying storage.
    pub fn as_dmatrix(&self) -> &DMatrix<T> {
        &self.data
    }

    fn check_bounds(&self, row: usize, column: usize) -> Result<()> {
        if row >= self.rows() || column >= self.columns() {
            return Err(RabinError::IndexOutOfBounds {
                row,
                column,
                rows: self.rows(),
                columns: self.columns(),
            });
        }
        Ok(())
    }

    fn require_original(&self, expected: &'static str) -> Result<()> {
        match self.factorization {
            Factorization::None => Ok(()),
            _ => Err(RabinError::WrongFactorization {
                expected,
                found: self.factorization.kind().name(),
            }),
        }
    }

    /// Element at `(row, column)`.
    pub fn get(&self, row: usize, column: usize) -> Result<T> {
        self.check_bounds(row, column)?;
        Ok(self.data[(row, column)])
    }

    /// Set element at `(row, column)`.
    pub fn set(&mut self, row: usize, column: usize, value: T) -> Result<()> {
        self.check_bounds(row, column)?;
        self.data[(row, column)] = value;
        Ok(())
    }

    /// Set `(row, column)` and `(column, row)`.
    ///
    /// The transposed entry gets the conjugate, so real matrices stay
    /// exactly symmetric and complex ones exactly Hermitian.
    pub fn set_symmetric(&mut self, row: usize, column: usize, value: T) -> Result<()> {
        self.check_bounds(row, column)?;
        self.check_bounds(column, row)?;
        self.data[(row, column)] = value;
        self.data[(column, row)] = value.conjugate();
        Ok(())
    }

    /// Sum of all elements in the given rows and columns.
    pub fn block_sum(&self, rows: &[usize], columns: &[usize]) -> Result<T> {
        let mut sum = T::from_real(0.0);
        for &i in rows {
            for &j in columns {
                sum += self.get(i, j)?;
            }
        }
        Ok(sum)
    }

    /// `scalar · self`.
    pub fn scale(&self, scalar: T) -> Result<Matrix<T>> {
        self.require_original("original")?;
        Ok(Self::from_dmatrix(&self.data * scalar))
    }

    /// `self · other`.
    pub fn multiply(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        self.require_original("original")?;
        other.require_original("original")?;
        if self.columns() != other.rows() {
            return Err(RabinError::dimensions(self.shape(), other.shape()));
        }
        Ok(Self::from_dmatrix(&self.data * &other.data))
    }

    /// Exact test of `A[i,j] == conj(A[j,i])` for every pair.
    pub fn test_symmetry(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.rows();
        (0..n).all(|i| (i..n).all(|j| self.data[(i, j)] == self.data[(j, i)].conjugate()))
    }
}

impl<T: Element> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.factorization() == other.factorization() && self.data == other.data
    }
}

impl<T: Element> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows() {
            write!(f, "|")?;
            for j in 0..self.columns() {
                write!(f, "{}", self.data[(i, j)].format_cell())?;
            }
            writeln!(f, " |")?;
        }
        Ok(())
    }
}
