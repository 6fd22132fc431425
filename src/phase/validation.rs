//! Background positive-definiteness check of the inductance matrix.

use std::fmt;
use std::thread::{self, JoinHandle};

use log::{error, info};

use crate::error::Result;
use crate::matrix::Matrix;

/// Outcome of the background Cholesky factorization.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationStatus {
    /// No matrix has been built yet
    NotStarted,
    /// The factorization is still running
    Pending,
    /// The matrix has a Cholesky factor
    PositiveDefinite,
    /// The factorization failed
    NotPositiveDefinite { diagnostic: String },
}

impl ValidationStatus {
    /// Check if the matrix was confirmed positive definite.
    pub fn is_positive_definite(&self) -> bool {
        matches!(self, ValidationStatus::PositiveDefinite)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::NotStarted => write!(f, "not started"),
            ValidationStatus::Pending => write!(f, "pending"),
            ValidationStatus::PositiveDefinite => write!(f, "positive definite"),
            ValidationStatus::NotPositiveDefinite { diagnostic } => {
                write!(f, "not positive definite ({})", diagnostic)
            }
        }
    }
}

/// A Cholesky factorization running on its own thread.
#[derive(Debug)]
pub(crate) struct BackgroundValidation {
    handle: Option<JoinHandle<Result<Matrix<f64>>>>,
    status: ValidationStatus,
    factor: Option<Matrix<f64>>,
}

impl BackgroundValidation {
    /// Nothing to validate.
    pub fn idle() -> Self {
        Self {
            handle: None,
            status: ValidationStatus::NotStarted,
            factor: None,
        }
    }

    /// Start factorizing a copy of `matrix`.
    pub fn spawn(matrix: Matrix<f64>) -> Self {
        let handle = thread::spawn(move || {
            let mut factor = matrix;
            factor.test_positive_definite(true).map(|()| factor)
        });
        Self {
            handle: Some(handle),
            status: ValidationStatus::Pending,
            factor: None,
        }
    }

    /// Collect the result if the thread has finished.
    pub fn poll(&mut self) -> &ValidationStatus {
        if self.handle.as_ref().is_some_and(JoinHandle::is_finished) {
            self.join();
        }
        &self.status
    }

    /// Block until the thread finishes.
    pub fn wait(&mut self) -> &ValidationStatus {
        self.join();
        &self.status
    }

    /// The Cholesky factor, once validation has succeeded.
    pub fn factor(&self) -> Option<&Matrix<f64>> {
        self.factor.as_ref()
    }

    fn join(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.status = match handle.join() {
            Ok(Ok(factor)) => {
                info!("Inductance matrix is positive definite");
                self.factor = Some(factor);
                ValidationStatus::PositiveDefinite
            }
            Ok(Err(err)) => {
                error!("Inductance matrix validation failed: {}", err);
                ValidationStatus::NotPositiveDefinite {
                    diagnostic: err.to_string(),
                }
            }
            Err(_) => {
                error!("Inductance matrix validation thread panicked");
                ValidationStatus::NotPositiveDefinite {
                    diagnostic: "validation thread panicked".to_string(),
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::FactorizationKind;

    #[test]
    fn test_idle() {
        let mut v = BackgroundValidation::idle();
        assert_eq!(v.poll(), &ValidationStatus::NotStarted);
        assert_eq!(v.wait(), &ValidationStatus::NotStarted);
        assert!(v.factor().is_none());
    }

    #[test]
    fn test_positive_definite_matrix() {
        let m = Matrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]).unwrap();
        let mut v = BackgroundValidation::spawn(m);
        assert!(v.wait().is_positive_definite());
        assert_eq!(v.factor().map(Matrix::factorization), Some(FactorizationKind::Cholesky));
    }

    #[test]
    fn test_indefinite_matrix() {
        let m = Matrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]).unwrap();
        let mut v = BackgroundValidation::spawn(m);
        match v.wait() {
            ValidationStatus::NotPositiveDefinite { diagnostic } => assert!(diagnostic.contains("order 2")),
            other => panic!("unexpected status {:?}", other),
        }
        assert!(v.factor().is_none());
    }
}
