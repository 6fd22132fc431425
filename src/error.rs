//! Error types for the Rabin inductance engine.
//!
//! This module provides a unified error type [`RabinError`] that covers
//! all error conditions that can occur while building winding geometry,
//! evaluating the harmonic series, and factoring the inductance matrix.

use thiserror::Error;

/// Result type alias using [`RabinError`].
pub type Result<T> = std::result::Result<T, RabinError>;

/// Unified error type for all Rabin operations.
#[derive(Error, Debug)]
pub enum RabinError {
    // ============ Geometry Errors ============
    /// Invalid core, coil, or section dimensions
    #[error("Invalid geometry for {item}: {message}")]
    InvalidGeometry { item: String, message: String },

    /// Window-height multiplier outside the usable range
    #[error("Window height multiplier {multiplier} must be greater than 1.0")]
    InvalidWindowMultiplier { multiplier: f64 },

    /// Section used in an inductance formula without an owning coil
    #[error("Section {section} has no parent coil")]
    MissingParent { section: usize },

    /// Section attached to a different coil than the one supplied
    #[error("Section {section} does not belong to coil {coil}")]
    ParentMismatch { section: usize, coil: usize },

    /// Section harmonics requested before the section was attached to a coil
    #[error("Harmonics for section {section} have not been initialized")]
    HarmonicsNotInitialized { section: usize },

    /// Section id not present in the phase
    #[error("Section {section} not found")]
    SectionNotFound { section: usize },

    /// Coil id not present in the phase
    #[error("Coil {coil} not found")]
    CoilNotFound { coil: usize },

    /// Two coils share part of their radial build
    #[error("Coils '{first}' and '{second}' overlap radially")]
    OverlappingCoils { first: String, second: String },

    // ============ Numerical Errors ============
    /// Adaptive quadrature did not reach its tolerance
    #[error("Quadrature for {integrand} at x = {x:.6e} did not converge after {subdivisions} subdivisions (error estimate: {error:.2e})")]
    QuadratureFailed {
        integrand: &'static str,
        x: f64,
        subdivisions: usize,
        error: f64,
    },

    /// A scaled-number reduction produced NaN or infinity
    #[error("Precision loss while reducing a scaled number ({context})")]
    PrecisionLoss { context: String },

    /// Invalid calculation parameter
    #[error("Invalid calculation parameter: {message}")]
    InvalidSettings { message: String },

    // ============ Linear Algebra Errors ============
    /// Matrix shapes incompatible for the requested operation
    #[error("Dimension mismatch: {left_rows}x{left_cols} and {right_rows}x{right_cols}")]
    DimensionMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    /// Element subscript outside the matrix
    #[error("Subscript ({row}, {column}) out of bounds for {rows}x{columns} matrix")]
    IndexOutOfBounds {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    /// Cholesky factorization failed
    #[error("The leading minor of order {order} is not positive definite")]
    NotPositiveDefinite { order: usize },

    /// Matrix is not symmetric (or Hermitian for complex elements)
    #[error("Matrix is not symmetric")]
    NotSymmetric,

    /// LU factorization hit a zero pivot
    #[error("Matrix is singular: U({pivot},{pivot}) is exactly zero")]
    SingularMatrix { pivot: usize },

    /// Solve requested with the wrong factorization in the buffer
    #[error("Matrix holds {found} data, {expected} factorization required")]
    WrongFactorization {
        expected: &'static str,
        found: &'static str,
    },

    /// Inductance matrix requested for a phase without sections
    #[error("Phase has no sections")]
    EmptyPhase,

    /// Persisted matrix record is inconsistent
    #[error("Invalid matrix record: {message}")]
    InvalidMatrixRecord { message: String },

    // ============ Design Input Errors ============
    /// Design file could not be interpreted
    #[error("Design error: {message}")]
    Design { message: String },

    /// TOML syntax or schema error
    #[error("Failed to parse design file: {0}")]
    DesignParse(#[from] toml::de::Error),

    /// Matrix persistence error
    #[error("Matrix encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    // ============ I/O Errors ============
    /// Error reading or writing a file
    #[error("Failed to access '{path}': {source}")]
    FileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RabinError {
    /// Create an invalid geometry error
    pub fn geometry(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            item: item.into(),
            message: message.into(),
        }
    }

    /// Create a design-input error
    pub fn design(message: impl Into<String>) -> Self {
        Self::Design {
            message: message.into(),
        }
    }

    /// Create a precision-loss error
    pub fn precision(context: impl Into<String>) -> Self {
        Self::PrecisionLoss {
            context: context.into(),
        }
    }

    /// Create an invalid settings error
    pub fn settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }

    /// Create an invalid matrix record error
    pub fn record(message: impl Into<String>) -> Self {
        Self::InvalidMatrixRecord {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error from two shapes
    pub fn dimensions(left: (usize, usize), right: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            left_rows: left.0,
            left_cols: left.1,
            right_rows: right.0,
            right_cols: right.1,
        }
    }
}
