//! # Rabin Core
//!
//! Leakage inductance of power-transformer windings by Rabin's method.
//!
//! This library provides:
//! - Winding geometry: a core leg carrying concentric coils split into axial sections
//! - The harmonic (Fourier–Bessel) solution of the magnetostatic field inside a
//!   grounded cylindrical tank, with log-scaled accumulation of its series
//! - Self and mutual inductance of every section pair, assembled into a
//!   symmetric positive-definite matrix
//! - Stored energy, leakage inductance and per-unit leakage reactance
//!
//! ## Architecture
//!
//! - [`numeric`] - Scaled numbers, Bessel and Struve functions, adaptive quadrature
//! - [`geometry`] - Core, coils, sections and their validation
//! - [`inductance`] - Harmonic coefficient tables, inductance formulas, vector potential
//! - [`matrix`] - Dense real/complex matrices with Cholesky and LU solves
//! - [`phase`] - Matrix assembly and derived quantities
//! - [`design`] - TOML design files
//!
//! ## Usage
//!
//! ```bash
//! rabin transformer.toml --base-va 3.333e6 --base-current 83.67 --print-matrix
//! ```
//!
//! ## Method
//!
//! The window is extended axially to an effective height `L` and the current
//! density of each section is expanded as `J(z) = J0 + Σ Jn cos(nπz/L)`. Each
//! harmonic solves a modified Bessel equation in three radial regions (core
//! gap, winding, tank gap). Terms whose magnitude spans hundreds of orders are
//! kept as `(ln scale, coefficient)` pairs until the final sum.

pub mod design;
pub mod error;
pub mod geometry;
pub mod inductance;
pub mod matrix;
pub mod numeric;
pub mod phase;

// Re-export main types for convenience
pub use design::{load_phase, Design};
pub use error::{RabinError, Result};
pub use geometry::{Coil, CoilId, CoilParams, Core, CurrentDirection, Region, Section, SectionId};
pub use inductance::CalculationSettings;
pub use matrix::Matrix;
pub use phase::{Phase, ValidationStatus};

/// Permeability of free space (H/m)
pub const MU_0: f64 = 4.0 * std::f64::consts::PI * 1e-7;

/// Default number of Fourier harmonics
pub const DEFAULT_HARMONICS: usize = 200;

/// Default system frequency in Hz
pub const DEFAULT_FREQUENCY: f64 = 60.0;
