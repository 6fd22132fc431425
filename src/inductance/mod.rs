//! Harmonic-series inductance (Rabin's method).
//!
//! The window is modelled as a grounded cylindrical box of height
//! `L = real window height × multiplier` around an infinitely permeable
//! core leg. The axial current density of each section is expanded in a
//! cosine series, and each harmonic's vector potential is a combination of
//! modified Bessel and Struve functions of `m·r`.
//!
//! The pipeline is:
//!
//! 1. [`HarmonicCoefficients`]: per coil, shape functions for every region and
//!    harmonic, computed once at coil construction
//! 2. [`formulas`]: section self/mutual inductance from the shape functions and
//!    the sections' cached current-density spectra
//! 3. [`field`]: vector potential of a coil, for inspection and cross-checks

mod coefficients;
pub mod field;
pub mod formulas;
mod settings;

pub use coefficients::{HarmonicCoefficients, HarmonicTerms, RegionCoefficients};
pub use settings::CalculationSettings;

/// Radial gap between the outermost winding face and the tank wall (m).
pub const DEFAULT_TANK_STANDOFF: f64 = 0.15;

/// Coils whose inner radii differ by less than this share a radial position (m).
pub const DEFAULT_RADIAL_TOLERANCE: f64 = 1e-6;
