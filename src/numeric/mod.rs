//! Numerical building blocks.
//!
//! - [`scaled`] - log-domain deferred arithmetic ([`ScaledNumber`])
//! - [`bessel`] - exponentially scaled modified Bessel functions
//! - [`quadrature`] - adaptive Gauss–Kronrod integration
//! - [`special`] - `M0`, `M1` and the closed-form `∫ t·Z1(t) dt` integrals

pub mod bessel;
pub mod quadrature;
pub mod scaled;
pub mod special;

pub use quadrature::{integrate, Integral, QuadraturePolicy, QuadratureSettings};
pub use scaled::{ScaledNumber, ScaledTerm};
