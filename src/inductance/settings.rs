//! Calculation settings.

use serde::{Deserialize, Serialize};

use crate::error::{RabinError, Result};
use crate::numeric::{QuadraturePolicy, QuadratureSettings};
use crate::{DEFAULT_FREQUENCY, DEFAULT_HARMONICS};

use super::{DEFAULT_RADIAL_TOLERANCE, DEFAULT_TANK_STANDOFF};

/// Parameters shared by every coil of a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationSettings {
    /// Number of Fourier harmonics summed (the series truncation).
    pub harmonics: usize,
    /// Radial distance from the outermost winding face to the tank wall (m).
    pub tank_standoff: f64,
    /// Coils whose inner radii differ by less than this are coaxial (m).
    pub radial_tolerance: f64,
    /// Adaptive quadrature for the auxiliary integrals.
    pub quadrature: QuadratureSettings,
    /// System frequency for reactance (Hz).
    pub frequency: f64,
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            harmonics: DEFAULT_HARMONICS,
            tank_standoff: DEFAULT_TANK_STANDOFF,
            radial_tolerance: DEFAULT_RADIAL_TOLERANCE,
            quadrature: QuadratureSettings::default(),
            frequency: DEFAULT_FREQUENCY,
        }
    }
}

impl CalculationSettings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of harmonics.
    ///
    /// Cost grows linearly with the count; 200 is adequate for disc-level
    /// sections of a power transformer.
    pub fn with_harmonics(mut self, harmonics: usize) -> Self {
        self.harmonics = harmonics;
        self
    }

    /// Set the tank standoff (m).
    pub fn with_tank_standoff(mut self, tank_standoff: f64) -> Self {
        self.tank_standoff = tank_standoff;
        self
    }

    /// Set the coaxial tolerance (m).
    pub fn with_radial_tolerance(mut self, radial_tolerance: f64) -> Self {
        self.radial_tolerance = radial_tolerance;
        self
    }

    /// Set the quadrature settings.
    pub fn with_quadrature(mut self, quadrature: QuadratureSettings) -> Self {
        self.quadrature = quadrature;
        self
    }

    /// Set the quadrature failure policy only.
    pub fn with_quadrature_policy(mut self, policy: QuadraturePolicy) -> Self {
        self.quadrature.policy = policy;
        self
    }

    /// Set the system frequency (Hz).
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.harmonics == 0 {
            return Err(RabinError::settings("harmonics must be at least 1"));
        }
        if !(self.tank_standoff.is_finite() && self.tank_standoff > 0.0) {
            return Err(RabinError::settings(format!(
                "tank standoff must be positive, got {}",
                self.tank_standoff
            )));
        }
        if !(self.radial_tolerance.is_finite() && self.radial_tolerance >= 0.0) {
            return Err(RabinError::settings(format!(
                "radial tolerance must be non-negative, got {}",
                self.radial_tolerance
            )));
        }
        let q = &self.quadrature;
        if !(q.abs_tolerance >= 0.0 && q.rel_tolerance >= 0.0) || q.max_subdivisions == 0 {
            return Err(RabinError::settings(
                "quadrature tolerances must be non-negative and max_subdivisions at least 1",
            ));
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(RabinError::settings(format!(
                "frequency must be positive, got {}",
                self.frequency
            )));
        }
        Ok(())
    }
}
