//! Core leg and window dimensions.

use log::warn;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_WINDOW_MULTIPLIER, MAX_RECOMMENDED_WINDOW_MULTIPLIER};
use crate::error::{RabinError, Result};

/// Core leg of one phase.
///
/// The series solution places a grounded boundary at
/// `effective_window_height = real_window_height × window_multiplier`. Larger
/// multipliers approximate an open window better, but the matrix stops being
/// positive definite somewhere above 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Core {
    radius: f64,
    real_window_height: f64,
    window_multiplier: f64,
}

impl Core {
    /// Create a core with the default window multiplier.
    pub fn new(radius: f64, real_window_height: f64) -> Result<Self> {
        Self::with_window_multiplier(radius, real_window_height, DEFAULT_WINDOW_MULTIPLIER)
    }

    /// Create a core with an explicit window multiplier.
    pub fn with_window_multiplier(
        radius: f64,
        real_window_height: f64,
        window_multiplier: f64,
    ) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(RabinError::geometry("core", format!("radius must be positive, got {}", radius)));
        }
        if !(real_window_height.is_finite() && real_window_height > 0.0) {
            return Err(RabinError::geometry(
                "core",
                format!("window height must be positive, got {}", real_window_height),
            ));
        }
        if !(window_multiplier.is_finite() && window_multiplier > 1.0) {
            return Err(RabinError::InvalidWindowMultiplier {
                multiplier: window_multiplier,
            });
        }
        if window_multiplier >= MAX_RECOMMENDED_WINDOW_MULTIPLIER {
            warn!(
                "Window multiplier {} is at or above {}; the inductance matrix may not be positive definite",
                window_multiplier, MAX_RECOMMENDED_WINDOW_MULTIPLIER
            );
        }

        Ok(Self {
            radius,
            real_window_height,
            window_multiplier,
        })
    }

    /// Same leg and window with a different multiplier.
    pub fn rescaled(&self, window_multiplier: f64) -> Result<Self> {
        Self::with_window_multiplier(self.radius, self.real_window_height, window_multiplier)
    }

    /// Core leg radius (m).
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Physical window height (m).
    pub fn real_window_height(&self) -> f64 {
        self.real_window_height
    }

    /// Window height multiplier.
    pub fn window_multiplier(&self) -> f64 {
        self.window_multiplier
    }

    /// Height of the boundary used in the series solution (m).
    pub fn effective_window_height(&self) -> f64 {
        self.real_window_height * self.window_multiplier
    }
}
