//! Identifiers and small value types shared by the winding model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RabinError, Result};

/// A unique identifier for a section (disc) of a coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub usize);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A unique identifier for a coil within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoilId(pub usize);

impl fmt::Display for CoilId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// Hands out monotonically increasing section ids.
///
/// Owned by the [`Phase`](crate::phase::Phase), so two phases built from the
/// same input number their sections identically.
#[derive(Debug, Clone, Default)]
pub struct SectionIdAllocator {
    next: usize,
}

impl SectionIdAllocator {
    /// Start numbering at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id.
    pub fn allocate(&mut self) -> SectionId {
        let id = SectionId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> usize {
        self.next
    }
}

/// Sense of a coil's current relative to the phase reference.
///
/// `Off` removes the coil from energy and reactance sums (e.g. an idle tap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum CurrentDirection {
    Negative,
    Off,
    #[default]
    Positive,
}

impl CurrentDirection {
    /// `-1.0`, `0.0` or `1.0`.
    pub fn sign(self) -> f64 {
        match self {
            CurrentDirection::Negative => -1.0,
            CurrentDirection::Off => 0.0,
            CurrentDirection::Positive => 1.0,
        }
    }

    /// Check if the coil takes part in energy sums.
    pub fn is_active(self) -> bool {
        self != CurrentDirection::Off
    }
}

impl TryFrom<i8> for CurrentDirection {
    type Error = RabinError;

    fn try_from(value: i8) -> Result<Self> {
        match value {
            -1 => Ok(CurrentDirection::Negative),
            0 => Ok(CurrentDirection::Off),
            1 => Ok(CurrentDirection::Positive),
            other => Err(RabinError::design(format!(
                "current direction must be -1, 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl From<CurrentDirection> for i8 {
    fn from(direction: CurrentDirection) -> i8 {
        match direction {
            CurrentDirection::Negative => -1,
            CurrentDirection::Off => 0,
            CurrentDirection::Positive => 1,
        }
    }
}

/// Radial band of the harmonic solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Between the core leg and the coil's inner radius
    CoreGap,
    /// Inside the winding
    Coil,
    /// Between the coil's outer radius and the tank
    TankGap,
}

impl Region {
    /// All regions in radial order.
    pub const ALL: [Region; 3] = [Region::CoreGap, Region::Coil, Region::TankGap];

    /// Position in the coefficient table.
    pub fn index(self) -> usize {
        match self {
            Region::CoreGap => 0,
            Region::Coil => 1,
            Region::TankGap => 2,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::CoreGap => write!(f, "core gap"),
            Region::Coil => write!(f, "coil"),
            Region::TankGap => write!(f, "tank gap"),
        }
    }
}

/// User-facing description of a coil, before its coefficient table exists.
#[derive(Debug, Clone, PartialEq)]
pub struct CoilParams {
    /// Display name
    pub name: String,
    /// Current sense
    pub direction: CurrentDirection,
    /// Inner radius (m)
    pub inner_radius: f64,
    /// Outer radius (m)
    pub outer_radius: f64,
    /// Rated current (A)
    pub rated_current: f64,
}

impl CoilParams {
    /// Create parameters for a positively-directed coil.
    pub fn new(name: impl Into<String>, inner_radius: f64, outer_radius: f64, rated_current: f64) -> Self {
        Self {
            name: name.into(),
            direction: CurrentDirection::Positive,
            inner_radius,
            outer_radius,
            rated_current,
        }
    }

    /// Set the current direction.
    pub fn with_direction(mut self, direction: CurrentDirection) -> Self {
        self.direction = direction;
        self
    }
}
