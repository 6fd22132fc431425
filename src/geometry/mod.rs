//! Winding geometry.
//!
//! A phase is one [`Core`] leg carrying concentric [`Coil`]s, each divided
//! axially into [`Section`]s. Coils own their sections; a section refers back
//! to its coil only by [`CoilId`].
//!
//! ```text
//!        r_core  r_inner  r_outer      r_outer + standoff
//!   core |  gap  | coil  |   tank gap   | tank
//! ```

mod coil;
mod core_leg;
mod section;
mod types;
mod validate;

pub use coil::Coil;
pub use core_leg::Core;
pub use section::Section;
pub use types::*;
pub use validate::{validate_coil_pair, validate_coil_params, validate_sections};

/// Window multiplier used when none is given.
pub const DEFAULT_WINDOW_MULTIPLIER: f64 = 1.5;

/// Multipliers at or above this value draw a warning.
pub const MAX_RECOMMENDED_WINDOW_MULTIPLIER: f64 = 3.0;
