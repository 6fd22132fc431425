//! Geometry validation.

use crate::error::{RabinError, Result};

use super::{Coil, CoilParams, Core, Section};

/// Validate a coil's radial build against its core.
///
/// Checks:
/// - Radii are finite and `core radius ≤ inner < outer`
/// - Rated current is finite and non-negative
pub fn validate_coil_params(params: &CoilParams, core: &Core) -> Result<()> {
    let item = format!("coil '{}'", params.name);

    if !(params.inner_radius.is_finite() && params.outer_radius.is_finite()) {
        return Err(RabinError::geometry(item, "radii must be finite"));
    }
    if params.inner_radius < core.radius() {
        return Err(RabinError::geometry(
            item,
            format!(
                "inner radius {} lies inside the core leg (radius {})",
                params.inner_radius,
                core.radius()
            ),
        ));
    }
    if params.outer_radius <= params.inner_radius {
        return Err(RabinError::geometry(
            item,
            format!(
                "outer radius {} must exceed inner radius {}",
                params.outer_radius, params.inner_radius
            ),
        ));
    }
    if !(params.rated_current.is_finite() && params.rated_current >= 0.0) {
        return Err(RabinError::geometry(
            item,
            format!("rated current must be non-negative, got {}", params.rated_current),
        ));
    }

    Ok(())
}

/// Validate a coil's sections against the window, assuming they are sorted by `z_min`.
///
/// Checks:
/// - At least one section
/// - Every section lies inside the real window
/// - Neighbouring sections do not overlap
pub fn validate_sections(name: &str, sections: &[Section], core: &Core) -> Result<()> {
    let item = format!("coil '{}'", name);

    if sections.is_empty() {
        return Err(RabinError::geometry(item, "coil has no sections"));
    }

    for section in sections {
        if section.z_max() > core.real_window_height() {
            return Err(RabinError::geometry(
                item,
                format!(
                    "section {} reaches z = {} above the window height {}",
                    section.id(),
                    section.z_max(),
                    core.real_window_height()
                ),
            ));
        }
    }

    for pair in sections.windows(2) {
        if pair[1].z_min() < pair[0].z_max() {
            return Err(RabinError::geometry(
                item,
                format!("sections {} and {} overlap axially", pair[0].id(), pair[1].id()),
            ));
        }
    }

    Ok(())
}

/// Validate that two coils can share a phase.
///
/// They must either sit at the same radial position (within `tolerance`) or
/// be radially disjoint.
pub fn validate_coil_pair(a: &Coil, b: &Coil, tolerance: f64) -> Result<()> {
    let coaxial = (a.inner_radius() - b.inner_radius()).abs() < tolerance
        && (a.outer_radius() - b.outer_radius()).abs() < tolerance;
    let disjoint = a.outer_radius() <= b.inner_radius() + tolerance
        || b.outer_radius() <= a.inner_radius() + tolerance;

    if coaxial || disjoint {
        Ok(())
    } else {
        Err(RabinError::OverlappingCoils {
            first: a.name().to_string(),
            second: b.name().to_string(),
        })
    }
}
