//! Vector potential of a single coil.
//!
//! `A(r, z) = A0(r) + Σₙ (µ0 Jn / m²) Zₙ(m r) cos(m z)` where, with the coil's
//! own coil-region shape functions,
//!
//! ```text
//! core gap:  Z = Cn I1(x) + Dn K1(x)
//! winding:   Z = En I1(x) + Fn K1(x) − (π/2) L1(x)
//! tank gap:  Z = Gn K1(x)
//! ```
//!
//! The uniform term is the infinite-solenoid potential `µ0 J0 ψ(r) / r`.

use std::f64::consts::FRAC_PI_2;

use crate::error::{RabinError, Result};
use crate::geometry::{Coil, Region};
use crate::numeric::special::{bessel_i1, bessel_k1, struve_l1};
use crate::numeric::ScaledNumber;
use crate::MU_0;

use super::formulas::harmonic_sum;

/// `r·A0(r) / (µ0 J0)` for a winding between `a` and `b`.
fn uniform_flux(r: f64, a: f64, b: f64) -> f64 {
    let d = b - a;
    if r <= a {
        d * r * r / 2.0
    } else if r <= b {
        d * a * a / 2.0 + b * (r * r - a * a) / 2.0 - (r.powi(3) - a.powi(3)) / 3.0
    } else {
        (b.powi(3) - a.powi(3)) / 6.0
    }
}

/// `∫_lo^hi uniform_flux(r) dr`, piecewise.
fn uniform_flux_integral(lo: f64, hi: f64, a: f64, b: f64) -> f64 {
    let d = b - a;
    let inside = |r: f64| d * r.powi(3) / 6.0;
    let within = |r: f64| (d * a * a / 2.0 - b * a * a / 2.0 + a.powi(3) / 3.0) * r + b * r.powi(3) / 6.0 - r.powi(4) / 12.0;
    let outside = |r: f64| (b.powi(3) - a.powi(3)) / 6.0 * r;

    let pieces: [(f64, f64, &dyn Fn(f64) -> f64); 3] = [
        (f64::NEG_INFINITY, a, &inside),
        (a, b, &within),
        (b, f64::INFINITY, &outside),
    ];

    pieces
        .iter()
        .map(|(start, end, antiderivative)| {
            let l = lo.max(*start);
            let h = hi.min(*end);
            if h > l {
                antiderivative(h) - antiderivative(l)
            } else {
                0.0
            }
        })
        .sum()
}

/// `j·cos(mz) / m^power` as one log-domain term; `None` when it vanishes.
fn axial_factor(j: f64, wavenumber: f64, z: f64, power: i32) -> Option<ScaledNumber> {
    let weight = j * (wavenumber * z).cos();
    if weight == 0.0 {
        return None;
    }
    Some(ScaledNumber::from_term(
        weight.abs().ln() - f64::from(power) * wavenumber.ln(),
        weight.signum(),
    ))
}

/// `A(r, z)` (Wb/m) for `r` at or outside the core leg.
pub fn vector_potential(coil: &Coil, r: f64, z: f64) -> Result<f64> {
    let core_radius = coil.core().radius();
    if !(r.is_finite() && r >= core_radius) {
        return Err(RabinError::geometry(
            format!("coil '{}'", coil.name()),
            format!("field point r = {} is inside the core leg (radius {})", r, core_radius),
        ));
    }

    let spectrum = coil.current_density_harmonics()?;
    let table = coil.coefficients();
    let winding = table.region(Region::Coil);
    let (r1, r2) = (coil.inner_radius(), coil.outer_radius());
    let quadrature = &coil.settings().quadrature;

    let series = harmonic_sum(table.harmonic_count(), |n| {
        let m = table.wavenumber(n);
        let Some(factor) = axial_factor(spectrum[n], m, z, 2) else {
            return Ok(None);
        };
        let t = winding.harmonic(n);
        let x = m * r;
        let shape = if r <= r1 {
            &(&t.c * &bessel_i1(x)) + &(&t.d * &bessel_k1(x))
        } else if r <= r2 {
            let linked = &(&t.e * &bessel_i1(x)) + &(&t.f * &bessel_k1(x));
            &linked - &(FRAC_PI_2 * &struve_l1(x, quadrature)?)
        } else {
            &t.g * &bessel_k1(x)
        };
        Ok(Some(&factor * &shape))
    })?;

    Ok(MU_0 * (spectrum[0] * uniform_flux(r, r1, r2) / r + series))
}

/// Mean of `A(r, z)` over a region, weighted by `r` (Wb/m).
///
/// `2π · mean · (r_hi² − r_lo²)/2` is the flux linked by a thin filament
/// spread uniformly over the region's cross-section at height `z`.
pub fn mean_vector_potential(coil: &Coil, region: Region, z: f64) -> Result<f64> {
    let table = coil.coefficients();
    let (lo, hi) = table.region(region).bounds();
    let area = (hi * hi - lo * lo) / 2.0;
    if area <= 0.0 {
        return Err(RabinError::geometry(
            format!("coil '{}'", coil.name()),
            format!("{} region has no radial extent", region),
        ));
    }

    let spectrum = coil.current_density_harmonics()?;
    let winding = table.region(Region::Coil);
    let target = table.region(region);
    let (r1, r2) = (coil.inner_radius(), coil.outer_radius());

    let series = harmonic_sum(table.harmonic_count(), |n| {
        let Some(factor) = axial_factor(spectrum[n], table.wavenumber(n), z, 4) else {
            return Ok(None);
        };
        let t = winding.harmonic(n);
        let local = target.harmonic(n);
        let shape = match region {
            Region::CoreGap => &(&t.c * &local.integral_i1) + &(&t.d * &local.c),
            Region::Coil => {
                let linked = &(&t.e * &t.integral_i1) + &(&t.f * &t.c);
                &linked - &(FRAC_PI_2 * &t.integral_l1)
            }
            Region::TankGap => &t.g * &local.c,
        };
        Ok(Some(&factor * &shape))
    })?;

    let integral = MU_0 * (spectrum[0] * uniform_flux_integral(lo, hi, r1, r2) + series);
    Ok(integral / area)
}
