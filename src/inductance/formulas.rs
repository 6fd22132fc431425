//! Self and mutual inductance of sections.
//!
//! Both are a uniform (`n = 0`) term plus a harmonic series
//!
//! ```text
//! πµ0 L Σₙ (j_a,n · j_b,n / m⁴) · Bₙ
//! ```
//!
//! where `j = Jn / I` is a section's current-density harmonic per ampere and
//! `Bₙ` is a product of shape functions. Each harmonic's contribution is built
//! as a [`ScaledNumber`] (the `j²/m⁴` factor in log form), accumulated into one
//! shared total and reduced once.

use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;

use crate::error::{RabinError, Result};
use crate::geometry::{Coil, Region, Section};
use crate::numeric::ScaledNumber;
use crate::MU_0;

use super::HarmonicTerms;

/// Sum `contribution(n)` for `n = 1..=count` in parallel and reduce once.
pub(crate) fn harmonic_sum<F>(count: usize, contribution: F) -> Result<f64>
where
    F: Fn(usize) -> Result<Option<ScaledNumber>> + Sync + Send,
{
    let total = Mutex::new(ScaledNumber::new());

    (1..=count).into_par_iter().try_for_each(|n| -> Result<()> {
        if let Some(term) = contribution(n)? {
            total
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .absorb(term);
        }
        Ok(())
    })?;

    total
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .reduce()
}

/// `j_a·j_b / m⁴` as a single log-domain term; `None` if either is zero.
fn spectral_factor(ja: f64, jb: f64, wavenumber: f64) -> Option<ScaledNumber> {
    if ja == 0.0 || jb == 0.0 {
        return None;
    }
    let sign = if (ja > 0.0) == (jb > 0.0) { 1.0 } else { -1.0 };
    Some(ScaledNumber::from_term(
        ja.abs().ln() + jb.abs().ln() - 4.0 * wavenumber.ln(),
        sign,
    ))
}

/// `En·I1n + Fn·Cn − (π/2)·L1n`: the in-winding bracket.
fn winding_bracket(t: &HarmonicTerms) -> ScaledNumber {
    let linked = &(&t.e * &t.integral_i1) + &(&t.f * &t.c);
    &linked - &(FRAC_PI_2 * &t.integral_l1)
}

fn check_compatible(a: &Coil, b: &Coil) -> Result<()> {
    let (ca, cb) = (a.coefficients(), b.coefficients());
    if ca.harmonic_count() != cb.harmonic_count() || ca.effective_height() != cb.effective_height() {
        return Err(RabinError::settings(format!(
            "coils '{}' and '{}' were built with different harmonic tables",
            a.name(),
            b.name()
        )));
    }
    Ok(())
}

/// Self inductance (H) of `section` inside `coil`.
///
/// ```text
/// L = πµ0N²/(6L)·((r2+r1)² + 2r1²) + πµ0L Σₙ (jₙ²/m⁴)(En·I1n + Fn·Cn − (π/2)L1n)
/// ```
pub fn self_inductance(section: &Section, coil: &Coil) -> Result<f64> {
    section.check_parent(coil)?;
    let spectrum = section.unit_spectrum()?;
    let table = coil.coefficients();
    let winding = table.region(Region::Coil);
    let length = table.effective_height();
    let (r1, r2) = (coil.inner_radius(), coil.outer_radius());
    let turns = section.turns();

    let uniform = PI * MU_0 * turns * turns / (6.0 * length) * ((r2 + r1).powi(2) + 2.0 * r1 * r1);

    let series = harmonic_sum(table.harmonic_count(), |n| {
        let j = spectrum[n];
        Ok(spectral_factor(j, j, table.wavenumber(n))
            .map(|factor| &factor * &winding_bracket(winding.harmonic(n))))
    })?;

    Ok(uniform + PI * MU_0 * length * series)
}

/// Mutual inductance (H) between two sections.
///
/// The pair is put in a canonical order, radially inner coil first, so the
/// result does not depend on argument order. Coaxial coils at the same
/// radial position use the in-winding bracket of the shared table; nested
/// coils use `Gn` of the inner coil against `Cn` of the outer:
///
/// ```text
/// M = πµ0NaNb/(3L)·(r2a² + r2a·r1a + r1a²) + πµ0L Σₙ (ja·jb/m⁴)·Gn,a·Cn,b
/// ```
pub fn mutual_inductance(a: &Section, coil_a: &Coil, b: &Section, coil_b: &Coil) -> Result<f64> {
    a.check_parent(coil_a)?;
    b.check_parent(coil_b)?;
    check_compatible(coil_a, coil_b)?;

    let swap = (coil_b.inner_radius(), coil_b.id()) < (coil_a.inner_radius(), coil_a.id());
    let ((inner_section, inner), (outer_section, outer)) = if swap {
        ((b, coil_b), (a, coil_a))
    } else {
        ((a, coil_a), (b, coil_b))
    };

    let spectrum_inner = inner_section.unit_spectrum()?;
    let spectrum_outer = outer_section.unit_spectrum()?;
    let table = inner.coefficients();
    let length = table.effective_height();
    let (r1, r2) = (inner.inner_radius(), inner.outer_radius());
    let turns = inner_section.turns() * outer_section.turns();
    let tolerance = inner.settings().radial_tolerance;

    if (inner.inner_radius() - outer.inner_radius()).abs() < tolerance {
        let winding = table.region(Region::Coil);
        let uniform = PI * MU_0 * turns / (6.0 * length) * ((r2 + r1).powi(2) + 2.0 * r1 * r1);
        let series = harmonic_sum(table.harmonic_count(), |n| {
            Ok(spectral_factor(spectrum_inner[n], spectrum_outer[n], table.wavenumber(n))
                .map(|factor| &factor * &winding_bracket(winding.harmonic(n))))
        })?;
        return Ok(uniform + PI * MU_0 * length * series);
    }

    let source = table.region(Region::Coil);
    let target = outer.coefficients().region(Region::Coil);
    let uniform = PI * MU_0 * turns / (3.0 * length) * (r2 * r2 + r2 * r1 + r1 * r1);
    let series = harmonic_sum(table.harmonic_count(), |n| {
        Ok(spectral_factor(spectrum_inner[n], spectrum_outer[n], table.wavenumber(n))
            .map(|factor| &factor * &(&source.harmonic(n).g * &target.harmonic(n).c)))
    })?;

    Ok(uniform + PI * MU_0 * length * series)
}
