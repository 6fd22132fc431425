//! Auxiliary integrals of the harmonic solution.
//!
//! `M0` and `M1` are the modified-Struve complements
//!
//! ```text
//! M0(x) = (2/π) ∫₀^{π/2} e^{-x cosθ} dθ               = I0(x) − L0(x)
//! M1(x) = (2/π) (1 − ∫₀^{π/2} e^{-x cosθ} cosθ dθ)    = I1(x) − L1(x)
//! ```
//!
//! which stay bounded for large `x`, unlike `I` and `L` themselves. The
//! closed forms of `∫ t I1(t) dt`, `∫ t K1(t) dt` and `∫ t L1(t) dt` are
//! returned as [`ScaledNumber`]s with one term anchored at each limit, so
//! the `e^±x` growth is never evaluated here.

use std::f64::consts::{FRAC_2_PI, FRAC_PI_2, PI};

use log::warn;

use super::bessel::{i0e, i1e, k_scaled};
use super::quadrature::{integrate, QuadraturePolicy, QuadratureSettings};
use super::ScaledNumber;
use crate::error::{RabinError, Result};

/// Integrate over `[0, π/2]`, applying the failure policy.
///
/// `None` means the integral failed under the permissive policy; the caller
/// then reports `0.0` for the whole function, not just for the integral.
fn angular_integral<F: Fn(f64) -> f64>(
    integrand: &'static str,
    x: f64,
    f: F,
    settings: &QuadratureSettings,
) -> Result<Option<f64>> {
    let result = integrate(f, 0.0, FRAC_PI_2, settings);
    if result.converged {
        return Ok(Some(result.value));
    }

    match settings.policy {
        QuadraturePolicy::Strict => Err(RabinError::QuadratureFailed {
            integrand,
            x,
            subdivisions: result.subdivisions,
            error: result.error,
        }),
        QuadraturePolicy::Permissive => {
            warn!(
                "{} at x = {:.6e} did not converge (error {:.2e}), using 0.0",
                integrand, x, result.error
            );
            Ok(None)
        }
    }
}

/// `M0(x) = I0(x) − L0(x)`.
pub fn m0(x: f64, settings: &QuadratureSettings) -> Result<f64> {
    let integral = angular_integral("M0", x, |t| (-x * t.cos()).exp(), settings)?;
    Ok(integral.map_or(0.0, |i| FRAC_2_PI * i))
}

/// `M1(x) = I1(x) − L1(x)`.
pub fn m1(x: f64, settings: &QuadratureSettings) -> Result<f64> {
    let integral = angular_integral(
        "M1",
        x,
        |t| {
            let c = t.cos();
            (-x * c).exp() * c
        },
        settings,
    )?;
    Ok(integral.map_or(0.0, |i| FRAC_2_PI * (1.0 - i)))
}

/// `∫₀^b M0(t) dt`, via `(2/π) ∫₀^{π/2} (1 − e^{-b cosθ}) / cosθ dθ`.
fn integral_of_m0_from_zero(b: f64, settings: &QuadratureSettings) -> Result<f64> {
    if b == 0.0 {
        return Ok(0.0);
    }
    let integral = angular_integral(
        "integral of M0",
        b,
        |t| {
            let c = t.cos();
            if c > 0.0 {
                -(-b * c).exp_m1() / c
            } else {
                b
            }
        },
        settings,
    )?;
    Ok(integral.map_or(0.0, |i| FRAC_2_PI * i))
}

/// `∫_a^b M0(t) dt`.
pub fn integral_of_m0(a: f64, b: f64, settings: &QuadratureSettings) -> Result<f64> {
    if a == 0.0 {
        return integral_of_m0_from_zero(b, settings);
    }
    Ok(integral_of_m0_from_zero(b, settings)? - integral_of_m0_from_zero(a, settings)?)
}

/// `(π/2)·x·(M1 I0e − M0 I1e)(x)`, the scaled antiderivative of `t I1(t)`,
/// as `(scale, coefficient)` with the `e^x` growth in the scale.
fn t_i1_antiderivative(x: f64, settings: &QuadratureSettings) -> Result<(f64, f64)> {
    let coefficient = m1(x, settings)? * i0e(x) - m0(x, settings)? * i1e(x);
    Ok((x + (FRAC_PI_2 * x).ln(), coefficient))
}

/// `−(π/2)·x·(M1 K0e + M0 K1e)(x)`, the varying part of the antiderivative of
/// `t K1(t)` (whose constant is `π/2`), with the `e^-x` decay in the scale.
fn t_k1_antiderivative(x: f64, settings: &QuadratureSettings) -> Result<(f64, f64)> {
    let (k0, k1) = k_scaled(x);
    let coefficient = m1(x, settings)? * k0 + m0(x, settings)? * k1;
    Ok((-x + (FRAC_PI_2 * x).ln(), -coefficient))
}

/// `∫_{x1}^{x2} t I1(t) dt`.
pub fn integral_of_t_i1(x1: f64, x2: f64, settings: &QuadratureSettings) -> Result<ScaledNumber> {
    let mut result = ScaledNumber::new();
    if x1 > 0.0 {
        let (scale, coefficient) = t_i1_antiderivative(x1, settings)?;
        result += ScaledNumber::from_term(scale, -coefficient);
    }
    let (scale, coefficient) = t_i1_antiderivative(x2, settings)?;
    result += ScaledNumber::from_term(scale, coefficient);
    Ok(result)
}

/// `∫_{x1}^{x2} t K1(t) dt`.
pub fn integral_of_t_k1(x1: f64, x2: f64, settings: &QuadratureSettings) -> Result<ScaledNumber> {
    let mut result = if x1 > 0.0 {
        let (scale, coefficient) = t_k1_antiderivative(x1, settings)?;
        ScaledNumber::from_term(scale, -coefficient)
    } else {
        ScaledNumber::from_term(0.0, FRAC_PI_2)
    };
    let (scale, coefficient) = t_k1_antiderivative(x2, settings)?;
    result += ScaledNumber::from_term(scale, coefficient);
    Ok(result)
}

/// `∫_{x1}^{x2} t L1(t) dt`, with `L1` the modified Struve function.
///
/// `∫₀^x t L1 = ∫₀^x t I1 − x M0(x) − x²/π + ∫₀^x M0`; everything except the
/// `t I1` part is of moderate size and is folded into a single plain term.
pub fn integral_of_t_l1(x1: f64, x2: f64, settings: &QuadratureSettings) -> Result<ScaledNumber> {
    let unscaled = |x: f64| -> Result<f64> { Ok(-x * m0(x, settings)? - x * x / PI) };
    let bounded = unscaled(x2)? - unscaled(x1)? + integral_of_m0(x1, x2, settings)?;
    Ok(ScaledNumber::from(bounded) + integral_of_t_i1(x1, x2, settings)?)
}

/// `I1(x)` as a single scaled term.
pub fn bessel_i1(x: f64) -> ScaledNumber {
    ScaledNumber::from_term(x, i1e(x))
}

/// `K1(x)` as a single scaled term.
pub fn bessel_k1(x: f64) -> ScaledNumber {
    let (_, k1) = k_scaled(x);
    ScaledNumber::from_term(-x, k1)
}

/// Modified Struve function `L1(x) = I1(x) − M1(x)`.
pub fn struve_l1(x: f64, settings: &QuadratureSettings) -> Result<ScaledNumber> {
    Ok(bessel_i1(x) - ScaledNumber::from(m1(x, settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settings() -> QuadratureSettings {
        QuadratureSettings::default()
    }

    #[test]
    fn test_m_functions_at_origin() {
        assert_relative_eq!(m0(0.0, &settings()).unwrap(), 1.0, max_relative = 1e-14);
        assert_relative_eq!(m1(0.0, &settings()).unwrap(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_m_functions_large_argument_limits() {
        // M0 → 2/(πx), M1 → 2/π as x → ∞
        let x = 400.0;
        assert_relative_eq!(m0(x, &settings()).unwrap(), FRAC_2_PI / x, max_relative = 1e-4);
        assert_relative_eq!(m1(x, &settings()).unwrap(), FRAC_2_PI, max_relative = 1e-2);
    }

    #[test]
    fn test_integral_of_m0_is_additive() {
        let s = settings();
        let whole = integral_of_m0(0.0, 3.0, &s).unwrap();
        let split = integral_of_m0(0.0, 1.2, &s).unwrap() + integral_of_m0(1.2, 3.0, &s).unwrap();
        assert_relative_eq!(whole, split, max_relative = 1e-12);
    }

    #[test]
    fn test_t_i1_matches_direct_quadrature() {
        let s = settings();
        let closed = integral_of_t_i1(0.5, 4.0, &s).unwrap().reduce().unwrap();
        let direct = integrate(|t| t * i1e(t) * t.exp(), 0.5, 4.0, &s);
        assert_relative_eq!(closed, direct.value, max_relative = 1e-9);
    }

    #[test]
    fn test_t_k1_matches_direct_quadrature() {
        let s = settings();
        let closed = integral_of_t_k1(0.5, 4.0, &s).unwrap().reduce().unwrap();
        let direct = integrate(|t| t * k_scaled(t).1 * (-t).exp(), 0.5, 4.0, &s);
        assert_relative_eq!(closed, direct.value, max_relative = 1e-9);
    }

    #[test]
    fn test_t_k1_from_zero_approaches_half_pi() {
        let total = integral_of_t_k1(0.0, 60.0, &settings()).unwrap().reduce().unwrap();
        assert_relative_eq!(total, FRAC_PI_2, max_relative = 1e-12);
    }

    #[test]
    fn test_t_l1_matches_direct_quadrature() {
        let s = settings();
        let closed = integral_of_t_l1(0.3, 2.5, &s).unwrap().reduce().unwrap();
        let direct = integrate(
            |t| t * struve_l1(t, &s).unwrap().reduce().unwrap(),
            0.3,
            2.5,
            &s,
        );
        assert_relative_eq!(closed, direct.value, max_relative = 1e-7);
    }

    #[test]
    fn test_large_arguments_stay_scaled() {
        // I1(2000) overflows f64, yet the integral terms are finite
        let terms = integral_of_t_i1(1500.0, 2000.0, &settings()).unwrap();
        assert_eq!(terms.len(), 2);
        assert!(terms.terms().iter().all(|t| t.scale.is_finite() && t.coefficient.is_finite()));
    }

    #[test]
    fn test_strict_policy_reports_failure() {
        let tight = QuadratureSettings::default()
            .with_max_subdivisions(1)
            .with_tolerances(0.0, 0.0);
        let err = m0(50.0, &tight).unwrap_err();
        assert!(matches!(err, RabinError::QuadratureFailed { integrand: "M0", .. }));
    }

    #[test]
    fn test_permissive_policy_degrades_to_zero() {
        let tight = QuadratureSettings::default()
            .with_max_subdivisions(1)
            .with_tolerances(0.0, 0.0)
            .with_policy(QuadraturePolicy::Permissive);
        assert_eq!(m0(50.0, &tight).unwrap(), 0.0);
        assert_eq!(m1(50.0, &tight).unwrap(), 0.0);
        assert_eq!(integral_of_m0(0.0, 50.0, &tight).unwrap(), 0.0);
    }
}
