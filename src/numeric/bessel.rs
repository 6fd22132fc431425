//! Exponentially scaled modified Bessel functions of orders 0 and 1.
//!
//! The inductance series needs `I_ν(x)` and `K_ν(x)` for arguments up to a few
//! thousand, where `I` overflows and `K` underflows. Only the scaled forms
//!
//! ```text
//! I0e(x) = e^-x I0(x)    I1e(x) = e^-x I1(x)
//! K0e(x) = e^x  K0(x)    K1e(x) = e^x  K1(x)
//! ```
//!
//! are ever formed; the `e^±x` factor travels separately as the scale of a
//! [`ScaledNumber`](super::ScaledNumber) term.

use std::f64::consts::PI;

/// Euler–Mascheroni constant.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Switch from the power series to the asymptotic expansion for `I`.
const I_ASYMPTOTIC_THRESHOLD: f64 = 30.0;

/// Switch from the series to the continued fraction for `K`.
const K_SERIES_THRESHOLD: f64 = 2.0;

const SERIES_EPSILON: f64 = 1e-17;
const MAX_SERIES_TERMS: usize = 500;
const MAX_ASYMPTOTIC_TERMS: usize = 60;
const MAX_FRACTION_TERMS: usize = 10_000;

/// `I_ν(x)` by its power series `Σ (x/2)^(2k+ν) / (k!(k+ν)!)`, for ν ∈ {0, 1}.
fn i_series(order: u32, x: f64) -> f64 {
    let half = 0.5 * x;
    let q = half * half;
    let mut term = if order == 0 { 1.0 } else { half };
    let mut sum = term;
    if term == 0.0 {
        return 0.0;
    }
    let nu = f64::from(order);
    for k in 1..MAX_SERIES_TERMS {
        let k = k as f64;
        term *= q / (k * (k + nu));
        sum += term;
        if term < SERIES_EPSILON * sum {
            break;
        }
    }
    sum
}

/// Hankel expansion of `√(2πx) e^-x I_ν(x)` divided back out.
fn i_asymptotic(order: u32, x: f64) -> f64 {
    let mu = 4.0 * f64::from(order * order);
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..=MAX_ASYMPTOTIC_TERMS {
        let odd = (2 * k - 1) as f64;
        term *= -(mu - odd * odd) / (k as f64 * 8.0 * x);
        sum += term;
        if term.abs() < SERIES_EPSILON * sum.abs() {
            break;
        }
    }
    sum / (2.0 * PI * x).sqrt()
}

fn i_scaled(order: u32, x: f64) -> f64 {
    if x < I_ASYMPTOTIC_THRESHOLD {
        i_series(order, x) * (-x).exp()
    } else {
        i_asymptotic(order, x)
    }
}

/// `e^-x I0(x)` for `x ≥ 0`.
pub fn i0e(x: f64) -> f64 {
    i_scaled(0, x)
}

/// `e^-x I1(x)` for `x ≥ 0`.
pub fn i1e(x: f64) -> f64 {
    i_scaled(1, x)
}

/// Small-argument series for `(K0, K1)`, scaled by `e^x`.
fn k_series(x: f64) -> (f64, f64) {
    let q = 0.25 * x * x;
    let log_half = (0.5 * x).ln();

    // K0 = -(ln(x/2) + γ) I0 + Σ q^k / (k!)² H_k
    let mut term = 1.0;
    let mut harmonic = 0.0;
    let mut sum = 0.0;
    for k in 1..MAX_SERIES_TERMS {
        let kf = k as f64;
        term *= q / (kf * kf);
        harmonic += 1.0 / kf;
        let delta = term * harmonic;
        sum += delta;
        if delta < SERIES_EPSILON * sum.abs() {
            break;
        }
    }
    let k0 = -(log_half + EULER_GAMMA) * i_series(0, x) + sum;

    // K1 = 1/x + I1 ln(x/2) - (x/4) Σ (ψ(k+1) + ψ(k+2)) q^k / (k!(k+1)!)
    let mut term = 1.0;
    let mut psi_a = -EULER_GAMMA;
    let mut psi_b = 1.0 - EULER_GAMMA;
    let mut sum = psi_a + psi_b;
    for k in 1..MAX_SERIES_TERMS {
        let kf = k as f64;
        term *= q / (kf * (kf + 1.0));
        psi_a += 1.0 / kf;
        psi_b += 1.0 / (kf + 1.0);
        let delta = term * (psi_a + psi_b);
        sum += delta;
        if delta.abs() < SERIES_EPSILON * sum.abs() {
            break;
        }
    }
    let k1 = 1.0 / x + i_series(1, x) * log_half - 0.25 * x * sum;

    let growth = x.exp();
    (k0 * growth, k1 * growth)
}

/// Steed's continued fraction (Temme's variant) for `(K0e, K1e)`, `x > 2`.
fn k_continued_fraction(x: f64) -> (f64, f64) {
    let a1 = 0.25;
    let mut b = 2.0 * (1.0 + x);
    let mut d = 1.0 / b;
    let mut h = d;
    let mut delh = d;
    let mut q1 = 0.0;
    let mut q2 = 1.0;
    let mut q = a1;
    let mut c = a1;
    let mut a = -a1;
    let mut s = 1.0 + q * delh;

    for i in 2..MAX_FRACTION_TERMS {
        let fi = i as f64;
        a -= 2.0 * (fi - 1.0);
        c = -a * c / fi;
        let q_next = (q1 - b * q2) / a;
        q1 = q2;
        q2 = q_next;
        q += c * q_next;
        b += 2.0;
        d = 1.0 / (b + a * d);
        delh = (b * d - 1.0) * delh;
        h += delh;
        let dels = q * delh;
        s += dels;
        if (dels / s).abs() < 1e-16 {
            break;
        }
    }

    let h = a1 * h;
    let k0 = (PI / (2.0 * x)).sqrt() / s;
    let k1 = k0 * (x + 0.5 - h) / x;
    (k0, k1)
}

/// `(e^x K0(x), e^x K1(x))` for `x > 0`.
pub fn k_scaled(x: f64) -> (f64, f64) {
    if x <= K_SERIES_THRESHOLD {
        k_series(x)
    } else {
        k_continued_fraction(x)
    }
}

/// `e^x K0(x)` for `x > 0`.
pub fn k0e(x: f64) -> f64 {
    k_scaled(x).0
}

/// `e^x K1(x)` for `x > 0`.
pub fn k1e(x: f64) -> f64 {
    k_scaled(x).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_i_at_origin() {
        assert_eq!(i0e(0.0), 1.0);
        assert_eq!(i1e(0.0), 0.0);
    }

    #[test]
    fn test_i_reference_values() {
        // e^-x I_ν(x) from tables
        assert_relative_eq!(i0e(1.0), 0.465_759_607_593_640_5, max_relative = 1e-13);
        assert_relative_eq!(i1e(1.0), 0.207_910_415_349_708_5, max_relative = 1e-13);
        assert_relative_eq!(i0e(10.0), 0.127_833_337_163_428_6, max_relative = 1e-13);
        assert_relative_eq!(i1e(10.0), 0.121_262_681_384_455_5, max_relative = 1e-13);
    }

    #[test]
    fn test_k_reference_values() {
        // e^x K_ν(x) from tables
        assert_relative_eq!(k0e(1.0), 1.144_463_079_806_895_4, max_relative = 1e-13);
        assert_relative_eq!(k1e(1.0), 1.636_153_486_263_258_1, max_relative = 1e-13);
        assert_relative_eq!(k0e(10.0), 0.391_631_934_436_598_7, max_relative = 1e-13);
        assert_relative_eq!(k1e(10.0), 0.410_766_570_595_788_8, max_relative = 1e-13);
    }

    #[test]
    fn test_branches_agree_at_switch_points() {
        let below = k_series(K_SERIES_THRESHOLD);
        let above = k_continued_fraction(K_SERIES_THRESHOLD);
        assert_relative_eq!(below.0, above.0, max_relative = 1e-13);
        assert_relative_eq!(below.1, above.1, max_relative = 1e-13);

        let x = I_ASYMPTOTIC_THRESHOLD;
        assert_relative_eq!(i_series(0, x) * (-x).exp(), i_asymptotic(0, x), max_relative = 1e-13);
        assert_relative_eq!(i_series(1, x) * (-x).exp(), i_asymptotic(1, x), max_relative = 1e-13);
    }

    #[test]
    fn test_wronskian_holds_for_large_arguments() {
        // I0 K1 + I1 K0 = 1/x; the exponential scales cancel
        for x in [0.05, 0.7, 3.0, 25.0, 150.0, 2500.0] {
            let (k0, k1) = k_scaled(x);
            let w = i0e(x) * k1 + i1e(x) * k0;
            assert_relative_eq!(w, 1.0 / x, max_relative = 1e-13);
        }
    }
}
