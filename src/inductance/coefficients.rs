//! Per-coil harmonic shape functions.
//!
//! For harmonic `n` the axial wavenumber is `m = nπ / L`, with `L` the
//! effective window height. With `xc = m·r_core` and a region spanning
//! `[x1, x2] = [m·r_lo, m·r_hi]`:
//!
//! ```text
//! Cn  = ∫_{x1}^{x2} t K1(t) dt
//! Dn  = (I0(xc) / K0(xc)) · Cn
//! En  = ∫_0^{x2} t K1(t) dt
//! Fn  = Dn − ∫_0^{x1} t I1(t) dt
//! Gn  = Dn + ∫_{x1}^{x2} t I1(t) dt
//! I1n = ∫_{x1}^{x2} t I1(t) dt
//! L1n = ∫_{x1}^{x2} t L1(t) dt
//! ```
//!
//! `Dn` carries the core boundary condition (zero tangential `H` on an
//! infinitely permeable leg); the ratio `I0/K0` is held as the single term
//! `exp(2xc) · I0e(xc)/K0e(xc)`.

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::error::Result;
use crate::geometry::{Core, Region};
use crate::numeric::bessel::{i0e, k0e};
use crate::numeric::special::{integral_of_t_i1, integral_of_t_k1, integral_of_t_l1};
use crate::numeric::{QuadratureSettings, ScaledNumber};

use super::CalculationSettings;

/// Shape functions of one harmonic in one region.
#[derive(Debug, Clone)]
pub struct HarmonicTerms {
    pub c: ScaledNumber,
    pub d: ScaledNumber,
    pub e: ScaledNumber,
    pub f: ScaledNumber,
    pub g: ScaledNumber,
    pub integral_i1: ScaledNumber,
    pub integral_l1: ScaledNumber,
}

impl HarmonicTerms {
    fn compute(
        wavenumber: f64,
        core_radius: f64,
        lower: f64,
        upper: f64,
        quadrature: &QuadratureSettings,
    ) -> Result<Self> {
        let xc = wavenumber * core_radius;
        let x1 = wavenumber * lower;
        let x2 = wavenumber * upper;

        let c = integral_of_t_k1(x1, x2, quadrature)?;
        let core_ratio = ScaledNumber::from_term(2.0 * xc, i0e(xc) / k0e(xc));
        let d = &core_ratio * &c;
        let integral_i1 = integral_of_t_i1(x1, x2, quadrature)?;
        let f = &d - &integral_of_t_i1(0.0, x1, quadrature)?;
        let g = &d + &integral_i1;
        let e = integral_of_t_k1(0.0, x2, quadrature)?;
        let integral_l1 = integral_of_t_l1(x1, x2, quadrature)?;

        Ok(Self {
            c,
            d,
            e,
            f,
            g,
            integral_i1,
            integral_l1,
        })
    }
}

/// Shape functions of every harmonic in one radial region.
#[derive(Debug, Clone)]
pub struct RegionCoefficients {
    region: Region,
    lower: f64,
    upper: f64,
    /// Index `n − 1`
    terms: Vec<HarmonicTerms>,
}

impl RegionCoefficients {
    /// Which region this is.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Radial extent `(lower, upper)` (m).
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Terms of harmonic `n` (1-based).
    pub fn harmonic(&self, n: usize) -> &HarmonicTerms {
        &self.terms[n - 1]
    }

    /// All harmonics, starting at `n = 1`.
    pub fn terms(&self) -> &[HarmonicTerms] {
        &self.terms
    }
}

/// Shape functions of a coil: `[region][n]`.
#[derive(Debug, Clone)]
pub struct HarmonicCoefficients {
    effective_height: f64,
    harmonics: usize,
    regions: Vec<RegionCoefficients>,
}

impl HarmonicCoefficients {
    /// Compute the table for a coil spanning `[inner_radius, outer_radius]`.
    ///
    /// Harmonics are evaluated in parallel; each is independent.
    pub fn compute(
        core: &Core,
        inner_radius: f64,
        outer_radius: f64,
        settings: &CalculationSettings,
    ) -> Result<Self> {
        let effective_height = core.effective_window_height();
        let bounds = [
            (Region::CoreGap, core.radius(), inner_radius),
            (Region::Coil, inner_radius, outer_radius),
            (Region::TankGap, outer_radius, outer_radius + settings.tank_standoff),
        ];

        let mut regions = Vec::with_capacity(bounds.len());
        for (region, lower, upper) in bounds {
            let terms = (1..=settings.harmonics)
                .into_par_iter()
                .map(|n| {
                    let m = n as f64 * PI / effective_height;
                    HarmonicTerms::compute(m, core.radius(), lower, upper, &settings.quadrature)
                })
                .collect::<Result<Vec<_>>>()?;
            regions.push(RegionCoefficients {
                region,
                lower,
                upper,
                terms,
            });
        }

        Ok(Self {
            effective_height,
            harmonics: settings.harmonics,
            regions,
        })
    }

    /// Effective window height `L` used for the wavenumbers (m).
    pub fn effective_height(&self) -> f64 {
        self.effective_height
    }

    /// Number of harmonics `Nmax`.
    pub fn harmonic_count(&self) -> usize {
        self.harmonics
    }

    /// Axial wavenumber `m = nπ / L` (1/m).
    pub fn wavenumber(&self, n: usize) -> f64 {
        n as f64 * PI / self.effective_height
    }

    /// Coefficients of one region.
    pub fn region(&self, region: Region) -> &RegionCoefficients {
        &self.regions[region.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> HarmonicCoefficients {
        let core = Core::with_window_multiplier(0.2415, 1.26, 2.5).unwrap();
        let settings = CalculationSettings::default().with_harmonics(40);
        HarmonicCoefficients::compute(&core, 0.26035, 0.30128, &settings).unwrap()
    }

    #[test]
    fn test_table_shape() {
        let t = table();
        assert_eq!(t.harmonic_count(), 40);
        for region in Region::ALL {
            assert_eq!(t.region(region).terms().len(), 40);
        }
        assert_eq!(t.region(Region::TankGap).bounds(), (0.30128, 0.30128 + 0.15));
        assert_relative_eq!(t.wavenumber(2), 2.0 * PI / 3.15, max_relative = 1e-15);
    }

    #[test]
    fn test_derived_coefficients_are_consistent() {
        let t = table();
        for n in [1, 17, 40] {
            let h = t.region(Region::Coil).harmonic(n);
            let f = h.f.reduce().unwrap();
            let g = h.g.reduce().unwrap();
            let i1 = h.integral_i1.reduce().unwrap();
            let d = h.d.reduce().unwrap();
            assert_relative_eq!(g - d, i1, max_relative = 1e-9);
            assert!(f < d, "F subtracts a positive integral");
            assert!(h.c.reduce().unwrap() > 0.0);
            assert!(h.e.reduce().unwrap() > h.c.reduce().unwrap());
        }
    }

    #[test]
    fn test_regions_partition_the_k1_integral() {
        // ∫ from the core to the tank = sum over the three regions
        let t = table();
        let n = 5;
        let m = t.wavenumber(n);
        let total = integral_of_t_k1(m * 0.2415, m * 0.45128, &QuadratureSettings::default())
            .unwrap()
            .reduce()
            .unwrap();
        let parts: f64 = Region::ALL
            .iter()
            .map(|&r| t.region(r).harmonic(n).c.reduce().unwrap())
            .sum();
        assert_relative_eq!(total, parts, max_relative = 1e-10);
    }
}
