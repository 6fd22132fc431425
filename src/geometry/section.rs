//! Axially uniform current-carrying sections (discs).

use std::f64::consts::PI;

use super::{Coil, CoilId, SectionId, SectionIdAllocator};
use crate::error::{RabinError, Result};
use crate::inductance::formulas;

/// One axially uniform block of turns within a coil.
///
/// A section starts detached. Attaching it to a coil records the parent id
/// and caches its current-density spectrum per ampere of coil current, after
/// which it is read-only. Splitting produces new sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    id: SectionId,
    z_min: f64,
    z_max: f64,
    turns: f64,
    parent: Option<CoilId>,
    /// `Jn / I` for `n = 0..=harmonics`
    unit_spectrum: Option<Vec<f64>>,
}

impl Section {
    /// Create a detached section spanning `[z_min, z_max]`.
    pub fn new(ids: &mut SectionIdAllocator, z_min: f64, z_max: f64, turns: f64) -> Result<Self> {
        let id = ids.allocate();
        if !(z_min.is_finite() && z_max.is_finite() && z_min < z_max) {
            return Err(RabinError::geometry(
                id.to_string(),
                format!("axial extent [{}, {}] is empty", z_min, z_max),
            ));
        }
        if z_min < 0.0 {
            return Err(RabinError::geometry(
                id.to_string(),
                format!("z_min {} lies below the yoke", z_min),
            ));
        }
        if !(turns.is_finite() && turns > 0.0) {
            return Err(RabinError::geometry(
                id.to_string(),
                format!("turns must be positive, got {}", turns),
            ));
        }

        Ok(Self {
            id,
            z_min,
            z_max,
            turns,
            parent: None,
            unit_spectrum: None,
        })
    }

    /// Section id.
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Lower axial bound (m).
    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    /// Upper axial bound (m).
    pub fn z_max(&self) -> f64 {
        self.z_max
    }

    /// Axial height (m).
    pub fn height(&self) -> f64 {
        self.z_max - self.z_min
    }

    /// Number of turns.
    pub fn turns(&self) -> f64 {
        self.turns
    }

    /// Owning coil, if attached.
    pub fn parent(&self) -> Option<CoilId> {
        self.parent
    }

    /// Check if the harmonic spectrum has been cached.
    pub fn is_initialized(&self) -> bool {
        self.unit_spectrum.is_some()
    }

    /// Record the owning coil and cache the spectrum.
    pub(crate) fn attach(&mut self, coil: CoilId, radial_build: f64, effective_height: f64, harmonics: usize) {
        self.parent = Some(coil);
        self.unit_spectrum = Some(self.spectrum(radial_build, effective_height, harmonics));
    }

    /// Cache the spectrum for a section whose parent link is already set.
    pub fn initialize_harmonics(&mut self, coil: &Coil) -> Result<()> {
        self.check_parent(coil)?;
        let coefficients = coil.coefficients();
        self.unit_spectrum = Some(self.spectrum(
            coil.radial_build(),
            coefficients.effective_height(),
            coefficients.harmonic_count(),
        ));
        Ok(())
    }

    /// Fourier coefficients of the current density per ampere of coil current.
    fn spectrum(&self, radial_build: f64, effective_height: f64, harmonics: usize) -> Vec<f64> {
        let density = self.turns / (radial_build * self.height());
        let mut spectrum = Vec::with_capacity(harmonics + 1);
        spectrum.push(density * self.height() / effective_height);
        for n in 1..=harmonics {
            let k = n as f64 * PI / effective_height;
            let amplitude = 2.0 * density / (n as f64 * PI);
            spectrum.push(amplitude * ((k * self.z_max).sin() - (k * self.z_min).sin()));
        }
        spectrum
    }

    /// Verify that `coil` is this section's parent.
    pub fn check_parent(&self, coil: &Coil) -> Result<()> {
        match self.parent {
            None => Err(RabinError::MissingParent { section: self.id.0 }),
            Some(parent) if parent != coil.id() => Err(RabinError::ParentMismatch {
                section: self.id.0,
                coil: coil.id().0,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Cached `Jn / I` for `n = 0..=harmonics`.
    pub fn unit_spectrum(&self) -> Result<&[f64]> {
        self.unit_spectrum
            .as_deref()
            .ok_or(RabinError::HarmonicsNotInitialized { section: self.id.0 })
    }

    /// Harmonic `n` of the current density (A/m²) at the coil's rated current.
    pub fn jn(&self, n: usize, coil: &Coil) -> Result<f64> {
        self.check_parent(coil)?;
        let spectrum = self.unit_spectrum()?;
        spectrum
            .get(n)
            .map(|j| j * coil.rated_current())
            .ok_or_else(|| RabinError::settings(format!("harmonic {} beyond the {} cached", n, spectrum.len() - 1)))
    }

    /// Uniform current density `I·N / (radial build × height)` (A/m²).
    pub fn current_density(&self, coil: &Coil) -> Result<f64> {
        self.check_parent(coil)?;
        Ok(coil.rated_current() * self.turns / (coil.radial_build() * self.height()))
    }

    /// Divide into `count` equal discs separated by `gap`.
    ///
    /// Children get fresh ids and an equal share of the turns, and keep the
    /// parent link; their spectra are cached when the coil adopts them.
    pub fn split(&self, count: usize, gap: f64, ids: &mut SectionIdAllocator) -> Result<Vec<Section>> {
        if count == 0 {
            return Err(RabinError::geometry(self.id.to_string(), "cannot split into zero sections"));
        }
        if !(gap.is_finite() && gap >= 0.0) {
            return Err(RabinError::geometry(self.id.to_string(), format!("gap must be non-negative, got {}", gap)));
        }

        let disc_height = (self.height() - (count - 1) as f64 * gap) / count as f64;
        if disc_height <= 0.0 {
            return Err(RabinError::geometry(
                self.id.to_string(),
                format!("{} discs with gap {} do not fit in height {}", count, gap, self.height()),
            ));
        }

        let turns = self.turns / count as f64;
        let mut children = Vec::with_capacity(count);
        for k in 0..count {
            let z_min = self.z_min + k as f64 * (disc_height + gap);
            let z_max = if k + 1 == count { self.z_max } else { z_min + disc_height };
            let mut child = Section::new(ids, z_min, z_max, turns)?;
            child.parent = self.parent;
            children.push(child);
        }
        Ok(children)
    }

    /// Self inductance (H) of this section within `coil`.
    pub fn self_inductance(&self, coil: &Coil) -> Result<f64> {
        formulas::self_inductance(self, coil)
    }

    /// Mutual inductance (H) to `other`, owned by `other_coil`.
    pub fn mutual_inductance_to(&self, coil: &Coil, other: &Section, other_coil: &Coil) -> Result<f64> {
        formulas::mutual_inductance(self, coil, other, other_coil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_bad_geometry() {
        let mut ids = SectionIdAllocator::new();
        assert!(Section::new(&mut ids, 1.0, 1.0, 10.0).is_err());
        assert!(Section::new(&mut ids, 1.0, 0.5, 10.0).is_err());
        assert!(Section::new(&mut ids, 0.0, 1.0, 0.0).is_err());
        assert!(Section::new(&mut ids, -0.1, 1.0, 10.0).is_err());
        // failed constructions still consume ids
        assert_eq!(ids.allocated(), 4);
    }

    #[test]
    fn test_detached_section_has_no_spectrum() {
        let mut ids = SectionIdAllocator::new();
        let s = Section::new(&mut ids, 0.1, 0.5, 20.0).unwrap();
        assert!(!s.is_initialized());
        assert!(matches!(s.unit_spectrum(), Err(RabinError::HarmonicsNotInitialized { section: 0 })));
    }

    #[test]
    fn test_spectrum_reconstructs_density() {
        let mut ids = SectionIdAllocator::new();
        let mut s = Section::new(&mut ids, 0.4, 0.9, 50.0).unwrap();
        s.attach(CoilId(0), 0.05, 2.0, 400);
        let spectrum = s.unit_spectrum().unwrap();
        let density = 50.0 / (0.05 * 0.5);

        let at = |z: f64| -> f64 {
            spectrum
                .iter()
                .enumerate()
                .map(|(n, j)| j * (n as f64 * PI * z / 2.0).cos())
                .sum()
        };
        // Fourier sum converges to the density well inside, zero well outside
        assert_relative_eq!(at(0.65), density, max_relative = 1e-2);
        assert!(at(1.5).abs() < 1e-2 * density);
    }

    #[test]
    fn test_split_with_gap() {
        let mut ids = SectionIdAllocator::new();
        let mut s = Section::new(&mut ids, 0.0, 1.0, 40.0).unwrap();
        s.attach(CoilId(3), 0.05, 2.0, 10);
        let children = s.split(4, 0.02, &mut ids).unwrap();

        assert_eq!(children.len(), 4);
        assert_eq!(children[0].id(), SectionId(1));
        assert!(children.iter().all(|c| c.parent() == Some(CoilId(3)) && !c.is_initialized()));
        assert_relative_eq!(children[0].height(), (1.0 - 3.0 * 0.02) / 4.0, max_relative = 1e-12);
        assert_relative_eq!(children[1].z_min() - children[0].z_max(), 0.02, max_relative = 1e-9);
        assert_eq!(children[3].z_max(), 1.0);
        assert_relative_eq!(children.iter().map(|c| c.turns()).sum::<f64>(), 40.0);
    }

    #[test]
    fn test_split_rejects_oversized_gap() {
        let mut ids = SectionIdAllocator::new();
        let s = Section::new(&mut ids, 0.0, 0.1, 10.0).unwrap();
        assert!(s.split(5, 0.05, &mut ids).is_err());
        assert!(s.split(0, 0.0, &mut ids).is_err());
    }
}
