//! Coils (windings) and their harmonic coefficient tables.

use std::sync::Arc;

use log::debug;

use super::validate::{validate_coil_params, validate_sections};
use super::{CoilId, CoilParams, Core, CurrentDirection, Region, Section, SectionId, SectionIdAllocator};
use crate::error::{RabinError, Result};
use crate::inductance::{field, CalculationSettings, HarmonicCoefficients};

/// A cylindrical winding on the core leg.
///
/// The coefficient table depends only on geometry and is computed once at
/// construction. A coil with different geometry is a new coil.
#[derive(Debug, Clone)]
pub struct Coil {
    id: CoilId,
    name: String,
    direction: CurrentDirection,
    inner_radius: f64,
    outer_radius: f64,
    rated_current: f64,
    /// Sorted by `z_min`
    sections: Vec<Section>,
    core: Arc<Core>,
    coefficients: Arc<HarmonicCoefficients>,
    settings: CalculationSettings,
}

impl Coil {
    /// Build a coil, compute its coefficient table and adopt `sections`.
    pub fn new(
        id: CoilId,
        params: CoilParams,
        sections: Vec<Section>,
        core: Arc<Core>,
        settings: &CalculationSettings,
    ) -> Result<Self> {
        validate_coil_params(&params, &core)?;

        let coefficients =
            HarmonicCoefficients::compute(&core, params.inner_radius, params.outer_radius, settings)?;
        debug!(
            "Coil '{}' ({}): {} harmonics over {} regions",
            params.name,
            id,
            coefficients.harmonic_count(),
            Region::ALL.len()
        );

        Self::assemble(id, params, sections, core, Arc::new(coefficients), settings.clone())
    }

    fn assemble(
        id: CoilId,
        params: CoilParams,
        mut sections: Vec<Section>,
        core: Arc<Core>,
        coefficients: Arc<HarmonicCoefficients>,
        settings: CalculationSettings,
    ) -> Result<Self> {
        for section in &sections {
            if let Some(parent) = section.parent() {
                if parent != id {
                    return Err(RabinError::ParentMismatch {
                        section: section.id().0,
                        coil: id.0,
                    });
                }
            }
        }

        sections.sort_by(|a, b| a.z_min().total_cmp(&b.z_min()));
        validate_sections(&params.name, &sections, &core)?;

        let radial_build = params.outer_radius - params.inner_radius;
        for section in &mut sections {
            section.attach(
                id,
                radial_build,
                coefficients.effective_height(),
                coefficients.harmonic_count(),
            );
        }

        Ok(Self {
            id,
            name: params.name,
            direction: params.direction,
            inner_radius: params.inner_radius,
            outer_radius: params.outer_radius,
            rated_current: params.rated_current,
            sections,
            core,
            coefficients,
            settings,
        })
    }

    /// The same coil on a different core, with a freshly computed table.
    pub fn rebuilt_on(&self, core: Arc<Core>) -> Result<Self> {
        let sections = self.sections.clone();
        Self::new(self.id, self.params(), sections, core, &self.settings)
    }

    /// The coil's user-facing parameters.
    pub fn params(&self) -> CoilParams {
        CoilParams {
            name: self.name.clone(),
            direction: self.direction,
            inner_radius: self.inner_radius,
            outer_radius: self.outer_radius,
            rated_current: self.rated_current,
        }
    }

    /// Coil id.
    pub fn id(&self) -> CoilId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current sense.
    pub fn direction(&self) -> CurrentDirection {
        self.direction
    }

    /// Inner radius (m).
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    /// Outer radius (m).
    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }

    /// `outer_radius − inner_radius` (m).
    pub fn radial_build(&self) -> f64 {
        self.outer_radius - self.inner_radius
    }

    /// Rated current (A).
    pub fn rated_current(&self) -> f64 {
        self.rated_current
    }

    /// Sum of section turns.
    pub fn total_turns(&self) -> f64 {
        self.sections.iter().map(Section::turns).sum()
    }

    /// Sections in axial order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Find a section by id.
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id() == id)
    }

    /// The shared core.
    pub fn core(&self) -> &Arc<Core> {
        &self.core
    }

    /// Precomputed harmonic coefficients.
    pub fn coefficients(&self) -> &HarmonicCoefficients {
        &self.coefficients
    }

    /// Settings the coefficient table was built with.
    pub fn settings(&self) -> &CalculationSettings {
        &self.settings
    }

    /// Radial extent `(inner, outer)` of a region (m).
    pub fn region_bounds(&self, region: Region) -> (f64, f64) {
        self.coefficients.region(region).bounds()
    }

    /// Current-density harmonics `J0..=JN` (A/m²) of the whole coil at rated
    /// current, signed by its direction.
    pub fn current_density_harmonics(&self) -> Result<Vec<f64>> {
        let current = self.rated_current * self.direction.sign();
        let mut total = vec![0.0; self.coefficients.harmonic_count() + 1];
        for section in &self.sections {
            for (sum, j) in total.iter_mut().zip(section.unit_spectrum()?) {
                *sum += j * current;
            }
        }
        Ok(total)
    }

    pub(crate) fn set_rated_current(&mut self, current: f64) -> Result<()> {
        if !(current.is_finite() && current >= 0.0) {
            return Err(RabinError::geometry(
                format!("coil '{}'", self.name),
                format!("rated current must be non-negative, got {}", current),
            ));
        }
        self.rated_current = current;
        Ok(())
    }

    pub(crate) fn set_direction(&mut self, direction: CurrentDirection) {
        self.direction = direction;
    }

    /// Replace section `id` with `count` discs separated by `gap`.
    pub(crate) fn split_section(
        &mut self,
        id: SectionId,
        count: usize,
        gap: f64,
        ids: &mut SectionIdAllocator,
    ) -> Result<Vec<SectionId>> {
        let position = self
            .sections
            .iter()
            .position(|s| s.id() == id)
            .ok_or(RabinError::SectionNotFound { section: id.0 })?;

        let mut children = self.sections[position].split(count, gap, ids)?;
        for child in &mut children {
            child.initialize_harmonics(self)?;
        }
        let new_ids = children.iter().map(Section::id).collect();

        self.sections.splice(position..=position, children);
        Ok(new_ids)
    }

    /// Axisymmetric vector potential `A(r, z)` (Wb/m) produced by this coil
    /// alone at its rated current and direction.
    pub fn vector_potential(&self, r: f64, z: f64) -> Result<f64> {
        field::vector_potential(self, r, z)
    }

    /// Area-weighted mean of `A(r, z)` over a radial region at height `z`.
    pub fn mean_vector_potential(&self, region: Region, z: f64) -> Result<f64> {
        field::mean_vector_potential(self, region, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settings() -> CalculationSettings {
        CalculationSettings::default().with_harmonics(20)
    }

    fn core() -> Arc<Core> {
        Arc::new(Core::with_window_multiplier(0.2, 1.0, 2.0).unwrap())
    }

    fn coil(ids: &mut SectionIdAllocator) -> Coil {
        let sections = vec![
            Section::new(ids, 0.5, 0.9, 40.0).unwrap(),
            Section::new(ids, 0.1, 0.45, 60.0).unwrap(),
        ];
        Coil::new(CoilId(0), CoilParams::new("LV", 0.25, 0.3, 100.0), sections, core(), &settings()).unwrap()
    }

    #[test]
    fn test_new_sorts_and_attaches_sections() {
        let mut ids = SectionIdAllocator::new();
        let coil = coil(&mut ids);
        assert_eq!(coil.sections()[0].id(), SectionId(1));
        assert_eq!(coil.total_turns(), 100.0);
        assert_relative_eq!(coil.radial_build(), 0.05, max_relative = 1e-12);
        assert!(coil.sections().iter().all(|s| s.parent() == Some(CoilId(0)) && s.is_initialized()));
        assert_eq!(coil.region_bounds(Region::Coil), (0.25, 0.3));
    }

    #[test]
    fn test_rejects_foreign_sections() {
        let mut ids = SectionIdAllocator::new();
        let first = coil(&mut ids);
        let err = Coil::new(
            CoilId(1),
            CoilParams::new("HV", 0.35, 0.4, 10.0),
            first.sections().to_vec(),
            core(),
            &settings(),
        )
        .unwrap_err();
        assert!(matches!(err, RabinError::ParentMismatch { coil: 1, .. }));
    }

    #[test]
    fn test_rejects_overlapping_sections() {
        let mut ids = SectionIdAllocator::new();
        let sections = vec![
            Section::new(&mut ids, 0.1, 0.5, 10.0).unwrap(),
            Section::new(&mut ids, 0.4, 0.8, 10.0).unwrap(),
        ];
        let result = Coil::new(CoilId(0), CoilParams::new("LV", 0.25, 0.3, 1.0), sections, core(), &settings());
        assert!(matches!(result, Err(RabinError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_split_section_in_place() {
        let mut ids = SectionIdAllocator::new();
        let mut coil = coil(&mut ids);
        let children = coil.split_section(SectionId(0), 2, 0.0, &mut ids).unwrap();
        assert_eq!(children, vec![SectionId(2), SectionId(3)]);
        let order: Vec<_> = coil.sections().iter().map(Section::id).collect();
        assert_eq!(order, vec![SectionId(1), SectionId(2), SectionId(3)]);
        assert!(coil.sections().iter().all(Section::is_initialized));
        assert_eq!(coil.total_turns(), 100.0);
        assert!(matches!(
            coil.split_section(SectionId(0), 2, 0.0, &mut ids),
            Err(RabinError::SectionNotFound { section: 0 })
        ));
    }

    #[test]
    fn test_rebuilt_on_new_core() {
        let mut ids = SectionIdAllocator::new();
        let coil = coil(&mut ids);
        let taller = Arc::new(coil.core().rescaled(2.5).unwrap());
        let rebuilt = coil.rebuilt_on(taller).unwrap();
        assert_relative_eq!(rebuilt.coefficients().effective_height(), 2.5, max_relative = 1e-12);
        assert_eq!(rebuilt.sections().len(), 2);
        assert_ne!(
            rebuilt.sections()[0].unit_spectrum().unwrap()[1],
            coil.sections()[0].unit_spectrum().unwrap()[1]
        );
    }

    #[test]
    fn test_rated_current_must_be_non_negative() {
        let mut ids = SectionIdAllocator::new();
        let mut coil = coil(&mut ids);
        assert!(coil.set_rated_current(-5.0).is_err());
        assert!(coil.set_rated_current(f64::NAN).is_err());
        coil.set_rated_current(250.0).unwrap();
        assert_eq!(coil.rated_current(), 250.0);
    }

    #[test]
    fn test_vector_potential_is_continuous() {
        let mut ids = SectionIdAllocator::new();
        let coil = coil(&mut ids);
        for r in [coil.inner_radius(), coil.outer_radius()] {
            let below = coil.vector_potential(r * (1.0 - 1e-9), 0.3).unwrap();
            let above = coil.vector_potential(r * (1.0 + 1e-9), 0.3).unwrap();
            assert_relative_eq!(below, above, max_relative = 1e-6);
        }
        assert!(coil.vector_potential(0.1, 0.3).is_err());
    }

    #[test]
    fn test_current_density_harmonics_sum_sections() {
        let mut ids = SectionIdAllocator::new();
        let mut coil = coil(&mut ids);
        let harmonics = coil.current_density_harmonics().unwrap();
        assert_eq!(harmonics.len(), 21);
        for (n, &jn) in harmonics.iter().enumerate() {
            let expected: f64 = coil.sections().iter().map(|s| s.jn(n, &coil).unwrap()).sum();
            assert_relative_eq!(jn, expected, max_relative = 1e-12, epsilon = 1e-12);
        }
        assert!(harmonics[0] > 0.0);

        coil.set_direction(CurrentDirection::Negative);
        let reversed = coil.current_density_harmonics().unwrap();
        assert!(reversed.iter().zip(&harmonics).all(|(r, h)| *r == -h));

        coil.set_direction(CurrentDirection::Off);
        assert!(coil.current_density_harmonics().unwrap().iter().all(|&j| j == 0.0));
    }

    #[test]
    fn test_switched_off_coil_has_no_field() {
        let mut ids = SectionIdAllocator::new();
        let mut coil = coil(&mut ids);
        coil.set_direction(CurrentDirection::Off);
        assert_eq!(coil.vector_potential(0.27, 0.3).unwrap(), 0.0);
        assert_eq!(coil.mean_vector_potential(Region::Coil, 0.3).unwrap(), 0.0);
    }
}
