//! Inductance matrix assembly for one phase.
//!
//! A [`Phase`] owns the coils on one core leg, numbers every section as a
//! matrix row, and caches the section inductance matrix. The cache is
//! explicit: anything that changes the section composition marks the phase
//! dirty and drops the matrix, and the next request rebuilds it.
//!
//! The matrix is per ampere of coil current, so it does not depend on the
//! coils' rated currents or directions; energy and reactance read those live.

mod validation;

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{RabinError, Result};
use crate::geometry::{
    validate_coil_pair, Coil, CoilId, CoilParams, Core, CurrentDirection, Section, SectionId,
    SectionIdAllocator,
};
use crate::inductance::CalculationSettings;
use crate::matrix::Matrix;

pub use validation::ValidationStatus;
use validation::BackgroundValidation;

/// Where a matrix row lives: coil position and section id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowLocation {
    coil: usize,
    section: SectionId,
}

/// All coils on one core leg and their section inductance matrix.
#[derive(Debug)]
pub struct Phase {
    core: Arc<Core>,
    settings: CalculationSettings,
    coils: Vec<Coil>,
    ids: SectionIdAllocator,
    dirty: bool,
    rows: Vec<RowLocation>,
    section_index: HashMap<SectionId, usize>,
    matrix: Option<Matrix<f64>>,
    validation: BackgroundValidation,
}

impl Phase {
    /// Create an empty phase on `core`.
    pub fn new(core: Core, settings: CalculationSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            core: Arc::new(core),
            settings,
            coils: Vec::new(),
            ids: SectionIdAllocator::new(),
            dirty: true,
            rows: Vec::new(),
            section_index: HashMap::new(),
            matrix: None,
            validation: BackgroundValidation::idle(),
        })
    }

    /// The core leg.
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// Calculation settings shared by all coils.
    pub fn settings(&self) -> &CalculationSettings {
        &self.settings
    }

    /// Coils in insertion order.
    pub fn coils(&self) -> &[Coil] {
        &self.coils
    }

    /// Find a coil by id.
    pub fn coil(&self, id: CoilId) -> Result<&Coil> {
        self.coils
            .iter()
            .find(|c| c.id() == id)
            .ok_or(RabinError::CoilNotFound { coil: id.0 })
    }

    fn coil_position(&self, id: CoilId) -> Result<usize> {
        self.coils
            .iter()
            .position(|c| c.id() == id)
            .ok_or(RabinError::CoilNotFound { coil: id.0 })
    }

    /// All sections with their coils, coil by coil in axial order.
    pub fn sections(&self) -> impl Iterator<Item = (&Coil, &Section)> {
        self.coils
            .iter()
            .flat_map(|coil| coil.sections().iter().map(move |s| (coil, s)))
    }

    /// Total number of sections (matrix order).
    pub fn section_count(&self) -> usize {
        self.coils.iter().map(|c| c.sections().len()).sum()
    }

    /// Section id allocator, for building sections outside [`new_section`](Self::new_section).
    pub fn ids_mut(&mut self) -> &mut SectionIdAllocator {
        &mut self.ids
    }

    /// Create a detached section with the next id.
    pub fn new_section(&mut self, z_min: f64, z_max: f64, turns: f64) -> Result<Section> {
        Section::new(&mut self.ids, z_min, z_max, turns)
    }

    /// Build a coil from `params` and `sections` and add it to the phase.
    pub fn add_coil(&mut self, params: CoilParams, sections: Vec<Section>) -> Result<CoilId> {
        let id = CoilId(self.coils.iter().map(|c| c.id().0 + 1).max().unwrap_or(0));
        let coil = Coil::new(id, params, sections, Arc::clone(&self.core), &self.settings)?;
        for other in &self.coils {
            validate_coil_pair(&coil, other, self.settings.radial_tolerance)?;
        }

        debug!("Added coil '{}' ({}) with {} sections", coil.name(), id, coil.sections().len());
        self.coils.push(coil);
        self.invalidate();
        Ok(id)
    }

    /// Replace a section by `count` discs separated by `gap`.
    pub fn split_section(&mut self, id: SectionId, count: usize, gap: f64) -> Result<Vec<SectionId>> {
        let coil = self
            .coils
            .iter_mut()
            .find(|c| c.section(id).is_some())
            .ok_or(RabinError::SectionNotFound { section: id.0 })?;

        let children = coil.split_section(id, count, gap, &mut self.ids)?;
        debug!("Split section {} into {} sections", id, children.len());
        self.invalidate();
        Ok(children)
    }

    /// Change a coil's rated current; the matrix stays valid.
    pub fn set_coil_current(&mut self, id: CoilId, current: f64) -> Result<()> {
        let position = self.coil_position(id)?;
        self.coils[position].set_rated_current(current)
    }

    /// Change a coil's current direction; the matrix stays valid.
    pub fn set_coil_direction(&mut self, id: CoilId, direction: CurrentDirection) -> Result<()> {
        let position = self.coil_position(id)?;
        self.coils[position].set_direction(direction);
        Ok(())
    }

    /// The same phase with a different window multiplier.
    ///
    /// Every coil gets a new coefficient table and every section a new
    /// spectrum; the returned phase has no matrix yet.
    pub fn with_window_multiplier(&self, multiplier: f64) -> Result<Phase> {
        let core = Arc::new(self.core.rescaled(multiplier)?);
        let coils = self
            .coils
            .iter()
            .map(|coil| coil.rebuilt_on(Arc::clone(&core)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Phase {
            core,
            settings: self.settings.clone(),
            coils,
            ids: self.ids.clone(),
            dirty: true,
            rows: Vec::new(),
            section_index: HashMap::new(),
            matrix: None,
            validation: BackgroundValidation::idle(),
        })
    }

    /// Check if the matrix must be rebuilt.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop the cached matrix, index and validation.
    pub fn invalidate(&mut self) {
        self.dirty = true;
        self.rows.clear();
        self.section_index.clear();
        self.matrix = None;
        self.validation = BackgroundValidation::idle();
    }

    /// The cached matrix, if the phase is clean.
    pub fn inductance_matrix(&self) -> Option<&Matrix<f64>> {
        if self.dirty {
            None
        } else {
            self.matrix.as_ref()
        }
    }

    /// Build the matrix if the phase is dirty and return it.
    ///
    /// Entry `(i, j)` is the inductance (H) between the sections on rows `i`
    /// and `j` per ampere of their coils' currents. Pairs are evaluated in
    /// parallel; a positive-definiteness check is started in the background
    /// and never blocks this call.
    pub fn build_inductance_matrix(&mut self) -> Result<&Matrix<f64>> {
        if self.dirty || self.matrix.is_none() {
            self.rebuild()?;
        }
        self.matrix.as_ref().ok_or(RabinError::EmptyPhase)
    }

    /// Invalidate and rebuild.
    pub fn recalculate_inductance_matrix(&mut self) -> Result<&Matrix<f64>> {
        self.invalidate();
        self.build_inductance_matrix()
    }

    fn rebuild(&mut self) -> Result<()> {
        self.invalidate();

        let rows: Vec<RowLocation> = self
            .coils
            .iter()
            .enumerate()
            .flat_map(|(coil, c)| {
                c.sections().iter().map(move |s| RowLocation {
                    coil,
                    section: s.id(),
                })
            })
            .collect();
        if rows.is_empty() {
            return Err(RabinError::EmptyPhase);
        }

        let order = rows.len();
        let pairs: Vec<(usize, usize)> = (0..order).flat_map(|i| (i..order).map(move |j| (i, j))).collect();
        debug!("Building {}x{} inductance matrix ({} pairs)", order, order, pairs.len());

        let values = pairs
            .par_iter()
            .map(|&(i, j)| -> Result<(usize, usize, f64)> {
                let (coil_i, section_i) = self.locate(rows[i])?;
                let value = if i == j {
                    section_i.self_inductance(coil_i)?
                } else {
                    let (coil_j, section_j) = self.locate(rows[j])?;
                    section_i.mutual_inductance_to(coil_i, section_j, coil_j)?
                };
                Ok((i, j, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut matrix = Matrix::new(order, order);
        for (i, j, value) in values {
            matrix.set_symmetric(i, j, value)?;
        }

        self.section_index = rows.iter().enumerate().map(|(row, loc)| (loc.section, row)).collect();
        self.rows = rows;
        self.validation = BackgroundValidation::spawn(matrix.clone());
        self.matrix = Some(matrix);
        self.dirty = false;
        info!("Built {}x{} inductance matrix", order, order);
        Ok(())
    }

    fn locate(&self, location: RowLocation) -> Result<(&Coil, &Section)> {
        let coil = self
            .coils
            .get(location.coil)
            .ok_or(RabinError::SectionNotFound { section: location.section.0 })?;
        let section = coil
            .section(location.section)
            .ok_or(RabinError::SectionNotFound { section: location.section.0 })?;
        Ok((coil, section))
    }

    /// Section id → matrix row, for the current build (empty while dirty).
    pub fn section_index(&self) -> &HashMap<SectionId, usize> {
        &self.section_index
    }

    /// The coil and section on matrix row `row`.
    pub fn section_at_row(&self, row: usize) -> Result<(&Coil, &Section)> {
        let location = self.rows.get(row).copied().ok_or(RabinError::IndexOutOfBounds {
            row,
            column: row,
            rows: self.rows.len(),
            columns: self.rows.len(),
        })?;
        self.locate(location)
    }

    /// Rows belonging to a coil.
    fn rows_of(&self, id: CoilId) -> Result<Vec<usize>> {
        let position = self.coil_position(id)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, loc)| loc.coil == position)
            .map(|(row, _)| row)
            .collect())
    }

    /// Stored magnetic energy (J) at rated currents.
    ///
    /// `½ Σ M[i,i] I_i² + Σ_{i<j} M[i,j] I_i I_j s_i s_j`, where `I` and the sign
    /// `s` come from each section's coil and coils switched off are skipped.
    pub fn energy(&mut self) -> Result<f64> {
        self.build_inductance_matrix()?;
        let matrix = self.matrix.as_ref().ok_or(RabinError::EmptyPhase)?;

        let drive: Vec<Option<f64>> = self
            .rows
            .iter()
            .map(|loc| {
                let coil = &self.coils[loc.coil];
                coil.direction()
                    .is_active()
                    .then(|| coil.rated_current() * coil.direction().sign())
            })
            .collect();

        let mut energy = 0.0;
        for (i, current_i) in drive.iter().enumerate() {
            let Some(current_i) = current_i else { continue };
            energy += 0.5 * matrix.get(i, i)? * current_i * current_i;
            for (j, current_j) in drive.iter().enumerate().skip(i + 1) {
                if let Some(current_j) = current_j {
                    energy += matrix.get(i, j)? * current_i * current_j;
                }
            }
        }
        Ok(energy)
    }

    /// `2·energy / base_current²` (H).
    pub fn leakage_inductance(&mut self, base_current: f64) -> Result<f64> {
        if !(base_current.is_finite() && base_current > 0.0) {
            return Err(RabinError::settings(format!(
                "base current must be positive, got {}",
                base_current
            )));
        }
        Ok(2.0 * self.energy()? / (base_current * base_current))
    }

    /// `2π f · leakage_inductance` (Ω).
    pub fn leakage_reactance(&mut self, base_current: f64) -> Result<f64> {
        Ok(2.0 * PI * self.settings.frequency * self.leakage_inductance(base_current)?)
    }

    /// Leakage reactance in per unit of `base_va / base_current²`.
    pub fn leakage_reactance_pu(&mut self, base_va: f64, base_current: f64) -> Result<f64> {
        if !(base_va.is_finite() && base_va > 0.0) {
            return Err(RabinError::settings(format!("base VA must be positive, got {}", base_va)));
        }
        Ok(self.leakage_reactance(base_current)? * base_current * base_current / base_va)
    }

    /// Leakage inductance (H) of two opposing windings referred to `a`:
    /// `L_a + (N_a/N_b)² L_b − 2 (N_a/N_b) M_ab`, with each coil's inductance
    /// summed over its sections.
    pub fn two_winding_leakage_inductance(&mut self, a: CoilId, b: CoilId) -> Result<f64> {
        self.build_inductance_matrix()?;
        let rows_a = self.rows_of(a)?;
        let rows_b = self.rows_of(b)?;
        let ratio = self.coil(a)?.total_turns() / self.coil(b)?.total_turns();
        let matrix = self.matrix.as_ref().ok_or(RabinError::EmptyPhase)?;

        let l_a = matrix.block_sum(&rows_a, &rows_a)?;
        let l_b = matrix.block_sum(&rows_b, &rows_b)?;
        let m_ab = matrix.block_sum(&rows_a, &rows_b)?;
        Ok(l_a + ratio * ratio * l_b - 2.0 * ratio * m_ab)
    }

    /// Poll the background validation without blocking.
    pub fn validation_status(&mut self) -> ValidationStatus {
        self.validation.poll().clone()
    }

    /// Block until the background validation finishes.
    pub fn wait_for_validation(&mut self) -> ValidationStatus {
        self.validation.wait().clone()
    }

    /// The Cholesky factor of the matrix, waiting for validation if needed.
    pub fn cholesky_factor(&mut self) -> Option<&Matrix<f64>> {
        self.validation.wait();
        self.validation.factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_phase() -> Phase {
        let core = Core::with_window_multiplier(0.2415, 1.26, 2.0).unwrap();
        let settings = CalculationSettings::default().with_harmonics(30);
        let mut phase = Phase::new(core, settings).unwrap();

        let lv = vec![phase.new_section(0.1, 1.1, 60.0).unwrap()];
        phase
            .add_coil(
                CoilParams::new("LV", 0.26, 0.30, 800.0).with_direction(CurrentDirection::Negative),
                lv,
            )
            .unwrap();
        let hv = vec![phase.new_section(0.1, 1.1, 600.0).unwrap()];
        phase.add_coil(CoilParams::new("HV", 0.34, 0.38, 80.0), hv).unwrap();
        phase
    }

    #[test]
    fn test_empty_phase() {
        let core = Core::new(0.2, 1.0).unwrap();
        let mut phase = Phase::new(core, CalculationSettings::default()).unwrap();
        assert!(matches!(phase.build_inductance_matrix(), Err(RabinError::EmptyPhase)));
        assert_eq!(phase.validation_status(), ValidationStatus::NotStarted);
    }

    #[test]
    fn test_rejects_overlapping_coils() {
        let mut phase = small_phase();
        let s = vec![phase.new_section(0.1, 1.1, 10.0).unwrap()];
        let err = phase.add_coil(CoilParams::new("bad", 0.29, 0.35, 1.0), s).unwrap_err();
        assert!(matches!(err, RabinError::OverlappingCoils { .. }));
        assert_eq!(phase.coils().len(), 2);
    }

    #[test]
    fn test_matrix_is_cached_until_invalidated() {
        let mut phase = small_phase();
        assert!(phase.is_dirty());
        assert!(phase.inductance_matrix().is_none());

        let first = phase.build_inductance_matrix().unwrap().clone();
        assert!(!phase.is_dirty());
        assert_eq!(phase.inductance_matrix(), Some(&first));
        assert_eq!(phase.section_index().len(), 2);

        phase.invalidate();
        assert!(phase.inductance_matrix().is_none());
        assert!(phase.section_index().is_empty());
        assert_eq!(phase.recalculate_inductance_matrix().unwrap(), &first);
    }

    #[test]
    fn test_matrix_is_exactly_symmetric() {
        let mut phase = small_phase();
        let matrix = phase.build_inductance_matrix().unwrap();
        assert!(matrix.test_symmetry());
        assert!(matrix.get(0, 0).unwrap() > 0.0);
        assert!(matrix.get(0, 1).unwrap() > 0.0);
    }

    #[test]
    fn test_current_changes_keep_matrix() {
        let mut phase = small_phase();
        let before = phase.energy().unwrap();
        phase.set_coil_current(CoilId(0), 1600.0).unwrap();
        assert!(!phase.is_dirty());
        let after = phase.energy().unwrap();
        assert!(after != before);
        assert!(phase.set_coil_current(CoilId(0), -1.0).is_err());
        assert!(phase.set_coil_current(CoilId(9), 1.0).is_err());
    }

    #[test]
    fn test_switched_off_coil_drops_out_of_energy() {
        let mut phase = small_phase();
        phase.set_coil_direction(CoilId(0), CurrentDirection::Off).unwrap();
        let energy = phase.energy().unwrap();
        let m = phase.inductance_matrix().unwrap().get(1, 1).unwrap();
        assert_relative_eq!(energy, 0.5 * m * 80.0 * 80.0, max_relative = 1e-12);
    }

    #[test]
    fn test_split_marks_dirty_and_renumbers() {
        let mut phase = small_phase();
        phase.build_inductance_matrix().unwrap();
        let target = phase.coils()[1].sections()[0].id();

        let children = phase.split_section(target, 3, 0.01).unwrap();
        assert!(phase.is_dirty());
        assert_eq!(children.len(), 3);
        assert_eq!(phase.section_count(), 4);

        phase.build_inductance_matrix().unwrap();
        assert_eq!(phase.section_index()[&children[2]], 3);
        let (coil, section) = phase.section_at_row(2).unwrap();
        assert_eq!(coil.name(), "HV");
        assert_eq!(section.id(), children[1]);
        assert!(phase.section_at_row(4).is_err());
        assert!(phase.split_section(target, 2, 0.0).is_err());
    }

    #[test]
    fn test_background_validation() {
        let mut phase = small_phase();
        phase.build_inductance_matrix().unwrap();
        assert!(phase.wait_for_validation().is_positive_definite());
        assert!(phase.cholesky_factor().is_some());
    }

    #[test]
    fn test_leakage_requires_positive_bases() {
        let mut phase = small_phase();
        assert!(phase.leakage_inductance(0.0).is_err());
        assert!(phase.leakage_reactance_pu(-1.0, 80.0).is_err());
    }
}
