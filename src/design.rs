//! TOML design files.
//!
//! A design describes one phase: the core leg, optional calculation
//! settings, and the coils with their axial sections.
//!
//! ```toml
//! [core]
//! radius = 0.2415
//! window_height = 1.26
//! window_multiplier = 2.5   # optional
//!
//! [settings]                # optional, every key defaults
//! harmonics = 200
//!
//! [[coil]]
//! name = "LV"
//! direction = -1
//! inner_radius = 0.26035
//! outer_radius = 0.30128
//! rated_current = 801.3
//! [[coil.section]]
//! z_min = 0.0889
//! z_max = 1.1309
//! turns = 64
//!
//! [[coil]]
//! name = "HV"
//! inner_radius = 0.33938
//! outer_radius = 0.38448
//! rated_current = 83.67
//! discs = 60                # generated sections instead of a list
//! gap = 0.004
//! z_min = 0.0889
//! z_max = 1.1309
//! turns = 613
//! ```

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{RabinError, Result};
use crate::geometry::{
    CoilParams, Core, CurrentDirection, Section, SectionIdAllocator, DEFAULT_WINDOW_MULTIPLIER,
};
use crate::inductance::CalculationSettings;
use crate::phase::Phase;

/// A whole design file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Design {
    pub core: CoreSpec,
    #[serde(default)]
    pub settings: CalculationSettings,
    #[serde(rename = "coil", default)]
    pub coils: Vec<CoilSpec>,
}

/// `[core]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreSpec {
    pub radius: f64,
    pub window_height: f64,
    #[serde(default = "default_window_multiplier")]
    pub window_multiplier: f64,
}

fn default_window_multiplier() -> f64 {
    DEFAULT_WINDOW_MULTIPLIER
}

/// One `[[coil]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoilSpec {
    pub name: String,
    #[serde(default)]
    pub direction: CurrentDirection,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub rated_current: f64,
    #[serde(flatten)]
    pub layout: SectionLayout,
}

/// How a coil's sections are given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionLayout {
    /// Explicit `[[coil.section]]` entries
    Explicit {
        #[serde(rename = "section")]
        sections: Vec<SectionSpec>,
    },
    /// `discs` equal discs separated by `gap` over `[z_min, z_max]`
    Discs {
        discs: usize,
        #[serde(default)]
        gap: f64,
        z_min: f64,
        z_max: f64,
        turns: f64,
    },
}

/// One `[[coil.section]]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionSpec {
    pub z_min: f64,
    pub z_max: f64,
    pub turns: f64,
}

impl Design {
    /// Parse a design from TOML text.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Read and parse a design file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RabinError::FileError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Build the phase: core, coils in file order, sections numbered in file
    /// order.
    pub fn build(&self) -> Result<Phase> {
        if self.coils.is_empty() {
            return Err(RabinError::design("design has no [[coil]] tables"));
        }

        let core = Core::with_window_multiplier(
            self.core.radius,
            self.core.window_height,
            self.core.window_multiplier,
        )?;
        let mut phase = Phase::new(core, self.settings.clone())?;

        for spec in &self.coils {
            let sections = spec.sections(&mut phase)?;
            debug!("Design coil '{}': {} sections", spec.name, sections.len());
            phase.add_coil(spec.params(), sections)?;
        }
        Ok(phase)
    }
}

impl CoilSpec {
    fn params(&self) -> CoilParams {
        CoilParams::new(
            self.name.clone(),
            self.inner_radius,
            self.outer_radius,
            self.rated_current,
        )
        .with_direction(self.direction)
    }

    fn sections(&self, phase: &mut Phase) -> Result<Vec<Section>> {
        match &self.layout {
            SectionLayout::Explicit { sections } => sections
                .iter()
                .map(|s| phase.new_section(s.z_min, s.z_max, s.turns))
                .collect(),
            SectionLayout::Discs {
                discs,
                gap,
                z_min,
                z_max,
                turns,
            } => {
                if *discs == 0 {
                    return Err(RabinError::design(format!("coil '{}' needs at least one disc", self.name)));
                }
                // the envelope only carries the extent; its id is thrown away
                let envelope = Section::new(&mut SectionIdAllocator::new(), *z_min, *z_max, *turns)?;
                envelope.split(*discs, *gap, phase.ids_mut())
            }
        }
    }
}

/// Load a design file and build its phase.
pub fn load_phase(path: &Path) -> Result<Phase> {
    Design::load(path)?.build()
}
