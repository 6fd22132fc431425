//! Adaptive Gauss–Kronrod (7/15) quadrature.
//!
//! The interval with the largest error estimate is bisected until the summed
//! estimate meets `max(abs_tolerance, rel_tolerance·|result|)` or the
//! subdivision budget runs out.

use serde::{Deserialize, Serialize};

/// Default absolute error target.
pub const DEFAULT_ABS_TOLERANCE: f64 = 1e-12;

/// Default relative error target.
pub const DEFAULT_REL_TOLERANCE: f64 = 1e-8;

/// Default limit on the number of intervals.
pub const DEFAULT_MAX_SUBDIVISIONS: usize = 50;

// 15-point Kronrod abscissae, outermost first; odd indices are the 7-point Gauss nodes.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// What to do when an integral misses its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuadraturePolicy {
    /// Report the failure as an error.
    #[default]
    Strict,
    /// Log a warning and use zero for the integral.
    Permissive,
}

/// Tolerances and limits for the adaptive integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadratureSettings {
    /// Absolute error target
    pub abs_tolerance: f64,
    /// Relative error target
    pub rel_tolerance: f64,
    /// Maximum number of intervals
    pub max_subdivisions: usize,
    /// Behaviour on non-convergence
    pub policy: QuadraturePolicy,
}

impl Default for QuadratureSettings {
    fn default() -> Self {
        Self {
            abs_tolerance: DEFAULT_ABS_TOLERANCE,
            rel_tolerance: DEFAULT_REL_TOLERANCE,
            max_subdivisions: DEFAULT_MAX_SUBDIVISIONS,
            policy: QuadraturePolicy::Strict,
        }
    }
}

impl QuadratureSettings {
    /// Set the failure policy.
    pub fn with_policy(mut self, policy: QuadraturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the subdivision budget.
    pub fn with_max_subdivisions(mut self, max_subdivisions: usize) -> Self {
        self.max_subdivisions = max_subdivisions;
        self
    }

    /// Set both error targets.
    pub fn with_tolerances(mut self, abs_tolerance: f64, rel_tolerance: f64) -> Self {
        self.abs_tolerance = abs_tolerance;
        self.rel_tolerance = rel_tolerance;
        self
    }
}

/// Outcome of [`integrate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integral {
    /// Kronrod estimate of the integral
    pub value: f64,
    /// Summed |Kronrod − Gauss| error estimate
    pub error: f64,
    /// Number of intervals used
    pub subdivisions: usize,
    /// Whether the tolerance was met
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: f64,
    upper: f64,
    value: f64,
    error: f64,
}

fn kronrod_segment<F: Fn(f64) -> f64>(f: &F, lower: f64, upper: f64) -> Segment {
    let center = 0.5 * (lower + upper);
    let half = 0.5 * (upper - lower);
    let fc = f(center);
    let mut kronrod = fc * WGK[7];
    let mut gauss = fc * WG[3];

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = f(center - dx) + f(center + dx);
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    Segment {
        lower,
        upper,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    }
}

/// Integrate `f` over `[lower, upper]`.
///
/// Never fails outright; inspect [`Integral::converged`].
pub fn integrate<F: Fn(f64) -> f64>(
    f: F,
    lower: f64,
    upper: f64,
    settings: &QuadratureSettings,
) -> Integral {
    let mut segments = vec![kronrod_segment(&f, lower, upper)];

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();
        let target = settings.abs_tolerance.max(settings.rel_tolerance * value.abs());

        if error <= target || segments.len() >= settings.max_subdivisions.max(1) {
            return Integral {
                value,
                error,
                subdivisions: segments.len(),
                converged: error <= target,
            };
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.error.total_cmp(&b.1.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let split = segments.swap_remove(worst);
        let mid = 0.5 * (split.lower + split.upper);
        segments.push(kronrod_segment(&f, split.lower, mid));
        segments.push(kronrod_segment(&f, mid, split.upper));
    }
}
