//! Log-domain scaled arithmetic.
//!
//! A [`ScaledNumber`] stores a value as a list of terms
//!
//! ```text
//! value = Σ exp(scale_i) · coefficient_i
//! ```
//!
//! Addition and subtraction only concatenate term lists, multiplication forms
//! the cross product of terms, and nothing is exponentiated until
//! [`ScaledNumber::reduce`] is called. Reduction repeatedly combines the two
//! largest terms, so terms that grow like `e^x` and `e^-x` meet their
//! comparably-sized partners before any of them is turned into a plain `f64`.
//! Terms that are bit-for-bit equal and opposite cancel exactly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::error::{RabinError, Result};

/// Beyond this difference in natural-log magnitude the smaller of two terms
/// cannot change the larger one in double precision.
const NEGLIGIBLE_SCALE_GAP: f64 = 40.0;

/// One `exp(scale) · coefficient` term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledTerm {
    /// Natural-log scale
    pub scale: f64,
    /// Multiplier applied to `exp(scale)`
    pub coefficient: f64,
}

impl ScaledTerm {
    /// Create a new term.
    pub fn new(scale: f64, coefficient: f64) -> Self {
        Self { scale, coefficient }
    }

    /// Fold the coefficient magnitude into the scale, leaving a unit coefficient.
    fn normalized(self) -> Option<HeapTerm> {
        if self.coefficient == 0.0 {
            return None;
        }
        let scale = self.scale + self.coefficient.abs().ln();
        if scale == f64::NEG_INFINITY {
            return None;
        }
        Some(HeapTerm {
            scale,
            sign: self.coefficient.signum(),
        })
    }
}

/// Normalized term ordered by scale (largest first out of the heap).
#[derive(Debug, Clone, Copy)]
struct HeapTerm {
    scale: f64,
    sign: f64,
}

impl PartialEq for HeapTerm {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapTerm {}

impl PartialOrd for HeapTerm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapTerm {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scale
            .total_cmp(&other.scale)
            .then_with(|| self.sign.total_cmp(&other.sign))
    }
}

/// A real number held as a deferred sum of log-scaled terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaledNumber {
    terms: Vec<ScaledTerm>,
}

impl ScaledNumber {
    /// An empty term list (value zero).
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// The canonical zero: a single term with a zero coefficient.
    pub fn zero() -> Self {
        Self::from_term(0.0, 0.0)
    }

    /// The unit value `exp(0) · 1`.
    pub fn one() -> Self {
        Self::from_term(0.0, 1.0)
    }

    /// A single `exp(scale) · coefficient` term.
    pub fn from_term(scale: f64, coefficient: f64) -> Self {
        Self {
            terms: vec![ScaledTerm::new(scale, coefficient)],
        }
    }

    /// Build from an arbitrary list of terms.
    pub fn from_terms(terms: impl IntoIterator<Item = ScaledTerm>) -> Self {
        Self {
            terms: terms.into_iter().collect(),
        }
    }

    /// The raw terms.
    pub fn terms(&self) -> &[ScaledTerm] {
        &self.terms
    }

    /// Number of stored terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True when no terms are stored.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True when every stored coefficient is zero.
    pub fn is_zero(&self) -> bool {
        self.terms.iter().all(|t| t.coefficient == 0.0)
    }

    /// Multiply every coefficient by `scalar`.
    pub fn scaled_by(&self, scalar: f64) -> Self {
        if scalar == 0.0 {
            return Self::zero();
        }
        Self {
            terms: self
                .terms
                .iter()
                .map(|t| ScaledTerm::new(t.scale, t.coefficient * scalar))
                .collect(),
        }
    }

    /// Append another value's terms.
    pub fn absorb(&mut self, other: ScaledNumber) {
        self.terms.extend(other.terms);
    }

    /// Collapse the term list into an ordinary `f64`.
    ///
    /// The two largest terms are combined at the smaller of their two scales,
    /// `s_min + ln|exp(s_max - s_min)·c_max + c_min|`, and the result is put
    /// back until one term remains. Returns an error if the result is NaN or
    /// overflows.
    pub fn reduce(&self) -> Result<f64> {
        let mut heap: BinaryHeap<HeapTerm> = self
            .terms
            .iter()
            .filter_map(|t| t.normalized())
            .collect();

        while heap.len() > 1 {
            let (Some(a), Some(b)) = (heap.pop(), heap.pop()) else {
                break;
            };

            let gap = a.scale - b.scale;
            if gap > NEGLIGIBLE_SCALE_GAP {
                heap.push(a);
                continue;
            }

            let combined = gap.exp() * a.sign + b.sign;
            if combined == 0.0 {
                continue;
            }

            heap.push(HeapTerm {
                scale: b.scale + combined.abs().ln(),
                sign: combined.signum(),
            });
        }

        let value = match heap.pop() {
            Some(last) => last.sign * last.scale.exp(),
            None => 0.0,
        };

        if value.is_nan() {
            return Err(RabinError::precision("reduction produced NaN"));
        }
        if value.is_infinite() {
            return Err(RabinError::precision("reduction overflowed"));
        }

        Ok(value)
    }
}

impl From<f64> for ScaledNumber {
    fn from(x: f64) -> Self {
        if x == 0.0 {
            Self::zero()
        } else {
            Self::from_term(x.abs().ln(), x.signum())
        }
    }
}

impl Add for ScaledNumber {
    type Output = ScaledNumber;

    fn add(mut self, rhs: ScaledNumber) -> ScaledNumber {
        self.terms.extend(rhs.terms);
        self
    }
}

impl Add for &ScaledNumber {
    type Output = ScaledNumber;

    fn add(self, rhs: &ScaledNumber) -> ScaledNumber {
        let mut terms = Vec::with_capacity(self.len() + rhs.len());
        terms.extend_from_slice(&self.terms);
        terms.extend_from_slice(&rhs.terms);
        ScaledNumber { terms }
    }
}

impl AddAssign for ScaledNumber {
    fn add_assign(&mut self, rhs: ScaledNumber) {
        self.absorb(rhs);
    }
}

impl Neg for ScaledNumber {
    type Output = ScaledNumber;

    fn neg(self) -> ScaledNumber {
        ScaledNumber {
            terms: self
                .terms
                .into_iter()
                .map(|t| ScaledTerm::new(t.scale, -t.coefficient))
                .collect(),
        }
    }
}

impl Neg for &ScaledNumber {
    type Output = ScaledNumber;

    fn neg(self) -> ScaledNumber {
        -self.clone()
    }
}

impl Sub for ScaledNumber {
    type Output = ScaledNumber;

    fn sub(self, rhs: ScaledNumber) -> ScaledNumber {
        self + (-rhs)
    }
}

impl Sub for &ScaledNumber {
    type Output = ScaledNumber;

    fn sub(self, rhs: &ScaledNumber) -> ScaledNumber {
        self + &(-rhs)
    }
}

impl Mul for &ScaledNumber {
    type Output = ScaledNumber;

    fn mul(self, rhs: &ScaledNumber) -> ScaledNumber {
        let mut terms = Vec::with_capacity(self.len() * rhs.len());
        for a in &self.terms {
            for b in &rhs.terms {
                let coefficient = a.coefficient * b.coefficient;
                if coefficient != 0.0 {
                    terms.push(ScaledTerm::new(a.scale + b.scale, coefficient));
                }
            }
        }
        ScaledNumber { terms }
    }
}

impl Mul for ScaledNumber {
    type Output = ScaledNumber;

    fn mul(self, rhs: ScaledNumber) -> ScaledNumber {
        &self * &rhs
    }
}

impl Mul<&ScaledNumber> for f64 {
    type Output = ScaledNumber;

    fn mul(self, rhs: &ScaledNumber) -> ScaledNumber {
        rhs.scaled_by(self)
    }
}

impl Mul<ScaledNumber> for f64 {
    type Output = ScaledNumber;

    fn mul(self, rhs: ScaledNumber) -> ScaledNumber {
        rhs.scaled_by(self)
    }
}
