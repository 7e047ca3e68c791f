//! Approximate-answer oracle
//!
//! Decides whether a candidate answer is an acceptable approximation of the
//! reference answer. The check is one-sided: the candidate is rejected only
//! when it overshoots the ceiling `reference * (1 + tolerance)`. Any answer at
//! or below the ceiling passes, including answers below the reference.
//!
//! The comparison is carried out in integers. For a tolerance `p/q` the
//! candidate `c` overshoots the reference `r` iff `(c - r) * q > r * p`, which
//! for integer `c - r` is the same as `c - r > floor(r * p / q)`. Both sides
//! fit in `i128` for every `i64` answer, so there is no overflow and no
//! rounding.

mod tolerance;

pub use tolerance::{Ratio, Tolerance, ToleranceMode, SAMPLE_BITS};

/// A tolerance the oracle can check against.
pub trait ToleranceBound {
    /// `true` when `candidate > reference * (1 + self)`.
    fn exceeded_by(&self, reference: i64, candidate: i64) -> bool;
}

impl ToleranceBound for Ratio {
    fn exceeded_by(&self, reference: i64, candidate: i64) -> bool {
        let overshoot = i128::from(candidate) - i128::from(reference);
        let allowed = (i128::from(reference) * i128::from(self.numerator()))
            .div_euclid(i128::from(self.denominator()));
        overshoot > allowed
    }
}

/// Floats are checked against their exact binary value.
///
/// Values outside `[0, 1)` have no ratio form and fall back to a plain float
/// comparison.
impl ToleranceBound for f64 {
    fn exceeded_by(&self, reference: i64, candidate: i64) -> bool {
        match Ratio::from_f64(*self) {
            Ok(ratio) => ratio.exceeded_by(reference, candidate),
            Err(_) => candidate as f64 > reference as f64 * (1.0 + *self),
        }
    }
}

impl ToleranceBound for Tolerance {
    fn exceeded_by(&self, reference: i64, candidate: i64) -> bool {
        match self {
            Tolerance::Float(value) => value.exceeded_by(reference, candidate),
            Tolerance::Exact(ratio) => ratio.exceeded_by(reference, candidate),
        }
    }
}

/// `true` when the candidate answer is within tolerance of the reference.
pub fn accepts<T: ToleranceBound + ?Sized>(reference: i64, candidate: i64, tolerance: &T) -> bool {
    !tolerance.exceeded_by(reference, candidate)
}

/// Ceiling `reference * (1 + tolerance)` as a float, for display only.
pub fn ceiling(reference: i64, tolerance: &Tolerance) -> f64 {
    reference as f64 * (1.0 + tolerance.as_f64())
}

/// Parse a program answer: one integer, surrounding whitespace ignored.
pub fn parse_answer(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
