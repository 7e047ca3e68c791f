//! Tolerance values
//!
//! A tolerance is the allowed relative overshoot of the candidate over the
//! reference, always in `[0, 1)`. It is either a plain `f64` or an exact
//! [`Ratio`]; which one is decided when the value is built.

use crate::error::{HarnessError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampled tolerances are multiples of `2^-SAMPLE_BITS`, which every `f64`
/// in `[0, 1)` of that form represents exactly.
pub const SAMPLE_BITS: u32 = 53;

/// Largest power-of-two denominator used when converting a float.
const MAX_DYADIC_SHIFT: u32 = 63;

/// Exact tolerance `numerator / denominator`, kept in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Ratio {
    numerator: u64,
    denominator: u64,
}

impl Ratio {
    /// Build a ratio in `[0, 1)`.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self> {
        if denominator == 0 {
            return Err(HarnessError::InvalidTolerance(
                "denominator must be positive".to_string(),
            ));
        }
        if numerator >= denominator {
            return Err(HarnessError::InvalidTolerance(format!(
                "{numerator}/{denominator} is not below 1"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        }
        .reduced())
    }

    /// Exact value of a float in `[0, 1)`.
    ///
    /// Floats are dyadic rationals, so this is lossless whenever the value is
    /// a multiple of `2^-63`. Smaller fractional bits are rounded to nearest.
    pub fn from_f64(value: f64) -> Result<Self> {
        check_unit_interval(value)?;
        if value == 0.0 {
            return Ok(Self::ZERO);
        }

        let (mut mantissa, mut exponent) = decompose(value);
        let zeros = mantissa.trailing_zeros();
        mantissa >>= zeros;
        exponent += zeros as i32;

        // value < 1 implies a negative exponent
        let shift = exponent.unsigned_abs();
        if shift <= MAX_DYADIC_SHIFT {
            return Ok(Self {
                numerator: mantissa,
                denominator: 1u64 << shift,
            });
        }

        let drop = shift - MAX_DYADIC_SHIFT;
        let numerator = if drop >= 64 {
            0
        } else {
            let half = 1u128 << (drop - 1);
            ((u128::from(mantissa) + half) >> drop) as u64
        };
        Ok(Self {
            numerator,
            denominator: 1u64 << MAX_DYADIC_SHIFT,
        }
        .reduced())
    }

    pub const ZERO: Ratio = Ratio {
        numerator: 0,
        denominator: 1,
    };

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Nearest float. Exact for denominators up to `2^53`.
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    fn reduced(self) -> Self {
        if self.numerator == 0 {
            return Self::ZERO;
        }
        let g = gcd(self.numerator, self.denominator);
        Self {
            numerator: self.numerator / g,
            denominator: self.denominator / g,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// How per-iteration tolerances are represented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceMode {
    /// Plain `f64` tolerance
    #[default]
    Float,
    /// Exact `numerator/denominator` tolerance
    Rational,
}

impl fmt::Display for ToleranceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToleranceMode::Float => write!(f, "float"),
            ToleranceMode::Rational => write!(f, "rational"),
        }
    }
}

/// Allowed relative overshoot for one iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    Float(f64),
    Exact(Ratio),
}

impl Tolerance {
    pub fn float(value: f64) -> Result<Self> {
        check_unit_interval(value)?;
        Ok(Self::Float(value))
    }

    pub fn exact(numerator: u64, denominator: u64) -> Result<Self> {
        Ratio::new(numerator, denominator).map(Self::Exact)
    }

    /// Draw a tolerance uniformly from `[0, 1)` on the `2^-53` grid.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, mode: ToleranceMode) -> Self {
        let scale = 1u64 << SAMPLE_BITS;
        let k = rng.gen_range(0..scale);
        match mode {
            ToleranceMode::Float => Self::Float(k as f64 / scale as f64),
            ToleranceMode::Rational => Self::Exact(
                Ratio {
                    numerator: k,
                    denominator: scale,
                }
                .reduced(),
            ),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Tolerance::Float(value) => *value,
            Tolerance::Exact(ratio) => ratio.as_f64(),
        }
    }

    pub fn mode(&self) -> ToleranceMode {
        match self {
            Tolerance::Float(_) => ToleranceMode::Float,
            Tolerance::Exact(_) => ToleranceMode::Rational,
        }
    }

    /// Text handed to the generator as `precision=<value>`.
    ///
    /// Sampled values are exact floats, so the float rendering is lossless
    /// for both variants.
    pub fn precision_arg(&self) -> String {
        format!("{}", self.as_f64())
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tolerance::Float(value) => write!(f, "{value}"),
            Tolerance::Exact(ratio) => write!(f, "{ratio} (~{})", ratio.as_f64()),
        }
    }
}

impl FromStr for Tolerance {
    type Err = HarnessError;

    /// `"0.25"` builds a float tolerance, `"1/4"` an exact one.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((num, den)) = s.split_once('/') {
            let parse = |part: &str| {
                part.trim().parse::<u64>().map_err(|_| {
                    HarnessError::InvalidTolerance(format!("'{s}' is not a ratio of integers"))
                })
            };
            return Tolerance::exact(parse(num)?, parse(den)?);
        }
        let value = s
            .parse::<f64>()
            .map_err(|_| HarnessError::InvalidTolerance(format!("'{s}' is not a number")))?;
        Tolerance::float(value)
    }
}

fn check_unit_interval(value: f64) -> Result<()> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(HarnessError::InvalidTolerance(format!(
            "{value} is outside [0, 1)"
        )))
    }
}

/// Split a positive finite float into `mantissa * 2^exponent`.
fn decompose(value: f64) -> (u64, i32) {
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
