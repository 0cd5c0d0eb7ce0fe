//! Literal generation biased toward immediate-encoding boundaries.

use std::fmt;

use rand::Rng;

/// Magnitude classes a literal is sampled from.
///
/// The class is chosen uniformly before sampling a concrete value inside it,
/// so encoding edge cases (zero, 12-bit immediates, `lui`-shaped values) are
/// heavily over-represented compared to uniform sampling of the full range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralClass {
    /// Exactly zero.
    Zero,
    /// Signed 12-bit range, `[-2048, 2048)` - fits an `addi` immediate.
    Imm12,
    /// `[0, 2^20) << 12` - low 12 bits clear, fits a single `lui`.
    Upper20,
    /// Signed 32-bit range.
    Int32,
    /// Full signed 64-bit range.
    Int64,
    /// Floating point in `[-1e6, 1e6]`.
    Float,
}

impl LiteralClass {
    const ALL: [Self; 6] = [
        Self::Zero,
        Self::Imm12,
        Self::Upper20,
        Self::Int32,
        Self::Int64,
        Self::Float,
    ];

    /// Pick a class uniformly.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Sample a concrete literal from this class.
    pub fn sample<R: Rng>(self, rng: &mut R) -> Literal {
        match self {
            Self::Zero => Literal::Int(0),
            Self::Imm12 => Literal::Int(rng.gen_range(-2048..2048)),
            Self::Upper20 => Literal::Int(i64::from(rng.gen_range(0u32..1 << 20)) << 12),
            Self::Int32 => Literal::Int(i64::from(rng.r#gen::<i32>())),
            Self::Int64 => Literal::Int(rng.r#gen::<i64>()),
            Self::Float => Literal::Float(rng.gen_range(-1_000_000.0..=1_000_000.0)),
        }
    }
}

/// A concrete literal value, rendered as JavaScript source text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

impl Literal {
    /// Sample a literal from a uniformly chosen class.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        LiteralClass::random(rng).sample(rng)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
        }
    }
}
