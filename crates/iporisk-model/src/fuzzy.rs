//! Fuzzy similarity from distances
//!
//! Distances are shifted by the minimum observed distance and passed through
//! a triangular membership function over `[0, range]` with its peak at 0 and
//! its foot at `range / 2`. With [`MembershipMode::ClosedForm`] only peers at
//! the minimum distance score 1.0 and every peer in the upper half of the
//! observed range scores 0. [`MembershipMode::Discretized`] keeps scores in
//! [0, 1] and monotone in distance but gives neither guarantee.

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// How the triangular membership function is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum MembershipMode {
    /// Exact piecewise-linear formula
    #[default]
    ClosedForm,
    /// Sample the membership on the grid `0, step, 2·step, …` strictly below
    /// the observed range and interpolate linearly between samples.
    ///
    /// Distances past the last sample take its value, so a peer in the upper
    /// half of the range can score above 0 when the last sample lies below
    /// the foot, and with `step >= range` every peer scores 1.0.
    Discretized {
        /// Grid spacing
        step: f64,
    },
}

impl MembershipMode {
    /// Grid-sampled evaluation with the conventional 0.1 step.
    pub const fn discretized() -> Self {
        Self::Discretized { step: 0.1 }
    }

    /// Check that a discretization step is finite and positive.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::ClosedForm => Ok(()),
            Self::Discretized { step } if step.is_finite() && step > 0.0 => Ok(()),
            Self::Discretized { step } => Err(RiskError::InvalidConfig(format!(
                "membership step must be finite and positive, got {step}"
            ))),
        }
    }
}

/// Triangular membership function with feet `a`, `c` and peak `b`.
///
/// A degenerate left edge (`a == b`) makes the function 1.0 at `b`, and a
/// degenerate right edge (`b == c`) likewise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangularMembership {
    a: f64,
    b: f64,
    c: f64,
}

impl TriangularMembership {
    /// Create a membership function; requires `a <= b <= c`.
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self> {
        if !(a <= b && b <= c) {
            return Err(RiskError::InvalidConfig(format!(
                "triangular membership requires a <= b <= c, got ({a}, {b}, {c})"
            )));
        }
        Ok(Self { a, b, c })
    }

    /// Membership degree at `x`, in [0, 1].
    pub fn evaluate(&self, x: f64) -> f64 {
        if x < self.a || x > self.c {
            0.0
        } else if x < self.b {
            (x - self.a) / (self.b - self.a)
        } else if x > self.b {
            (self.c - x) / (self.c - self.b)
        } else {
            1.0
        }
    }
}

/// Convert distances to similarity scores in [0, 1].
///
/// Scores are returned in the same order as `distances`. When every distance
/// is identical (including a single distance) every score is exactly 1.0.
pub fn to_similarity(distances: &[f64], mode: MembershipMode) -> Result<Vec<f64>> {
    mode.validate()?;
    if distances.is_empty() {
        return Ok(Vec::new());
    }

    let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
    let max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range == 0.0 {
        return Ok(vec![1.0; distances.len()]);
    }

    let membership = TriangularMembership::new(0.0, 0.0, range / 2.0)?;
    let shifted = distances.iter().map(|&d| d - min);

    let scores = match mode {
        MembershipMode::ClosedForm => shifted.map(|v| membership.evaluate(v)).collect(),
        MembershipMode::Discretized { step } => {
            match SampledMembership::new(membership, range, step) {
                Some(sampled) => shifted.map(|v| sampled.evaluate(v)).collect(),
                None => shifted.map(|v| membership.evaluate(v)).collect(),
            }
        }
    };
    Ok(scores)
}

/// Membership sampled at `i·step` for `i` in `0..=last_index`, evaluated on demand.
#[derive(Debug, Clone, Copy)]
struct SampledMembership {
    membership: TriangularMembership,
    step: f64,
    last_index: f64,
}

impl SampledMembership {
    /// Returns `None` when `range / step` overflows, leaving no usable grid.
    fn new(membership: TriangularMembership, range: f64, step: f64) -> Option<Self> {
        let ratio = range / step;
        if !ratio.is_finite() {
            return None;
        }
        Some(Self {
            membership,
            step,
            last_index: (ratio.ceil() - 1.0).max(0.0),
        })
    }

    fn sample(&self, index: f64) -> f64 {
        self.membership.evaluate(index * self.step)
    }

    /// Piecewise-linear interpolation, clamped to the end samples outside the grid.
    fn evaluate(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return self.sample(0.0);
        }
        if x >= self.last_index * self.step {
            return self.sample(self.last_index);
        }

        let mut lower = (x / self.step).floor().min(self.last_index - 1.0);
        if lower > 0.0 && lower * self.step > x {
            lower -= 1.0;
        }
        let t = (x - lower * self.step) / self.step;
        let (lo, hi) = (self.sample(lower), self.sample(lower + 1.0));
        lo + t * (hi - lo)
    }
}
