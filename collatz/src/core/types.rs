//! Shared deterministic types for the stopping-time engine.
//!
//! These types are the contract between the step functions, the batch
//! evaluator and the driver commands. They carry no I/O and serialize stably.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::step;

/// Per-input result of a step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResultTriple {
    /// Applications of the variant's (possibly accelerated) transform until 1.
    pub reduced_steps: u64,
    /// Primitive halving/tripling operations those applications stand for.
    pub raw_steps: u64,
    /// Largest value of the sequence, the starting value included.
    pub peak: u64,
}

impl ResultTriple {
    /// The triple every variant reports for `n = 1`.
    pub const FIXED_POINT: Self = Self::new(0, 0, 1);

    pub const fn new(reduced_steps: u64, raw_steps: u64, peak: u64) -> Self {
        Self {
            reduced_steps,
            raw_steps,
            peak,
        }
    }

    /// Project one field out of the triple.
    pub fn field(&self, field: StepField) -> u64 {
        match field {
            StepField::Reduced => self.reduced_steps,
            StepField::Raw => self.raw_steps,
            StepField::Peak => self.peak,
        }
    }
}

/// Field of a [`ResultTriple`] an aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepField {
    #[default]
    Reduced,
    Raw,
    Peak,
}

impl fmt::Display for StepField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepField::Reduced => "reduced",
            StepField::Raw => "raw",
            StepField::Peak => "peak",
        };
        f.write_str(name)
    }
}

/// The three stopping-time recurrences.
///
/// - `Baseline` (`f`): one counter tick per `3n+1` or `n/2`.
/// - `ReducedOdd` (`g`): one tick per `3n+1` followed by a full power-of-two strip.
/// - `ReducedOddSecondary` (`h`): like `g`, but whole runs of `(3n+1)/2` on odd
///   values are folded into a single reduced step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Baseline,
    ReducedOdd,
    ReducedOddSecondary,
}

impl Variant {
    pub const ALL: [Variant; 3] = [
        Variant::Baseline,
        Variant::ReducedOdd,
        Variant::ReducedOddSecondary,
    ];

    /// Short function name used in reports (`f`, `g`, `h`).
    pub fn symbol(self) -> &'static str {
        match self {
            Variant::Baseline => "f",
            Variant::ReducedOdd => "g",
            Variant::ReducedOddSecondary => "h",
        }
    }

    /// Evaluate `n` with wrapping 64-bit arithmetic.
    ///
    /// `n` must be non-zero. Outside a variant's safe subdomain the result wraps
    /// modulo 2^64 and is unspecified.
    pub fn evaluate(self, n: u64) -> ResultTriple {
        match self {
            Variant::Baseline => step::baseline(n),
            Variant::ReducedOdd => step::reduced_odd(n),
            Variant::ReducedOddSecondary => step::reduced_odd_secondary(n),
        }
    }

    /// Evaluate `n`, failing instead of wrapping when an intermediate value
    /// does not fit in 64 bits.
    pub fn evaluate_checked(self, n: u64) -> Result<ResultTriple, step::ArithmeticOverflow> {
        match self {
            Variant::Baseline => step::baseline_with::<step::Checked>(n),
            Variant::ReducedOdd => step::reduced_odd_with::<step::Checked>(n),
            Variant::ReducedOddSecondary => step::reduced_odd_secondary_with::<step::Checked>(n),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(x)", self.symbol())
    }
}

/// How a batch treats intermediate values that exceed `u64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Wrap modulo 2^64; callers bound the range to the safe subdomain.
    #[default]
    Wrapping,
    /// Report [`crate::error::EngineError::Overflow`] and abort the batch.
    Checked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_projects_each_component() {
        let triple = ResultTriple::new(3, 16, 52);
        assert_eq!(triple.field(StepField::Reduced), 3);
        assert_eq!(triple.field(StepField::Raw), 16);
        assert_eq!(triple.field(StepField::Peak), 52);
    }

    #[test]
    fn variant_display_uses_function_names() {
        let names: Vec<String> = Variant::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["f(x)", "g(x)", "h(x)"]);
    }

    #[test]
    fn policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Holder {
            overflow: OverflowPolicy,
        }
        let holder: Holder = toml::from_str("overflow = \"checked\"").expect("parse");
        assert_eq!(holder.overflow, OverflowPolicy::Checked);
    }
}
