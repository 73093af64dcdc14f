//! Collatz stopping-time engine.
//!
//! Three recurrences compute the stopping time of a positive integer: the
//! baseline `f`, which counts every `3n+1` and `n/2`, and two accelerated
//! variants `g` and `h` that fold deterministic runs of those operations into
//! single reduced steps while still reporting the primitive count and the peak.
//!
//! - **[`core`]**: Pure, deterministic logic (step functions, the divisibility
//!   primitive, range partitioning, accumulators). No I/O, no threads.
//! - **[`batch`]**: Fork-join evaluation of one variant over a range, merged
//!   into a dense array, running maximum, histogram or cumulative ratio.
//! - **[`io`]**: The TOML configuration file read by the CLI.
//!
//! Orchestration modules ([`compare`], [`maximum`], [`stopping_time`],
//! [`ratios`]) turn batches into the reports behind the CLI commands.

pub mod batch;
pub mod compare;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod maximum;
pub mod ratios;
pub mod stopping_time;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use batch::{Aggregate, AggregationMode, BatchConfig, evaluate_batch, evaluate_one};
pub use crate::core::types::{OverflowPolicy, ResultTriple, StepField, Variant};
pub use error::EngineError;
