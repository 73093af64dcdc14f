//! Deterministic, pure logic behind the stopping-time engine.
//!
//! Core modules must be free of I/O side effects and threads. They operate on
//! in-memory values and return deterministic outputs suitable for tests.

pub mod accumulate;
pub mod divisibility;
pub mod partition;
pub mod step;
pub mod types;
