//! Stable exit codes for the `collatz` CLI.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid arguments or configuration, or the engine rejected the request.
pub const INVALID: i32 = 1;
/// `collatz compare` found an input where a variant disagrees with the baseline.
pub const MISMATCH: i32 = 2;
