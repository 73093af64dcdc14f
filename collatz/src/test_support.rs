//! Test-only helpers: a trajectory-based reference evaluator and config fixtures.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::types::ResultTriple;

/// Every value visited from `n` down to 1, both ends included.
pub fn trajectory(mut n: u64) -> Vec<u64> {
    let mut values = vec![n];
    while n != 1 {
        n = if n % 2 == 1 { 3 * n + 1 } else { n / 2 };
        values.push(n);
    }
    values
}

/// Baseline triple computed from the explicit trajectory.
pub fn reference_triple(n: u64) -> ResultTriple {
    let values = trajectory(n);
    let steps = values.len() as u64 - 1;
    let peak = values.iter().copied().max().unwrap_or(n);
    ResultTriple::new(steps, steps, peak)
}

/// Write `contents` to `collatz.toml` inside a fresh temp dir.
///
/// The directory lives as long as the returned `TempDir`.
pub fn config_fixture(contents: &str) -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create tempdir")?;
    let path = dir.path().join("collatz.toml");
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}
