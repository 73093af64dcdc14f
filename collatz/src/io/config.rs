//! Explorer configuration stored in `collatz.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::batch::{AggregationMode, BatchConfig};
use crate::core::accumulate::MAX_BIN_RESOLUTION;
use crate::core::types::{OverflowPolicy, Variant};

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "collatz.toml";

/// Explorer configuration (TOML).
///
/// Missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Worker threads per batch; `0` uses the available parallelism.
    pub workers: usize,

    /// `wrapping` (unchecked 64-bit contract) or `checked`.
    pub overflow: OverflowPolicy,

    /// Number of step-count buckets for `time --graph histogram`.
    pub histogram_buckets: usize,

    /// Inputs per data point for `ratios --graph line`, and the bin
    /// resolution for `ratios --graph histogram`.
    pub ratio_group: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            overflow: OverflowPolicy::Wrapping,
            histogram_buckets: 100_000,
            ratio_group: 5_000,
        }
    }
}

impl ExplorerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.histogram_buckets == 0 {
            return Err(anyhow!("histogram_buckets must be > 0"));
        }
        if self.ratio_group == 0 {
            return Err(anyhow!("ratio_group must be > 0"));
        }
        if self.ratio_group > MAX_BIN_RESOLUTION as u64 {
            return Err(anyhow!(
                "ratio_group must be <= {MAX_BIN_RESOLUTION}: {}",
                self.ratio_group
            ));
        }
        Ok(())
    }

    /// Batch over `[1, limit)` using this config's workers and overflow policy.
    pub fn batch(&self, variant: Variant, limit: u64, mode: AggregationMode) -> BatchConfig {
        BatchConfig::new(variant, 1, limit, mode)
            .with_workers(self.workers)
            .with_overflow(self.overflow)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ExplorerConfig::default()`.
pub fn load_config(path: &Path) -> Result<ExplorerConfig> {
    if !path.exists() {
        let cfg = ExplorerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ExplorerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ExplorerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::config_fixture;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, ExplorerConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("collatz.toml");
        let cfg = ExplorerConfig {
            workers: 3,
            overflow: OverflowPolicy::Checked,
            ..ExplorerConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let (_dir, path) = config_fixture("ratio_group = 250\n").expect("fixture");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.ratio_group, 250);
        assert_eq!(cfg.histogram_buckets, 100_000);
        assert_eq!(cfg.overflow, OverflowPolicy::Wrapping);
    }

    #[test]
    fn zero_group_is_rejected() {
        let (_dir, path) = config_fixture("ratio_group = 0\n").expect("fixture");
        let err = load_config(&path).expect_err("invalid");
        assert!(err.to_string().contains("ratio_group"), "{err:#}");
    }

    #[test]
    fn oversized_group_is_rejected() {
        let (_dir, path) = config_fixture("ratio_group = 1000001\n").expect("fixture");
        let err = load_config(&path).expect_err("invalid");
        assert!(err.to_string().contains("ratio_group"), "{err:#}");
    }
}
