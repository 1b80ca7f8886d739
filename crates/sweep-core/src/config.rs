use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Deserialize;

fn default_verification_epochs() -> usize {
    10
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("log")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("res")
}

/// One experiment's parameters, loaded from a YAML file and passed explicitly
/// into the driver. The grid's first element is the designated baseline level
/// and anchors the speedup normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    /// External solver program, invoked as `solver <concurrency_level>` with
    /// the input case on stdin.
    pub solver: PathBuf,
    /// Ordered concurrency levels to test. 0 conventionally means the serial
    /// reference mode.
    pub concurrency_grid: Vec<u32>,
    /// Repetitions per level. Verification, not retry: a process failure on
    /// any repetition is fatal.
    #[serde(default = "default_verification_epochs")]
    pub verification_epochs: usize,
    /// Directory of input case files.
    pub input_corpus: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Charts and the averaged summary land here.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<ExperimentConfig> {
        let raw = fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot read config {}: {}", path.display(), e))?;
        let config: ExperimentConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.concurrency_grid.is_empty() {
            problems.push("concurrency_grid must not be empty");
        }
        if self.verification_epochs == 0 {
            problems.push("verification_epochs must be >= 1");
        }
        if self.solver.as_os_str().is_empty() {
            problems.push("solver must be set");
        }
        if self.input_corpus.as_os_str().is_empty() {
            problems.push("input_corpus must be set");
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "invalid experiment config:\n{}",
                problems
                    .iter()
                    .map(|p| format!("  - {}", p))
                    .collect::<Vec<_>>()
                    .join("\n")
            ))
        }
    }

    /// The level speedups are normalized against: the grid's first element.
    pub fn baseline_level(&self) -> u32 {
        self.concurrency_grid[0]
    }

    pub fn trials_per_input(&self) -> usize {
        self.concurrency_grid.len() * self.verification_epochs
    }
}

/// Starter config written by `sweep init`.
pub const CONFIG_TEMPLATE: &str = "\
# threadsweep experiment configuration
solver: ./bin/solver                 # REQUIRED: program run as `solver <level>` with the case on stdin
concurrency_grid: [0, 1, 2, 4, 8, 16, 32, 64]
verification_epochs: 10              # repetitions per level
input_corpus: inputs                 # REQUIRED: directory of case files
log_dir: log
out_dir: res
";
