use std::path::PathBuf;

use thiserror::Error;

/// Fatal harness failures. None of these is recoverable locally: the whole
/// point of a verification harness is to surface them, so they propagate to
/// the binary and halt the run. The experiment log written up to that point
/// stays on disk as evidence.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The solver could not be launched or exited non-zero.
    #[error("external process failed: `{command}`: {reason}")]
    ExternalProcess { command: String, reason: String },

    /// Solver stdout did not contain the three required numeric tokens
    /// (echoed level, result, elapsed time).
    #[error(
        "malformed solver output from `{command}`: expected 3 numeric tokens, found {found} in {stdout:?}"
    )]
    MalformedOutput {
        command: String,
        found: usize,
        stdout: String,
    },

    /// A trial's result disagreed with the ground truth established by the
    /// first trial for the same input. Invalidates the entire experiment.
    #[error(
        "determinism violation for {input_id}: expected {expected:?}, got {actual:?} when running `{command}`"
    )]
    DeterminismViolation {
        input_id: String,
        expected: String,
        actual: String,
        command: String,
    },

    /// No input files were discovered. Raised before any trial runs.
    #[error("no input files found in {}", path.display())]
    EmptyCorpus { path: PathBuf },

    /// A log row fit neither the `ok` nor the `mismatch` shape.
    #[error("malformed experiment log row {line_no}: {line:?}")]
    MalformedLog { line_no: usize, line: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
