use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use sweep_core::HarnessError;

/// What one solver invocation reported on stdout: the echoed concurrency
/// level, the answer token kept as raw text, and the self-measured elapsed
/// time in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub echoed_level: String,
    pub result: String,
    pub elapsed_time: f64,
}

/// Seam between the verifier and the actual subprocess, so verification
/// semantics can be exercised with scripted stand-ins.
pub trait TrialRunner {
    fn run_trial(&self, input: &Path, level: u32) -> Result<Observation, HarnessError>;

    /// Human-readable form of the invocation, used in diagnostics.
    fn describe(&self, input: &Path, level: u32) -> String {
        format!("trial({}, level {})", input.display(), level)
    }
}

/// Runs the external solver as `program <level>` with the input case piped
/// to stdin. Blocking, no timeout: a hang is out of scope for the baseline
/// contract. stderr is inherited so solver diagnostics reach the operator.
#[derive(Debug, Clone)]
pub struct SolverProcess {
    program: PathBuf,
}

impl SolverProcess {
    pub fn new(program: impl Into<PathBuf>) -> SolverProcess {
        SolverProcess {
            program: program.into(),
        }
    }
}

impl TrialRunner for SolverProcess {
    fn run_trial(&self, input: &Path, level: u32) -> Result<Observation, HarnessError> {
        let command = self.describe(input, level);
        let input_bytes = fs::read(input)?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(level.to_string());
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| HarnessError::ExternalProcess {
            command: command.clone(),
            reason: format!("failed to launch: {}", e),
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            // The solver may exit without draining stdin; a broken pipe here
            // is its business, not ours.
            let _ = stdin.write_all(&input_bytes);
        }
        let output = child
            .wait_with_output()
            .map_err(|e| HarnessError::ExternalProcess {
                command: command.clone(),
                reason: format!("wait failed: {}", e),
            })?;
        if !output.status.success() {
            return Err(HarnessError::ExternalProcess {
                command,
                reason: format!("exited with {}", output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_observation(&stdout, &command, level)
    }

    fn describe(&self, input: &Path, level: u32) -> String {
        format!("{} {} < {}", self.program.display(), level, input.display())
    }
}

/// Extracts the first three numeric tokens from solver stdout, in order:
/// echoed level, result, elapsed time. Trailing text is ignored.
fn parse_observation(
    stdout: &str,
    command: &str,
    requested_level: u32,
) -> Result<Observation, HarnessError> {
    let tokens = numeric_tokens(stdout);
    if tokens.len() < 3 {
        return Err(HarnessError::MalformedOutput {
            command: command.to_string(),
            found: tokens.len(),
            stdout: stdout.to_string(),
        });
    }
    let elapsed_time: f64 = tokens[2].parse().map_err(|_| HarnessError::MalformedOutput {
        command: command.to_string(),
        found: tokens.len(),
        stdout: stdout.to_string(),
    })?;
    if tokens[0] != requested_level.to_string() {
        tracing::warn!(
            command,
            requested = requested_level,
            echoed = tokens[0],
            "solver echoed a different concurrency level"
        );
    }
    Ok(Observation {
        echoed_level: tokens[0].to_string(),
        result: tokens[1].to_string(),
        elapsed_time,
    })
}

/// Maximal runs of `[0-9]+` optionally followed by `.[0-9]+`. The grammar
/// admits no sign, so parsed elapsed times are non-negative by construction.
fn numeric_tokens(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            tokens.push(&text[start..i]);
        } else {
            i += 1;
        }
    }
    tokens
}
