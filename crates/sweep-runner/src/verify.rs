use std::path::Path;

use sweep_core::{HarnessError, LogRecord, Trial, TrialLog};

use crate::solver::TrialRunner;

/// Runs the full grid × epochs matrix for one input and enforces the
/// determinism invariant: every result must equal the first result ever
/// observed for this input (the ground truth). No oracle beyond that is
/// needed — reproducibility across concurrency levels is the property under
/// test.
pub struct Verifier<'a, R: TrialRunner> {
    runner: &'a R,
    grid: &'a [u32],
    epochs: usize,
}

impl<'a, R: TrialRunner> Verifier<'a, R> {
    pub fn new(runner: &'a R, grid: &'a [u32], epochs: usize) -> Verifier<'a, R> {
        Verifier {
            runner,
            grid,
            epochs,
        }
    }

    /// Appends `grid.len() * epochs` ok rows on success. On a mismatch the
    /// offending trial is appended first (the evidence), then one mismatch
    /// row, and the whole experiment fails with `DeterminismViolation`.
    pub fn verify_input(&self, input: &Path, log: &TrialLog) -> Result<(), HarnessError> {
        let input_id = input.display().to_string();
        let mut ground_truth: Option<String> = None;

        for &level in self.grid {
            tracing::info!(input = %input_id, level, epochs = self.epochs, "verifying");
            for _ in 0..self.epochs {
                let obs = self.runner.run_trial(input, level)?;
                let trial = Trial {
                    input_id: input_id.clone(),
                    concurrency_level: level,
                    result: obs.result,
                    elapsed_time: obs.elapsed_time,
                };
                log.append(&LogRecord::Ok(trial.clone()))?;

                match &ground_truth {
                    None => ground_truth = Some(trial.result),
                    Some(expected) if *expected != trial.result => {
                        log.append(&LogRecord::Mismatch {
                            input_id: input_id.clone(),
                            concurrency_level: level,
                            expected: expected.clone(),
                            actual: trial.result.clone(),
                        })?;
                        return Err(HarnessError::DeterminismViolation {
                            input_id,
                            expected: expected.clone(),
                            actual: trial.result,
                            command: self.runner.describe(input, level),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}
