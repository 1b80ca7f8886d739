use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use sweep_core::{log::generate_log_id, ExperimentConfig, HarnessError, TrialLog};

use crate::solver::TrialRunner;
use crate::verify::Verifier;

/// Lists the corpus directory (files only, one level deep) in lexicographic
/// order. Raised before any subprocess launches if nothing is found.
pub fn discover_corpus(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let mut inputs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| HarnessError::Io(e.into()))?;
        if entry.file_type().is_file() {
            inputs.push(entry.into_path());
        }
    }
    if inputs.is_empty() {
        return Err(HarnessError::EmptyCorpus {
            path: dir.to_path_buf(),
        });
    }
    Ok(inputs)
}

/// One bounded experiment run: verify every input in corpus order against a
/// single shared log. The first fatal verifier error terminates the whole
/// run; the partial log stays on disk as evidence.
pub struct ExperimentDriver<'a, R: TrialRunner> {
    config: &'a ExperimentConfig,
    runner: &'a R,
}

impl<'a, R: TrialRunner> ExperimentDriver<'a, R> {
    pub fn new(config: &'a ExperimentConfig, runner: &'a R) -> ExperimentDriver<'a, R> {
        ExperimentDriver { config, runner }
    }

    pub fn run(&self) -> Result<TrialLog, HarnessError> {
        let inputs = discover_corpus(&self.config.input_corpus)?;
        let log = TrialLog::create(self.config.log_dir.join(generate_log_id()))?;
        tracing::info!(
            log = %log.path().display(),
            inputs = inputs.len(),
            levels = self.config.concurrency_grid.len(),
            epochs = self.config.verification_epochs,
            "experiment started"
        );

        let verifier = Verifier::new(
            self.runner,
            &self.config.concurrency_grid,
            self.config.verification_epochs,
        );
        for input in &inputs {
            verifier.verify_input(input, &log)?;
        }
        tracing::info!(log = %log.path().display(), "experiment finished");
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Observation;
    use std::cell::Cell;
    use std::fs;

    struct CountingRunner {
        calls: Cell<usize>,
    }

    impl TrialRunner for CountingRunner {
        fn run_trial(&self, _input: &Path, level: u32) -> Result<Observation, HarnessError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Observation {
                echoed_level: level.to_string(),
                result: "7".to_string(),
                elapsed_time: 0.25,
            })
        }
    }

    fn test_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sweep_drive_test_{}_{}_{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        fs::create_dir_all(&dir).expect("create test dir");
        dir
    }

    fn config_for(root: &Path) -> ExperimentConfig {
        ExperimentConfig {
            solver: PathBuf::from("./bin/solver"),
            concurrency_grid: vec![0, 2],
            verification_epochs: 2,
            input_corpus: root.join("inputs"),
            log_dir: root.join("log"),
            out_dir: root.join("res"),
        }
    }

    #[test]
    fn corpus_is_sorted_and_files_only() {
        let dir = test_dir("sorted");
        let corpus = dir.join("inputs");
        fs::create_dir_all(corpus.join("nested")).expect("mkdir");
        fs::write(corpus.join("b.txt"), "2").expect("write");
        fs::write(corpus.join("a.txt"), "1").expect("write");
        fs::write(corpus.join("nested").join("c.txt"), "3").expect("write");
        let inputs = discover_corpus(&corpus).expect("discover");
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().and_then(|n| n.to_str()).unwrap_or(""))
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn empty_corpus_fails_before_any_trial() {
        let dir = test_dir("empty");
        let corpus = dir.join("inputs");
        fs::create_dir_all(&corpus).expect("mkdir");
        let mut config = config_for(&dir);
        config.input_corpus = corpus.clone();
        let runner = CountingRunner {
            calls: Cell::new(0),
        };
        let err = ExperimentDriver::new(&config, &runner)
            .run()
            .expect_err("empty corpus is fatal");
        assert!(matches!(err, HarnessError::EmptyCorpus { .. }));
        assert_eq!(runner.calls.get(), 0, "no subprocess may launch");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn full_run_covers_every_input() {
        let dir = test_dir("full");
        let corpus = dir.join("inputs");
        fs::create_dir_all(&corpus).expect("mkdir");
        fs::write(corpus.join("a.txt"), "1").expect("write");
        fs::write(corpus.join("b.txt"), "2").expect("write");
        let config = config_for(&dir);
        let runner = CountingRunner {
            calls: Cell::new(0),
        };
        let log = ExperimentDriver::new(&config, &runner)
            .run()
            .expect("run succeeds");
        // 2 inputs x 2 levels x 2 epochs
        assert_eq!(runner.calls.get(), 8);
        assert_eq!(log.read().expect("read log").len(), 8);
        let _ = fs::remove_dir_all(dir);
    }
}
