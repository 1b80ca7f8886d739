//! Experiment execution: the solver subprocess runner, the per-input
//! determinism verifier, and the corpus-level driver.

pub mod drive;
pub mod solver;
pub mod verify;

pub use drive::{discover_corpus, ExperimentDriver};
pub use solver::{Observation, SolverProcess, TrialRunner};
pub use verify::Verifier;
