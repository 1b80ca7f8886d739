//! Shared data model for the sweep harness: experiment configuration, the
//! harness error taxonomy, trial records, and the append-only experiment log.

pub mod config;
pub mod error;
pub mod log;
pub mod trial;

pub use config::ExperimentConfig;
pub use error::HarnessError;
pub use log::TrialLog;
pub use trial::{LogRecord, Trial};
