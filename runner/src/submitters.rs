mod condor;

pub use condor::CondorSubmitter;

use crate::config::{ConfigErrors, SubmitterConfig};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Failed to spawn submission command {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// what happened to a handed over descriptor, the scheduler's answer is not interpreted
pub enum SubmitStatus {
    /// command ran, `None` if it was killed by a signal
    Exited(Option<i32>),
    Skipped,
}

/// Anything that can hand a written descriptor to the scheduler
pub trait Submitter {
    fn submit(&mut self, descriptor: &Path) -> Result<SubmitStatus, SubmitError>;
}

#[derive(Clone, Debug)]
pub enum Submitters {
    Condor(CondorSubmitter),
    Null,
}

impl Submitters {
    pub fn load(config: &SubmitterConfig) -> Result<Self, ConfigErrors> {
        match config.name.as_str() {
            "condor" => Ok(Self::Condor(CondorSubmitter::load(config))),
            "null" => Ok(Self::Null),
            _ => Err(ConfigErrors::UnsupportedSubmitter(config.name.clone())),
        }
    }
}

impl Submitter for Submitters {
    fn submit(&mut self, descriptor: &Path) -> Result<SubmitStatus, SubmitError> {
        match self {
            Self::Condor(submitter) => submitter.submit(descriptor),
            Self::Null => {
                info!("Dry run, not submitting {}", descriptor.to_string_lossy());

                Ok(SubmitStatus::Skipped)
            }
        }
    }
}
