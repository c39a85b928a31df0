use super::{SubmitError, SubmitStatus, Submitter};
use crate::config::SubmitterConfig;
use std::{
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{info, instrument, warn};

/// Submitter that calls `condor_submit <descriptor>` and waits for it
#[derive(Clone, Debug)]
pub struct CondorSubmitter {
    command: PathBuf,
}

impl CondorSubmitter {
    pub fn load(config: &SubmitterConfig) -> Self {
        Self {
            command: config.command.clone(),
        }
    }
}

impl Submitter for CondorSubmitter {
    /// The exit status is only reported, a failing submission does not fail the run
    #[instrument(skip(self), level = "info")]
    fn submit(&mut self, descriptor: &Path) -> Result<SubmitStatus, SubmitError> {
        info!(
            "Submitting HTCondor jobs using: {}",
            descriptor.to_string_lossy()
        );

        match Command::new(&self.command).arg(descriptor).status() {
            Ok(status) => {
                if status.success() {
                    info!("{} finished", self.command.to_string_lossy());
                } else {
                    warn!(
                        "{} exited with {status}",
                        self.command.to_string_lossy()
                    );
                }

                Ok(SubmitStatus::Exited(status.code()))
            }
            Err(source) => Err(SubmitError::Spawn {
                command: self.command.to_string_lossy().into_owned(),
                source,
            }),
        }
    }
}
