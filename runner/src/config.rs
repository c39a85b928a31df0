use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Error,
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

/// Executable every job block runs, expected in the submission directory
pub const JOB_EXECUTABLE: &str = "htsub.sh";

/// Directory the descriptor's log/output/error paths point into
pub const LOG_DIRECTORY: &str = "cond";

/// Job flavours understood by the scheduler with their wall-clock limit
pub const KNOWN_FLAVOURS: [(&str, &str); 7] = [
    ("espresso", "20min"),
    ("microcentury", "1h"),
    ("longlunch", "2h"),
    ("workday", "8h"),
    ("tomorrow", "1d"),
    ("testmatch", "3d"),
    ("nextweek", "1w"),
];

// check if a file is executable
pub fn check_executable(path: &Path) -> Result<bool, ConfigErrors> {
    if !path.is_file() {
        Err(ConfigErrors::FileNotFound(path.to_path_buf()))
    } else {
        match File::open(path).map(|file| file.metadata()) {
            Ok(Ok(metadata)) => Ok((metadata.mode() & 0o111) != 0),
            Ok(Err(e)) | Err(e) => Err(ConfigErrors::Io(e)),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Submitter not supported: {0}")]
    UnsupportedSubmitter(String),
    #[error("File not found: {}", .0.to_string_lossy())]
    FileNotFound(PathBuf),
    #[error("Failed to read {0}")]
    Io(#[from] Error),
    #[error("Config file is not valid YAML")]
    InvalidYaml(#[from] serde_yaml::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SubmitConfig {
    // stem of the input list, `<infiles>.txt` is read
    #[serde(default)]
    pub infiles: String,
    // base name of the output handed to every job
    #[serde(default)]
    pub outfiles: String,
    #[serde(default = "default_jobflavour", alias = "jobflav")]
    pub jobflavour: String,
    #[serde(default = "default_one")]
    pub ncpu: u32,
    #[serde(default = "default_one_usize")]
    pub njobs: usize,
    // stem for the `.sub` file and the cond/ logs
    #[serde(default = "default_subfiles")]
    pub subfiles: String,
    #[serde(default, alias = "uncertanties")]
    pub uncertainties: i64,
    #[serde(default)]
    pub split: bool,

    #[serde(default)]
    pub submitter: SubmitterConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SubmitterConfig {
    // Name of the selected submitter, see Submitters::load for the selection proccess
    #[serde(default = "default_submitter_name")]
    pub name: String,
    #[serde(default = "default_submit_command")]
    pub command: PathBuf,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            infiles: String::new(),
            outfiles: String::new(),
            jobflavour: default_jobflavour(),
            ncpu: default_one(),
            njobs: default_one_usize(),
            subfiles: default_subfiles(),
            uncertainties: 0,
            split: false,
            submitter: SubmitterConfig::default(),
        }
    }
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            name: default_submitter_name(),
            command: default_submit_command(),
        }
    }
}

impl SubmitConfig {
    /// read a YAML config file, keys that are left out take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        if !path.is_file() {
            return Err(ConfigErrors::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        debug!(path = ?path, "Loaded config file");

        Ok(serde_yaml::from_str(&content)?)
    }

    /// path of the input list, `<infiles>.txt`
    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.txt", self.infiles))
    }

    /// path of the generated descriptor, `<subfiles>.sub`
    pub fn descriptor_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.sub", self.subfiles))
    }

    /// Look for anything that will likely make the submitted jobs fail.
    /// None of these stop the run, returns the number of findings.
    pub fn preflight_checks(&mut self, workdir: &Path) -> usize {
        let mut findings = 0;

        self.submitter.name = self.submitter.name.to_lowercase();

        if !KNOWN_FLAVOURS
            .iter()
            .any(|(flavour, _)| *flavour == self.jobflavour)
        {
            warn!(
                "Job flavour '{}' is not one of the known classes ({}), the scheduler might reject it",
                self.jobflavour,
                KNOWN_FLAVOURS
                    .iter()
                    .map(|(flavour, limit)| format!("{flavour}={limit}"))
                    .join(", ")
            );
            findings += 1;
        }

        if self.ncpu == 0 {
            warn!("ncpu is 0, the scheduler will not match any machine");
            findings += 1;
        }

        if self.njobs == 0 {
            warn!("njobs is 0, the input list will not be divided");
            findings += 1;
        }

        if !workdir.join(LOG_DIRECTORY).is_dir() {
            warn!(
                "{LOG_DIRECTORY}/ does not exist in {}, job logs can't be written",
                workdir.to_string_lossy()
            );
            findings += 1;
        }

        match check_executable(&workdir.join(JOB_EXECUTABLE)) {
            Ok(true) => {}
            Ok(false) => {
                warn!("{JOB_EXECUTABLE} is not executable, this might cause problems");
                findings += 1;
            }
            Err(e) => {
                warn!("Failed to determine if {JOB_EXECUTABLE} is an executable: {e}");
                findings += 1;
            }
        }

        findings
    }
}

fn default_jobflavour() -> String {
    "espresso".to_owned()
}

fn default_one() -> u32 {
    1
}

fn default_one_usize() -> usize {
    1
}

fn default_subfiles() -> String {
    "HTcondor_sub_data_".to_owned()
}

fn default_submitter_name() -> String {
    "condor".to_owned()
}

fn default_submit_command() -> PathBuf {
    PathBuf::from("condor_submit")
}
