use crate::{
    config::{SubmitConfig, JOB_EXECUTABLE, LOG_DIRECTORY},
    partition::{fragment_path, PartitionPlan},
};
use itertools::Itertools;
use std::{
    fmt::{self, Display},
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Positional arguments between the output label and the uncertainty index.
/// Their meaning belongs to htsub.sh; they are passed through unchanged.
pub const FIXED_ARGUMENTS: [&str; 9] = ["0", "0", "0", "10", "5", "2.0", "0", "0", "0"];

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Failed to write descriptor {}", .path.to_string_lossy())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// single `(attribute =?= "value")` clause of the machine requirements
pub struct Requirement {
    pub attribute: &'static str,
    pub value: &'static str,
}

pub const REQUIREMENTS: [Requirement; 2] = [
    Requirement {
        attribute: "OpSysAndVer",
        value: "AlmaLinux9",
    },
    Requirement {
        attribute: "CERNEnvironment",
        value: "qa",
    },
];

#[derive(Debug, Clone, PartialEq)]
/// settings shared by every job of the descriptor
pub struct Preamble {
    pub universe: &'static str,
    pub getenv: bool,
    pub executable: String,
    pub job_flavour: String,
    pub requirements: Vec<Requirement>,
    pub request_cpus: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobBlock {
    pub log: String,
    pub output: String,
    pub error: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub preamble: Preamble,
    pub blocks: Vec<JobBlock>,
}

impl Preamble {
    pub fn new(config: &SubmitConfig) -> Self {
        Self {
            universe: "vanilla",
            getenv: true,
            executable: JOB_EXECUTABLE.to_owned(),
            job_flavour: config.jobflavour.clone(),
            requirements: REQUIREMENTS.to_vec(),
            request_cpus: config.ncpu,
        }
    }
}

impl JobBlock {
    /// `log_stem` is the path of the log files without extension
    pub fn new(log_stem: &str, input: String, output_label: String, uncertainties: i64) -> Self {
        let mut arguments = vec![input, output_label];
        arguments.extend(FIXED_ARGUMENTS.iter().map(|argument| argument.to_string()));
        arguments.push(uncertainties.to_string());

        Self {
            log: format!("{log_stem}.log"),
            output: format!("{log_stem}.out"),
            error: format!("{log_stem}.err"),
            arguments,
        }
    }
}

impl Descriptor {
    /// Without split there is a single job over the whole list, otherwise
    /// one job per entry of `plan`, in index order.
    pub fn build(config: &SubmitConfig, plan: &PartitionPlan) -> Self {
        let blocks = if config.split {
            (0..plan.job_count())
                .map(|index| {
                    JobBlock::new(
                        &format!("{LOG_DIRECTORY}/{}_part_{index}", config.subfiles),
                        fragment_path(&config.infiles, index)
                            .to_string_lossy()
                            .into_owned(),
                        format!("{}_job_{index}", config.outfiles),
                        config.uncertainties,
                    )
                })
                .collect_vec()
        } else {
            vec![JobBlock::new(
                &format!("{LOG_DIRECTORY}/{}", config.subfiles),
                format!("{}.txt", config.infiles),
                config.outfiles.clone(),
                config.uncertainties,
            )]
        };

        Self {
            preamble: Preamble::new(config),
            blocks,
        }
    }

    /// Render into a uniquely named temporary file next to `path` and persist
    /// it over `path`, a failed write never leaves a partial descriptor behind.
    pub fn write(&self, path: &Path) -> Result<(), DescriptorError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let into_error = |source: std::io::Error| DescriptorError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut temporary = NamedTempFile::new_in(parent).map_err(into_error)?;
        temporary
            .write_all(self.to_string().as_bytes())
            .map_err(into_error)?;
        temporary.flush().map_err(into_error)?;
        temporary.persist(path).map_err(|e| into_error(e.error))?;

        debug!(path = ?path, blocks = self.blocks.len(), "Wrote descriptor");

        Ok(())
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} =?= \"{}\")", self.attribute, self.value)
    }
}

impl Display for Preamble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "universe   = {}", self.universe)?;
        writeln!(
            f,
            "getenv     = {}",
            if self.getenv { "True" } else { "False" }
        )?;
        writeln!(f, "executable = {}", self.executable)?;
        writeln!(f, "+JobFlavour = \"{}\"", self.job_flavour)?;
        writeln!(
            f,
            "requirements = ({})",
            self.requirements.iter().join(" && ")
        )?;
        writeln!(f, "RequestCpus = {}", self.request_cpus)
    }
}

impl Display for JobBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "log        = {}", self.log)?;
        writeln!(f, "output     = {}", self.output)?;
        writeln!(f, "error      = {}", self.error)?;
        writeln!(f, "arguments = {}", self.arguments.iter().join(" "))?;
        writeln!(f, "queue")
    }
}

impl Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.preamble)?;

        for block in self.blocks.iter() {
            writeln!(f)?;
            write!(f, "{block}")?;
        }

        Ok(())
    }
}
