use crate::config::{ConfigErrors, SubmitConfig};
use clap::Parser;
use std::path::PathBuf;

/// Split a list of input files over HTCondor jobs and submit them
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// input list of files, without the .txt extension
    #[arg(short = 'i', long = "infiles")]
    pub infiles: Option<String>,

    /// output name
    #[arg(short = 'o', long = "outfiles")]
    pub outfiles: Option<String>,

    /// job flavour (espresso=20min, microcentury=1h, longlunch=2h, workday=8h,
    /// tomorrow=1d, testmatch=3d, nextweek=1w) [default: espresso]
    #[arg(short = 'f', long = "jobflav")]
    pub jobflavour: Option<String>,

    /// number of cpu requested (2GB per cpu) [default: 1]
    #[arg(short = 'c', long = "ncpu")]
    pub ncpu: Option<u32>,

    /// number of jobs to be submitted [default: 1]
    #[arg(short = 'n', long = "njobs")]
    pub njobs: Option<usize>,

    /// HTCondor submission file, without the .sub extension [default: HTcondor_sub_data_]
    #[arg(short = 's', long = "subfiles")]
    pub subfiles: Option<String>,

    /// Systematic uncertainties number [default: 0]
    #[arg(
        short = 'u',
        long = "uncertanties",
        visible_alias = "uncertainties",
        allow_hyphen_values = true
    )]
    pub uncertainties: Option<i64>,

    /// Split files into multiple parts
    #[arg(long)]
    pub split: bool,

    /// YAML file with default values for all of the above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the fragments and the descriptor but do not submit
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Defaults, overridden by the config file, overridden by the command line
    pub fn into_config(self) -> Result<SubmitConfig, ConfigErrors> {
        let base = match self.config {
            Some(ref path) => SubmitConfig::load(path)?,
            None => SubmitConfig::default(),
        };

        Ok(self.merge(base))
    }

    pub fn merge(self, mut config: SubmitConfig) -> SubmitConfig {
        if let Some(infiles) = self.infiles {
            config.infiles = infiles;
        }
        if let Some(outfiles) = self.outfiles {
            config.outfiles = outfiles;
        }
        if let Some(jobflavour) = self.jobflavour {
            config.jobflavour = jobflavour;
        }
        if let Some(ncpu) = self.ncpu {
            config.ncpu = ncpu;
        }
        if let Some(njobs) = self.njobs {
            config.njobs = njobs;
        }
        if let Some(subfiles) = self.subfiles {
            config.subfiles = subfiles;
        }
        if let Some(uncertainties) = self.uncertainties {
            config.uncertainties = uncertainties;
        }

        config.split |= self.split;
        if self.dry_run {
            config.submitter.name = "null".to_owned();
        }

        config
    }
}
