use crate::{
    config::SubmitConfig,
    descriptor::{Descriptor, DescriptorError},
    input::{InputError, InputList},
    partition::{write_fragments, Fragment, PartitionError, PartitionPlan},
    submitters::{SubmitError, SubmitStatus, Submitter},
};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub plan: PartitionPlan,
    pub fragments: Vec<Fragment>,
    pub descriptor: PathBuf,
    pub status: SubmitStatus,
}

/// Load the input list, split it if requested, write the descriptor and hand
/// it to `submitter`. Both precondition checks happen before anything is written.
#[instrument(skip_all, fields(infiles = %config.infiles, subfiles = %config.subfiles), level = "info")]
pub fn run<S: Submitter>(config: &SubmitConfig, submitter: &mut S) -> Result<RunSummary, RunError> {
    let list = InputList::load(&config.input_path())?;
    info!(path = ?list.path(), "Number of files: {}", list.len());
    info!("Number of jobs: {}", config.njobs);

    let plan = PartitionPlan::new(list.len(), config.njobs)?;
    info!(
        "Files per job: {} --> closest integer: {}",
        plan.ratio(),
        plan.chunk_size()
    );

    let fragments = if config.split {
        if plan.job_count() == 0 {
            warn!("Splitting into 0 jobs, the descriptor will not queue anything");
        }

        write_fragments(&list, &plan, &config.infiles)?
    } else {
        Vec::new()
    };

    let descriptor = Descriptor::build(config, &plan);
    let path = config.descriptor_path();
    descriptor.write(&path)?;

    let status = submitter.submit(&path)?;

    Ok(RunSummary {
        plan,
        fragments,
        descriptor: path,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        fs,
        path::{Path, PathBuf},
    };

    /// records every submission and whether the fragments were already there
    #[derive(Default)]
    struct RecordingSubmitter {
        expected_fragments: Vec<PathBuf>,
        calls: Vec<(PathBuf, bool)>,
    }

    impl Submitter for RecordingSubmitter {
        fn submit(&mut self, descriptor: &Path) -> Result<SubmitStatus, SubmitError> {
            let ready = descriptor.is_file()
                && self.expected_fragments.iter().all(|path| path.is_file());
            self.calls.push((descriptor.to_path_buf(), ready));

            Ok(SubmitStatus::Exited(Some(0)))
        }
    }

    fn config_in(dir: &Path, lines: usize) -> SubmitConfig {
        let content = (0..lines)
            .map(|i| format!("root://eos/xexe/file_{i}.root\n"))
            .collect::<String>();
        fs::write(dir.join("files.txt"), content).unwrap();

        SubmitConfig {
            infiles: dir.join("files").to_string_lossy().into_owned(),
            outfiles: "xexe".to_owned(),
            subfiles: dir.join("sub").to_string_lossy().into_owned(),
            ..SubmitConfig::default()
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn unsplit_run_writes_one_block() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path();
        let config = config_in(&dir, 4);
        let mut submitter = RecordingSubmitter::default();

        let summary = run(&config, &mut submitter).unwrap();

        assert!(summary.fragments.is_empty());
        assert_eq!(entries(&dir), vec!["files.txt", "sub.sub"]);
        assert_eq!(submitter.calls, vec![(dir.join("sub.sub"), true)]);

        let descriptor = fs::read_to_string(dir.join("sub.sub")).unwrap();
        assert_eq!(descriptor.matches("\nqueue\n").count(), 1);
        assert!(descriptor.contains(&format!(
            "arguments = {}.txt xexe 0 0 0 10 5 2.0 0 0 0 0\n",
            config.infiles
        )));
    }

    #[test]
    fn split_run_writes_fragments_before_submitting() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path();
        let config = SubmitConfig {
            njobs: 3,
            split: true,
            ..config_in(&dir, 10)
        };
        let mut submitter = RecordingSubmitter {
            expected_fragments: (0..3)
                .map(|i| dir.join(format!("files_part{i}.txt")))
                .collect(),
            ..RecordingSubmitter::default()
        };

        let summary = run(&config, &mut submitter).unwrap();

        assert_eq!(
            summary.fragments.iter().map(|f| f.range.clone()).collect::<Vec<_>>(),
            vec![0..3, 3..6, 6..10]
        );
        assert_eq!(
            entries(&dir),
            vec![
                "files.txt",
                "files_part0.txt",
                "files_part1.txt",
                "files_part2.txt",
                "sub.sub"
            ]
        );
        assert_eq!(submitter.calls, vec![(dir.join("sub.sub"), true)]);

        let joined = (0..3)
            .map(|i| fs::read_to_string(dir.join(format!("files_part{i}.txt"))).unwrap())
            .collect::<String>();
        assert_eq!(joined, fs::read_to_string(dir.join("files.txt")).unwrap());

        let descriptor = fs::read_to_string(dir.join("sub.sub")).unwrap();
        assert_eq!(descriptor.matches("\nqueue\n").count(), 3);
        assert!(descriptor.contains("xexe_job_2 0 0 0 10 5 2.0 0 0 0 0\n"));
    }

    #[test]
    fn missing_input_writes_nothing() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path();
        let config = SubmitConfig {
            infiles: dir.join("absent").to_string_lossy().into_owned(),
            subfiles: dir.join("sub").to_string_lossy().into_owned(),
            split: true,
            ..SubmitConfig::default()
        };
        let mut submitter = RecordingSubmitter::default();

        assert!(matches!(
            run(&config, &mut submitter),
            Err(RunError::Input(InputError::MissingInput(_)))
        ));
        assert!(entries(&dir).is_empty());
        assert!(submitter.calls.is_empty());
    }

    #[test]
    fn too_many_jobs_writes_nothing() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path();
        let config = SubmitConfig {
            njobs: 5,
            split: true,
            ..config_in(&dir, 4)
        };
        let mut submitter = RecordingSubmitter::default();

        assert!(matches!(
            run(&config, &mut submitter),
            Err(RunError::Partition(PartitionError::InvalidPartition { jobs: 5, lines: 4 }))
        ));
        assert_eq!(entries(&dir), vec!["files.txt"]);
        assert!(submitter.calls.is_empty());
    }

    #[test]
    fn too_many_jobs_is_checked_without_split() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path();
        let config = SubmitConfig {
            njobs: 5,
            ..config_in(&dir, 4)
        };

        assert!(run(&config, &mut RecordingSubmitter::default()).is_err());
        assert_eq!(entries(&dir), vec!["files.txt"]);
    }

    #[test]
    fn zero_jobs_split_queues_nothing() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path();
        let config = SubmitConfig {
            njobs: 0,
            split: true,
            ..config_in(&dir, 4)
        };

        let summary = run(&config, &mut RecordingSubmitter::default()).unwrap();

        assert_eq!(summary.plan.chunk_size(), 4);
        assert!(summary.fragments.is_empty());
        assert!(!fs::read_to_string(dir.join("sub.sub"))
            .unwrap()
            .contains("queue"));
    }

    #[test]
    fn failed_fragment_write_stops_before_descriptor() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path();
        let config = SubmitConfig {
            njobs: 2,
            split: true,
            ..config_in(dir, 4)
        };
        // a directory where the second fragment should go
        fs::create_dir(dir.join("files_part1.txt")).unwrap();
        let mut submitter = RecordingSubmitter::default();

        match run(&config, &mut submitter) {
            Err(RunError::Partition(PartitionError::Write { path, .. })) => {
                assert_eq!(path, dir.join("files_part1.txt"))
            }
            other => panic!("expected a fragment write error, got {other:?}"),
        }
        assert!(!dir.join("sub.sub").exists());
        assert!(submitter.calls.is_empty());
    }
}
