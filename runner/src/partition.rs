
use crate::input::InputList;
use rayon::prelude::*;
use std::{
    fs::File,
    io::{BufWriter, Write},
    ops::Range,
    path::PathBuf,
};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Number of jobs ({jobs}) greater than number of files ({lines}), please reduce the number of jobs")]
    InvalidPartition { jobs: usize, lines: usize },
    #[error("Failed to write fragment {}", .path.to_string_lossy())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// contiguous split of `line_count` lines over `job_count` jobs,
/// every job gets `chunk_size` lines and the last one also takes the remainder
pub struct PartitionPlan {
    line_count: usize,
    job_count: usize,
    ratio: f64,
    chunk_size: usize,
}

impl PartitionPlan {
    /// A job count of 0 means "do not divide": the ratio and the chunk size
    /// fall back to the full line count.
    pub fn new(line_count: usize, job_count: usize) -> Result<Self, PartitionError> {
        let (ratio, chunk_size) = if job_count == 0 {
            (line_count as f64, line_count)
        } else {
            (line_count as f64 / job_count as f64, line_count / job_count)
        };

        // equivalent to ratio < 1, without trusting float rounding on large counts
        if chunk_size == 0 {
            return Err(PartitionError::InvalidPartition {
                jobs: job_count,
                lines: line_count,
            });
        }

        Ok(Self {
            line_count,
            job_count,
            ratio,
            chunk_size,
        })
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn job_count(&self) -> usize {
        self.job_count
    }

    /// estimated files per job, only used for reporting
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// half-open line range of job `index`
    pub fn range(&self, index: usize) -> Range<usize> {
        let start = index * self.chunk_size;
        let end = if index + 1 == self.job_count {
            self.line_count
        } else {
            (index + 1) * self.chunk_size
        };

        start..end
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.job_count).map(|index| self.range(index))
    }
}

#[derive(Debug, Clone, PartialEq)]
/// per job subset of the input list written to disk
pub struct Fragment {
    pub index: usize,
    pub path: PathBuf,
    pub range: Range<usize>,
}

/// `<stem>_part<index>.txt`
pub fn fragment_path(stem: &str, index: usize) -> PathBuf {
    PathBuf::from(format!("{stem}_part{index}.txt"))
}

/// Write one fragment file per job. Every job owns a disjoint file, so the
/// writes run on the rayon pool; all of them are done once this returns.
#[instrument(skip(list, plan), level = "info")]
pub fn write_fragments(
    list: &InputList,
    plan: &PartitionPlan,
    stem: &str,
) -> Result<Vec<Fragment>, PartitionError> {
    (0..plan.job_count())
        .into_par_iter()
        .map(|index| -> Result<Fragment, PartitionError> {
            let fragment = Fragment {
                index,
                path: fragment_path(stem, index),
                range: plan.range(index),
            };

            write_fragment(&fragment, &list.lines()[fragment.range.clone()]).map_err(
                |source| PartitionError::Write {
                    path: fragment.path.clone(),
                    source,
                },
            )?;

            debug!(
                path = ?fragment.path,
                "Wrote fragment {index} with lines {}..{}",
                fragment.range.start,
                fragment.range.end
            );

            Ok(fragment)
        })
        .collect()
}

fn write_fragment(fragment: &Fragment, lines: &[String]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(&fragment.path)?);

    for line in lines {
        writer.write_all(line.as_bytes())?;
    }

    writer.flush()
}
