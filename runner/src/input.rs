use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input file list {} does not exist", .0.to_string_lossy())]
    MissingInput(PathBuf),
    #[error("Failed to read input file list")]
    Read(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
/// ordered lines of an input list, each line keeps its own terminator
/// so that writing them back out reproduces the file
pub struct InputList {
    path: PathBuf,
    lines: Vec<String>,
}

impl InputList {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        if !path.exists() {
            return Err(InputError::MissingInput(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let list = Self::from_content(path, &content);
        debug!(path = ?path, lines = list.len(), "Loaded input list");

        Ok(list)
    }

    pub fn from_content(path: &Path, content: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: content.split_inclusive('\n').map(str::to_owned).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
