//! Version-control adapters.
//!
//! The pipeline adds every file it writes, commits when asked, and reverts
//! the working copy when a platform fails.
/// Git adapter
mod git;

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

pub use git::GitVcs;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}: {output}")]
    Failed { command: String, status: String, output: String },
}

/// Operations the pipeline needs from a version-control system.
pub trait Vcs: fmt::Debug {
    /// Stages `path`, new or modified.
    ///
    /// # Errors
    /// Returns error if the VCS rejects the file.
    fn add_file(&self, path: &Path) -> Result<(), VcsError>;

    /// Commits staged changes. Returns false when there was nothing to commit.
    ///
    /// # Errors
    /// Returns error if the commit fails.
    fn commit(&self, message: &str) -> Result<bool, VcsError>;

    /// Sends commits to the remote.
    ///
    /// # Errors
    /// Returns error if the push fails.
    fn upload(&self) -> Result<(), VcsError>;

    /// Discards every uncommitted change to tracked files.
    ///
    /// # Errors
    /// Returns error if the reset fails.
    fn revert_all(&self) -> Result<(), VcsError>;
}

/// Does nothing. Used when version control is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpVcs;

impl Vcs for NoOpVcs {
    fn add_file(&self, _path: &Path) -> Result<(), VcsError> {
        Ok(())
    }

    fn commit(&self, _message: &str) -> Result<bool, VcsError> {
        Ok(false)
    }

    fn upload(&self) -> Result<(), VcsError> {
        Ok(())
    }

    fn revert_all(&self) -> Result<(), VcsError> {
        Ok(())
    }
}

/// Config tag selecting a [`Vcs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    #[default]
    None,
    Git,
}

impl VcsKind {
    /// Builds the adapter for the repository at `root`.
    #[must_use]
    pub fn create(self, root: &Path) -> Box<dyn Vcs> {
        match self {
            Self::None => Box::new(NoOpVcs),
            Self::Git => Box::new(GitVcs::new(PathBuf::from(root))),
        }
    }
}
