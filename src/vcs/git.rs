use std::path::{
    Path,
    PathBuf,
};
use std::process::Command;

use super::{
    Vcs,
    VcsError,
};

/// Runs the `git` command line in `repo`.
#[derive(Debug, Clone)]
pub struct GitVcs {
    repo: PathBuf,
}

impl GitVcs {
    #[must_use]
    pub const fn new(repo: PathBuf) -> Self {
        Self { repo }
    }

    /// Runs `git <args>` and returns its stdout.
    fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!(repo = %self.repo.display(), %command, "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo)
            .output()
            .map_err(|source| VcsError::Spawn { command: command.clone(), source })?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(VcsError::Failed {
                command,
                status: output.status.to_string(),
                output: text.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Vcs for GitVcs {
    fn add_file(&self, path: &Path) -> Result<(), VcsError> {
        let path = path.to_string_lossy();
        self.run(&["add", "--", &*path]).map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<bool, VcsError> {
        let status = self.run(&["status", "-uno", "--porcelain"])?;
        if status.trim().is_empty() {
            tracing::info!("No changes to commit");
            return Ok(false);
        }

        self.run(&["commit", "-m", message])?;
        Ok(true)
    }

    fn upload(&self) -> Result<(), VcsError> {
        self.run(&["push", "origin", "HEAD"]).map(|_| ())
    }

    fn revert_all(&self) -> Result<(), VcsError> {
        tracing::warn!(repo = %self.repo.display(), "Reverting all uncommitted changes");
        self.run(&["reset", "--hard"]).map(|_| ())
    }
}
