//! Local git queries.
//!
//! Runs the `git` executable against a configured working directory and
//! parses its standard output. One process per query, no retries, no
//! timeout.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::analyzer::{ChangeSource, MergeBaseSource};
use crate::error::{Error, GitCommandError};

/// Runs git queries against a local repository checkout.
#[derive(Debug, Clone)]
pub struct LocalGit {
    repo_path: PathBuf,
}

/// Captured result of one git invocation.
struct GitOutput {
    command: String,
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl LocalGit {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// The working directory git runs in.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Find the nearest common ancestor of two branches.
    ///
    /// Resolution is driven by what git prints: the first stdout line,
    /// trimmed. Disjoint histories and unknown refs leave stdout empty,
    /// which maps to `None` so the caller decides what an absent merge
    /// base means.
    pub fn merge_base(
        &self,
        branch_a: &str,
        branch_b: &str,
    ) -> Result<Option<String>, GitCommandError> {
        let output = self.run_git(&["merge-base", branch_a, branch_b])?;

        let first_line = output.stdout.lines().next().map(str::trim).unwrap_or("");
        if first_line.is_empty() {
            return Ok(None);
        }

        Ok(Some(first_line.to_string()))
    }

    /// List files that differ between `base_commit` and `branch`.
    ///
    /// Runs a two-dot `git diff --name-only` and returns every non-blank
    /// stdout line, trimmed, in git's output order. A non-zero exit is an
    /// error carrying the captured stderr, so a bad ref never reads as
    /// "no changes".
    pub fn changed_files(
        &self,
        base_commit: &str,
        branch: &str,
    ) -> Result<Vec<String>, GitCommandError> {
        let range = format!("{}..{}", base_commit, branch);
        let output = self.run_git(&["diff", "--name-only", &range])?;

        if !output.status.success() {
            return Err(GitCommandError::Exit {
                command: output.command,
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Run git with the given arguments and capture both output streams.
    fn run_git(&self, args: &[&str]) -> Result<GitOutput, GitCommandError> {
        let command = format!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| GitCommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        Ok(GitOutput {
            command,
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

impl MergeBaseSource for LocalGit {
    fn merge_base(&self, branch_a: &str, branch_b: &str) -> Result<Option<String>, Error> {
        LocalGit::merge_base(self, branch_a, branch_b).map_err(|e| Error::Git(e.into()))
    }
}

impl ChangeSource for LocalGit {
    fn changed_files(&self, base_commit: &str, branch: &str) -> Result<Vec<String>, Error> {
        LocalGit::changed_files(self, base_commit, branch).map_err(|e| Error::Git(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::fs;
    use tempfile::TempDir;

    /// Run git in `repo`, assert success, return trimmed stdout.
    fn git(repo: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(repo)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn commit_file(repo: &Path, name: &str, contents: &str, message: &str) {
        fs::write(repo.join(name), contents).unwrap();
        git(repo, &["add", "."]);
        git(repo, &["commit", "-m", message]);
    }

    /// Scratch repo with a shared base commit on `main` and two branches,
    /// `feature-a` and `feature-b`, each one commit ahead of it.
    fn divergent_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let repo = dir.path();

        git(repo, &["init"]);
        git(repo, &["checkout", "-b", "main"]);
        git(repo, &["config", "user.email", "test@example.com"]);
        git(repo, &["config", "user.name", "Test"]);
        commit_file(repo, "base.txt", "base\n", "base commit");

        git(repo, &["checkout", "-b", "feature-a"]);
        commit_file(repo, "fileA.txt", "a\n", "change on a");

        git(repo, &["checkout", "main"]);
        git(repo, &["checkout", "-b", "feature-b"]);
        commit_file(repo, "fileB.txt", "b\n", "change on b");

        dir
    }

    #[test]
    fn merge_base_is_the_shared_commit() {
        let dir = divergent_repo();
        let local = LocalGit::new(dir.path());

        let merge_base = local.merge_base("feature-a", "feature-b").unwrap();

        let main_sha = git(dir.path(), &["rev-parse", "main"]);
        assert_eq!(merge_base, Some(main_sha));
    }

    #[test]
    fn merge_base_is_absent_for_unknown_ref() {
        let dir = divergent_repo();
        let local = LocalGit::new(dir.path());

        let merge_base = local.merge_base("feature-a", "no-such-branch").unwrap();

        assert_eq!(merge_base, None);
    }

    #[test]
    fn changed_files_lists_only_the_branch_side() {
        let dir = divergent_repo();
        let local = LocalGit::new(dir.path());

        let base = git(dir.path(), &["rev-parse", "main"]);
        let files = local.changed_files(&base, "feature-b").unwrap();

        assert_eq!(files, vec!["fileB.txt".to_string()]);
    }

    #[test]
    fn changed_files_is_empty_without_differences() {
        let dir = divergent_repo();
        let local = LocalGit::new(dir.path());

        let base = git(dir.path(), &["rev-parse", "main"]);
        let files = local.changed_files(&base, "main").unwrap();

        assert!(files.is_empty());
    }

    #[test]
    fn changed_files_fails_for_unknown_ref() {
        let dir = divergent_repo();
        let local = LocalGit::new(dir.path());

        let base = git(dir.path(), &["rev-parse", "main"]);
        let err = local.changed_files(&base, "no-such-branch").unwrap_err();

        assert!(matches!(err, GitCommandError::Exit { .. }));
    }

    #[test]
    fn missing_working_directory_is_a_spawn_error() {
        let local = LocalGit::new("/no/such/directory/anywhere");

        let err = local.merge_base("a", "b").unwrap_err();

        assert!(matches!(err, GitCommandError::Spawn { .. }));
    }

    #[test]
    fn change_source_failure_reads_as_git_command_error() {
        let local = LocalGit::new("/no/such/directory/anywhere");

        let err = ChangeSource::changed_files(&local, "a", "b").unwrap_err();

        assert!(err.is_git());
        assert_eq!(err.to_string(), "Error executing git command");
        let cause = err.source().and_then(|s| s.downcast_ref::<GitCommandError>());
        assert!(matches!(cause, Some(GitCommandError::Spawn { .. })));
    }
}
