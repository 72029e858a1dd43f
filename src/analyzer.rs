//! Overlap analysis between an upstream branch and a local branch.
//!
//! The analyzer resolves the merge base of the two branches and fetches
//! both sides' changed-file lists relative to it. Files present in both
//! lists are reported in the remote list's order.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::{Error, GitCommandError, GitError};
use crate::git::LocalGit;
use crate::github::{GitHubApiClient, RemoteChanges};

/// How often the fetch wait loop re-checks the cancellation token.
const FETCH_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A source of "which files changed between base and branch" answers.
pub trait ChangeSource {
    /// Files changed between `base_commit` and `branch`, in source order.
    fn changed_files(&self, base_commit: &str, branch: &str) -> Result<Vec<String>, Error>;
}

/// Resolves the nearest common ancestor of two branches.
pub trait MergeBaseSource {
    /// `None` when the branches share no resolvable ancestor.
    fn merge_base(&self, branch_a: &str, branch_b: &str) -> Result<Option<String>, Error>;
}

/// Orchestrates the merge-base lookup and the two changed-file queries,
/// then computes the overlap.
///
/// `R` answers for the remote branch, `L` for the local one. Production
/// code wires [`RemoteChanges`] and [`LocalGit`]; tests substitute fakes.
pub struct OverlapAnalyzer<R, L> {
    remote: Arc<R>,
    local: Arc<L>,
    branch_a: String,
    branch_b: String,
    cancel: CancelToken,
}

enum Side {
    Remote,
    Local,
}

impl OverlapAnalyzer<RemoteChanges, LocalGit> {
    /// Wire the production sources: the remote side through the compare
    /// API, the local side through git in `repo_path`.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        repo_path: impl Into<PathBuf>,
        branch_a: impl Into<String>,
        branch_b: impl Into<String>,
    ) -> Result<Self, Error> {
        let client = GitHubApiClient::new(token)?;
        let remote = RemoteChanges::new(client, owner, repo);
        let local = LocalGit::new(repo_path);
        Ok(Self::from_parts(remote, local, branch_a, branch_b))
    }
}

impl<R, L> OverlapAnalyzer<R, L>
where
    R: ChangeSource + Send + Sync + 'static,
    L: ChangeSource + MergeBaseSource + Send + Sync + 'static,
{
    /// Build an analyzer from pre-built sources.
    pub fn from_parts(
        remote: R,
        local: L,
        branch_a: impl Into<String>,
        branch_b: impl Into<String>,
    ) -> Self {
        Self {
            remote: Arc::new(remote),
            local: Arc::new(local),
            branch_a: branch_a.into(),
            branch_b: branch_b.into(),
            cancel: CancelToken::new(),
        }
    }

    /// Attach a shared cancellation token. The analyzer polls it while
    /// waiting and never clears it.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Find the files changed both in `branch_a` (as seen through the
    /// remote source) and in `branch_b` (as seen locally), relative to
    /// the branches' merge base.
    ///
    /// Fails without partial results: the first error from the merge-base
    /// lookup or either fetch aborts the whole operation.
    pub fn find_overlapping_changed_files(&self) -> Result<Vec<String>, Error> {
        self.check_cancelled()?;

        let merge_base = self.local.merge_base(&self.branch_a, &self.branch_b)?;
        let merge_base = match merge_base {
            Some(commit) if !commit.trim().is_empty() => commit,
            _ => return Err(GitError::MergeBaseNotFound.into()),
        };

        self.check_cancelled()?;

        let (remote_files, local_files) = self.fetch_both(&merge_base)?;

        Ok(overlap(&remote_files, &local_files))
    }

    /// Run the two changed-file queries on worker threads and wait for
    /// both, polling the cancellation token between ticks.
    fn fetch_both(&self, merge_base: &str) -> Result<(Vec<String>, Vec<String>), Error> {
        let (tx, rx) = mpsc::channel();

        let remote = Arc::clone(&self.remote);
        let remote_tx = tx.clone();
        let remote_base = merge_base.to_string();
        let remote_branch = self.branch_a.clone();
        thread::spawn(move || {
            let result = remote.changed_files(&remote_base, &remote_branch);
            let _ = remote_tx.send((Side::Remote, result));
        });

        let local = Arc::clone(&self.local);
        let local_base = merge_base.to_string();
        let local_branch = self.branch_b.clone();
        thread::spawn(move || {
            let result = local.changed_files(&local_base, &local_branch);
            let _ = tx.send((Side::Local, result));
        });

        let mut remote_files = None;
        let mut local_files = None;

        while remote_files.is_none() || local_files.is_none() {
            self.check_cancelled()?;

            match rx.recv_timeout(FETCH_POLL_INTERVAL) {
                Ok((Side::Remote, result)) => remote_files = Some(result?),
                Ok((Side::Local, result)) => local_files = Some(result?),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => return Err(fetch_worker_lost()),
            }
        }

        match (remote_files, local_files) {
            (Some(remote), Some(local)) => Ok((remote, local)),
            // The loop above only exits with both sides present.
            _ => Err(fetch_worker_lost()),
        }
    }

    fn check_cancelled(&self) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            return Err(GitError::Interrupted.into());
        }
        Ok(())
    }
}

/// Entries of `remote` that also appear anywhere in `local`, in remote
/// order. Matching is exact string equality; repeated remote entries stay
/// repeated.
pub fn overlap(remote: &[String], local: &[String]) -> Vec<String> {
    let local_paths: HashSet<&str> = local.iter().map(String::as_str).collect();
    remote
        .iter()
        .filter(|path| local_paths.contains(path.as_str()))
        .cloned()
        .collect()
}

/// A fetch worker dropped its channel without reporting a result. Only a
/// panicking source implementation can get here.
fn fetch_worker_lost() -> Error {
    GitError::from(GitCommandError::Spawn {
        command: "changed-files fetch".to_string(),
        source: io::Error::new(
            io::ErrorKind::Other,
            "fetch worker exited before reporting a result",
        ),
    })
    .into()
}
