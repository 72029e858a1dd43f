//! Error taxonomy for the overlap analysis.
//!
//! Two failure classes stay distinguishable all the way to the caller:
//! local git failures (`GitError`) and compare-API failures
//! (`GitHubApiError`), so a caller can react differently depending on
//! which side broke.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Top-level error returned by the public entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// Local git failure: merge base, process execution, cancellation.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Failure talking to the compare endpoint.
    #[error(transparent)]
    GitHubApi(#[from] GitHubApiError),
}

impl Error {
    /// True for local git failures.
    pub fn is_git(&self) -> bool {
        matches!(self, Error::Git(_))
    }

    /// True for compare-API failures.
    pub fn is_github_api(&self) -> bool {
        matches!(self, Error::GitHubApi(_))
    }
}

/// Local git failures surfaced by the analyzer.
#[derive(Debug, Error)]
pub enum GitError {
    /// The two branches share no resolvable common ancestor.
    #[error("Could not find merge base between branches")]
    MergeBaseNotFound,

    /// A git invocation could not run to a usable result.
    #[error("Error executing git command")]
    Command(#[from] GitCommandError),

    /// A cancellation was observed while waiting on a sub-operation.
    #[error("Git operation was interrupted")]
    Interrupted,
}

/// Failure detail from one git process invocation.
#[derive(Debug, Error)]
pub enum GitCommandError {
    /// The process could not be started or its output could not be read.
    #[error("failed to run {command}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The process ran but exited non-zero.
    #[error("{command} exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Failures from the compare endpoint.
#[derive(Debug, Error)]
pub enum GitHubApiError {
    /// The HTTP client could not be constructed.
    #[error("failed to build GitHub API client")]
    Client(#[source] reqwest::Error),

    /// The endpoint answered with a status other than 200.
    #[error("GitHub API request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// A 200 response carried a body that is not valid JSON.
    #[error("failed to parse GitHub API response")]
    Parse(#[from] serde_json::Error),

    /// The request or the response body transfer failed on the wire.
    #[error("failed to reach GitHub API")]
    Transport(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn git_error_messages_are_stable() {
        assert_eq!(
            GitError::MergeBaseNotFound.to_string(),
            "Could not find merge base between branches"
        );
        assert_eq!(
            GitError::Interrupted.to_string(),
            "Git operation was interrupted"
        );
        let command_failed = GitError::from(GitCommandError::Spawn {
            command: "git merge-base a b".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        });
        assert_eq!(command_failed.to_string(), "Error executing git command");
    }

    #[test]
    fn command_error_keeps_the_io_cause() {
        let err = Error::from(GitError::from(GitCommandError::Spawn {
            command: "git diff --name-only a..b".to_string(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"),
        }));

        assert!(err.is_git());
        assert_eq!(err.to_string(), "Error executing git command");

        let cause = err.source().and_then(|s| s.downcast_ref::<GitCommandError>());
        assert!(matches!(cause, Some(GitCommandError::Spawn { .. })));

        let io_cause = cause
            .and_then(|c| c.source())
            .and_then(|s| s.downcast_ref::<io::Error>());
        assert_eq!(io_cause.map(|e| e.kind()), Some(io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn error_classes_stay_distinguishable() {
        let git: Error = GitError::MergeBaseNotFound.into();
        assert!(git.is_git());
        assert!(!git.is_github_api());

        let api: Error = GitHubApiError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            body: "Not Found".to_string(),
        }
        .into();
        assert!(api.is_github_api());
        assert!(!api.is_git());
    }
}
