//! Crossdiff - overlapping change detection between branch histories
//!
//! A library for finding files modified both upstream and in a local
//! branch, relative to the branches' merge base:
//! - Local git queries through the `git` executable
//! - GitHub-style compare endpoint client over blocking HTTP
//! - Overlap analysis preserving the remote list's order
//! - Cancellation-aware concurrent fetching

pub mod analyzer;
pub mod cancel;
pub mod error;
pub mod git;
pub mod github;

pub use analyzer::{overlap, ChangeSource, MergeBaseSource, OverlapAnalyzer};
pub use cancel::CancelToken;
pub use error::{Error, GitCommandError, GitError, GitHubApiError};
pub use git::LocalGit;
pub use github::{GitHubApiClient, RemoteChanges, DEFAULT_API_ROOT};
