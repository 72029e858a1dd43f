//! GitHub compare API client.
//!
//! Fetches the list of files changed between two revisions through the
//! `/repos/{owner}/{repo}/compare/{base}...{head}` endpoint, over a
//! blocking HTTP client. One request per query, no retries, no
//! pagination: the `files` array is trusted to be complete in a single
//! response.

use std::time::Duration;

use serde::Deserialize;

use crate::analyzer::ChangeSource;
use crate::error::{Error, GitHubApiError};

/// API root used unless [`GitHubApiClient::with_api_root`] overrides it.
pub const DEFAULT_API_ROOT: &str = "https://api.github.com";

const USER_AGENT: &str = "crossdiff";

/// Client for the compare endpoint of a GitHub-style API.
///
/// Requests carry `Authorization: token {token}` and the
/// `application/vnd.github.v3+json` media type. Redirects are not
/// followed, so any final status other than 200 surfaces as
/// [`GitHubApiError::Status`].
#[derive(Debug, Clone)]
pub struct GitHubApiClient {
    api_root: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl GitHubApiClient {
    pub fn new(token: impl Into<String>) -> Result<Self, GitHubApiError> {
        Ok(Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            token: token.into(),
            client: build_client(None)?,
        })
    }

    /// Point the client at a different API root, e.g. a test server or a
    /// GitHub Enterprise installation.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into().trim_end_matches('/').to_string();
        self
    }

    /// Apply a request timeout. The default is no timeout at all; the
    /// knob exists so callers can bound the blocking call from outside.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GitHubApiError> {
        self.client = build_client(Some(timeout))?;
        Ok(self)
    }

    /// Files changed between `base_commit` and `branch`, in the order the
    /// endpoint reports them.
    ///
    /// An absent or empty `files` array yields an empty list. Elements
    /// without a `filename` field are kept as empty strings rather than
    /// rejected.
    pub fn changed_files(
        &self,
        owner: &str,
        repo: &str,
        base_commit: &str,
        branch: &str,
    ) -> Result<Vec<String>, GitHubApiError> {
        let url = format!(
            "{}/repos/{}/{}/compare/{}...{}",
            self.api_root, owner, repo, base_commit, branch
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(GitHubApiError::Status {
                status,
                body: body.trim().to_string(),
            });
        }

        let body = response.text()?;
        let compare: CompareResponse = serde_json::from_str(&body)?;

        Ok(compare.files.into_iter().map(|f| f.filename).collect())
    }
}

fn build_client(timeout: Option<Duration>) -> Result<reqwest::blocking::Client, GitHubApiError> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()
        .map_err(GitHubApiError::Client)
}

/// Subset of the compare payload this crate reads.
#[derive(Debug, Deserialize)]
struct CompareResponse {
    #[serde(default)]
    files: Vec<CompareFile>,
}

#[derive(Debug, Deserialize)]
struct CompareFile {
    #[serde(default)]
    filename: String,
}

/// Binds a client to one repository so it can serve as a [`ChangeSource`].
#[derive(Debug, Clone)]
pub struct RemoteChanges {
    client: GitHubApiClient,
    owner: String,
    repo: String,
}

impl RemoteChanges {
    pub fn new(
        client: GitHubApiClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl ChangeSource for RemoteChanges {
    fn changed_files(&self, base_commit: &str, branch: &str) -> Result<Vec<String>, Error> {
        self.client
            .changed_files(&self.owner, &self.repo, base_commit, branch)
            .map_err(Error::from)
    }
}
