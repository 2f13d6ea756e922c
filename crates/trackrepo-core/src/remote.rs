use std::fmt;

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GithubConfig;

/// Answer of one branch lookup against the repository host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkOutcome {
    BranchExists { head_sha: Option<String> },
    BranchMissing,
    TransportFailure { reason: String },
}

impl NetworkOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BranchExists { .. } => "branch exists",
            Self::BranchMissing => "branch missing",
            Self::TransportFailure { .. } => "transport failure",
        }
    }
}

impl fmt::Display for NetworkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportFailure { reason } => write!(f, "{}: {reason}", self.label()),
            _ => f.write_str(self.label()),
        }
    }
}

/// Remote existence check for `branch` inside `repository` owned by `username`.
///
/// Implementations must not cache: every call reflects the current remote
/// state.
pub trait RepositoryChecker: Send + Sync {
    fn check(&self, username: &str, repository: &str, branch: &str) -> NetworkOutcome;
}

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("invalid GitHub API url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("GitHub API url '{url}' cannot carry path segments")]
    CannotBeABase { url: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
    commit: Option<BranchCommit>,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Found,
    NotFound,
    Indeterminate,
}

fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Found
    } else if status == StatusCode::NOT_FOUND {
        StatusClass::NotFound
    } else {
        StatusClass::Indeterminate
    }
}

/// Branch lookup through the GitHub REST API
/// (`GET /repos/{owner}/{repo}/branches/{branch}`).
pub struct GithubChecker {
    base_url: Url,
    client: Client,
}

impl GithubChecker {
    pub fn new(config: &GithubConfig) -> Result<Self, CheckerError> {
        let raw = config.api_url.trim();
        let base_url = Url::parse(raw).map_err(|source| CheckerError::InvalidBaseUrl {
            url: raw.to_string(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CheckerError::CannotBeABase {
                url: raw.to_string(),
            });
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(CheckerError::Client)?;

        Ok(Self { base_url, client })
    }

    pub fn branch_url(&self, username: &str, repository: &str, branch: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", username, repository, "branches", branch]);
        }
        url
    }

    fn lookup(&self, url: Url, branch: &str) -> NetworkOutcome {
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
        {
            Ok(response) => response,
            Err(error) => {
                let reason = if error.is_timeout() {
                    "request timed out".to_string()
                } else if error.is_connect() {
                    format!("could not connect: {error}")
                } else {
                    format!("request failed: {error}")
                };
                return NetworkOutcome::TransportFailure { reason };
            }
        };

        let status = response.status();
        match classify_status(status) {
            StatusClass::NotFound => NetworkOutcome::BranchMissing,
            StatusClass::Indeterminate => NetworkOutcome::TransportFailure {
                reason: format!("unexpected response from GitHub: HTTP {status}"),
            },
            StatusClass::Found => match response.json::<BranchResponse>() {
                Ok(body) if body.name == branch => NetworkOutcome::BranchExists {
                    head_sha: body.commit.map(|commit| commit.sha),
                },
                // A renamed branch redirects to its new name; the requested one is gone.
                Ok(body) => {
                    debug!(requested = branch, answered = %body.name, "branch was renamed");
                    NetworkOutcome::BranchMissing
                }
                Err(error) => NetworkOutcome::TransportFailure {
                    reason: format!("failed to parse GitHub branch response: {error}"),
                },
            },
        }
    }
}

impl RepositoryChecker for GithubChecker {
    fn check(&self, username: &str, repository: &str, branch: &str) -> NetworkOutcome {
        let url = self.branch_url(username, repository, branch);
        debug!(%url, "checking remote branch");

        let outcome = self.lookup(url, branch);
        match &outcome {
            NetworkOutcome::TransportFailure { reason } => {
                warn!(username, repository, branch, reason = %reason, "branch check was inconclusive");
            }
            other => {
                info!(username, repository, branch, outcome = other.label(), "branch check finished");
            }
        }
        outcome
    }
}
