//! Error types for mergebot

use thiserror::Error;

/// Errors raised by mergebot.
///
/// Policy rejections (missing permission, draft, conflicts, failing checks,
/// timeouts) are not errors: they are reported as [`RunOutcome`] values.
/// Everything here is a collaborator fault or a local setup problem.
///
/// [`RunOutcome`]: crate::types::RunOutcome
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub API returned an error or an unexpected response
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// No usable authentication token
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook payload could not be turned into a trigger event
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Invalid command-line or API argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The PR was merged by someone else before we got to it
    #[error("PR #{0} is already merged")]
    AlreadyMerged(u64),

    /// The PR was closed before we got to it
    #[error("PR #{0} is closed")]
    PrClosed(u64),

    /// GitHub refused the merge request
    #[error("PR is not mergeable: {0}")]
    NotMergeable(String),

    /// Error bubbled up from octocrab
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Error from raw HTTP requests
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short, non-sensitive description suitable for a PR comment.
    ///
    /// Merge races get a specific explanation; everything else is reported
    /// generically and the full error goes to the logs.
    pub fn user_summary(&self) -> String {
        match self {
            Self::AlreadyMerged(pr) => format!("PR #{pr} was already merged"),
            Self::PrClosed(pr) => format!("PR #{pr} was closed"),
            Self::NotMergeable(_) => {
                "GitHub refused the merge (the PR changed while I was working on it)".to_string()
            }
            Self::Auth(_) => "I could not authenticate with GitHub".to_string(),
            _ => "I could not talk to GitHub".to_string(),
        }
    }
}

/// Result alias for mergebot operations
pub type Result<T> = std::result::Result<T, Error>;
