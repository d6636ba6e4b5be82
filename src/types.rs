//! Core types for mergebot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Repository identifier (`owner/name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a repository identifier
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive comparison (GitHub names are case-insensitive)
    pub fn matches(&self, other: &Self) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Platform configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Repository the service operates on
    pub repo: RepoId,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// A posted PR comment that may contain a command.
///
/// Immutable input to exactly one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Repository the PR lives in
    pub repo: RepoId,
    /// PR number
    pub pr_number: u64,
    /// ID of the triggering comment (reactions are attached to it)
    pub comment_id: u64,
    /// Login of the commenter
    pub author: String,
    /// Raw comment text
    pub body: String,
    /// When the comment was posted
    pub created_at: DateTime<Utc>,
}

/// A recognized bot directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Merge the PR once it is ready
    Merge,
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    /// PR is open and can be merged
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// Point-in-time view of a PR.
///
/// Mergeability and checks change outside our control, so snapshots are
/// re-fetched on every poll and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSnapshot {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR description
    pub body: Option<String>,
    /// Current state of the PR
    pub state: PrState,
    /// Whether PR is a draft
    pub is_draft: bool,
    /// Whether PR can be merged (no conflicts)
    /// - `Some(true)` = mergeable
    /// - `Some(false)` = has conflicts
    /// - `None` = unknown (GitHub still computing)
    pub mergeable: Option<bool>,
    /// Head branch name
    pub head_ref: String,
    /// Head commit SHA
    pub head_sha: String,
    /// Full name of the repository the head branch lives in (`None` if deleted)
    pub head_repo: Option<String>,
    /// Base branch name
    pub base_ref: String,
    /// Login of the PR author
    pub author: String,
    /// Check names branch protection requires on the base branch
    pub required_checks: Vec<String>,
    /// Web URL for the PR
    pub html_url: String,
}

impl PullRequestSnapshot {
    /// Whether the head branch lives outside `repo` (a fork)
    pub fn is_from_fork(&self, repo: &RepoId) -> bool {
        self.head_repo
            .as_deref()
            .is_none_or(|head| !head.eq_ignore_ascii_case(&repo.to_string()))
    }
}

/// State of one status check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    /// Queued or running
    Pending,
    /// Completed successfully
    Success,
    /// Completed unsuccessfully
    Failure,
    /// Did not run
    Skipped,
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// One named status check as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name (status context or check run name)
    pub name: String,
    /// Current state
    pub state: CheckState,
}

impl CheckResult {
    /// Convenience constructor
    pub fn new(name: impl Into<String>, state: CheckState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }
}

/// Overall classification of the required checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallCheckState {
    /// At least one required check is still running or not reported yet
    Pending,
    /// Every required check passed
    Success,
    /// At least one required check failed
    Failure,
}

/// Classified view of a PR's checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    /// Overall classification
    pub overall: OverallCheckState,
    /// Required checks that failed
    pub failing: Vec<String>,
    /// Required checks reported as pending
    pub pending: Vec<String>,
    /// Required checks not reported at all
    pub missing: Vec<String>,
    /// Checks that are not required (kept for reporting only)
    pub optional: Vec<CheckResult>,
}

impl CheckSummary {
    /// Required checks that have not resolved yet (pending or missing)
    pub fn unresolved(&self) -> Vec<&str> {
        self.pending
            .iter()
            .chain(&self.missing)
            .map(String::as_str)
            .collect()
    }
}

/// Collaborator role of an identity on a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Not a collaborator
    None,
    /// Read access
    Read,
    /// Triage access
    Triage,
    /// Write (or maintain) access
    Write,
    /// Admin access
    Admin,
}

impl Role {
    /// Whether this role may trigger a merge
    pub const fn can_merge(self) -> bool {
        matches!(self, Self::Write | Self::Admin)
    }

    /// Map GitHub's permission response onto a role.
    ///
    /// `role_name` is the finer-grained value (it distinguishes triage and
    /// maintain); `permission` is the legacy coarse value.
    pub fn from_github(permission: &str, role_name: Option<&str>) -> Self {
        match role_name.unwrap_or(permission) {
            "admin" => Self::Admin,
            "maintain" | "write" => Self::Write,
            "triage" => Self::Triage,
            "read" | "pull" => Self::Read,
            _ => match permission {
                "admin" => Self::Admin,
                "write" | "push" => Self::Write,
                "read" | "pull" => Self::Read,
                _ => Self::None,
            },
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Read => write!(f, "read"),
            Self::Triage => write!(f, "triage"),
            Self::Write => write!(f, "write"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Result of the authorization gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationDecision {
    /// Whether the identity may trigger a merge
    pub authorized: bool,
    /// The identity's effective role
    pub role: Role,
}

/// Readiness of a PR snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Not a draft and mergeable
    Ready,
    /// Draft PR
    Draft,
    /// GitHub reports conflicts with the base branch
    Conflicting,
    /// GitHub has not computed mergeability yet; re-fetch later
    MergeabilityUnknown,
}

/// Result of a merge operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Squash all commits into one
    #[default]
    Squash,
    /// Create a merge commit
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

/// Reaction emoji accepted by the GitHub reactions API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reaction {
    /// 👍
    #[serde(rename = "+1")]
    ThumbsUp,
    /// 👎
    #[serde(rename = "-1")]
    ThumbsDown,
    /// 😄
    #[serde(rename = "laugh")]
    Laugh,
    /// 😕
    #[serde(rename = "confused")]
    Confused,
    /// ❤️
    #[serde(rename = "heart")]
    Heart,
    /// 🎉
    #[serde(rename = "hooray")]
    Hooray,
    /// 🚀
    #[serde(rename = "rocket")]
    Rocket,
    /// 👀
    #[default]
    #[serde(rename = "eyes")]
    Eyes,
}

impl Reaction {
    /// Value of the `content` field in the reactions API
    pub const fn as_api_str(self) -> &'static str {
        match self {
            Self::ThumbsUp => "+1",
            Self::ThumbsDown => "-1",
            Self::Laugh => "laugh",
            Self::Confused => "confused",
            Self::Heart => "heart",
            Self::Hooray => "hooray",
            Self::Rocket => "rocket",
            Self::Eyes => "eyes",
        }
    }
}

/// What happened to the head branch after a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchCleanup {
    /// Branch was deleted
    Deleted {
        /// Branch name
        branch: String,
    },
    /// Deletion was not attempted
    Skipped {
        /// Branch name
        branch: String,
        /// Why it was skipped
        reason: String,
    },
    /// Deletion was attempted and failed (the merge still stands)
    Failed {
        /// Branch name
        branch: String,
        /// Error message from the host
        error: String,
    },
}

/// Terminal result of one orchestration run.
///
/// Only used to select the feedback message; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// PR merged
    Merged {
        /// Merge method used
        method: MergeMethod,
        /// Merge commit SHA, if the host returned one
        sha: Option<String>,
        /// Time spent waiting for checks
        waited: Duration,
        /// Head branch cleanup result
        cleanup: BranchCleanup,
    },
    /// Commenter lacks write access
    RejectedPermission {
        /// The commenter's effective role
        role: Role,
    },
    /// PR is a draft
    RejectedDraft,
    /// PR conflicts with its base branch
    RejectedConflict {
        /// Base branch name
        base_ref: String,
    },
    /// At least one required check failed
    RejectedChecksFailed {
        /// Names of the failing required checks
        failing: Vec<String>,
        /// Time spent waiting before the failure was observed
        waited: Duration,
    },
    /// Required checks did not resolve before the deadline
    TimedOut {
        /// Time spent waiting
        waited: Duration,
        /// Required checks still pending or missing at the deadline
        unresolved: Vec<String>,
        /// GitHub had not finished computing mergeability at the deadline
        mergeability_unknown: bool,
    },
    /// Collaborator fault
    Error {
        /// User-facing summary
        summary: String,
    },
}

impl RunOutcome {
    /// Stable short name, used in logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Merged { .. } => "merged",
            Self::RejectedPermission { .. } => "rejected-permission",
            Self::RejectedDraft => "rejected-draft",
            Self::RejectedConflict { .. } => "rejected-conflict",
            Self::RejectedChecksFailed { .. } => "rejected-checks-failed",
            Self::TimedOut { .. } => "timed-out",
            Self::Error { .. } => "error",
        }
    }

    /// Whether the run ended in a merge
    pub const fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Orchestrator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Comment received
    Received,
    /// Comment contains a merge command
    Parsed,
    /// Checking the commenter's role
    Authorizing,
    /// Checking draft/conflict state
    Evaluating,
    /// Polling required checks
    Waiting,
    /// Merge request in flight
    Merging,
    /// Deleting the head branch
    CleaningUp,
    /// Collaborator fault; always followed by `Done(Error)`
    Errored,
    /// Dropped by shutdown before merging
    Cancelled,
    /// Terminal state
    Done(RunOutcome),
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Received => write!(f, "received"),
            Self::Parsed => write!(f, "parsed"),
            Self::Authorizing => write!(f, "authorizing"),
            Self::Evaluating => write!(f, "evaluating"),
            Self::Waiting => write!(f, "waiting"),
            Self::Merging => write!(f, "merging"),
            Self::CleaningUp => write!(f, "cleaning-up"),
            Self::Errored => write!(f, "errored"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Done(outcome) => write!(f, "done({})", outcome.kind()),
        }
    }
}

/// Record of one orchestration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// States visited, in order
    pub transitions: Vec<RunState>,
    /// Terminal outcome (`None` for a non-command or a cancelled run)
    pub outcome: Option<RunOutcome>,
}

impl RunReport {
    /// Whether the run visited `state`
    pub fn visited(&self, state: &RunState) -> bool {
        self.transitions.contains(state)
    }

    /// Whether shutdown dropped the run
    pub fn was_cancelled(&self) -> bool {
        self.visited(&RunState::Cancelled)
    }
}
