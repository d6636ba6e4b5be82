//! Shared test helpers

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::{CreateCommentCall, MergePrCall, MockPlatformService, ReactionCall};

use chrono::Utc;
use mergebot::config::MergeBotConfig;
use mergebot::types::{
    CheckResult, CheckState, PlatformConfig, PrState, PullRequestSnapshot, RepoId, TriggerEvent,
};

pub const OWNER: &str = "acme";
pub const REPO: &str = "widgets";

pub fn repo_id() -> RepoId {
    RepoId::new(OWNER, REPO)
}

/// Platform config for the test repository on github.com
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        repo: repo_id(),
        host: None,
    }
}

/// Mock bound to the test repository
pub fn mock_service() -> MockPlatformService {
    MockPlatformService::with_config(github_config())
}

/// Default config: 30s poll interval, 600s timeout
pub fn test_config() -> MergeBotConfig {
    MergeBotConfig::default()
}

/// An open, mergeable, non-draft PR requiring `build` and `test`
pub fn make_snapshot(number: u64) -> PullRequestSnapshot {
    PullRequestSnapshot {
        number,
        title: format!("Change {number}"),
        body: Some(format!("Implements change {number}")),
        state: PrState::Open,
        is_draft: false,
        mergeable: Some(true),
        head_ref: format!("feature-{number}"),
        head_sha: format!("head_sha_{number}"),
        head_repo: Some(format!("{OWNER}/{REPO}")),
        base_ref: "main".to_string(),
        author: "octocat".to_string(),
        required_checks: vec!["build".to_string(), "test".to_string()],
        html_url: format!("https://github.com/{OWNER}/{REPO}/pull/{number}"),
    }
}

pub fn checks(entries: &[(&str, CheckState)]) -> Vec<CheckResult> {
    entries
        .iter()
        .map(|(name, state)| CheckResult::new(*name, *state))
        .collect()
}

pub fn passing_checks(names: &[String]) -> Vec<CheckResult> {
    names
        .iter()
        .map(|name| CheckResult::new(name.as_str(), CheckState::Success))
        .collect()
}

/// A comment on a PR of the test repository
pub fn comment_event(pr_number: u64, author: &str, body: &str) -> TriggerEvent {
    TriggerEvent {
        repo: repo_id(),
        pr_number,
        comment_id: 1000 + pr_number,
        author: author.to_string(),
        body: body.to_string(),
        created_at: Utc::now(),
    }
}
