//! GitHub `issue_comment` webhook payloads
//!
//! The same payload shape is delivered to webhooks and to GitHub Actions
//! (via `GITHUB_EVENT_PATH`). Only newly created comments on pull requests,
//! written by humans, become trigger events.

use crate::error::{Error, Result};
use crate::types::{RepoId, TriggerEvent};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct IssueCommentPayload {
    action: String,
    issue: Issue,
    comment: Comment,
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct Issue {
    number: u64,
    /// Present only when the issue is a pull request
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Comment {
    id: u64,
    body: Option<String>,
    user: User,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    owner: User,
}

/// Turn an `issue_comment` payload into a trigger event.
///
/// Returns `Ok(None)` for payloads that can never carry a command: edits and
/// deletions, comments on plain issues, and comments written by bots.
pub fn parse_issue_comment(payload: &str) -> Result<Option<TriggerEvent>> {
    let payload: IssueCommentPayload = serde_json::from_str(payload)
        .map_err(|e| Error::InvalidEvent(format!("not an issue_comment payload: {e}")))?;

    if payload.action != "created" {
        debug!(action = %payload.action, "ignoring non-created comment event");
        return Ok(None);
    }
    if payload.issue.pull_request.is_none() {
        debug!(issue = payload.issue.number, "ignoring comment on plain issue");
        return Ok(None);
    }
    if payload.comment.user.kind == "Bot" {
        debug!(login = %payload.comment.user.login, "ignoring comment from bot");
        return Ok(None);
    }

    Ok(Some(TriggerEvent {
        repo: RepoId::new(payload.repository.owner.login, payload.repository.name),
        pr_number: payload.issue.number,
        comment_id: payload.comment.id,
        author: payload.comment.user.login,
        body: payload.comment.body.unwrap_or_default(),
        created_at: payload.comment.created_at,
    }))
}
