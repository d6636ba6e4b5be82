//! User-facing feedback on the PR
//!
//! Two touch points per recognized command: a reaction as soon as the
//! command is seen, and one terminal comment. Both are fire-and-forget; a
//! failure to post feedback is logged and never changes the run's outcome.

use crate::platform::PlatformService;
use crate::types::{BranchCleanup, Reaction, RunOutcome, TriggerEvent};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{debug, warn};

/// Posts acknowledgments and outcome comments
pub struct FeedbackReporter<'a> {
    platform: &'a dyn PlatformService,
    ack_reaction: Reaction,
}

impl<'a> FeedbackReporter<'a> {
    /// Create a reporter posting through `platform`
    pub fn new(platform: &'a dyn PlatformService, ack_reaction: Reaction) -> Self {
        Self {
            platform,
            ack_reaction,
        }
    }

    /// React to the triggering comment
    pub async fn acknowledge(&self, event: &TriggerEvent) {
        if let Err(e) = self
            .platform
            .create_comment_reaction(event.comment_id, self.ack_reaction)
            .await
        {
            warn!(comment_id = event.comment_id, error = %e, "failed to acknowledge command");
        }
    }

    /// Post the terminal outcome comment
    pub async fn report(&self, event: &TriggerEvent, outcome: &RunOutcome) {
        self.post(event, &render_outcome(event, outcome)).await;
    }

    /// Tell the commenter an earlier command for this PR is still running
    pub async fn already_running(&self, event: &TriggerEvent) {
        let body = format!(
            "@{} :hourglass: A merge for this PR is already in progress; ignoring this command.",
            event.author
        );
        self.post(event, &body).await;
    }

    async fn post(&self, event: &TriggerEvent, body: &str) {
        match self.platform.create_pr_comment(event.pr_number, body).await {
            Ok(()) => debug!(pr_number = event.pr_number, "posted feedback"),
            Err(e) => warn!(pr_number = event.pr_number, error = %e, "failed to post feedback"),
        }
    }
}

/// Render the terminal comment for `outcome` (PURE)
#[must_use]
pub fn render_outcome(event: &TriggerEvent, outcome: &RunOutcome) -> String {
    let who = &event.author;
    match outcome {
        RunOutcome::Merged {
            method,
            sha,
            waited,
            cleanup,
        } => {
            let mut msg = format!(":white_check_mark: @{who} Merged #{} ({method})", event.pr_number);
            if let Some(sha) = sha {
                let short = sha.get(..7).unwrap_or(sha);
                let _ = write!(msg, " as `{short}`");
            }
            if !waited.is_zero() {
                let _ = write!(msg, " after waiting {} for checks", format_duration(*waited));
            }
            msg.push('.');
            match cleanup {
                BranchCleanup::Deleted { branch } => {
                    let _ = write!(msg, " Deleted branch `{branch}`.");
                }
                BranchCleanup::Skipped { branch, reason } => {
                    let _ = write!(msg, " Kept branch `{branch}`: {reason}.");
                }
                BranchCleanup::Failed { branch, error } => {
                    let _ = write!(
                        msg,
                        "\n\n:warning: Could not delete branch `{branch}` ({error}); delete it manually."
                    );
                }
            }
            msg
        }
        RunOutcome::RejectedPermission { role } => format!(
            ":no_entry: @{who} you don't have permission to merge this PR \
             (your access is `{role}`). Only collaborators with write or admin \
             access can trigger a merge."
        ),
        RunOutcome::RejectedDraft => format!(
            ":construction: @{who} this PR is a draft. Mark it ready for review, \
             then comment again to merge."
        ),
        RunOutcome::RejectedConflict { base_ref } => format!(
            ":x: @{who} this PR has merge conflicts with `{base_ref}`. Resolve \
             them (rebase or merge `{base_ref}` in), then comment again."
        ),
        RunOutcome::RejectedChecksFailed { failing, waited } => {
            let mut msg = format!(
                ":x: @{who} not merging: required checks failed: {}.",
                code_list(failing)
            );
            if !waited.is_zero() {
                let _ = write!(msg, " (after waiting {})", format_duration(*waited));
            }
            msg.push_str(" Fix them, then comment again.");
            msg
        }
        RunOutcome::TimedOut {
            waited,
            unresolved,
            mergeability_unknown,
        } => {
            let mut msg = format!(
                ":hourglass: @{who} gave up after waiting {} for this PR to become mergeable.",
                format_duration(*waited)
            );
            if !unresolved.is_empty() {
                let _ = write!(msg, " Still waiting on: {}.", code_list(unresolved));
            }
            if *mergeability_unknown {
                msg.push_str(" GitHub had not finished computing mergeability.");
            }
            msg.push_str(" Comment again to retry.");
            msg
        }
        RunOutcome::Error { summary } => format!(
            ":warning: @{who} something went wrong while merging: {summary}. \
             Details are in the bot logs; comment again to retry."
        ),
    }
}

fn code_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable duration: `45s`, `2m 30s`, `1h 5m`
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m {s}s"),
        (h, 0, _) => format!("{h}h"),
        (h, m, _) => format!("{h}h {m}m"),
    }
}
