//! Handle commands - process a single comment

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use chrono::Utc;
use mergebot::error::Result;
use mergebot::event::parse_issue_comment;
use mergebot::feedback::format_duration;
use mergebot::platform::parse_repo_slug;
use mergebot::types::{BranchCleanup, RunOutcome, RunReport, TriggerEvent};
use std::path::Path;

/// A comment given explicitly on the command line
#[derive(Debug, Clone)]
pub struct CommentArgs {
    /// `owner/name` or a repository URL
    pub repo: String,
    /// PR number
    pub pr: u64,
    /// Comment author login
    pub author: String,
    /// Comment id, used for the acknowledgment reaction
    pub comment_id: u64,
    /// Comment text
    pub body: String,
}

/// Run the handle command: one `issue_comment` payload from a file
///
/// Returns `false` when the run ended in an error.
#[allow(clippy::future_not_send)]
pub async fn run_handle(config_path: Option<&Path>, event_path: &Path) -> Result<bool> {
    let payload = std::fs::read_to_string(event_path)?;

    let Some(event) = parse_issue_comment(&payload)? else {
        println!("{}", "Event is not a new PR comment; nothing to do.".muted());
        return Ok(true);
    };

    run_event(config_path, event).await
}

/// Run the comment command: one comment given as arguments
#[allow(clippy::future_not_send)]
pub async fn run_comment(config_path: Option<&Path>, args: CommentArgs) -> Result<bool> {
    let event = TriggerEvent {
        repo: parse_repo_slug(&args.repo)?,
        pr_number: args.pr,
        comment_id: args.comment_id,
        author: args.author,
        body: args.body,
        created_at: Utc::now(),
    };

    run_event(config_path, event).await
}

#[allow(clippy::future_not_send)]
async fn run_event(config_path: Option<&Path>, event: TriggerEvent) -> Result<bool> {
    let ctx = CommandContext::new(config_path, event.repo.clone()).await?;

    if ctx.orchestrator.parser().parse(&event.body).is_none() {
        println!("{}", "Comment holds no merge command; nothing to do.".muted());
        return Ok(true);
    }

    println!(
        "{} {}",
        "Handling".emphasis(),
        format!("{}#{} from @{}", event.repo, event.pr_number, event.author).accent()
    );

    let report = ctx
        .orchestrator
        .run_until(&event, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    print_report(&report);
    Ok(!matches!(report.outcome, Some(RunOutcome::Error { .. })))
}

/// Print the result of one run
pub fn print_report(report: &RunReport) {
    if report.was_cancelled() {
        println!("{} Cancelled before merging", "!".warn());
        return;
    }
    let Some(outcome) = &report.outcome else {
        println!("{}", "No merge command".muted());
        return;
    };

    match outcome {
        RunOutcome::Merged {
            method,
            sha,
            waited,
            cleanup,
        } => {
            let sha = sha.as_deref().unwrap_or("unknown");
            println!("{} Merged ({method}) as {}", check(), sha.accent());
            if !waited.is_zero() {
                println!("   Waited {}", format_duration(*waited).muted());
            }
            match cleanup {
                BranchCleanup::Deleted { branch } => {
                    println!("   Deleted branch {}", branch.accent());
                }
                BranchCleanup::Skipped { branch, reason } => {
                    println!("   Kept branch {} ({})", branch.accent(), reason.muted());
                }
                BranchCleanup::Failed { branch, error } => {
                    println!(
                        "   {}",
                        format!("Failed to delete branch {branch}: {error}").warn()
                    );
                }
            }
        }
        RunOutcome::RejectedPermission { role } => {
            println!("{} Rejected: commenter has {} access", cross(), role.emphasis());
        }
        RunOutcome::RejectedDraft => println!("{} Rejected: PR is a draft", cross()),
        RunOutcome::RejectedConflict { base_ref } => {
            println!("{} Rejected: conflicts with {}", cross(), base_ref.accent());
        }
        RunOutcome::RejectedChecksFailed { failing, .. } => {
            println!(
                "{} Rejected: required checks failed: {}",
                cross(),
                failing.join(", ").accent()
            );
        }
        RunOutcome::TimedOut {
            waited, unresolved, ..
        } => {
            println!(
                "{} Timed out after {}",
                "!".warn(),
                format_duration(*waited).emphasis()
            );
            if !unresolved.is_empty() {
                println!("   Still pending: {}", unresolved.join(", ").accent());
            }
        }
        RunOutcome::Error { summary } => {
            println!("{} {}", cross(), format!("Error: {summary}").error());
        }
    }
}
