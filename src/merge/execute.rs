//! Merge execution - effectful operations
//!
//! The merge itself is all-or-nothing; branch cleanup afterwards is best
//! effort and its result is only reported.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{BranchCleanup, MergeMethod, MergeResult, PullRequestSnapshot};
use tracing::{debug, warn};

/// Merge the PR at the snapshot's head (EFFECTFUL)
///
/// A response that reports `merged: false` is a race with an external
/// change and surfaces as [`Error::NotMergeable`], never as success.
pub async fn merge_pull_request(
    platform: &dyn PlatformService,
    snapshot: &PullRequestSnapshot,
    method: MergeMethod,
) -> Result<MergeResult> {
    let result = platform
        .merge_pr(snapshot, method)
        .await?;

    if !result.merged {
        return Err(Error::NotMergeable(
            result
                .message
                .unwrap_or_else(|| "merge was not performed".to_string()),
        ));
    }

    debug!(pr_number = snapshot.number, sha = ?result.sha, "merged");
    Ok(result)
}

/// Delete the head branch after a merge (EFFECTFUL, never fails)
///
/// Branches in forks are left alone: they belong to someone else.
pub async fn cleanup_branch(
    platform: &dyn PlatformService,
    snapshot: &PullRequestSnapshot,
    enabled: bool,
) -> BranchCleanup {
    let branch = snapshot.head_ref.clone();

    if !enabled {
        return BranchCleanup::Skipped {
            branch,
            reason: "branch deletion is disabled".to_string(),
        };
    }
    if snapshot.is_from_fork(&platform.config().repo) {
        return BranchCleanup::Skipped {
            branch,
            reason: "the branch lives in a fork".to_string(),
        };
    }

    match platform.delete_branch(&branch).await {
        Ok(()) => BranchCleanup::Deleted { branch },
        Err(e) => {
            warn!(branch = %branch, error = %e, "failed to delete head branch");
            BranchCleanup::Failed {
                branch,
                error: e.to_string(),
            }
        }
    }
}
