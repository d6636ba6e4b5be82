//! Hosting platform services
//!
//! Everything the orchestrator needs from the code host goes through
//! [`PlatformService`], so runs can be driven against GitHub or a test double.

mod detection;
mod factory;
mod github;

pub use detection::parse_repo_slug;
pub use factory::create_platform_service;
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{
    CheckResult, MergeMethod, MergeResult, PlatformConfig, PullRequestSnapshot, Reaction, Role,
};
use async_trait::async_trait;

/// Platform service trait for the operations a merge run performs
///
/// Every method is a fresh request: implementations must not cache roles,
/// mergeability or check states between calls.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Get the collaborator role of `login` on the configured repository
    ///
    /// Non-collaborators resolve to [`Role::None`]; only transport and API
    /// failures are errors.
    async fn get_collaborator_role(&self, login: &str) -> Result<Role>;

    /// Fetch a point-in-time snapshot of a PR, including the check names
    /// branch protection requires on its base branch
    async fn get_pr_snapshot(&self, pr_number: u64) -> Result<PullRequestSnapshot>;

    /// List reported check states for the snapshot's head commit
    async fn list_check_states(&self, snapshot: &PullRequestSnapshot) -> Result<Vec<CheckResult>>;

    /// Merge the snapshot's PR with the specified method
    ///
    /// The snapshot's head SHA guards against merging commits pushed after
    /// the checks were evaluated. Its title and body become the squash
    /// commit message.
    async fn merge_pr(
        &self,
        snapshot: &PullRequestSnapshot,
        method: MergeMethod,
    ) -> Result<MergeResult>;

    /// Delete a branch on the configured repository
    async fn delete_branch(&self, branch: &str) -> Result<()>;

    /// Create a comment on a PR
    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// React to an issue/PR comment
    async fn create_comment_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
