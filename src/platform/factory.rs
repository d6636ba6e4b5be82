//! Platform service construction

use crate::auth::get_github_auth;
use crate::config::MergeBotConfig;
use crate::error::Result;
use crate::platform::{GitHubService, PlatformService};
use crate::types::RepoId;
use std::sync::Arc;

/// Create a GitHub service for `repo`, discovering a token on the way
pub async fn create_platform_service(
    repo: RepoId,
    config: &MergeBotConfig,
) -> Result<Arc<dyn PlatformService>> {
    let auth = get_github_auth(config.host.as_deref()).await?;
    let service = GitHubService::new(&auth.token, repo, config.host.clone())?;
    Ok(Arc::new(service))
}
