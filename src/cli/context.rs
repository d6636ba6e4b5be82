//! Shared command context for CLI commands
//!
//! Extracts the setup shared by handle, comment and watch.

use mergebot::config::{MergeBotConfig, load_config};
use mergebot::error::Result;
use mergebot::orchestrator::Orchestrator;
use mergebot::platform::create_platform_service;
use mergebot::types::RepoId;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared context for CLI commands that talk to GitHub
///
/// Loading config, discovering a token and building the orchestrator all
/// happen here, so a bad config fails before any event is read.
pub struct CommandContext {
    /// Loaded configuration
    pub config: MergeBotConfig,
    /// Repository the orchestrator is bound to
    pub repo: RepoId,
    /// Orchestrator for that repository
    pub orchestrator: Arc<Orchestrator>,
}

impl CommandContext {
    /// Create a new command context bound to `repo`
    pub async fn new(config_path: Option<&Path>, repo: RepoId) -> Result<Self> {
        let config = load_config(config_path)?;
        debug!(?config, "loaded config");

        let platform = create_platform_service(repo.clone(), &config).await?;
        let orchestrator = Orchestrator::new(platform, config.clone())?;

        Ok(Self {
            config,
            repo,
            orchestrator: Arc::new(orchestrator),
        })
    }
}
