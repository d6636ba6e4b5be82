//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    CheckResult, CheckState, MergeMethod, MergeResult, PlatformConfig, PrState,
    PullRequestSnapshot, Reaction, RepoId, Role,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout for every GitHub call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest page size the checks endpoints accept
const PAGE_SIZE: usize = 100;

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests
    token: String,
    /// HTTP client for endpoints octocrab does not cover
    http_client: Client,
    /// API host for raw requests
    api_host: String,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, repo: RepoId, host: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder()
            .personal_token(token.to_string())
            .set_connect_timeout(Some(REQUEST_TIMEOUT))
            .set_read_timeout(Some(REQUEST_TIMEOUT))
            .set_write_timeout(Some(REQUEST_TIMEOUT));

        let api_host = if let Some(ref h) = host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
            format!("{h}/api/v3")
        } else {
            "api.github.com".to_string()
        };

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("mergebot")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: PlatformConfig { repo, host },
            token: token.to_string(),
            http_client,
            api_host,
        })
    }

    fn owner(&self) -> &str {
        &self.config.repo.owner
    }

    fn repo(&self) -> &str {
        &self.config.repo.name
    }

    /// Build an authenticated request against `/repos/{owner}/{repo}{path}`
    fn repo_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "https://{}/repos/{}/{}{}",
            self.api_host,
            self.owner(),
            self.repo(),
            path
        );
        self.http_client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Required status check names for a base branch.
    ///
    /// Unprotected branches (404) and tokens that may not read protection
    /// settings (403) yield an empty set.
    async fn required_checks(&self, base_ref: &str) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct RequiredStatusChecks {
            #[serde(default)]
            contexts: Vec<String>,
            #[serde(default)]
            checks: Vec<RequiredCheck>,
        }

        #[derive(Deserialize)]
        struct RequiredCheck {
            context: String,
        }

        let path = format!(
            "/branches/{}/protection/required_status_checks",
            urlencoding::encode(base_ref)
        );
        let response = self
            .repo_request(Method::GET, &path)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch branch protection: {e}")))?;

        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN
        ) {
            debug!(base_ref, status = %response.status(), "no readable required status checks");
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Branch protection request failed: {}",
                response.status()
            )));
        }

        let required: RequiredStatusChecks = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse branch protection: {e}")))?;

        let mut names = required.contexts;
        for check in required.checks {
            if !names.contains(&check.context) {
                names.push(check.context);
            }
        }
        debug!(base_ref, count = names.len(), "fetched required checks");
        Ok(names)
    }

    /// Legacy commit statuses via the combined status API, every page
    async fn commit_statuses(&self, sha: &str) -> Result<Vec<CheckResult>> {
        #[derive(Deserialize)]
        struct CombinedStatus {
            total_count: usize,
            statuses: Vec<Status>,
        }

        #[derive(Deserialize)]
        struct Status {
            context: String,
            state: String,
        }

        let mut results = Vec::new();
        for page in 1.. {
            let response = self
                .repo_request(
                    Method::GET,
                    &format!("/commits/{sha}/status?per_page={PAGE_SIZE}&page={page}"),
                )
                .send()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to fetch commit status: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::GitHubApi(format!(
                    "Commit status request failed: {}",
                    response.status()
                )));
            }

            let combined: CombinedStatus = response
                .json()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to parse commit status: {e}")))?;

            let page_len = combined.statuses.len();
            results.extend(
                combined
                    .statuses
                    .into_iter()
                    .map(|s| CheckResult::new(s.context, status_state(&s.state))),
            );
            if !has_next_page(results.len(), combined.total_count, page_len) {
                break;
            }
        }
        Ok(results)
    }

    /// GitHub Actions (and other app) check runs, every page
    async fn check_runs(&self, sha: &str) -> Result<Vec<CheckResult>> {
        #[derive(Deserialize)]
        struct CheckRunsResponse {
            total_count: usize,
            check_runs: Vec<CheckRun>,
        }

        #[derive(Deserialize)]
        struct CheckRun {
            name: String,
            status: String,
            conclusion: Option<String>,
        }

        let mut results = Vec::new();
        for page in 1.. {
            let response = self
                .repo_request(
                    Method::GET,
                    &format!(
                        "/commits/{sha}/check-runs?filter=latest&per_page={PAGE_SIZE}&page={page}"
                    ),
                )
                .send()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to fetch check runs: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::GitHubApi(format!(
                    "Check runs request failed: {}",
                    response.status()
                )));
            }

            let runs: CheckRunsResponse = response
                .json()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to parse check runs: {e}")))?;

            let page_len = runs.check_runs.len();
            results.extend(runs.check_runs.into_iter().map(|run| {
                let state = check_run_state(&run.status, run.conclusion.as_deref());
                CheckResult::new(run.name, state)
            }));
            if !has_next_page(results.len(), runs.total_count, page_len) {
                break;
            }
        }
        Ok(results)
    }
}

/// Whether another page is worth fetching after `fetched` of `total` items.
///
/// An empty or short page ends the listing even if `total` says otherwise.
const fn has_next_page(fetched: usize, total: usize, page_len: usize) -> bool {
    page_len == PAGE_SIZE && fetched < total
}

/// Map a commit status state onto a check state
fn status_state(state: &str) -> CheckState {
    match state {
        "success" => CheckState::Success,
        "pending" => CheckState::Pending,
        // "failure", "error" and anything unexpected
        _ => CheckState::Failure,
    }
}

/// Map a check run status/conclusion pair onto a check state
fn check_run_state(status: &str, conclusion: Option<&str>) -> CheckState {
    if status != "completed" {
        return CheckState::Pending;
    }
    match conclusion {
        Some("success" | "neutral") => CheckState::Success,
        Some("skipped") => CheckState::Skipped,
        // failure, cancelled, timed_out, action_required, stale, or missing
        _ => CheckState::Failure,
    }
}

/// Squash commit title: the PR title with its number appended
fn squash_title(snapshot: &PullRequestSnapshot) -> String {
    format!("{} (#{})", snapshot.title, snapshot.number)
}

/// Classify an octocrab merge error
fn merge_error(pr_number: u64, err: octocrab::Error) -> Error {
    if let octocrab::Error::GitHub { ref source, .. } = err {
        let message = source.message.clone();
        match source.status_code.as_u16() {
            405 if message.to_lowercase().contains("already merged") => {
                return Error::AlreadyMerged(pr_number);
            }
            405 | 409 | 422 => return Error::NotMergeable(message),
            _ => {}
        }
    }
    Error::GitHubApi(format!("Merge failed: {err}"))
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_collaborator_role(&self, login: &str) -> Result<Role> {
        #[derive(Deserialize)]
        struct PermissionResponse {
            permission: String,
            role_name: Option<String>,
        }

        debug!(login, "fetching collaborator permission");
        let path = format!(
            "/collaborators/{}/permission",
            urlencoding::encode(login)
        );
        let response = self
            .repo_request(Method::GET, &path)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch permission: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(login, "not a collaborator");
            return Ok(Role::None);
        }
        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Permission request failed: {}",
                response.status()
            )));
        }

        let permission: PermissionResponse = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse permission: {e}")))?;

        let role = Role::from_github(&permission.permission, permission.role_name.as_deref());
        debug!(login, %role, "fetched collaborator role");
        Ok(role)
    }

    async fn get_pr_snapshot(&self, pr_number: u64) -> Result<PullRequestSnapshot> {
        debug!(pr_number, "fetching PR snapshot");

        let pr = self
            .client
            .pulls(self.owner(), self.repo())
            .get(pr_number)
            .await?;

        // Determine PR state from GitHub's state field and merged_at
        let state = match pr.state {
            Some(octocrab::models::IssueState::Open) => PrState::Open,
            Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => PrState::Merged,
            // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
            Some(_) | None => PrState::Closed,
        };

        let required_checks = self.required_checks(&pr.base.ref_field).await?;

        let snapshot = PullRequestSnapshot {
            number: pr.number,
            title: pr.title.clone().unwrap_or_default(),
            body: pr.body.clone(),
            state,
            is_draft: pr.draft.unwrap_or(false),
            mergeable: pr.mergeable,
            head_ref: pr.head.ref_field.clone(),
            head_sha: pr.head.sha.clone(),
            head_repo: pr.head.repo.as_ref().and_then(|r| r.full_name.clone()),
            base_ref: pr.base.ref_field.clone(),
            author: pr.user.as_ref().map(|u| u.login.clone()).unwrap_or_default(),
            required_checks,
            html_url: pr
                .html_url
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        };

        debug!(
            pr_number,
            state = %snapshot.state,
            draft = snapshot.is_draft,
            mergeable = ?snapshot.mergeable,
            "fetched PR snapshot"
        );
        Ok(snapshot)
    }

    async fn list_check_states(&self, snapshot: &PullRequestSnapshot) -> Result<Vec<CheckResult>> {
        debug!(pr_number = snapshot.number, sha = %snapshot.head_sha, "listing check states");

        // GitHub has two CI systems: the legacy commit status API used by
        // external CI services, and check runs used by GitHub Actions.
        let mut results = self.commit_statuses(&snapshot.head_sha).await?;
        results.extend(self.check_runs(&snapshot.head_sha).await?);

        debug!(pr_number = snapshot.number, count = results.len(), "listed check states");
        Ok(results)
    }

    async fn merge_pr(
        &self,
        snapshot: &PullRequestSnapshot,
        method: MergeMethod,
    ) -> Result<MergeResult> {
        let pr_number = snapshot.number;
        let expected_head_sha = snapshot.head_sha.as_str();
        debug!(pr_number, %method, "merging PR");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let pulls = self.client.pulls(self.owner(), self.repo());

        // For squash, use PR title and body as commit message
        let result = if method == MergeMethod::Squash {
            let mut builder = pulls
                .merge(pr_number)
                .method(octocrab_method)
                .sha(expected_head_sha)
                .title(squash_title(snapshot));
            if let Some(ref body) = snapshot.body {
                builder = builder.message(body);
            }
            builder.send().await
        } else {
            pulls
                .merge(pr_number)
                .method(octocrab_method)
                .sha(expected_head_sha)
                .send()
                .await
        }
        .map_err(|e| merge_error(pr_number, e))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        debug!(branch, "deleting branch");
        let encoded = branch
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let response = self
            .repo_request(Method::DELETE, &format!("/git/refs/heads/{encoded}"))
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to delete branch: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Deleting branch {branch} failed: {}",
                response.status()
            )));
        }
        debug!(branch, "deleted branch");
        Ok(())
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.client
            .issues(self.owner(), self.repo())
            .create_comment(pr_number, body)
            .await?;
        debug!(pr_number, "created PR comment");
        Ok(())
    }

    async fn create_comment_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()> {
        debug!(comment_id, reaction = reaction.as_api_str(), "reacting to comment");
        let response = self
            .repo_request(
                Method::POST,
                &format!("/issues/comments/{comment_id}/reactions"),
            )
            .json(&serde_json::json!({ "content": reaction.as_api_str() }))
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to create reaction: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Reaction request failed: {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squash_title_appends_number() {
        let snapshot = PullRequestSnapshot {
            number: 42,
            title: "Add widgets".to_string(),
            body: None,
            state: PrState::Open,
            is_draft: false,
            mergeable: Some(true),
            head_ref: "widgets".to_string(),
            head_sha: "abc123".to_string(),
            head_repo: Some("acme/widgets".to_string()),
            base_ref: "main".to_string(),
            author: "octocat".to_string(),
            required_checks: Vec::new(),
            html_url: String::new(),
        };
        assert_eq!(squash_title(&snapshot), "Add widgets (#42)");
    }

    #[test]
    fn test_has_next_page() {
        assert!(has_next_page(100, 250, 100));
        assert!(has_next_page(200, 250, 100));
        assert!(!has_next_page(250, 250, 50));
        assert!(!has_next_page(100, 100, 100));
        // Short or empty page ends the listing whatever the total says
        assert!(!has_next_page(40, 250, 40));
        assert!(!has_next_page(100, 250, 0));
    }

    #[tokio::test]
    async fn test_service_builds_with_request_timeouts() {
        let service = GitHubService::new("token", RepoId::new("acme", "widgets"), None);
        assert!(service.is_ok());
    }

    #[test]
    fn test_status_state_mapping() {
        assert_eq!(status_state("success"), CheckState::Success);
        assert_eq!(status_state("pending"), CheckState::Pending);
        assert_eq!(status_state("failure"), CheckState::Failure);
        assert_eq!(status_state("error"), CheckState::Failure);
    }

    #[test]
    fn test_check_run_state_mapping() {
        assert_eq!(check_run_state("queued", None), CheckState::Pending);
        assert_eq!(check_run_state("in_progress", None), CheckState::Pending);
        assert_eq!(check_run_state("completed", Some("success")), CheckState::Success);
        assert_eq!(check_run_state("completed", Some("neutral")), CheckState::Success);
        assert_eq!(check_run_state("completed", Some("skipped")), CheckState::Skipped);
        assert_eq!(check_run_state("completed", Some("cancelled")), CheckState::Failure);
        assert_eq!(check_run_state("completed", Some("timed_out")), CheckState::Failure);
        assert_eq!(check_run_state("completed", None), CheckState::Failure);
    }
}
