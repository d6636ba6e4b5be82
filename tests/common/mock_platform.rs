//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use mergebot::error::{Error, Result};
use mergebot::platform::PlatformService;
use mergebot::types::{
    CheckResult, MergeMethod, MergeResult, PlatformConfig, PrState, PullRequestSnapshot,
    Reaction, Role,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Call record for `create_pr_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub method: MergeMethod,
    pub expected_head_sha: String,
    pub title: String,
}

/// Call record for `create_comment_reaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCall {
    pub comment_id: u64,
    pub reaction: Reaction,
}

/// Scripted responses: each call takes the next entry, the last one repeats
#[derive(Debug)]
struct Script<T> {
    entries: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new(entries: Vec<T>) -> Self {
        assert!(!entries.is_empty(), "script needs at least one entry");
        Self {
            entries: entries.into(),
        }
    }

    fn next(&mut self) -> T {
        if self.entries.len() > 1 {
            self.entries.pop_front().expect("non-empty script")
        } else {
            self.entries.front().cloned().expect("non-empty script")
        }
    }
}

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using mockall,
/// so scripted sequences and host-side merge semantics stay easy to follow.
///
/// Features:
/// - Scripted PR snapshot and check-state sequences per PR
/// - Host-like merge: a merged PR reports `Merged` and refuses a second merge
/// - Head SHA guard on merge
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    roles: Mutex<HashMap<String, Role>>,
    snapshots: Mutex<HashMap<u64, Script<PullRequestSnapshot>>>,
    checks: Mutex<HashMap<u64, Script<Vec<CheckResult>>>>,
    /// Last snapshot handed out per PR (what the host currently shows)
    current: Mutex<HashMap<u64, PullRequestSnapshot>>,
    merged: Mutex<HashSet<u64>>,
    /// When set, `merge_pr` blocks until this is notified
    merge_release: Mutex<Option<Arc<Notify>>>,
    merge_entered: Notify,
    // Call tracking
    role_calls: Mutex<Vec<String>>,
    snapshot_calls: Mutex<Vec<u64>>,
    check_calls: Mutex<Vec<String>>,
    merge_pr_calls: Mutex<Vec<MergePrCall>>,
    delete_branch_calls: Mutex<Vec<String>>,
    create_comment_calls: Mutex<Vec<CreateCommentCall>>,
    reaction_calls: Mutex<Vec<ReactionCall>>,
    // Error injection
    error_on_role: Mutex<Option<String>>,
    error_on_snapshot: Mutex<Option<String>>,
    error_on_checks: Mutex<Option<String>>,
    error_on_merge_pr: Mutex<Option<String>>,
    error_on_delete_branch: Mutex<Option<String>>,
    error_on_comment: Mutex<Option<String>>,
    error_on_reaction: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            roles: Mutex::new(HashMap::new()),
            snapshots: Mutex::new(HashMap::new()),
            checks: Mutex::new(HashMap::new()),
            current: Mutex::new(HashMap::new()),
            merged: Mutex::new(HashSet::new()),
            merge_release: Mutex::new(None),
            merge_entered: Notify::new(),
            role_calls: Mutex::new(Vec::new()),
            snapshot_calls: Mutex::new(Vec::new()),
            check_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            delete_branch_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            reaction_calls: Mutex::new(Vec::new()),
            error_on_role: Mutex::new(None),
            error_on_snapshot: Mutex::new(None),
            error_on_checks: Mutex::new(None),
            error_on_merge_pr: Mutex::new(None),
            error_on_delete_branch: Mutex::new(None),
            error_on_comment: Mutex::new(None),
            error_on_reaction: Mutex::new(None),
        }
    }

    // === Merge holding ===

    /// Make every `merge_pr` call block until the returned handle is notified
    pub fn hold_merges(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.merge_release.lock().unwrap() = Some(Arc::clone(&release));
        release
    }

    /// Resolves once a held `merge_pr` call has started
    pub async fn merge_entered(&self) {
        self.merge_entered.notified().await;
    }

    // === Error injection methods ===

    /// Make `get_collaborator_role` return an error
    pub fn fail_role(&self, msg: &str) {
        *self.error_on_role.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_pr_snapshot` return an error
    pub fn fail_snapshot(&self, msg: &str) {
        *self.error_on_snapshot.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_check_states` return an error
    pub fn fail_checks(&self, msg: &str) {
        *self.error_on_checks.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge_pr` return an error
    pub fn fail_merge_pr(&self, msg: &str) {
        *self.error_on_merge_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `delete_branch` return an error
    pub fn fail_delete_branch(&self, msg: &str) {
        *self.error_on_delete_branch.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pr_comment` return an error
    pub fn fail_comment(&self, msg: &str) {
        *self.error_on_comment.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_comment_reaction` return an error
    pub fn fail_reaction(&self, msg: &str) {
        *self.error_on_reaction.lock().unwrap() = Some(msg.to_string());
    }

    // === Response setup ===

    /// Set the collaborator role for a login (unknown logins are `Role::None`)
    pub fn set_role(&self, login: &str, role: Role) {
        self.roles.lock().unwrap().insert(login.to_string(), role);
    }

    /// Script the snapshots `get_pr_snapshot` returns for a PR
    pub fn set_snapshots(&self, pr_number: u64, snapshots: Vec<PullRequestSnapshot>) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(pr_number, Script::new(snapshots));
    }

    /// Script the check states `list_check_states` returns for a PR
    pub fn set_checks(&self, pr_number: u64, checks: Vec<Vec<CheckResult>>) {
        self.checks
            .lock()
            .unwrap()
            .insert(pr_number, Script::new(checks));
    }

    /// Helper to set up an open, mergeable PR whose required checks all pass
    pub fn setup_ready_pr(&self, pr_number: u64) {
        let snapshot = super::make_snapshot(pr_number);
        let checks = super::passing_checks(&snapshot.required_checks);
        self.set_snapshots(pr_number, vec![snapshot]);
        self.set_checks(pr_number, vec![checks]);
    }

    // === Call inspection ===

    pub fn get_role_calls(&self) -> Vec<String> {
        self.role_calls.lock().unwrap().clone()
    }

    pub fn get_snapshot_calls(&self) -> Vec<u64> {
        self.snapshot_calls.lock().unwrap().clone()
    }

    /// Head SHAs checks were listed for, in order
    pub fn get_check_calls(&self) -> Vec<String> {
        self.check_calls.lock().unwrap().clone()
    }

    pub fn get_merge_pr_calls(&self) -> Vec<MergePrCall> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    pub fn get_delete_branch_calls(&self) -> Vec<String> {
        self.delete_branch_calls.lock().unwrap().clone()
    }

    pub fn get_create_comment_calls(&self) -> Vec<CreateCommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    pub fn get_reaction_calls(&self) -> Vec<ReactionCall> {
        self.reaction_calls.lock().unwrap().clone()
    }

    /// Whether the mock considers the PR merged
    pub fn is_merged(&self, pr_number: u64) -> bool {
        self.merged.lock().unwrap().contains(&pr_number)
    }

    /// Body of the only comment posted on a PR
    pub fn single_comment(&self, pr_number: u64) -> String {
        let bodies: Vec<String> = self
            .get_create_comment_calls()
            .into_iter()
            .filter(|c| c.pr_number == pr_number)
            .map(|c| c.body)
            .collect();
        assert_eq!(
            bodies.len(),
            1,
            "expected exactly one comment on PR #{pr_number}, got {bodies:?}"
        );
        bodies.into_iter().next().unwrap()
    }

    // === Assertions ===

    pub fn assert_merge_called(&self, pr_number: u64) {
        let calls = self.get_merge_pr_calls();
        assert!(
            calls.iter().any(|c| c.pr_number == pr_number),
            "expected merge_pr for PR #{pr_number}, got {calls:?}"
        );
    }

    pub fn assert_merge_not_called(&self, pr_number: u64) {
        let calls = self.get_merge_pr_calls();
        assert!(
            !calls.iter().any(|c| c.pr_number == pr_number),
            "expected no merge_pr for PR #{pr_number}, got {calls:?}"
        );
    }

    pub fn assert_merge_called_with_method(&self, pr_number: u64, method: MergeMethod) {
        let calls = self.get_merge_pr_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.pr_number == pr_number && c.method == method),
            "expected merge_pr for PR #{pr_number} with {method:?}, got {calls:?}"
        );
    }

    pub fn merge_call_count(&self) -> usize {
        self.merge_pr_calls.lock().unwrap().len()
    }

    pub fn comment_count(&self) -> usize {
        self.create_comment_calls.lock().unwrap().len()
    }
}

fn injected(slot: &Mutex<Option<String>>) -> Result<()> {
    match slot.lock().unwrap().clone() {
        Some(msg) => Err(Error::GitHubApi(msg)),
        None => Ok(()),
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_collaborator_role(&self, login: &str) -> Result<Role> {
        self.role_calls.lock().unwrap().push(login.to_string());
        injected(&self.error_on_role)?;
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(login)
            .copied()
            .unwrap_or(Role::None))
    }

    async fn get_pr_snapshot(&self, pr_number: u64) -> Result<PullRequestSnapshot> {
        self.snapshot_calls.lock().unwrap().push(pr_number);
        injected(&self.error_on_snapshot)?;

        let mut snapshot = if self.is_merged(pr_number) {
            // Host state is frozen after a merge
            self.current
                .lock()
                .unwrap()
                .get(&pr_number)
                .cloned()
                .ok_or_else(|| Error::GitHubApi(format!("PR #{pr_number} not found")))?
        } else {
            self.snapshots
                .lock()
                .unwrap()
                .get_mut(&pr_number)
                .map(Script::next)
                .ok_or_else(|| Error::GitHubApi(format!("PR #{pr_number} not found")))?
        };
        if self.is_merged(pr_number) {
            snapshot.state = PrState::Merged;
        }

        self.current
            .lock()
            .unwrap()
            .insert(pr_number, snapshot.clone());
        Ok(snapshot)
    }

    async fn list_check_states(&self, snapshot: &PullRequestSnapshot) -> Result<Vec<CheckResult>> {
        self.check_calls
            .lock()
            .unwrap()
            .push(snapshot.head_sha.clone());
        injected(&self.error_on_checks)?;
        Ok(self
            .checks
            .lock()
            .unwrap()
            .get_mut(&snapshot.number)
            .map(Script::next)
            .unwrap_or_default())
    }

    async fn merge_pr(
        &self,
        snapshot: &PullRequestSnapshot,
        method: MergeMethod,
    ) -> Result<MergeResult> {
        let pr_number = snapshot.number;
        let expected_head_sha = snapshot.head_sha.as_str();
        self.merge_pr_calls.lock().unwrap().push(MergePrCall {
            pr_number,
            method,
            expected_head_sha: expected_head_sha.to_string(),
            title: snapshot.title.clone(),
        });

        let release = self.merge_release.lock().unwrap().clone();
        if let Some(release) = release {
            self.merge_entered.notify_one();
            release.notified().await;
        }
        injected(&self.error_on_merge_pr)?;

        let current_sha = self
            .current
            .lock()
            .unwrap()
            .get(&pr_number)
            .map(|s| s.head_sha.clone());
        if current_sha.as_deref() != Some(expected_head_sha) {
            return Err(Error::NotMergeable(
                "Head branch was modified. Review and try the merge again.".to_string(),
            ));
        }
        if !self.merged.lock().unwrap().insert(pr_number) {
            return Err(Error::AlreadyMerged(pr_number));
        }

        Ok(MergeResult {
            merged: true,
            sha: Some(format!("merged_sha_{pr_number}")),
            message: None,
        })
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.delete_branch_calls
            .lock()
            .unwrap()
            .push(branch.to_string());
        injected(&self.error_on_delete_branch)
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        injected(&self.error_on_comment)?;
        self.create_comment_calls
            .lock()
            .unwrap()
            .push(CreateCommentCall {
                pr_number,
                body: body.to_string(),
            });
        Ok(())
    }

    async fn create_comment_reaction(&self, comment_id: u64, reaction: Reaction) -> Result<()> {
        self.reaction_calls.lock().unwrap().push(ReactionCall {
            comment_id,
            reaction,
        });
        injected(&self.error_on_reaction)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
