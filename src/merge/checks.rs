//! Required check aggregation

use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{CheckResult, CheckState, CheckSummary, OverallCheckState, PullRequestSnapshot};
use std::collections::HashMap;
use tracing::debug;

/// Required check names: branch protection first, then configured extras
pub fn required_check_names(snapshot: &PullRequestSnapshot, extra: &[String]) -> Vec<String> {
    let mut names = snapshot.required_checks.clone();
    for name in extra {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// Classify reported checks against the required set (PURE)
///
/// - any required check failed → failure
/// - else any required check pending or not reported → pending
/// - else → success (skipped counts as passing)
///
/// When a name is reported more than once the last report wins.
/// Non-required checks never affect the result.
#[must_use]
pub fn classify_checks(required: &[String], reported: &[CheckResult]) -> CheckSummary {
    let mut latest: HashMap<&str, CheckState> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for check in reported {
        if latest.insert(check.name.as_str(), check.state).is_none() {
            order.push(check.name.as_str());
        }
    }

    let mut failing = Vec::new();
    let mut pending = Vec::new();
    let mut missing = Vec::new();
    for name in required {
        match latest.get(name.as_str()) {
            Some(CheckState::Failure) => failing.push(name.clone()),
            Some(CheckState::Pending) => pending.push(name.clone()),
            Some(CheckState::Success | CheckState::Skipped) => {}
            None => missing.push(name.clone()),
        }
    }

    let optional = order
        .into_iter()
        .filter(|name| !required.iter().any(|r| r.as_str() == *name))
        .map(|name| CheckResult::new(name, latest[name]))
        .collect();

    let overall = if !failing.is_empty() {
        OverallCheckState::Failure
    } else if !pending.is_empty() || !missing.is_empty() {
        OverallCheckState::Pending
    } else {
        OverallCheckState::Success
    };

    CheckSummary {
        overall,
        failing,
        pending,
        missing,
        optional,
    }
}

/// Fetch check states for the snapshot's head commit and classify them
pub async fn aggregate_checks(
    platform: &dyn PlatformService,
    snapshot: &PullRequestSnapshot,
    extra_required: &[String],
) -> Result<CheckSummary> {
    let required = required_check_names(snapshot, extra_required);
    let reported = platform.list_check_states(snapshot).await?;
    let summary = classify_checks(&required, &reported);
    debug!(
        pr_number = snapshot.number,
        overall = ?summary.overall,
        failing = summary.failing.len(),
        pending = summary.pending.len(),
        missing = summary.missing.len(),
        "classified checks"
    );
    Ok(summary)
}
