//! Poll-with-deadline loop for required checks

use crate::error::Result;
use crate::merge::checks::aggregate_checks;
use crate::merge::gate::{ensure_open, evaluate_readiness};
use crate::platform::PlatformService;
use crate::types::{CheckSummary, OverallCheckState, PullRequestSnapshot, Readiness};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, warn};

/// How long a poll started before the deadline may run past it
pub const POLL_GRACE: Duration = Duration::from_secs(30);

/// Longest wait a scheduler honors, whatever it was built with
const MAX_WAIT: Duration = Duration::from_secs(crate::config::MAX_WAIT_SECS);

/// Why a PR stopped being mergeable while we waited
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Converted to draft
    Draft,
    /// Conflicts with the base branch
    Conflicting {
        /// Base branch name
        base_ref: String,
    },
}

/// Result of one poll iteration
///
/// Readiness and checks in one observation always come from the same
/// snapshot, so a `Ready` observation never mixes stale and fresh data.
#[derive(Debug, Clone)]
pub enum PollObservation {
    /// Snapshot is ready and every required check passed
    Ready {
        /// The snapshot that was evaluated
        snapshot: PullRequestSnapshot,
        /// Check classification for that snapshot's head
        checks: CheckSummary,
    },
    /// A gate that passed earlier now fails
    Rejected(Rejection),
    /// At least one required check failed
    ChecksFailed(CheckSummary),
    /// Nothing decided yet
    Pending {
        /// Required checks still pending or missing
        unresolved: Vec<String>,
        /// GitHub has not computed mergeability yet
        mergeability_unknown: bool,
    },
}

/// Terminal result of the wait loop
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// Ready to merge
    Ready {
        /// The snapshot to merge (its head SHA guards the merge)
        snapshot: PullRequestSnapshot,
        /// Check classification for that snapshot
        checks: CheckSummary,
        /// Time spent waiting
        waited: Duration,
    },
    /// PR turned draft or conflicting while waiting
    Rejected(Rejection),
    /// A required check failed
    ChecksFailed {
        /// Failing required checks
        failing: Vec<String>,
        /// Time spent waiting
        waited: Duration,
    },
    /// Deadline passed with checks still unresolved
    TimedOut {
        /// Time spent waiting
        waited: Duration,
        /// Required checks still pending or missing
        unresolved: Vec<String>,
        /// GitHub had not computed mergeability yet
        mergeability_unknown: bool,
    },
}

/// Sequential poller with an absolute deadline
#[derive(Debug, Clone, Copy)]
pub struct WaitScheduler {
    interval: Duration,
    timeout: Duration,
}

impl WaitScheduler {
    /// Create a scheduler polling every `interval` for at most `timeout`
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Poll until the observation resolves or the deadline passes.
    ///
    /// The deadline is `started + timeout` and is never extended. Polls run
    /// back to back with a fixed sleep in between (never overlapping); the
    /// last sleep is shortened so the final poll lands on the deadline. A
    /// poll still unresolved [`POLL_GRACE`] after the deadline is abandoned
    /// and the wait ends as timed out.
    pub async fn wait<F, Fut>(&self, started: Instant, mut poll: F) -> Result<WaitOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PollObservation>>,
    {
        let deadline = started + self.timeout.min(MAX_WAIT);
        let poll_deadline = deadline + POLL_GRACE;
        let mut attempt = 0u32;
        let mut last_unresolved = Vec::new();
        let mut last_mergeability_unknown = false;

        loop {
            attempt += 1;
            let Ok(observation) = timeout_at(poll_deadline, poll()).await else {
                let waited = started.elapsed();
                warn!(attempt, ?waited, "poll did not finish before the deadline");
                return Ok(WaitOutcome::TimedOut {
                    waited,
                    unresolved: last_unresolved,
                    mergeability_unknown: last_mergeability_unknown,
                });
            };
            let observation = observation?;
            let waited = started.elapsed();

            match observation {
                PollObservation::Ready { snapshot, checks } => {
                    debug!(attempt, ?waited, "checks settled");
                    return Ok(WaitOutcome::Ready {
                        snapshot,
                        checks,
                        waited,
                    });
                }
                PollObservation::Rejected(rejection) => {
                    debug!(attempt, ?rejection, "PR no longer mergeable");
                    return Ok(WaitOutcome::Rejected(rejection));
                }
                PollObservation::ChecksFailed(summary) => {
                    debug!(attempt, failing = ?summary.failing, "required checks failed");
                    return Ok(WaitOutcome::ChecksFailed {
                        failing: summary.failing,
                        waited,
                    });
                }
                PollObservation::Pending {
                    unresolved,
                    mergeability_unknown,
                } => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(attempt, ?waited, "deadline reached");
                        return Ok(WaitOutcome::TimedOut {
                            waited,
                            unresolved,
                            mergeability_unknown,
                        });
                    }
                    debug!(attempt, ?unresolved, mergeability_unknown, "still pending");
                    last_unresolved = unresolved;
                    last_mergeability_unknown = mergeability_unknown;
                    let wake = now
                        .checked_add(self.interval)
                        .map_or(deadline, |at| at.min(deadline));
                    sleep_until(wake).await;
                }
            }
        }
    }
}

/// One poll iteration: fresh snapshot, readiness, then checks for that head
pub async fn poll_once(
    platform: &dyn PlatformService,
    pr_number: u64,
    extra_required: &[String],
) -> Result<PollObservation> {
    let snapshot = platform.get_pr_snapshot(pr_number).await?;
    ensure_open(&snapshot)?;

    let readiness = evaluate_readiness(&snapshot);
    match readiness {
        Readiness::Draft => return Ok(PollObservation::Rejected(Rejection::Draft)),
        Readiness::Conflicting => {
            return Ok(PollObservation::Rejected(Rejection::Conflicting {
                base_ref: snapshot.base_ref,
            }));
        }
        Readiness::Ready | Readiness::MergeabilityUnknown => {}
    }

    let checks = aggregate_checks(platform, &snapshot, extra_required).await?;
    let mergeability_unknown = readiness == Readiness::MergeabilityUnknown;
    let overall = checks.overall;

    Ok(match overall {
        OverallCheckState::Failure => PollObservation::ChecksFailed(checks),
        OverallCheckState::Success if !mergeability_unknown => {
            PollObservation::Ready { snapshot, checks }
        }
        OverallCheckState::Success | OverallCheckState::Pending => PollObservation::Pending {
            unresolved: checks.unresolved().into_iter().map(String::from).collect(),
            mergeability_unknown,
        },
    })
}
