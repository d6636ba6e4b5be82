//! Merge run state machine
//!
//! One [`Orchestrator::run`] handles one trigger event:
//!
//! ```text
//! Received → Parsed → Authorizing → Evaluating → Waiting → Merging → CleaningUp → Done
//!     │          └──────────┴─────────────┴──────────┴─→ Done(rejected-* | timed-out)
//!     └─ no command: silent
//! any state ─→ Errored → Done(error)
//! ```
//!
//! The terminal comment is posted from exactly one place, at the end of the
//! run, so each recognized command gets exactly one outcome message.

use crate::command::CommandParser;
use crate::config::MergeBotConfig;
use crate::error::{Error, Result};
use crate::feedback::FeedbackReporter;
use crate::merge::{
    Rejection, WaitOutcome, WaitScheduler, authorize, cleanup_branch, ensure_open,
    evaluate_readiness, merge_pull_request, poll_once,
};
use crate::platform::PlatformService;
use crate::types::{
    PullRequestSnapshot, Readiness, RunOutcome, RunReport, RunState, TriggerEvent,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

/// Where the pre-merge phase ended
enum Gated {
    /// Run is over without merging
    Finished(RunOutcome),
    /// Everything is green for this snapshot
    Merge {
        snapshot: PullRequestSnapshot,
        waited: Duration,
    },
}

/// Records state transitions for one run
#[derive(Default)]
struct RunTrace {
    transitions: Vec<RunState>,
}

impl RunTrace {
    fn enter(&mut self, state: RunState) {
        debug!(state = %state, "run state");
        self.transitions.push(state);
    }

    fn current(&self) -> Option<&RunState> {
        self.transitions.last()
    }

    fn finish(self, outcome: Option<RunOutcome>) -> RunReport {
        RunReport {
            transitions: self.transitions,
            outcome,
        }
    }
}

/// Drives merge runs against one repository
pub struct Orchestrator {
    platform: Arc<dyn PlatformService>,
    config: MergeBotConfig,
    parser: CommandParser,
    scheduler: WaitScheduler,
}

impl Orchestrator {
    /// Create an orchestrator; fails on invalid configuration
    pub fn new(platform: Arc<dyn PlatformService>, config: MergeBotConfig) -> Result<Self> {
        config.validate()?;
        let parser = CommandParser::new(&config.bot_name, config.accept_bare_merge)?;
        let scheduler = WaitScheduler::new(config.poll_interval(), config.timeout());
        Ok(Self {
            platform,
            config,
            parser,
            scheduler,
        })
    }

    /// The command parser runs use
    pub const fn parser(&self) -> &CommandParser {
        &self.parser
    }

    /// Feedback reporter for this orchestrator's platform
    pub fn feedback(&self) -> FeedbackReporter<'_> {
        FeedbackReporter::new(self.platform.as_ref(), self.config.ack_reaction)
    }

    /// Handle one event to completion
    pub async fn run(&self, event: &TriggerEvent) -> RunReport {
        self.run_until(event, std::future::pending()).await
    }

    /// Handle one event, abandoning it if `shutdown` resolves before merging.
    ///
    /// Once the merge request has been issued the run is no longer
    /// cancellable: merge and branch cleanup always complete.
    pub async fn run_until<S>(&self, event: &TriggerEvent, shutdown: S) -> RunReport
    where
        S: Future<Output = ()>,
    {
        let span = info_span!(
            "merge_run",
            repo = %event.repo,
            pr = event.pr_number,
            author = %event.author,
        );
        self.run_inner(event, shutdown).instrument(span).await
    }

    async fn run_inner<S>(&self, event: &TriggerEvent, shutdown: S) -> RunReport
    where
        S: Future<Output = ()>,
    {
        let mut trace = RunTrace::default();
        trace.enter(RunState::Received);

        if self.parser.parse(&event.body).is_none() {
            debug!("no command in comment");
            return trace.finish(None);
        }
        if !event.repo.matches(&self.platform.config().repo) {
            warn!(
                configured = %self.platform.config().repo,
                "event belongs to another repository; ignoring"
            );
            return trace.finish(None);
        }
        trace.enter(RunState::Parsed);
        info!("merge command received");

        let feedback = self.feedback();
        feedback.acknowledge(event).await;

        let gated = {
            let gate = self.gate_and_wait(event, &mut trace);
            tokio::pin!(shutdown);
            tokio::select! {
                biased;
                () = &mut shutdown => None,
                gated = gate => Some(gated),
            }
        };

        let outcome = match gated {
            None => {
                info!(state = ?trace.current(), "run cancelled before merging");
                trace.enter(RunState::Cancelled);
                return trace.finish(None);
            }
            Some(Ok(Gated::Finished(outcome))) => outcome,
            Some(Ok(Gated::Merge { snapshot, waited })) => {
                match self.merge_and_cleanup(&snapshot, waited, &mut trace).await {
                    Ok(outcome) => outcome,
                    Err(e) => fault(e, &mut trace),
                }
            }
            Some(Err(e)) => fault(e, &mut trace),
        };

        info!(outcome = outcome.kind(), "run finished");
        trace.enter(RunState::Done(outcome.clone()));
        feedback.report(event, &outcome).await;
        trace.finish(Some(outcome))
    }

    /// Authorizing → Evaluating → Waiting
    async fn gate_and_wait(&self, event: &TriggerEvent, trace: &mut RunTrace) -> Result<Gated> {
        let platform = self.platform.as_ref();

        trace.enter(RunState::Authorizing);
        let decision = authorize(platform, &event.author).await?;
        if !decision.authorized {
            return Ok(Gated::Finished(RunOutcome::RejectedPermission {
                role: decision.role,
            }));
        }

        trace.enter(RunState::Evaluating);
        let snapshot = platform.get_pr_snapshot(event.pr_number).await?;
        ensure_open(&snapshot)?;
        match evaluate_readiness(&snapshot) {
            Readiness::Draft => return Ok(Gated::Finished(RunOutcome::RejectedDraft)),
            Readiness::Conflicting => {
                return Ok(Gated::Finished(RunOutcome::RejectedConflict {
                    base_ref: snapshot.base_ref,
                }));
            }
            Readiness::Ready | Readiness::MergeabilityUnknown => {}
        }

        trace.enter(RunState::Waiting);
        let started = Instant::now();
        let extra = &self.config.extra_required_checks;
        let waited = self
            .scheduler
            .wait(started, || poll_once(platform, event.pr_number, extra))
            .await?;

        Ok(match waited {
            WaitOutcome::Ready {
                snapshot, waited, ..
            } => Gated::Merge { snapshot, waited },
            WaitOutcome::Rejected(Rejection::Draft) => Gated::Finished(RunOutcome::RejectedDraft),
            WaitOutcome::Rejected(Rejection::Conflicting { base_ref }) => {
                Gated::Finished(RunOutcome::RejectedConflict { base_ref })
            }
            WaitOutcome::ChecksFailed { failing, waited } => {
                Gated::Finished(RunOutcome::RejectedChecksFailed { failing, waited })
            }
            WaitOutcome::TimedOut {
                waited,
                unresolved,
                mergeability_unknown,
            } => Gated::Finished(RunOutcome::TimedOut {
                waited,
                unresolved,
                mergeability_unknown,
            }),
        })
    }

    /// Merging → CleaningUp
    async fn merge_and_cleanup(
        &self,
        snapshot: &PullRequestSnapshot,
        waited: Duration,
        trace: &mut RunTrace,
    ) -> Result<RunOutcome> {
        let platform = self.platform.as_ref();
        let method = self.config.merge_method;

        trace.enter(RunState::Merging);
        let result = merge_pull_request(platform, snapshot, method).await?;
        info!(sha = ?result.sha, "PR merged");

        trace.enter(RunState::CleaningUp);
        let cleanup = cleanup_branch(platform, snapshot, self.config.delete_branch).await;

        Ok(RunOutcome::Merged {
            method,
            sha: result.sha,
            waited,
            cleanup,
        })
    }
}

/// Escalate a collaborator fault: log the detail, keep the message generic
fn fault(error: Error, trace: &mut RunTrace) -> RunOutcome {
    warn!(state = ?trace.current(), error = %error, "collaborator fault");
    trace.enter(RunState::Errored);
    RunOutcome::Error {
        summary: error.user_summary(),
    }
}
