//! Concurrent dispatch of trigger events
//!
//! Every recognized command runs as its own tokio task. Runs share nothing
//! except the set of PRs with a run in flight, which implements the
//! duplicate-command policy: while a run for a PR is still going, further
//! commands on that PR are answered with a short notice and dropped.
//!
//! Finished runs stay in the dispatcher until collected with
//! [`Dispatcher::reap_finished`] or [`Dispatcher::drain`]. Dropping the
//! dispatcher aborts runs that were never collected.

use crate::orchestrator::Orchestrator;
use crate::types::{RunReport, TriggerEvent};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

/// Lowercased `owner/name` plus PR number
type PrKey = (String, u64);

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A run was started
    Spawned,
    /// The comment holds no command
    NotACommand,
    /// Another run for the same PR is in flight
    AlreadyRunning,
}

/// Removes a PR from the in-flight set when its run ends
struct InFlightGuard {
    key: PrKey,
    in_flight: Arc<Mutex<HashSet<PrKey>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Spawns runs and coordinates shutdown
pub struct Dispatcher {
    orchestrator: Arc<Orchestrator>,
    ignore_duplicates: bool,
    in_flight: Arc<Mutex<HashSet<PrKey>>>,
    shutdown: watch::Sender<bool>,
    runs: Mutex<JoinSet<RunReport>>,
}

impl Dispatcher {
    /// Create a dispatcher.
    ///
    /// With `ignore_duplicates` false every command gets an independent run
    /// and the host's merge semantics prevent a double merge.
    pub fn new(orchestrator: Arc<Orchestrator>, ignore_duplicates: bool) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            orchestrator,
            ignore_duplicates,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            shutdown,
            runs: Mutex::new(JoinSet::new()),
        }
    }

    /// Start a run for `event` unless it is not a command or a duplicate
    pub async fn dispatch(&self, event: TriggerEvent) -> Dispatch {
        if self.orchestrator.parser().parse(&event.body).is_none() {
            return Dispatch::NotACommand;
        }

        let key = (event.repo.to_string().to_lowercase(), event.pr_number);
        let guard = if self.ignore_duplicates {
            let inserted = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.clone());
            if !inserted {
                info!(repo = %event.repo, pr = event.pr_number, author = %event.author,
                    "merge already in progress; ignoring command");
                self.orchestrator.feedback().already_running(&event).await;
                return Dispatch::AlreadyRunning;
            }
            Some(InFlightGuard {
                key,
                in_flight: Arc::clone(&self.in_flight),
            })
        } else {
            None
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let mut shutdown = self.shutdown.subscribe();
        let run = async move {
            let _guard = guard;
            let cancelled = async move {
                loop {
                    if *shutdown.borrow_and_update() {
                        break;
                    }
                    // Sender dropped counts as shutdown too
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            };
            orchestrator.run_until(&event, cancelled).await
        };
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .spawn(run);
        Dispatch::Spawned
    }

    /// Number of PRs with a run in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Ask every run to stop; runs already merging finish regardless
    pub fn shutdown(&self) {
        info!("shutting down; pending runs will be dropped");
        self.shutdown.send_replace(true);
    }

    /// Collect the reports of runs that have already finished, without waiting
    pub fn reap_finished(&self) -> Vec<RunReport> {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut reports = Vec::new();
        while let Some(joined) = runs.try_join_next() {
            collect(joined, &mut reports);
        }
        reports
    }

    /// Wait for every remaining run and collect their reports
    pub async fn drain(&self) -> Vec<RunReport> {
        let mut runs = std::mem::take(
            &mut *self.runs.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let mut reports = Vec::with_capacity(runs.len());
        while let Some(joined) = runs.join_next().await {
            collect(joined, &mut reports);
        }
        reports
    }
}

fn collect(joined: Result<RunReport, JoinError>, reports: &mut Vec<RunReport>) {
    match joined {
        Ok(report) => reports.push(report),
        Err(e) => warn!(error = %e, "merge run task failed"),
    }
}
