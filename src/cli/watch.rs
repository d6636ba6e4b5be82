//! Watch command - dispatch a stream of comment events

use crate::cli::context::CommandContext;
use crate::cli::handle::print_report;
use crate::cli::style::Stylize;
use anstream::println;
use mergebot::dispatch::{Dispatch, Dispatcher};
use mergebot::error::{Error, Result};
use mergebot::event::parse_issue_comment;
use mergebot::platform::parse_repo_slug;
use mergebot::types::{RunOutcome, RunReport};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Run the watch command
///
/// Reads one `issue_comment` payload per stdin line. Each command runs
/// concurrently and its report is printed once it finishes. End of input
/// waits for every run; Ctrl-C, before or during that wait, cancels the ones
/// that have not started merging.
#[allow(clippy::future_not_send)]
pub async fn run_watch(config_path: Option<&Path>, repo: Option<&str>) -> Result<bool> {
    let slug = match repo {
        Some(repo) => repo.to_string(),
        None => std::env::var("GITHUB_REPOSITORY").map_err(|_| {
            Error::InvalidArgument(
                "no repository given; pass --repo or set GITHUB_REPOSITORY".to_string(),
            )
        })?,
    };
    let ctx = CommandContext::new(config_path, parse_repo_slug(&slug)?).await?;
    let dispatcher = Dispatcher::new(
        Arc::clone(&ctx.orchestrator),
        ctx.config.ignore_duplicate_commands,
    );

    println!(
        "{} {}",
        "Watching".emphasis(),
        format!("comments for {}", ctx.repo).accent()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interrupted = false;
    let mut tally = Tally::default();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                interrupted = true;
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            debug!("end of input");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_issue_comment(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "skipping malformed event");
                continue;
            }
        };

        let pr_number = event.pr_number;
        match dispatcher.dispatch(event).await {
            Dispatch::Spawned => info!(pr = pr_number, "merge run started"),
            Dispatch::AlreadyRunning => debug!(pr = pr_number, "duplicate command"),
            Dispatch::NotACommand => {}
        }
        tally.record(dispatcher.reap_finished());
    }

    let reports = if interrupted {
        dispatcher.shutdown();
        dispatcher.drain().await
    } else {
        let drain = dispatcher.drain();
        tokio::pin!(drain);
        tokio::select! {
            reports = &mut drain => reports,
            _ = tokio::signal::ctrl_c() => {
                dispatcher.shutdown();
                drain.await
            }
        }
    };
    tally.record(reports);

    println!("{}", format!("{} run(s) finished", tally.runs).muted());
    Ok(tally.clean)
}

/// Printed reports so far
struct Tally {
    runs: usize,
    clean: bool,
}

impl Default for Tally {
    fn default() -> Self {
        Self {
            runs: 0,
            clean: true,
        }
    }
}

impl Tally {
    fn record(&mut self, reports: Vec<RunReport>) {
        for report in &reports {
            print_report(report);
            self.clean &= !matches!(report.outcome, Some(RunOutcome::Error { .. }));
        }
        self.runs += reports.len();
    }
}
