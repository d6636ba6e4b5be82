//! Merge pipeline for a single PR
//!
//! Same split as the rest of the crate's effectful code:
//! 1. Gate - authorization and readiness (pure decisions over fresh data)
//! 2. Wait - poll checks until they settle or the deadline passes
//! 3. Execute - merge and clean up the head branch (effectful)

mod checks;
mod execute;
mod gate;
mod wait;

pub use checks::{aggregate_checks, classify_checks, required_check_names};
pub use execute::{cleanup_branch, merge_pull_request};
pub use gate::{authorize, decide, ensure_open, evaluate_readiness};
pub use wait::{POLL_GRACE, PollObservation, Rejection, WaitOutcome, WaitScheduler, poll_once};
