//! mergebot - merge pull requests from a comment
//!
//! A collaborator comments `/merge` (or `@merge-bot merge`) on a pull
//! request. The bot checks the commenter's permission, waits for the PR to
//! be mergeable and for its required checks to pass, merges it, deletes the
//! head branch and reports back in one comment.
//!
//! The pipeline is split into small pieces:
//!
//! - [`command`]: recognize the command in comment text
//! - [`merge`]: permission and readiness gates, check aggregation, the wait
//!   loop and merge execution
//! - [`feedback`]: acknowledgment reaction and outcome comment
//! - [`orchestrator`]: the per-run state machine tying it together
//! - [`dispatch`]: concurrent runs with duplicate-command suppression
//! - [`platform`]: the code host behind a trait, with a GitHub implementation

pub mod auth;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod feedback;
pub mod merge;
pub mod orchestrator;
pub mod platform;
pub mod types;
