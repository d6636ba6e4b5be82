//! CLI commands

mod context;
mod handle;
mod parse;
pub mod style;
mod watch;

pub use handle::{CommentArgs, run_comment, run_handle};
pub use parse::run_parse;
pub use watch::run_watch;
