//! mergebot CLI

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mergebot", version, about = "Merge pull requests from a /merge comment")]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `mergebot=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one `issue_comment` event payload (e.g. `$GITHUB_EVENT_PATH`)
    Handle {
        /// Path to the JSON payload
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event: PathBuf,
    },
    /// Process one comment given on the command line
    Comment {
        /// Repository as `owner/name` or URL
        #[arg(long)]
        repo: String,
        /// Pull request number
        #[arg(long)]
        pr: u64,
        /// Login of the comment author
        #[arg(long)]
        author: String,
        /// Id of the comment, for the acknowledgment reaction
        #[arg(long)]
        comment_id: u64,
        /// Comment text
        body: String,
    },
    /// Read newline-delimited `issue_comment` payloads from stdin
    Watch {
        /// Repository as `owner/name` or URL
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: Option<String>,
    },
    /// Check whether text contains a merge command
    Parse {
        /// Comment text
        text: String,
    },
}

fn init_tracing(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();
    init_tracing(args.log.as_deref());
    let config = args.config.as_deref();

    let ok = match args.cmd {
        Command::Handle { event } => cli::run_handle(config, &event).await?,
        Command::Comment {
            repo,
            pr,
            author,
            comment_id,
            body,
        } => {
            let comment = cli::CommentArgs {
                repo,
                pr,
                author,
                comment_id,
                body,
            };
            cli::run_comment(config, comment).await?
        }
        Command::Watch { repo } => cli::run_watch(config, repo.as_deref()).await?,
        Command::Parse { text } => cli::run_parse(config, &text)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
