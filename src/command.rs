//! Merge command recognition in free-form comment text
//!
//! Recognized forms (case-insensitive, anywhere in the comment):
//! - `@merge-bot merge` / `@mergebot merge` (mention of the configured bot)
//! - `/merge`
//! - `merge` as a bare word (can be disabled)
//!
//! Matching is on whole words: `merged`, `merge-request` and `@merge-bot-ish`
//! are not commands. Quoted lines (`> ...`) and fenced code blocks are
//! skipped so that quoting an earlier command does not trigger a new run.

use crate::error::{Error, Result};
use crate::types::Command;
use regex::Regex;

/// Recognizes merge directives in comment text
#[derive(Debug, Clone)]
pub struct CommandParser {
    pattern: Regex,
}

impl CommandParser {
    /// Build a parser for the given bot name.
    ///
    /// Hyphens in `bot_name` are optional in mentions, so `merge-bot` also
    /// accepts `@mergebot`. With `accept_bare` false only the mention and
    /// slash forms match.
    pub fn new(bot_name: &str, accept_bare: bool) -> Result<Self> {
        let name = bot_name.trim().trim_start_matches('@');
        if name.is_empty() {
            return Err(Error::Config("bot name must not be empty".to_string()));
        }

        let mention = name
            .split('-')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("-?");
        let prefix = format!(r"(?:@{mention}[\s,:]+|/)");
        let prefix = if accept_bare {
            format!("{prefix}?")
        } else {
            prefix
        };

        // The leading class keeps `/`, `@` and `-` from acting as word
        // boundaries; the trailing class rejects `merged` and `merge-foo`.
        let pattern = format!(r"(?i)(?:^|[^\w/@-]){prefix}merge(?:$|[^\w-])");
        let pattern = Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("invalid command pattern for {name:?}: {e}")))?;

        Ok(Self { pattern })
    }

    /// Find a command in `text`
    pub fn parse(&self, text: &str) -> Option<Command> {
        let mut in_fence = false;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence || trimmed.starts_with('>') {
                continue;
            }
            if self.pattern.is_match(trimmed) {
                return Some(Command::Merge);
            }
        }
        None
    }
}
