//! Parse command - test comment text against the command grammar

use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use mergebot::command::CommandParser;
use mergebot::config::load_config;
use mergebot::error::Result;
use std::path::Path;

/// Print whether `text` holds a merge command; returns whether it does
pub fn run_parse(config_path: Option<&Path>, text: &str) -> Result<bool> {
    let config = load_config(config_path)?;
    let parser = CommandParser::new(&config.bot_name, config.accept_bare_merge)?;

    match parser.parse(text) {
        Some(command) => {
            println!("{} {}", check(), format!("{command:?}").to_lowercase().emphasis());
            Ok(true)
        }
        None => {
            println!("{} {}", cross(), "no command".muted());
            Ok(false)
        }
    }
}
