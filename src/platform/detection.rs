//! Repository identifier parsing

use crate::error::{Error, Result};
use crate::types::RepoId;
use url::Url;

/// Parse `owner/name` or a repository web/clone URL into a [`RepoId`].
///
/// Accepts `acme/widgets`, `https://github.com/acme/widgets`,
/// `https://ghe.example.com/acme/widgets.git` and `git@github.com:acme/widgets.git`.
pub fn parse_repo_slug(input: &str) -> Result<RepoId> {
    let input = input.trim();

    let path = if let Some(rest) = input.strip_prefix("git@") {
        // scp-like syntax: git@host:owner/name.git
        rest.split_once(':')
            .map(|(_, path)| path.to_string())
            .ok_or_else(|| invalid(input))?
    } else if input.contains("://") {
        let url = Url::parse(input).map_err(|_| invalid(input))?;
        url.path().to_string()
    } else {
        input.to_string()
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    match path.split('/').collect::<Vec<_>>().as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(RepoId::new(*owner, *name)),
        _ => Err(invalid(input)),
    }
}

fn invalid(input: &str) -> Error {
    Error::InvalidArgument(format!(
        "expected a repository as owner/name or URL, got {input:?}"
    ))
}
