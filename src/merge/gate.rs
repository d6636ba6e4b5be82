//! Authorization and readiness gates

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{AuthorizationDecision, PrState, PullRequestSnapshot, Readiness, Role};
use tracing::debug;

/// Decide whether `role` may trigger a merge (PURE)
#[must_use]
pub const fn decide(role: Role) -> AuthorizationDecision {
    AuthorizationDecision {
        authorized: role.can_merge(),
        role,
    }
}

/// Look up the commenter's role and decide (EFFECTFUL)
///
/// Always asks the host: access may have been revoked since the last run.
/// A failed lookup is an error, never an implicit "unauthorized".
pub async fn authorize(platform: &dyn PlatformService, login: &str) -> Result<AuthorizationDecision> {
    let role = platform.get_collaborator_role(login).await?;
    let decision = decide(role);
    debug!(login, %role, authorized = decision.authorized, "authorization decided");
    Ok(decision)
}

/// Fail with a merge-race error if the PR is no longer open
pub fn ensure_open(snapshot: &PullRequestSnapshot) -> Result<()> {
    match snapshot.state {
        PrState::Open => Ok(()),
        PrState::Merged => Err(Error::AlreadyMerged(snapshot.number)),
        PrState::Closed => Err(Error::PrClosed(snapshot.number)),
    }
}

/// Classify a snapshot's readiness (PURE)
///
/// Draft wins over everything else. Unknown mergeability is not a conflict:
/// GitHub computes it asynchronously after each push, so callers re-fetch.
#[must_use]
pub const fn evaluate_readiness(snapshot: &PullRequestSnapshot) -> Readiness {
    if snapshot.is_draft {
        return Readiness::Draft;
    }
    match snapshot.mergeable {
        Some(true) => Readiness::Ready,
        Some(false) => Readiness::Conflicting,
        None => Readiness::MergeabilityUnknown,
    }
}
