//! Structured lifecycle events for repository analysis.
//!
//! Every repository is analysed inside a `sad_repos.repo` span (see
//! [`repo_span`]), so the batch events below carry the repository through
//! the span rather than as a field.
//!
//! Events are emitted at `info!` level; failures at `warn!`.

use tracing::{info, warn, Span};

use crate::repo::RepoId;

/// Span scoping all events of one repository analysis.
///
/// Attach it with `tracing::Instrument` rather than entering it, since the
/// analysis awaits across requests.
pub fn repo_span(repo: &RepoId) -> Span {
    tracing::info_span!("sad_repos.repo", repo = %repo)
}

/// Emit event: analysis of a repository started.
pub fn emit_repo_started(repo: &RepoId) {
    info!(event = "repo.started", repo = %repo, "Analyzing: {}", repo);
}

/// Emit event: commit messages collected for the repository.
pub fn emit_messages_collected(count: usize) {
    info!(event = "repo.messages_collected", messages = count);
}

/// Emit event: one batch classified.
pub fn emit_batch_analyzed(seq: usize, messages: usize, bytes: usize) {
    info!(
        event = "batch.analyzed",
        seq = seq,
        messages = messages,
        bytes = bytes,
    );
}

/// Emit event: repository finished with its result count and duration.
pub fn emit_repo_finished(repo: &RepoId, results: usize, duration_ms: u64) {
    info!(
        event = "repo.finished",
        repo = %repo,
        results = results,
        duration_ms = duration_ms,
    );
}

/// Emit event: repository analysis failed (warning level).
pub fn emit_repo_failed(repo: &RepoId, error: &dyn std::fmt::Display) {
    warn!(event = "repo.failed", repo = %repo, error = %error);
}

/// Emit event: an identifier was not `owner/name` and is skipped.
pub fn emit_repo_skipped(input: &str) {
    warn!(event = "repo.skipped", input = %input, "skipping malformed repository identifier");
}
