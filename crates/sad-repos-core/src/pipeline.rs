//! Per-repository orchestration: fetch, then batch and analyse.
//!
//! Repositories are processed one after another and each one runs to
//! completion before the next starts. The first error ends the run.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::analyzer::BatchAnalyzer;
use crate::commits::{CommitFetcher, CommitSource};
use crate::config::Settings;
use crate::error::{ConfigError, Result};
use crate::github::GitHubClient;
use crate::obs;
use crate::repo::{select_repos, RepoId};
use crate::report::SentimentReport;
use crate::sentiment::{AnalysisResult, HttpSentimentClient, SentimentTransport};
use crate::summary::{ConfidenceThreshold, RepositorySummary};

/// Runs the fetch and analysis pipeline for repositories.
#[derive(Clone)]
pub struct RepoAnalyzer {
    fetcher: CommitFetcher,
    analyzer: BatchAnalyzer,
}

impl RepoAnalyzer {
    pub fn new(commits: Arc<dyn CommitSource>, sentiment: Arc<dyn SentimentTransport>) -> Self {
        RepoAnalyzer {
            fetcher: CommitFetcher::new(commits),
            analyzer: BatchAnalyzer::new(sentiment),
        }
    }

    /// Use a different payload ceiling for sentiment requests.
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.analyzer = self.analyzer.with_limit(limit);
        self
    }

    /// Wire the GitHub and HTTP sentiment clients from `settings`.
    ///
    /// Both share one HTTP client built here.
    pub fn from_settings(settings: &Settings, token: &str) -> std::result::Result<Self, ConfigError> {
        let http = settings.http_client()?;
        let commits = GitHubClient::new(&settings.github_api_url, token, http.clone());
        let sentiment = HttpSentimentClient::new(&settings.sentiment_endpoint, http);

        Ok(RepoAnalyzer::new(Arc::new(commits), Arc::new(sentiment))
            .with_batch_limit(settings.max_batch_bytes))
    }

    /// Classify every non-merge commit message of `repo`, in listing order.
    pub async fn analyze(&self, repo: &RepoId) -> Result<Vec<AnalysisResult>> {
        let started = Instant::now();

        let outcome = async {
            obs::emit_repo_started(repo);
            let messages = self.fetcher.fetch(repo).await?;
            obs::emit_messages_collected(messages.len());
            let results = self.analyzer.process(messages).await?;
            Ok(results)
        }
        .instrument(obs::repo_span(repo))
        .await;

        match &outcome {
            Ok(results) => {
                obs::emit_repo_finished(repo, results.len(), started.elapsed().as_millis() as u64)
            }
            Err(e) => obs::emit_repo_failed(repo, e),
        }
        outcome
    }

    /// Analyse each repository in turn, stopping at the first failure.
    pub async fn analyze_all(
        &self,
        repos: &[RepoId],
    ) -> Result<Vec<(RepoId, Vec<AnalysisResult>)>> {
        let mut out = Vec::with_capacity(repos.len());
        for repo in repos {
            let results = self.analyze(repo).await?;
            out.push((repo.clone(), results));
        }
        Ok(out)
    }

    /// Build the summary report for raw `owner/name` inputs.
    ///
    /// The threshold is validated before any request is made; malformed
    /// identifiers are skipped and listed in the report.
    pub async fn report<S>(&self, inputs: &[S], min_confidence: f32) -> Result<SentimentReport>
    where
        S: AsRef<str>,
    {
        let threshold = ConfidenceThreshold::new(min_confidence)?;

        let selection = select_repos(inputs);
        for skipped in &selection.skipped {
            obs::emit_repo_skipped(skipped);
        }

        let mut summaries = Vec::with_capacity(selection.valid.len());
        for repo in selection.valid {
            let results = self.analyze(&repo).await?;
            summaries.push(RepositorySummary::from_results(repo, &results, threshold));
        }

        Ok(SentimentReport::new(threshold, summaries, selection.skipped))
    }
}
