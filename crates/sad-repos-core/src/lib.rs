//! sad-repos core library
//!
//! Fetches the commit history of GitHub repositories, classifies each
//! non-merge commit message with a remote sentiment service and summarises
//! the results per repository.
//!
//! Both remote services sit behind traits ([`CommitSource`],
//! [`SentimentTransport`]) so the pipeline runs against the in-memory
//! [`fakes`] in tests.

pub mod analyzer;
pub mod batch;
pub mod commits;
pub mod config;
pub mod error;
pub mod fakes;
pub mod github;
pub mod obs;
pub mod pipeline;
pub mod repo;
pub mod report;
pub mod sentiment;
pub mod summary;
pub mod telemetry;

pub use analyzer::BatchAnalyzer;
pub use batch::{batches, Batch, BatchBuilder, Batches, MAX_BATCH_BYTES};
pub use commits::{is_merge_commit, CommitFetcher, CommitMessage, CommitPage, CommitSource};
pub use config::Settings;
pub use error::{AnalyzeError, BatchError, ConfigError, FetchError, Result};
pub use github::{GitHubClient, DEFAULT_GITHUB_API};
pub use pipeline::RepoAnalyzer;
pub use repo::{select_repos, RepoId, RepoSelection};
pub use report::{read_report_json, render_table, write_report_json, SentimentReport};
pub use sentiment::{
    AnalysisResult, HttpSentimentClient, Sentiment, SentimentTransport,
    DEFAULT_SENTIMENT_ENDPOINT,
};
pub use summary::{ConfidenceThreshold, PosNegRatio, RepositorySummary, DEFAULT_MIN_CONFIDENCE};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
